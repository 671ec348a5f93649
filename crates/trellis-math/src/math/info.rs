//! Information-theoretic quantities over discrete distributions.
//!
//! All quantities are reported in bits. Cells with zero probability mass
//! contribute nothing (`0 * log 0 = 0`).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors for malformed probability tables.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InfoError {
    #[error("joint distribution is empty")]
    Empty,

    #[error("row {row} has {got} columns, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        got: usize,
    },

    #[error("cell ({row}, {col}) is not a finite non-negative probability: {value}")]
    InvalidCell { row: usize, col: usize, value: f64 },

    #[error("joint distribution has zero total mass")]
    ZeroMass,
}

impl InfoError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            InfoError::Empty => 70,
            InfoError::Ragged { .. } => 71,
            InfoError::InvalidCell { .. } => 72,
            InfoError::ZeroMass => 73,
        }
    }
}

/// Shannon entropy H(p) in bits.
pub fn entropy(p: &[f64]) -> f64 {
    p.iter()
        .filter(|&&v| v > 0.0)
        .map(|&v| -v * v.log2())
        .sum()
}

/// Kullback-Leibler divergence D(p || q) in bits.
///
/// Returns `None` when the lengths differ. Returns `+inf` when `p` puts mass
/// where `q` has none.
pub fn kl_divergence(p: &[f64], q: &[f64]) -> Option<f64> {
    if p.len() != q.len() {
        return None;
    }
    let mut total = 0.0;
    for (&pi, &qi) in p.iter().zip(q) {
        if pi == 0.0 {
            continue;
        }
        if qi == 0.0 {
            return Some(f64::INFINITY);
        }
        total += pi * (pi / qi).log2();
    }
    Some(total)
}

/// Marginals and mutual information of a two-variable joint table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointSummary {
    /// P(X): row sums.
    pub marginal_x: Vec<f64>,
    /// P(Y): column sums.
    pub marginal_y: Vec<f64>,
    /// H(X) in bits.
    pub entropy_x: f64,
    /// H(Y) in bits.
    pub entropy_y: f64,
    /// I(X; Y) = D(P(x,y) || P(x)P(y)) in bits.
    pub mutual_information: f64,
}

fn validate_joint(joint: &[Vec<f64>]) -> Result<usize, InfoError> {
    let cols = match joint.first() {
        Some(row) if !row.is_empty() => row.len(),
        _ => return Err(InfoError::Empty),
    };
    let mut total = 0.0;
    for (r, row) in joint.iter().enumerate() {
        if row.len() != cols {
            return Err(InfoError::Ragged {
                row: r,
                expected: cols,
                got: row.len(),
            });
        }
        for (c, &value) in row.iter().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(InfoError::InvalidCell { row: r, col: c, value });
            }
            total += value;
        }
    }
    if total == 0.0 {
        return Err(InfoError::ZeroMass);
    }
    Ok(cols)
}

/// Mutual information I(X; Y) in bits of a joint table P(X=i, Y=j).
///
/// Computed as the KL divergence between the joint and the outer product of
/// its marginals. The table is taken as given (not renormalized).
pub fn mutual_information(joint: &[Vec<f64>]) -> Result<f64, InfoError> {
    analyze_joint(joint).map(|summary| summary.mutual_information)
}

/// Compute marginals, marginal entropies, and mutual information together.
pub fn analyze_joint(joint: &[Vec<f64>]) -> Result<JointSummary, InfoError> {
    let cols = validate_joint(joint)?;

    let marginal_x: Vec<f64> = joint.iter().map(|row| row.iter().sum()).collect();
    let mut marginal_y = vec![0.0; cols];
    for row in joint {
        for (acc, &v) in marginal_y.iter_mut().zip(row) {
            *acc += v;
        }
    }

    let flat_joint: Vec<f64> = joint.iter().flatten().copied().collect();
    let independent: Vec<f64> = marginal_x
        .iter()
        .flat_map(|&px| marginal_y.iter().map(move |&py| px * py))
        .collect();

    // Zero marginals force zero joint cells, so the divergence stays finite.
    let mutual_information = kl_divergence(&flat_joint, &independent).unwrap_or(f64::NAN);

    Ok(JointSummary {
        entropy_x: entropy(&marginal_x),
        entropy_y: entropy(&marginal_y),
        marginal_x,
        marginal_y,
        mutual_information,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn entropy_of_fair_coin_is_one_bit() {
        assert!(approx_eq(entropy(&[0.5, 0.5]), 1.0, 1e-12));
        assert!(approx_eq(entropy(&[1.0, 0.0]), 0.0, 1e-12));
    }

    #[test]
    fn kl_divergence_identical_is_zero() {
        let p = [0.2, 0.3, 0.5];
        assert!(approx_eq(kl_divergence(&p, &p).unwrap(), 0.0, 1e-12));
    }

    #[test]
    fn kl_divergence_unsupported_mass_is_infinite() {
        let out = kl_divergence(&[0.5, 0.5], &[1.0, 0.0]).unwrap();
        assert!(out.is_infinite());
        assert!(kl_divergence(&[1.0], &[0.5, 0.5]).is_none());
    }

    #[test]
    fn independent_joint_has_zero_information() {
        let px = [0.2, 0.5, 0.3];
        let py = [0.6, 0.4];
        let joint: Vec<Vec<f64>> = px
            .iter()
            .map(|&a| py.iter().map(|&b| a * b).collect())
            .collect();
        let mi = mutual_information(&joint).unwrap();
        assert!(approx_eq(mi, 0.0, 1e-12), "mi={mi}");
    }

    #[test]
    fn perfectly_correlated_bits_share_one_bit() {
        let joint = vec![vec![0.5, 0.0], vec![0.0, 0.5]];
        let mi = mutual_information(&joint).unwrap();
        assert!(approx_eq(mi, 1.0, 1e-12));
    }

    #[test]
    fn reference_table_matches_direct_sum() {
        let joint = vec![
            vec![0.1, 0.09, 0.11],
            vec![0.08, 0.07, 0.07],
            vec![0.18, 0.13, 0.17],
        ];
        let summary = analyze_joint(&joint).unwrap();
        let mut expected = 0.0;
        for (i, row) in joint.iter().enumerate() {
            for (j, &p) in row.iter().enumerate() {
                expected += p * (p / (summary.marginal_x[i] * summary.marginal_y[j])).log2();
            }
        }
        assert!(approx_eq(summary.mutual_information, expected, 1e-12));
        assert!(summary.mutual_information >= 0.0);
        assert!(summary.mutual_information < 0.01);
    }

    #[test]
    fn malformed_tables_are_rejected() {
        assert_eq!(mutual_information(&[]), Err(InfoError::Empty));
        assert!(matches!(
            mutual_information(&[vec![0.5, 0.5], vec![0.0]]),
            Err(InfoError::Ragged { row: 1, .. })
        ));
        assert!(matches!(
            mutual_information(&[vec![0.5, -0.1]]),
            Err(InfoError::InvalidCell { col: 1, .. })
        ));
        assert_eq!(mutual_information(&[vec![0.0, 0.0]]), Err(InfoError::ZeroMass));
    }
}
