//! Hidden Markov model file types.
//!
//! A model file is a JSON document describing the discrete hidden-state
//! space, the observation alphabet, and the three probability tables:
//!
//! ```json
//! {
//!   "schema_version": "1.0.0",
//!   "hidden_states": ["A", "B"],
//!   "observations": ["a", "b"],
//!   "prior": {"A": 0.5, "B": 0.5},
//!   "transitions": {"A": {"A": 0.9, "B": 0.1}, "B": {"A": 0.1, "B": 0.9}},
//!   "emissions": {"A": {"a": 1.0}, "B": {"b": 1.0}}
//! }
//! ```
//!
//! Enumeration order of states and observations is the order of the
//! `hidden_states` / `observations` lists, never the order of map keys.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::validate::ValidationError;

/// Sparse row of a probability table: key -> weight. Absent keys weigh 0.
pub type ProbabilityRow = BTreeMap<String, f64>;

/// Complete model configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFile {
    pub schema_version: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Hidden states in enumeration order.
    pub hidden_states: Vec<String>,

    /// Observation alphabet in enumeration order.
    pub observations: Vec<String>,

    /// P(state at t = 0).
    pub prior: ProbabilityRow,

    /// P(next state | state), keyed by the current state.
    pub transitions: BTreeMap<String, ProbabilityRow>,

    /// P(observation | state), keyed by the emitting state.
    pub emissions: BTreeMap<String, ProbabilityRow>,

    /// Permit states with no transition or emission row (absorbing or
    /// silent states). Rows that are present must still sum to one.
    #[serde(default)]
    pub allow_partial_rows: bool,
}

impl ModelFile {
    /// Load a model from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ValidationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::from_json(&content)
    }

    /// Parse a model from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))
    }

    /// Number of nonzero transition entries.
    pub fn transition_nonzeros(&self) -> usize {
        count_nonzeros(&self.transitions)
    }

    /// Number of nonzero emission entries.
    pub fn emission_nonzeros(&self) -> usize {
        count_nonzeros(&self.emissions)
    }

    /// Check whether the prior sums to one within tolerance.
    pub fn prior_sums_to_one(&self, tolerance: f64) -> bool {
        let sum: f64 = self.prior.values().sum();
        (sum - 1.0).abs() <= tolerance
    }
}

fn count_nonzeros(table: &BTreeMap<String, ProbabilityRow>) -> usize {
    table
        .values()
        .map(|row| row.values().filter(|&&p| p > 0.0).count())
        .sum()
}

/// An observation sequence, optionally paired with the hidden states that
/// produced it (as written by `trellis generate`).
///
/// `null` entries are missing observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationFile {
    pub observations: Vec<Option<String>>,

    /// Ground-truth hidden states, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub states: Option<Vec<String>>,
}

impl ObservationFile {
    /// Load an observation sequence from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ValidationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::from_json(&content)
    }

    /// Parse an observation sequence from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))
    }

    /// Number of time steps with a missing observation.
    pub fn missing_count(&self) -> usize {
        self.observations.iter().filter(|o| o.is_none()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_STATE: &str = r#"{
        "schema_version": "1.0.0",
        "hidden_states": ["A", "B"],
        "observations": ["A", "B"],
        "prior": {"A": 0.5, "B": 0.5},
        "transitions": {"A": {"A": 0.9, "B": 0.1}, "B": {"A": 0.1, "B": 0.9}},
        "emissions": {"A": {"A": 1.0}, "B": {"B": 1.0}}
    }"#;

    #[test]
    fn parse_two_state_model() {
        let model = ModelFile::from_json(TWO_STATE).unwrap();
        assert_eq!(model.hidden_states, vec!["A", "B"]);
        assert_eq!(model.transition_nonzeros(), 4);
        assert_eq!(model.emission_nonzeros(), 2);
        assert!(model.prior_sums_to_one(1e-9));
        assert!(!model.allow_partial_rows);
        assert!(model.description.is_none());
    }

    #[test]
    fn parse_rejects_malformed_json() {
        let err = ModelFile::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ValidationError::ParseError(_)));
    }

    #[test]
    fn observation_file_accepts_nulls() {
        let obs = ObservationFile::from_json(r#"{"observations": ["A", null, "B"]}"#).unwrap();
        assert_eq!(
            obs.observations,
            vec![Some("A".to_string()), None, Some("B".to_string())]
        );
        assert_eq!(obs.missing_count(), 1);
        assert!(obs.states.is_none());
    }

    #[test]
    fn observation_file_keeps_ground_truth() {
        let obs = ObservationFile::from_json(
            r#"{"states": ["A", "A"], "observations": ["A", "A"]}"#,
        )
        .unwrap();
        assert_eq!(obs.states.unwrap().len(), 2);
    }

    #[test]
    fn model_file_serde_roundtrip() {
        let model = ModelFile::from_json(TWO_STATE).unwrap();
        let json = serde_json::to_string(&model).unwrap();
        let back = ModelFile::from_json(&json).unwrap();
        assert_eq!(model, back);
    }
}
