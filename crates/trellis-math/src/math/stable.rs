//! Numerically stable primitives for log-domain probability math.
//!
//! Every place the inference engines take a logarithm of a probability goes
//! through [`careful_log`], so an exact zero (an impossible transition or a
//! zero-likelihood emission) becomes `-inf` instead of a warning or a panic.

/// Natural log of a non-negative probability weight.
///
/// Returns NEG_INFINITY for `0.0` and NaN for negative or NaN input.
pub fn careful_log(x: f64) -> f64 {
    if x == 0.0 {
        return f64::NEG_INFINITY;
    }
    if x.is_nan() || x < 0.0 {
        return f64::NAN;
    }
    x.ln()
}

/// Negative log-cost of a probability weight: `-careful_log(x)`.
///
/// Zero maps to `+inf`, the cost of an impossible event.
pub fn neg_log(x: f64) -> f64 {
    -careful_log(x)
}

/// Stable log(1 - exp(x)) for a log-probability `x <= 0`.
///
/// Uses `ln(-expm1(x))` near zero and `ln_1p(-exp(x))` further out
/// (Mächler's split at -ln 2).
pub fn log1m_exp(x: f64) -> f64 {
    if x.is_nan() || x > 0.0 {
        return f64::NAN;
    }
    if x == 0.0 {
        return f64::NEG_INFINITY;
    }
    if x == f64::NEG_INFINITY {
        return 0.0;
    }
    if x > -std::f64::consts::LN_2 {
        (-x.exp_m1()).ln()
    } else {
        (-x.exp()).ln_1p()
    }
}
