//! Inference engine modules.
//!
//! Both engines are pure functions of their observation sequence and a
//! borrowed model: no state survives between calls, so concurrent calls
//! against one model need no coordination.

pub mod forward_backward;
pub mod viterbi;

pub use forward_backward::{forward_backward, ForwardBackward, ForwardBackwardResult};
pub use viterbi::{viterbi, Viterbi, ViterbiPath};

use std::collections::HashSet;
use thiserror::Error;
use trellis_config::ValidationError;

use crate::model::HiddenMarkovModel;

/// Errors raised at the inference call boundary.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("observation sequence is empty")]
    EmptySequence,

    #[error("observation at t={t} is not in the model's observation space: {value}")]
    UnknownObservation { t: usize, value: String },

    #[error("invalid model: {0}")]
    InvalidModel(#[from] ValidationError),
}

impl InferenceError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            InferenceError::EmptySequence => 30,
            InferenceError::UnknownObservation { .. } => 31,
            InferenceError::InvalidModel(_) => 32,
        }
    }
}

/// Check call-boundary preconditions: a non-empty sequence whose present
/// observations all belong to the model's observation space.
pub fn check_observations<M: HiddenMarkovModel>(
    model: &M,
    observations: &[Option<M::Obs>],
) -> Result<(), InferenceError> {
    if observations.is_empty() {
        return Err(InferenceError::EmptySequence);
    }

    let alphabet: HashSet<&M::Obs> = model.observed_states().iter().collect();
    for (t, obs) in observations.iter().enumerate() {
        if let Some(obs) = obs {
            if !alphabet.contains(obs) {
                return Err(InferenceError::UnknownObservation {
                    t,
                    value: format!("{:?}", obs),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::Distribution;
    use crate::model::TabularModel;

    fn coin() -> TabularModel<u8, char> {
        TabularModel::new(vec![0, 1], vec!['h', 't'], Distribution::uniform([0u8, 1].iter()))
    }

    #[test]
    fn empty_sequence_rejected() {
        let err = check_observations(&coin(), &[]).unwrap_err();
        assert!(matches!(err, InferenceError::EmptySequence));
        assert_eq!(err.code(), 30);
    }

    #[test]
    fn unknown_observation_rejected() {
        let err = check_observations(&coin(), &[Some('h'), None, Some('x')]).unwrap_err();
        match err {
            InferenceError::UnknownObservation { t, value } => {
                assert_eq!(t, 2);
                assert_eq!(value, "'x'");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_observations_allowed() {
        check_observations(&coin(), &[None, None]).unwrap();
    }
}
