//! Seeded trajectory sampling from a hidden Markov model.
//!
//! Used to produce fixtures for the inference engines: a hidden-state path
//! drawn from the chain plus the observations it emits, with some
//! observations optionally replaced by `None`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::model::HiddenMarkovModel;

/// Errors from trajectory sampling.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SampleError {
    #[error("drop probability must be within [0, 1], got {0}")]
    InvalidDropProbability(f64),

    #[error("{table} distribution for {state} has no mass at step {t}")]
    EmptyDistribution {
        table: &'static str,
        state: String,
        t: usize,
    },
}

impl SampleError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            SampleError::InvalidDropProbability(_) => 50,
            SampleError::EmptyDistribution { .. } => 51,
        }
    }
}

/// A sampled hidden path and its (possibly partially missing) observations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory<S, O> {
    pub states: Vec<S>,
    pub observations: Vec<Option<O>>,
}

impl<S, O> Trajectory<S, O> {
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Number of dropped observations.
    pub fn missing_count(&self) -> usize {
        self.observations.iter().filter(|o| o.is_none()).count()
    }
}

/// Draws trajectories from a borrowed model.
#[derive(Debug, Clone, Copy)]
pub struct SequenceGenerator<'m, M> {
    model: &'m M,
}

impl<'m, M: HiddenMarkovModel> SequenceGenerator<'m, M> {
    pub fn new(model: &'m M) -> Self {
        Self { model }
    }

    /// Draw a trajectory of `steps` time steps.
    ///
    /// The same `seed` always yields the same trajectory. Each observation
    /// after the first is dropped independently with probability
    /// `drop_prob`; the first observation is always kept.
    pub fn generate(
        &self,
        steps: usize,
        seed: u64,
        drop_prob: f64,
    ) -> Result<Trajectory<M::State, M::Obs>, SampleError> {
        if !(0.0..=1.0).contains(&drop_prob) {
            return Err(SampleError::InvalidDropProbability(drop_prob));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut states = Vec::with_capacity(steps);
        let mut observations = Vec::with_capacity(steps);

        for t in 0..steps {
            let state = match states.last() {
                None => self.model.prior().sample(&mut rng).cloned().ok_or_else(|| {
                    SampleError::EmptyDistribution {
                        table: "prior",
                        state: "<none>".to_string(),
                        t,
                    }
                })?,
                Some(previous) => self
                    .model
                    .transition(previous)
                    .sample(&mut rng)
                    .cloned()
                    .ok_or_else(|| SampleError::EmptyDistribution {
                        table: "transition",
                        state: format!("{:?}", previous),
                        t,
                    })?,
            };

            let observation = if t > 0 && rng.random_bool(drop_prob) {
                None
            } else {
                let emitted = self
                    .model
                    .emission(&state)
                    .sample(&mut rng)
                    .cloned()
                    .ok_or_else(|| SampleError::EmptyDistribution {
                        table: "emission",
                        state: format!("{:?}", state),
                        t,
                    })?;
                Some(emitted)
            };

            states.push(state);
            observations.push(observation);
        }

        let trajectory = Trajectory {
            states,
            observations,
        };
        debug!(
            steps,
            seed,
            missing = trajectory.missing_count(),
            "trajectory sampled"
        );
        Ok(trajectory)
    }
}
