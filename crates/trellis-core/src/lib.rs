//! Trellis core library
//!
//! Discrete hidden Markov model inference and its companions:
//! - `Distribution`, the sparse probability mass function shared by all engines
//! - The `HiddenMarkovModel` provider trait and a tabular implementation
//! - Forward-backward smoothing and Viterbi decoding
//! - Seeded trajectory sampling
//! - A two-category Naive-Bayes text classifier
//! - Config loading, exit codes, structured logging and output for the CLI
//!
//! The binary entry point is in `main.rs`.

pub mod classify;
pub mod config;
pub mod distribution;
pub mod exit_codes;
pub mod inference;
pub mod logging;
pub mod model;
pub mod output;
pub mod sampling;

pub use distribution::Distribution;
pub use inference::{
    check_observations, forward_backward, viterbi, ForwardBackward, ForwardBackwardResult,
    InferenceError, Viterbi, ViterbiPath,
};
pub use model::{HiddenMarkovModel, TabularModel};
pub use sampling::{SampleError, SequenceGenerator, Trajectory};
