//! Structured event vocabulary for logging.
//!
//! Events carry the run's correlation ID and the pipeline stage so JSONL
//! output can be grouped per invocation.

use serde::{Deserialize, Serialize};

/// Log levels for events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Level::Trace,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

/// Stages of a trellis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and argument handling.
    Init,
    /// Model and observation loading.
    Load,
    /// Forward-backward smoothing.
    Infer,
    /// Viterbi decoding.
    Decode,
    /// Trajectory sampling.
    Sample,
    /// Document classification.
    Classify,
    /// Payload rendering.
    Output,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Load => "load",
            Stage::Infer => "infer",
            Stage::Decode => "decode",
            Stage::Sample => "sample",
            Stage::Classify => "classify",
            Stage::Output => "output",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    // Run lifecycle
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";

    // Load stage
    pub const MODEL_LOADED: &str = "load.model";
    pub const OBSERVATIONS_LOADED: &str = "load.observations";
    pub const CONFIG_ERROR: &str = "load.error";

    // Inference
    pub const INFER_FINISHED: &str = "infer.finished";
    pub const DECODE_FINISHED: &str = "decode.finished";

    // Other commands
    pub const SAMPLE_FINISHED: &str = "sample.finished";
    pub const CLASSIFY_FINISHED: &str = "classify.finished";

    pub const INTERNAL_ERROR: &str = "internal_error";
}

/// Correlation data attached to every event of a run.
#[derive(Debug, Clone)]
pub struct LogContext {
    /// Unique ID for this invocation.
    pub run_id: String,
}

impl LogContext {
    pub fn new(run_id: impl Into<String>) -> Self {
        LogContext {
            run_id: run_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_display_matches_serde() {
        for stage in [
            Stage::Init,
            Stage::Load,
            Stage::Infer,
            Stage::Decode,
            Stage::Sample,
            Stage::Classify,
            Stage::Output,
        ] {
            let json = serde_json::to_string(&stage).unwrap();
            assert_eq!(json, format!("\"{}\"", stage));
        }
    }

    #[test]
    fn test_log_context() {
        let ctx = LogContext::new(String::from("run-abc"));
        assert_eq!(ctx.run_id, "run-abc");
    }

    #[test]
    fn test_level_from_tracing() {
        assert_eq!(Level::from(tracing::Level::INFO), Level::Info);
        assert_eq!(Level::from(tracing::Level::WARN), Level::Warn);
    }

    #[test]
    fn test_event_names() {
        assert_eq!(event_names::RUN_STARTED, "run.started");
        assert_eq!(event_names::DECODE_FINISHED, "decode.finished");
    }
}
