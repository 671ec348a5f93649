//! Exit codes for the trellis CLI.
//!
//! Exit codes communicate operation outcome without requiring output parsing.
//!
//! Exit code ranges:
//! - 0: Success
//! - 10-19: User/environment errors (recoverable by user action)
//! - 20-29: Internal errors (bugs, should be reported)

use crate::classify::ClassifyError;
use crate::config::ConfigError;
use crate::inference::InferenceError;
use crate::sampling::SampleError;
use trellis_math::InfoError;

/// Exit codes for trellis operations.
///
/// These codes are a stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Clean = 0,

    // ========================================================================
    // User / Environment Errors (10-19)
    // ========================================================================
    /// Invalid arguments or input data inconsistent with the model
    ArgsError = 10,

    /// Model or observation file missing, malformed, or invalid
    ConfigError = 11,

    // ========================================================================
    // Internal Errors (20-29)
    // ========================================================================
    /// Internal error (bug - please report)
    InternalError = 20,

    /// I/O error
    IoError = 21,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        self == ExitCode::Clean
    }

    /// Check if this exit code is a user/environment error (codes 10-19).
    pub fn is_user_error(self) -> bool {
        (10..20).contains(&(self as i32))
    }

    /// Get the error code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}

impl From<&ConfigError> for ExitCode {
    fn from(err: &ConfigError) -> Self {
        if err.is_io() {
            ExitCode::IoError
        } else {
            ExitCode::ConfigError
        }
    }
}

impl From<&InferenceError> for ExitCode {
    fn from(err: &InferenceError) -> Self {
        match err {
            InferenceError::InvalidModel(_) => ExitCode::ConfigError,
            InferenceError::EmptySequence | InferenceError::UnknownObservation { .. } => {
                ExitCode::ArgsError
            }
        }
    }
}

impl From<&SampleError> for ExitCode {
    fn from(err: &SampleError) -> Self {
        match err {
            SampleError::InvalidDropProbability(_) => ExitCode::ArgsError,
            SampleError::EmptyDistribution { .. } => ExitCode::ConfigError,
        }
    }
}

impl From<&ClassifyError> for ExitCode {
    fn from(err: &ClassifyError) -> Self {
        match err {
            ClassifyError::EmptyCategory { .. } => ExitCode::ArgsError,
            ClassifyError::Io { .. } => ExitCode::IoError,
        }
    }
}

impl From<&InfoError> for ExitCode {
    fn from(_: &InfoError) -> Self {
        ExitCode::ArgsError
    }
}
