//! Resolution of the stderr log format and level.
//!
//! Sources, lowest precedence first: built-in defaults, `TRELLIS_LOG` and
//! `TRELLIS_LOG_FORMAT`, then the `-v` / `-q` / `--log-format` flags.
//! `RUST_LOG` bypasses all of this and is read directly by the filter in
//! [`super::init_logging`].

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Environment variable for the log level.
pub const ENV_LOG_LEVEL: &str = "TRELLIS_LOG";

/// Environment variable for the log format.
pub const ENV_LOG_FORMAT: &str = "TRELLIS_LOG_FORMAT";

/// Shape of the stderr log stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Plain text lines for a terminal.
    #[default]
    Human,
    /// One JSON object per event.
    #[value(alias = "json")]
    Jsonl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    #[value(alias = "warning")]
    Warn,
    Error,
    #[value(alias = "quiet")]
    Off,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved logging settings for one process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: LogLevel,
}

impl LogConfig {
    /// Resolve from the process environment and CLI overrides.
    pub fn from_env(cli_level: Option<LogLevel>, cli_format: Option<LogFormat>) -> Self {
        Self::resolve(|key| std::env::var(key).ok(), cli_level, cli_format)
    }

    /// Resolve with an arbitrary variable lookup. Unparseable values are
    /// ignored so a typo in the environment never aborts a run.
    pub fn resolve(
        lookup: impl Fn(&str) -> Option<String>,
        cli_level: Option<LogLevel>,
        cli_format: Option<LogFormat>,
    ) -> Self {
        let env_level = lookup(ENV_LOG_LEVEL).and_then(|v| LogLevel::from_str(v.trim(), true).ok());
        let env_format =
            lookup(ENV_LOG_FORMAT).and_then(|v| LogFormat::from_str(v.trim(), true).ok());

        let defaults = LogConfig::default();
        LogConfig {
            format: cli_format.or(env_format).unwrap_or(defaults.format),
            level: cli_level.or(env_level).unwrap_or(defaults.level),
        }
    }
}

/// Map `-v` count and `-q` to a level override.
///
/// `-q` wins over any `-v`. With neither flag there is no override.
pub fn level_from_flags(verbose: u8, quiet: bool) -> Option<LogLevel> {
    if quiet {
        return Some(LogLevel::Error);
    }
    match verbose {
        0 => None,
        1 => Some(LogLevel::Info),
        2 => Some(LogLevel::Debug),
        _ => Some(LogLevel::Trace),
    }
}
