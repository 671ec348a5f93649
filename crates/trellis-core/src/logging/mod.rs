//! Structured logging for trellis.
//!
//! Provides dual-mode logging:
//! - Human-readable console output for interactive use
//! - Machine-parseable JSONL for scripted runs
//!
//! # Usage
//!
//! ```ignore
//! use trellis_core::logging::{init_logging, LogConfig, LogContext, Stage, event_names};
//!
//! let config = LogConfig::from_env(None, None);
//! init_logging(&config);
//!
//! let ctx = LogContext::new(generate_run_id());
//! log_event!(ctx, INFO, event_names::RUN_STARTED, Stage::Init, "starting");
//! ```
//!
//! stdout is reserved for command payloads; all log output goes to stderr.

pub mod config;
pub mod events;
pub mod layer;

pub use config::{level_from_flags, LogConfig, LogFormat, LogLevel};
pub use events::{event_names, Level, LogContext, Stage};
pub use layer::JsonlLayer;

use std::io::IsTerminal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Crates whose events pass the default filter.
const LOG_TARGETS: [&str; 2] = ["trellis_core", "trellis"];

/// Initialize the logging subsystem.
///
/// Must be called once at startup before any logging occurs. A `RUST_LOG`
/// directive, when set, replaces the level-derived filter entirely.
pub fn init_logging(config: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(config.level)));

    match config.format {
        LogFormat::Human => {
            let use_ansi = std::io::stderr().is_terminal();
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(use_ansi)
                .without_time();

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .init();
        }
        LogFormat::Jsonl => {
            tracing_subscriber::registry()
                .with(filter)
                .with(JsonlLayer::stderr())
                .init();
        }
    }
}

/// Filter directives for the trellis crates only. Event targets that are
/// not module paths (the `log_event!` names) pass at the same level.
fn default_directives(level: LogLevel) -> String {
    let mut directives = vec![LogLevel::Off.to_string()];
    for target in LOG_TARGETS {
        directives.push(format!("{}={}", target, level));
    }
    for prefix in ["run", "load", "infer", "decode", "sample", "classify", "internal_error"] {
        directives.push(format!("{}={}", prefix, level));
    }
    directives.join(",")
}

/// Generate a unique run ID for this invocation.
pub fn generate_run_id() -> String {
    let uuid = uuid::Uuid::new_v4();
    // Shorten to first 12 hex chars for readability
    format!("run-{}", &uuid.simple().to_string()[..12])
}

/// Convenience macro for structured event logging with context.
///
/// Usage:
/// ```ignore
/// log_event!(ctx, INFO, event_names::MODEL_LOADED, Stage::Load, "model loaded",
///     states = 4);
/// ```
#[macro_export]
macro_rules! log_event {
    ($ctx:expr, INFO, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::info!(
            target: $event,
            run_id = %$ctx.run_id,
            stage = %$stage,
            message = $msg,
            $($key = $val,)*
        )
    };
    ($ctx:expr, DEBUG, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::debug!(
            target: $event,
            run_id = %$ctx.run_id,
            stage = %$stage,
            message = $msg,
            $($key = $val,)*
        )
    };
    ($ctx:expr, WARN, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::warn!(
            target: $event,
            run_id = %$ctx.run_id,
            stage = %$stage,
            message = $msg,
            $($key = $val,)*
        )
    };
    ($ctx:expr, ERROR, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::error!(
            target: $event,
            run_id = %$ctx.run_id,
            stage = %$stage,
            message = $msg,
            $($key = $val,)*
        )
    };
}
