//! Command payload rendering.
//!
//! Every command builds one JSON body; this module wraps it in the common
//! envelope (`schema_version`, `run_id`, `generated_at`, `command`) and
//! writes it to stdout in the requested format.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Schema version of command payloads.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Supported output formats for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pretty-printed JSON (default)
    #[default]
    Json,

    /// Single-line JSON
    Jsonl,

    /// One-line human summary
    Summary,

    /// No output (exit code only)
    Exitcode,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Jsonl => write!(f, "jsonl"),
            OutputFormat::Summary => write!(f, "summary"),
            OutputFormat::Exitcode => write!(f, "exitcode"),
        }
    }
}

/// Wrap a command body in the standard envelope.
///
/// Body keys are merged into the envelope; a non-object body is placed
/// under `"result"`.
pub fn envelope(command: &str, run_id: &str, body: Value) -> Value {
    let mut obj = serde_json::Map::new();
    obj.insert("schema_version".to_string(), Value::from(SCHEMA_VERSION));
    obj.insert("command".to_string(), Value::from(command));
    obj.insert("run_id".to_string(), Value::from(run_id));
    obj.insert(
        "generated_at".to_string(),
        Value::from(chrono::Utc::now().to_rfc3339()),
    );
    match body {
        Value::Object(fields) => obj.extend(fields),
        other => {
            obj.insert("result".to_string(), other);
        }
    }
    Value::Object(obj)
}

/// Render a payload in `format`. `summary` is only evaluated for the
/// summary format. Returns `None` when nothing should be printed.
pub fn render(format: OutputFormat, payload: &Value, summary: impl FnOnce() -> String) -> Option<String> {
    match format {
        OutputFormat::Json => Some(serde_json::to_string_pretty(payload).unwrap_or_default()),
        OutputFormat::Jsonl => Some(serde_json::to_string(payload).unwrap_or_default()),
        OutputFormat::Summary => Some(summary()),
        OutputFormat::Exitcode => None,
    }
}

/// Write a payload to stdout.
pub fn emit(format: OutputFormat, payload: &Value, summary: impl FnOnce() -> String) {
    if let Some(text) = render(format, payload, summary) {
        println!("{}", text);
    }
}

/// A finite float as JSON, or its string form (`"inf"`, `"-inf"`, `"NaN"`).
pub fn json_f64(value: f64) -> Value {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(value.to_string()))
}
