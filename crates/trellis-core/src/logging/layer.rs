//! Custom tracing layer for JSONL output.
//!
//! This layer produces machine-parseable JSONL logs on stderr while
//! keeping stdout clean for command payloads.

use std::io::{self, Write};
use std::sync::Mutex;

use chrono::Utc;
use tracing::span::{Attributes, Id};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use super::events::Level;

/// Correlation fields lifted to the top level of each line.
#[derive(Debug, Clone, Default)]
struct Correlation {
    run_id: Option<String>,
    stage: Option<String>,
    model_hash: Option<String>,
}

impl Correlation {
    /// Take a correlation field; false for ordinary fields.
    fn capture(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            "run_id" => &mut self.run_id,
            "stage" => &mut self.stage,
            "model_hash" => &mut self.model_hash,
            _ => return false,
        };
        *slot = Some(value);
        true
    }

    /// Fill unset fields from an enclosing span.
    fn inherit(&mut self, outer: &Correlation) {
        if self.run_id.is_none() {
            self.run_id.clone_from(&outer.run_id);
        }
        if self.stage.is_none() {
            self.stage.clone_from(&outer.stage);
        }
        if self.model_hash.is_none() {
            self.model_hash.clone_from(&outer.model_hash);
        }
    }
}

/// A visitor that extracts field values from tracing events and spans.
#[derive(Default)]
struct JsonFieldVisitor {
    correlation: Correlation,
    fields: serde_json::Map<String, serde_json::Value>,
    message: Option<String>,
}

impl JsonFieldVisitor {
    fn insert(&mut self, name: &str, value: serde_json::Value) {
        self.fields.insert(name.to_string(), value);
    }
}

impl tracing::field::Visit for JsonFieldVisitor {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else if !self.correlation.capture(field.name(), value.to_string()) {
            self.insert(field.name(), serde_json::Value::String(value.to_string()));
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        let s = format!("{:?}", value);
        if field.name() == "message" {
            self.message = Some(s);
        } else if !self.correlation.capture(field.name(), s.clone()) {
            self.insert(field.name(), serde_json::Value::String(s));
        }
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.insert(field.name(), serde_json::Value::Number(value.into()));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.insert(field.name(), serde_json::Value::Number(value.into()));
    }

    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        // JSON has no infinities; log-domain costs often are.
        let json = match serde_json::Number::from_f64(value) {
            Some(n) => serde_json::Value::Number(n),
            None => serde_json::Value::String(value.to_string()),
        };
        self.insert(field.name(), json);
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.insert(field.name(), serde_json::Value::Bool(value));
    }
}

/// JSONL tracing layer that outputs to stderr.
pub struct JsonlLayer<W = io::Stderr> {
    writer: Mutex<W>,
}

impl JsonlLayer<io::Stderr> {
    /// Create a new JSONL layer writing to stderr.
    pub fn stderr() -> Self {
        JsonlLayer {
            writer: Mutex::new(io::stderr()),
        }
    }
}

impl<W: Write> JsonlLayer<W> {
    /// Create a new JSONL layer with a custom writer.
    pub fn new(writer: W) -> Self {
        JsonlLayer {
            writer: Mutex::new(writer),
        }
    }
}

impl<S, W> Layer<S> for JsonlLayer<W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: Write + 'static,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut visitor = JsonFieldVisitor::default();
        attrs.record(&mut visitor);

        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(visitor.correlation);
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let ts = Utc::now();

        let mut visitor = JsonFieldVisitor::default();
        event.record(&mut visitor);

        // Innermost span wins for fields the event did not set itself
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope {
                if let Some(outer) = span.extensions().get::<Correlation>() {
                    visitor.correlation.inherit(outer);
                }
            }
        }

        let level: Level = (*event.metadata().level()).into();
        let mut obj = serde_json::Map::new();
        obj.insert("ts".to_string(), serde_json::json!(ts.to_rfc3339()));
        obj.insert("level".to_string(), serde_json::json!(level));
        obj.insert(
            "event".to_string(),
            serde_json::json!(event.metadata().target()),
        );

        let Correlation {
            run_id,
            stage,
            model_hash,
        } = visitor.correlation;
        if let Some(id) = run_id {
            obj.insert("run_id".to_string(), serde_json::json!(id));
        }
        if let Some(s) = stage {
            obj.insert("stage".to_string(), serde_json::json!(s));
        }
        if let Some(h) = model_hash {
            obj.insert("model_hash".to_string(), serde_json::json!(h));
        }
        if let Some(msg) = visitor.message {
            obj.insert("message".to_string(), serde_json::json!(msg));
        }
        if !visitor.fields.is_empty() {
            obj.insert(
                "fields".to_string(),
                serde_json::Value::Object(visitor.fields),
            );
        }

        let json = serde_json::to_string(&serde_json::Value::Object(obj)).unwrap_or_default();
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", json);
        }
    }
}
