//! Model snapshots for run provenance.
//!
//! A snapshot captures which model a run used, so inference output can be
//! traced back to the exact file contents later.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

use crate::model::ModelFile;
use crate::resolve::ConfigSource;

/// A frozen description of the model used by a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSnapshot {
    /// When this snapshot was taken.
    pub timestamp: DateTime<Utc>,

    /// Schema version of the model file.
    pub schema_version: String,

    /// SHA-256 hash of the model JSON content.
    pub model_hash: String,

    /// Path the model was loaded from.
    #[serde(default)]
    pub model_path: Option<String>,

    /// How the model path was resolved.
    pub model_source: String,

    /// Key model dimensions for quick reference.
    pub summary: ModelSummary,
}

/// Model dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub hidden_states: usize,
    pub observations: usize,
    pub transition_nonzeros: usize,
    pub emission_nonzeros: usize,
}

impl ModelSummary {
    pub fn from_model(model: &ModelFile) -> Self {
        Self {
            hidden_states: model.hidden_states.len(),
            observations: model.observations.len(),
            transition_nonzeros: model.transition_nonzeros(),
            emission_nonzeros: model.emission_nonzeros(),
        }
    }
}

impl ModelSnapshot {
    /// Build a snapshot from the raw file content and its parsed model.
    pub fn new(
        raw_content: &str,
        model: &ModelFile,
        path: Option<&Path>,
        source: ConfigSource,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            schema_version: model.schema_version.clone(),
            model_hash: content_hash(raw_content),
            model_path: path.map(|p| p.display().to_string()),
            model_source: source.to_string(),
            summary: ModelSummary::from_model(model),
        }
    }

    /// Check if two snapshots refer to byte-identical model files.
    pub fn same_model(&self, other: &ModelSnapshot) -> bool {
        self.model_hash == other.model_hash
    }
}

/// Hex-encoded SHA-256 of a file's content.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
