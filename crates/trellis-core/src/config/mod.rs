//! Model and observation loading for the CLI.
//!
//! This module handles:
//! - Model path resolution (CLI > env > XDG)
//! - Reading and parsing model.json and observation files
//! - Semantic validation via trellis-config
//! - Model snapshot generation for run provenance

pub use trellis_config::model::{ModelFile, ObservationFile};
pub use trellis_config::resolve::{resolve_model_path, ConfigSource, ModelPath};
pub use trellis_config::snapshot::ModelSnapshot;
pub use trellis_config::validate::ValidationError;
use trellis_config::validate::{validate_model, validate_observations};

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("File not found: {path}")]
    NotFound { path: PathBuf },

    #[error("No model file given and none found via TRELLIS_MODEL, TRELLIS_CONFIG_DIR or the XDG config dir")]
    NoModel,

    #[error("Invalid JSON in {path}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Validation failed for {path}: {source}")]
    ValidationError {
        path: PathBuf,
        #[source]
        source: ValidationError,
    },

    #[error("I/O error reading {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ConfigError::NotFound { .. } => 40,
            ConfigError::NoModel => 41,
            ConfigError::ParseError { .. } => 42,
            ConfigError::ValidationError { .. } => 43,
            ConfigError::IoError { .. } => 44,
        }
    }

    /// True for failures reading the filesystem, as opposed to bad content.
    pub fn is_io(&self) -> bool {
        matches!(self, ConfigError::IoError { .. })
    }
}

/// A validated model with provenance information.
#[derive(Debug, Clone)]
pub struct ResolvedModel {
    /// The parsed model file.
    pub file: ModelFile,
    /// Where the model was read from.
    pub path: PathBuf,
    /// Hash and dimensions of the model, for output provenance.
    pub snapshot: ModelSnapshot,
}

/// Resolve, read, and validate the model.
///
/// Resolution order (highest to lowest priority):
/// 1. Explicit CLI path
/// 2. Environment variables (TRELLIS_MODEL, TRELLIS_CONFIG_DIR)
/// 3. XDG config home (~/.config/trellis/model.json)
pub fn load_model(cli_path: Option<&Path>) -> Result<ResolvedModel, ConfigError> {
    let resolved = resolve_model_path(cli_path);
    let path = resolved.path.ok_or(ConfigError::NoModel)?;
    load_model_from_file(&path, resolved.source)
}

/// Read and validate a model from a specific file.
pub fn load_model_from_file(path: &Path, source: ConfigSource) -> Result<ResolvedModel, ConfigError> {
    let content = read(path)?;
    let file: ModelFile = serde_json::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    validate_model(&file).map_err(|e| ConfigError::ValidationError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let snapshot = ModelSnapshot::new(&content, &file, Some(path), source);
    Ok(ResolvedModel {
        file,
        path: path.to_path_buf(),
        snapshot,
    })
}

/// Read an observation file and check it against `model`.
pub fn load_observations(path: &Path, model: &ModelFile) -> Result<ObservationFile, ConfigError> {
    let content = read(path)?;
    let file: ObservationFile =
        serde_json::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

    validate_observations(model, &file).map_err(|e| ConfigError::ValidationError {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(file)
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::IoError {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MODEL: &str = r#"{
        "schema_version": "1.0.0",
        "hidden_states": ["A", "B"],
        "observations": ["a", "b"],
        "prior": {"A": 0.5, "B": 0.5},
        "transitions": {"A": {"A": 0.9, "B": 0.1}, "B": {"A": 0.1, "B": 0.9}},
        "emissions": {"A": {"a": 0.9, "b": 0.1}, "B": {"a": 0.1, "b": 0.9}}
    }"#;

    #[test]
    fn test_load_model_records_hash() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, MODEL).unwrap();

        let loaded = load_model(Some(&path)).unwrap();
        assert_eq!(loaded.path, path);
        assert_eq!(loaded.snapshot.model_hash.len(), 64);
        assert_eq!(loaded.snapshot.model_source, "CLI argument");
        assert_eq!(loaded.file.hidden_states, vec!["A", "B"]);
    }

    #[test]
    fn test_missing_model_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = load_model(Some(&dir.path().join("nope.json"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
        assert_eq!(err.code(), 40);
        assert!(!err.is_io());
    }

    #[test]
    fn test_bad_json_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = load_model(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_observations_checked_against_model() {
        let dir = TempDir::new().unwrap();
        let model_path = dir.path().join("model.json");
        let obs_path = dir.path().join("obs.json");
        std::fs::write(&model_path, MODEL).unwrap();
        std::fs::write(&obs_path, r#"{"observations": ["a", "z"]}"#).unwrap();

        let model = load_model(Some(&model_path)).unwrap();
        let err = load_observations(&obs_path, &model.file).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }
}
