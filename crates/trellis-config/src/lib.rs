//! trellis configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for model.json and observation files
//! - Model path resolution (CLI → env → XDG → none)
//! - Schema and semantic validation
//! - Model snapshots for run provenance

pub mod model;
pub mod resolve;
pub mod snapshot;
pub mod validate;

pub use model::{ModelFile, ObservationFile};
pub use resolve::{resolve_model_path, ConfigSource, ModelPath};
pub use snapshot::ModelSnapshot;
pub use validate::{validate_model, validate_observations, ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
