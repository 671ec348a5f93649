//! Configuration validation errors and semantic validation.

use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

use crate::model::{ModelFile, ObservationFile, ProbabilityRow};

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Rows and the prior must sum to one within this tolerance.
pub const SUM_TOLERANCE: f64 = 1e-6;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Schema validation failed: {0}")]
    SchemaError(String),

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::SchemaError(_) => 62,
            ValidationError::SemanticError(_) => 63,
            ValidationError::MissingField(_) => 64,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }
}

/// Validate a model configuration semantically.
pub fn validate_model(model: &ModelFile) -> ValidationResult<()> {
    if model.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: model.schema_version.clone(),
        });
    }

    let states = unique_keys("hidden_states", &model.hidden_states)?;
    let observations = unique_keys("observations", &model.observations)?;

    validate_row("prior", &model.prior, &states)?;

    validate_table(
        "transitions",
        &model.transitions,
        &states,
        &states,
        model.allow_partial_rows,
    )?;
    validate_table(
        "emissions",
        &model.emissions,
        &states,
        &observations,
        model.allow_partial_rows,
    )?;

    Ok(())
}

/// Validate an observation sequence against a model's alphabet.
///
/// The sequence must be non-empty; every present observation must be declared
/// in the model. Ground-truth states, when given, must match in length and be
/// declared hidden states.
pub fn validate_observations(model: &ModelFile, file: &ObservationFile) -> ValidationResult<()> {
    if file.observations.is_empty() {
        return Err(ValidationError::SemanticError(
            "Observation sequence must contain at least one time step".to_string(),
        ));
    }

    let alphabet: HashSet<&str> = model.observations.iter().map(String::as_str).collect();
    for (t, obs) in file.observations.iter().enumerate() {
        if let Some(obs) = obs {
            if !alphabet.contains(obs.as_str()) {
                return Err(ValidationError::InvalidValue {
                    field: format!("observations[{}]", t),
                    message: format!("Unknown observation '{}'", obs),
                });
            }
        }
    }

    if let Some(states) = &file.states {
        if states.len() != file.observations.len() {
            return Err(ValidationError::SemanticError(format!(
                "Ground-truth states have length {}, observations have length {}",
                states.len(),
                file.observations.len()
            )));
        }
        let declared: HashSet<&str> = model.hidden_states.iter().map(String::as_str).collect();
        for (t, state) in states.iter().enumerate() {
            if !declared.contains(state.as_str()) {
                return Err(ValidationError::InvalidValue {
                    field: format!("states[{}]", t),
                    message: format!("Unknown hidden state '{}'", state),
                });
            }
        }
    }

    Ok(())
}

/// Reject empty or duplicated key lists.
fn unique_keys<'a>(field: &str, keys: &'a [String]) -> ValidationResult<HashSet<&'a str>> {
    if keys.is_empty() {
        return Err(ValidationError::MissingField(format!(
            "{} must list at least one entry",
            field
        )));
    }

    let mut seen = HashSet::with_capacity(keys.len());
    for key in keys {
        if !seen.insert(key.as_str()) {
            return Err(ValidationError::InvalidValue {
                field: field.to_string(),
                message: format!("Duplicate entry '{}'", key),
            });
        }
    }
    Ok(seen)
}

fn validate_table(
    field: &str,
    table: &BTreeMap<String, ProbabilityRow>,
    rows: &HashSet<&str>,
    columns: &HashSet<&str>,
    allow_partial_rows: bool,
) -> ValidationResult<()> {
    for key in table.keys() {
        if !rows.contains(key.as_str()) {
            return Err(ValidationError::InvalidValue {
                field: format!("{}.{}", field, key),
                message: "Row for an undeclared hidden state".to_string(),
            });
        }
    }

    if !allow_partial_rows {
        let mut missing: Vec<&str> = rows
            .iter()
            .copied()
            .filter(|state| !table.contains_key(*state))
            .collect();
        if !missing.is_empty() {
            missing.sort_unstable();
            return Err(ValidationError::SchemaError(format!(
                "{} has no row for: {} (set allow_partial_rows to permit this)",
                field,
                missing.join(", ")
            )));
        }
    }

    for (key, row) in table {
        validate_row(&format!("{}.{}", field, key), row, columns)?;
    }
    Ok(())
}

/// A probability row: declared keys, finite non-negative weights, sums to one.
fn validate_row(field: &str, row: &ProbabilityRow, columns: &HashSet<&str>) -> ValidationResult<()> {
    let mut sum = 0.0;
    for (key, &weight) in row {
        if !columns.contains(key.as_str()) {
            return Err(ValidationError::InvalidValue {
                field: format!("{}.{}", field, key),
                message: "Undeclared key".to_string(),
            });
        }
        if !weight.is_finite() || weight < 0.0 {
            return Err(ValidationError::InvalidValue {
                field: format!("{}.{}", field, key),
                message: format!("Must be a finite non-negative probability, got {}", weight),
            });
        }
        sum += weight;
    }

    if (sum - 1.0).abs() > SUM_TOLERANCE {
        return Err(ValidationError::SemanticError(format!(
            "{} must sum to 1.0, got {}",
            field, sum
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_STATE: &str = r#"{
        "schema_version": "1.0.0",
        "hidden_states": ["A", "B"],
        "observations": ["a", "b"],
        "prior": {"A": 0.5, "B": 0.5},
        "transitions": {"A": {"A": 0.9, "B": 0.1}, "B": {"A": 0.1, "B": 0.9}},
        "emissions": {"A": {"a": 1.0}, "B": {"b": 1.0}}
    }"#;

    fn model() -> ModelFile {
        ModelFile::from_json(TWO_STATE).unwrap()
    }

    #[test]
    fn valid_model_passes() {
        validate_model(&model()).unwrap();
    }

    #[test]
    fn version_mismatch_rejected() {
        let mut m = model();
        m.schema_version = "0.9.0".to_string();
        let err = validate_model(&m).unwrap_err();
        assert!(matches!(err, ValidationError::VersionMismatch { .. }));
        assert_eq!(err.code(), 66);
    }

    #[test]
    fn duplicate_state_rejected() {
        let mut m = model();
        m.hidden_states.push("A".to_string());
        let err = validate_model(&m).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { .. }));
    }

    #[test]
    fn empty_alphabet_rejected() {
        let mut m = model();
        m.observations.clear();
        let err = validate_model(&m).unwrap_err();
        assert!(matches!(err, ValidationError::MissingField(_)));
    }

    #[test]
    fn bad_prior_sum_rejected() {
        let mut m = model();
        m.prior.insert("B".to_string(), 0.6);
        let err = validate_model(&m).unwrap_err();
        assert!(matches!(err, ValidationError::SemanticError(_)));
    }

    #[test]
    fn negative_weight_rejected() {
        let mut m = model();
        let row = m.transitions.get_mut("A").unwrap();
        row.insert("A".to_string(), 1.1);
        row.insert("B".to_string(), -0.1);
        let err = validate_model(&m).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { .. }));
    }

    #[test]
    fn undeclared_emission_key_rejected() {
        let mut m = model();
        m.emissions
            .get_mut("A")
            .unwrap()
            .insert("z".to_string(), 0.0);
        let err = validate_model(&m).unwrap_err();
        assert!(err.to_string().contains("emissions.A.z"));
    }

    #[test]
    fn missing_row_requires_opt_in() {
        let mut m = model();
        m.emissions.remove("B");
        assert!(matches!(
            validate_model(&m).unwrap_err(),
            ValidationError::SchemaError(_)
        ));

        m.allow_partial_rows = true;
        validate_model(&m).unwrap();
    }

    #[test]
    fn observations_checked_against_alphabet() {
        let m = model();
        let ok = ObservationFile {
            observations: vec![Some("a".to_string()), None],
            states: None,
        };
        validate_observations(&m, &ok).unwrap();

        let unknown = ObservationFile {
            observations: vec![Some("q".to_string())],
            states: None,
        };
        assert!(matches!(
            validate_observations(&m, &unknown).unwrap_err(),
            ValidationError::InvalidValue { .. }
        ));

        let empty = ObservationFile {
            observations: vec![],
            states: None,
        };
        assert!(validate_observations(&m, &empty).is_err());
    }

    #[test]
    fn ground_truth_length_must_match() {
        let m = model();
        let file = ObservationFile {
            observations: vec![Some("a".to_string()), Some("b".to_string())],
            states: Some(vec!["A".to_string()]),
        };
        assert!(matches!(
            validate_observations(&m, &file).unwrap_err(),
            ValidationError::SemanticError(_)
        ));
    }
}
