//! Model path resolution and discovery.
//!
//! Resolution order: CLI argument → environment variables → XDG path → none.

use std::path::{Path, PathBuf};

/// Discovered model file path.
#[derive(Debug, Clone, Default)]
pub struct ModelPath {
    /// Path to model.json (or None if not found).
    pub path: Option<PathBuf>,

    /// Where the path came from (for diagnostics).
    pub source: ConfigSource,
}

/// Where a configuration file was found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via environment variable.
    Environment,

    /// Found in XDG config directory.
    XdgConfig,

    /// Nothing found.
    #[default]
    NotFound,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::NotFound => write!(f, "not found"),
        }
    }
}

/// Environment variable names.
pub const ENV_MODEL_PATH: &str = "TRELLIS_MODEL";
pub const ENV_CONFIG_DIR: &str = "TRELLIS_CONFIG_DIR";

/// Standard model file name.
const MODEL_FILENAME: &str = "model.json";

/// Application name for XDG directories.
const APP_NAME: &str = "trellis";

/// Resolve the model path using the standard resolution order.
///
/// 1. Explicit CLI path (if provided and present)
/// 2. TRELLIS_MODEL environment variable
/// 3. TRELLIS_CONFIG_DIR environment variable + model.json
/// 4. XDG config directory (~/.config/trellis/model.json)
/// 5. None
///
/// A CLI path that does not exist is still returned so the caller reports
/// the missing file instead of silently falling through to another model.
pub fn resolve_model_path(cli_path: Option<&Path>) -> ModelPath {
    if let Some(path) = cli_path {
        return ModelPath {
            path: Some(path.to_path_buf()),
            source: ConfigSource::CliArgument,
        };
    }

    if let Ok(env_path) = std::env::var(ENV_MODEL_PATH) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return ModelPath {
                path: Some(path),
                source: ConfigSource::Environment,
            };
        }
    }

    if let Ok(config_dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = PathBuf::from(config_dir).join(MODEL_FILENAME);
        if path.exists() {
            return ModelPath {
                path: Some(path),
                source: ConfigSource::Environment,
            };
        }
    }

    if let Some(dir) = xdg_config_dir() {
        let path = dir.join(MODEL_FILENAME);
        if path.exists() {
            return ModelPath {
                path: Some(path),
                source: ConfigSource::XdgConfig,
            };
        }
    }

    ModelPath::default()
}

/// Get the XDG config directory for trellis.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_source_display() {
        assert_eq!(format!("{}", ConfigSource::CliArgument), "CLI argument");
        assert_eq!(
            format!("{}", ConfigSource::Environment),
            "environment variable"
        );
        assert_eq!(format!("{}", ConfigSource::XdgConfig), "XDG config");
        assert_eq!(format!("{}", ConfigSource::NotFound), "not found");
    }

    #[test]
    fn test_cli_path_always_wins() {
        let path = Path::new("/definitely/not/here/model.json");
        let resolved = resolve_model_path(Some(path));
        assert_eq!(resolved.source, ConfigSource::CliArgument);
        assert_eq!(resolved.path.as_deref(), Some(path));
    }

    #[test]
    fn test_xdg_config_dir() {
        if let Some(path) = xdg_config_dir() {
            assert!(path.ends_with(APP_NAME));
        }
    }
}
