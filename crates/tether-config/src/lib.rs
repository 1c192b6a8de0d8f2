//! Tether configuration.
//!
//! TOML-based configuration for the grouping engine, logging, and the
//! in-process runtime mesh. Every section has defaults so partial files
//! (or no file at all) work out of the box.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{default_config_path, load_default, load_from_path};
pub use schema::{EngineConfig, LogLevel, LoggingConfig, MeshConfig, TetherConfig};

use tether_common::ConfigError;

/// Load config from `path` when given, otherwise from the platform default,
/// and validate the result.
pub fn load_config(path: Option<&std::path::Path>) -> Result<TetherConfig, ConfigError> {
    let config = match path {
        Some(p) => load_from_path(p)?,
        None => load_default()?,
    };
    validation::validate(&config)?;
    Ok(config)
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &TetherConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_to_json_contains_all_sections() {
        let json = config_to_json(&TetherConfig::default());
        assert!(json.contains("\"engine\""));
        assert!(json.contains("\"logging\""));
        assert!(json.contains("\"mesh\""));
    }

    #[test]
    fn load_config_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[engine]\nevent_buffer = 0\n").unwrap();

        let err = load_config(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn load_config_accepts_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[engine]\nresolve_timeout_ms = 250\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.engine.resolve_timeout_ms, 250);
    }
}
