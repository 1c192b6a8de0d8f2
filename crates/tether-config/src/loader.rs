//! TOML config loading: read from a path or the platform default.

use std::path::{Path, PathBuf};

use tether_common::ConfigError;
use tracing::info;

use crate::schema::TetherConfig;

/// Load config from a specific TOML file path.
///
/// Missing fields take their serde defaults. Validation is left to the caller.
pub fn load_from_path(path: &Path) -> Result<TetherConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::ParseError(format!("failed to read {}: {e}", path.display())))?;

    let config: TetherConfig = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("failed to parse TOML: {e}")))?;

    info!("loaded config from {}", path.display());
    Ok(config)
}

/// Get the platform-specific default config file path.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::ParseError("could not determine config directory".into()))?;
    Ok(config_dir.join("tether").join("config.toml"))
}

/// Load config from the platform default path, or defaults if there is none.
pub fn load_default() -> Result<TetherConfig, ConfigError> {
    let path = default_config_path()?;

    match load_from_path(&path) {
        Ok(config) => Ok(config),
        Err(ConfigError::FileNotFound(_)) => {
            info!("no config found at {}, using defaults", path.display());
            Ok(TetherConfig::default())
        }
        Err(e) => Err(e),
    }
}
