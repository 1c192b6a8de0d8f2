//! Configuration schema types.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TetherConfig {
    pub engine: EngineConfig,
    pub logging: LoggingConfig,
    pub mesh: MeshConfig,
}

/// Grouping engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on a single remote resolve/list/register round-trip
    /// (valid range: 10-120000).
    pub resolve_timeout_ms: u64,
    /// Capacity of the broadcast event buffer (valid range: 1-65536).
    pub event_buffer: u32,
    /// Check registry invariants after every mutation.
    pub verify_invariants: bool,
}

impl EngineConfig {
    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_millis(self.resolve_timeout_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            resolve_timeout_ms: 5000,
            event_buffer: 256,
            verify_invariants: true,
        }
    }
}

/// Log level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
#[derive(Default)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// The `tracing` filter directive for this level.
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
}

/// Runtime instances created up-front by the CLI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    pub runtimes: Vec<String>,
}
