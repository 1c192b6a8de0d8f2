//! Configuration validation.
//!
//! Every check pushes onto a shared error list so a single
//! `ConfigError::ValidationError` reports all problems at once.

use std::collections::HashSet;

use tether_common::ConfigError;

use crate::schema::TetherConfig;

/// Push an error if `value` is outside `[min, max]`.
fn validate_range(errors: &mut Vec<String>, name: &str, value: u64, min: u64, max: u64) {
    if value < min || value > max {
        errors.push(format!("{name} = {value} is out of range [{min}, {max}]"));
    }
}

fn validate_engine(errors: &mut Vec<String>, config: &TetherConfig) {
    validate_range(
        errors,
        "engine.resolve_timeout_ms",
        config.engine.resolve_timeout_ms,
        10,
        120_000,
    );
    validate_range(
        errors,
        "engine.event_buffer",
        u64::from(config.engine.event_buffer),
        1,
        65_536,
    );
}

fn validate_mesh(errors: &mut Vec<String>, config: &TetherConfig) {
    let mut seen = HashSet::new();
    for name in &config.mesh.runtimes {
        if name.trim().is_empty() {
            errors.push("mesh.runtimes contains an empty name".into());
        } else if !seen.insert(name.as_str()) {
            errors.push(format!("mesh.runtimes lists '{name}' more than once"));
        }
    }
}

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &TetherConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_engine(&mut errors, config);
    validate_mesh(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
