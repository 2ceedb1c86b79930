//! gc-config: typed, layered configuration for gridcheck.
//!
//! The configuration is resolved once (defaults, then the test sheet, then
//! the user file), validated, and lent to every component.

pub mod layers;
pub mod schema;
pub mod validate;

use std::path::Path;

pub use layers::{merge_values, resolve_layers, resolve_yaml_layers};
pub use schema::*;
pub use validate::{ValidationError, validate_config};

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Read one configuration layer; JSON when the extension says so, YAML otherwise.
pub fn read_layer(path: &Path) -> ConfigResult<serde_yaml::Value> {
    let content = std::fs::read_to_string(path)?;
    if path.extension().is_some_and(|e| e.eq_ignore_ascii_case("json")) {
        let json: serde_json::Value = serde_json::from_str(&content)?;
        Ok(serde_yaml::to_value(json)?)
    } else {
        Ok(serde_yaml::from_str(&content)?)
    }
}

/// Resolve the configuration from optional test-sheet and user files.
pub fn load_layered(test_sheet: Option<&Path>, user: Option<&Path>) -> ConfigResult<Config> {
    let layers = [test_sheet, user]
        .into_iter()
        .flatten()
        .map(read_layer)
        .collect::<ConfigResult<Vec<_>>>()?;
    resolve_layers(layers)
}

pub fn load_yaml(path: &Path) -> ConfigResult<Config> {
    load_layered(None, Some(path))
}

pub fn save_yaml(path: &Path, config: &Config) -> ConfigResult<()> {
    validate_config(config)?;
    let content = serde_yaml::to_string(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_json(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&content)?;
    validate_config(&config)?;
    Ok(config)
}

pub fn save_json(path: &Path, config: &Config) -> ConfigResult<()> {
    validate_config(config)?;
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
