//! Configuration for the Payflow payment orchestration system

pub mod config;
pub mod loader;
pub mod validation;

pub use config::*;
pub use loader::{ConfigLoader, ConfigLoaderBuilder};
pub use validation::validate_config;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config source error: {0}")]
    Source(#[from] ::config::ConfigError),

    #[error("failed to load configuration: {0}")]
    LoadError(String),

    #[error("invalid configuration: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
