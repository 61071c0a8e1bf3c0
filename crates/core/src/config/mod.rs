//! Configuration loading and validation.

mod loader;
mod types;
mod validate;

pub use loader::{load_config, load_config_from_str};
pub use types::{
    Config, PipelineConfig, SanitizedConfig, SanitizedNatureServeConfig, SanitizedRegistryConfig,
    SgcnConfig,
};
pub use validate::validate_config;

use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file does not exist.
    #[error("config file not found: {0}")]
    FileNotFound(String),

    /// Config file could not be parsed.
    #[error("failed to parse config: {0}")]
    ParseError(String),

    /// Config parsed but failed validation.
    #[error("invalid configuration: {0}")]
    ValidationError(String),
}
