//! Configuration management for the voice relay
//!
//! Supports loading configuration from:
//! - YAML/TOML files under `config/`
//! - Environment variables (`VOICE_RELAY__` prefix, `__` nesting)
//! - Conventional variables (`GEMINI_API_KEY`, `PORT`, ...) and a `.env` file

pub mod constants;
pub mod settings;

pub use settings::{
    load_settings, CloudVoiceConfig, DatastoreConfig, GenerationConfig, ObservabilityConfig,
    RuntimeEnvironment, ServerConfig, Settings, StorageConfig, SttConfig, TtsConfig, TtsStrategy,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Environment error: {0}")]
    Environment(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        match err {
            config::ConfigError::NotFound(key) => ConfigError::MissingField(key),
            other => ConfigError::ParseError(other.to_string()),
        }
    }
}
