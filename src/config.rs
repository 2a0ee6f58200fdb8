//! Configuration for the normalization stage
//!
//! Every field is optional; missing fields fall back to the names shared with the other
//! pipeline stages.
//!
//! ```toml
//! input_parameter = "loader_storage"
//! output_parameter = "data"
//! before_event = "event_before_normalization"
//! after_event = "event_after_normalization"
//!
//! [context]
//! locale = "fr"
//! groups = ["public"]
//! ```

use crate::event::normalizing::Context;
use crate::normalizer::{EVENT_AFTER, EVENT_BEFORE, EVENT_KEY_STORAGE, NORMALIZED_DATA};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Normalizer configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizerConfig {
    /// Process event parameter holding the value to normalize
    #[serde(default = "default_input_parameter")]
    pub input_parameter: String,
    /// Process event parameter receiving the normalized value
    #[serde(default = "default_output_parameter")]
    pub output_parameter: String,
    /// Event dispatched before normalization
    #[serde(default = "default_before_event")]
    pub before_event: String,
    /// Event dispatched after normalization
    #[serde(default = "default_after_event")]
    pub after_event: String,
    /// Default normalization context
    #[serde(default)]
    pub context: Context,
}

fn default_input_parameter() -> String {
    EVENT_KEY_STORAGE.to_string()
}

fn default_output_parameter() -> String {
    NORMALIZED_DATA.to_string()
}

fn default_before_event() -> String {
    EVENT_BEFORE.to_string()
}

fn default_after_event() -> String {
    EVENT_AFTER.to_string()
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            input_parameter: default_input_parameter(),
            output_parameter: default_output_parameter(),
            before_event: default_before_event(),
            after_event: default_after_event(),
            context: Context::new(),
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl NormalizerConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: NormalizerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject blank parameter and event names
    pub fn validate(&self) -> Result<(), ConfigError> {
        let names = [
            ("input_parameter", &self.input_parameter),
            ("output_parameter", &self.output_parameter),
            ("before_event", &self.before_event),
            ("after_event", &self.after_event),
        ];

        for (field, value) in names {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidConfig(format!(
                    "{field} must not be empty"
                )));
            }
        }

        Ok(())
    }
}
