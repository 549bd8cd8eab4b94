//! Effective configuration schema
//!
//! The merged, validated configuration every command consumes. Each field
//! has an explicit built-in default; see [`defaults`].

use crate::primitives::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default configuration values
pub mod defaults {
    pub const API_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
    pub const MODEL: &str = "gemini-3-pro-image-preview";
    pub const OUTPUT_DIRECTORY: &str = ".";
    pub const MAX_HISTORY: i64 = 50;
    pub const APP_NAME: &str = "bnn";
}

/// Default value functions for configuration fields
mod default_fns {
    use super::*;

    pub fn endpoint() -> String {
        defaults::API_ENDPOINT.to_string()
    }

    pub fn model() -> String {
        defaults::MODEL.to_string()
    }

    pub fn thinking() -> ThinkingLevel {
        ThinkingLevel::Low
    }

    pub fn output_directory() -> PathBuf {
        PathBuf::from(defaults::OUTPUT_DIRECTORY)
    }

    pub fn resolution() -> Resolution {
        Resolution::OneK
    }

    pub fn aspect_ratio() -> AspectRatio {
        AspectRatio::Auto
    }

    pub fn naming() -> NamingScheme {
        NamingScheme::Timestamp
    }

    pub fn session_directory() -> PathBuf {
        directories::ProjectDirs::from("", "", defaults::APP_NAME)
            .map(|dirs| dirs.data_dir().join("sessions"))
            .unwrap_or_else(|| PathBuf::from(".bnn").join("sessions"))
    }

    pub fn max_history() -> usize {
        defaults::MAX_HISTORY as usize
    }

    pub fn log_level() -> LogLevel {
        LogLevel::Warning
    }
}

/// `[api]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// Provider API key; never printed unmasked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    #[serde(default = "default_fns::endpoint")]
    pub endpoint: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            key: None,
            endpoint: default_fns::endpoint(),
        }
    }
}

/// `[model]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    #[serde(default = "default_fns::model")]
    pub default: String,

    #[serde(default = "default_fns::thinking")]
    pub thinking: ThinkingLevel,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            default: default_fns::model(),
            thinking: default_fns::thinking(),
        }
    }
}

/// `[output]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default = "default_fns::output_directory")]
    pub directory: PathBuf,

    #[serde(default = "default_fns::resolution")]
    pub resolution: Resolution,

    #[serde(default = "default_fns::aspect_ratio")]
    pub aspect_ratio: AspectRatio,

    #[serde(default = "default_fns::naming")]
    pub naming: NamingScheme,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_fns::output_directory(),
            resolution: default_fns::resolution(),
            aspect_ratio: default_fns::aspect_ratio(),
            naming: default_fns::naming(),
        }
    }
}

/// `[session]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    #[serde(default = "default_fns::session_directory")]
    pub directory: PathBuf,

    /// Number of sessions retained before the oldest are pruned
    #[serde(default = "default_fns::max_history")]
    pub max_history: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            directory: default_fns::session_directory(),
            max_history: default_fns::max_history(),
        }
    }
}

/// `[logging]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    #[serde(default = "default_fns::log_level")]
    pub level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_fns::log_level(),
        }
    }
}

/// Merged, schema-validated configuration consumed by every command
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EffectiveConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EffectiveConfig {
    /// Built-in defaults as a TOML table, the lowest-precedence merge source
    pub fn defaults_table() -> Result<toml::Table, ConfigError> {
        toml::Table::try_from(Self::default()).map_err(|e| ConfigError::SerializeFailed {
            reason: e.to_string(),
        })
    }

    /// Logger configuration, raised by `verbosity` steps from `logging.level`
    pub fn to_logger_config(&self, verbosity: u8, color: bool) -> LoggerConfig {
        LoggerConfig {
            level: self.logging.level.raised_by(verbosity),
            color,
        }
    }

    /// Serialize with secret values masked, for `config list`/`config get`
    pub fn to_redacted_table(&self) -> Result<toml::Table, ConfigError> {
        let mut table =
            toml::Table::try_from(self).map_err(|e| ConfigError::SerializeFailed {
                reason: e.to_string(),
            })?;
        crate::bnn::secrets::redact_table(&mut table);
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    include!("config.test.rs");
}
