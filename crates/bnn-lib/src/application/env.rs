//! Environment variable overlay for application configuration
//!
//! The highest-precedence source. Values are validated one by one; anything
//! empty or outside its field's allowed set is ignored with a warning, since
//! there is no file location to attribute an error to.

use super::schema;
use crate::primitives::ConfigError;
use serde::Deserialize;
use toml::{Table, Value};
use tracing::{debug, warn};

pub const ENV_PREFIX: &str = "BNN_";

/// `BNN_*` environment variables that feed the effective configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EnvironmentConfig {
    /// BNN_API_KEY
    pub api_key: Option<String>,
    /// BNN_API_ENDPOINT
    pub api_endpoint: Option<String>,
    /// BNN_MODEL
    pub model: Option<String>,
    /// BNN_THINKING (low/medium/high)
    pub thinking: Option<String>,
    /// BNN_OUTPUT_DIR
    pub output_dir: Option<String>,
    /// BNN_RESOLUTION (1k/2k/4k)
    pub resolution: Option<String>,
    /// BNN_ASPECT_RATIO (auto, 1:1, 16:9, ...)
    pub aspect_ratio: Option<String>,
}

impl EnvironmentConfig {
    /// Load `BNN_*` variables from the current process environment
    pub fn load() -> Result<Self, ConfigError> {
        envy::prefixed(ENV_PREFIX)
            .from_env()
            .map_err(|e| ConfigError::EnvironmentParsingFailed { source: e })
    }

    /// Load from explicit pairs instead of the process environment
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        envy::prefixed(ENV_PREFIX)
            .from_iter(pairs.into_iter().map(|(k, v)| (k.into(), v.into())))
            .map_err(|e| ConfigError::EnvironmentParsingFailed { source: e })
    }

    fn entries(&self) -> [(&'static str, &'static str, Option<&String>); 7] {
        [
            ("BNN_API_KEY", "api.key", self.api_key.as_ref()),
            ("BNN_API_ENDPOINT", "api.endpoint", self.api_endpoint.as_ref()),
            ("BNN_MODEL", "model.default", self.model.as_ref()),
            ("BNN_THINKING", "model.thinking", self.thinking.as_ref()),
            ("BNN_OUTPUT_DIR", "output.directory", self.output_dir.as_ref()),
            ("BNN_RESOLUTION", "output.resolution", self.resolution.as_ref()),
            (
                "BNN_ASPECT_RATIO",
                "output.aspect_ratio",
                self.aspect_ratio.as_ref(),
            ),
        ]
    }

    /// Build the overlay document from every variable that passes validation
    pub fn to_overlay(&self) -> Table {
        let mut overlay = Table::new();

        for (variable, key, raw) in self.entries() {
            let Some(raw) = raw else { continue };
            let Some(field) = schema::field(key) else {
                continue;
            };

            match schema::coerce_literal(field, raw) {
                Ok(value) => {
                    debug!(variable, key, "Applying environment override");
                    let (section, name) = key.split_once('.').unwrap_or((key, ""));
                    let entry = overlay
                        .entry(section.to_string())
                        .or_insert_with(|| Value::Table(Table::new()));
                    if let Value::Table(section) = entry {
                        section.insert(name.to_string(), value);
                    }
                }
                Err(e) => {
                    warn!(variable, error = %e, "Ignoring invalid environment value");
                }
            }
        }

        overlay
    }
}

#[cfg(test)]
mod tests {
    include!("env.test.rs");
}
