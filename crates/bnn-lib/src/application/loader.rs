//! Configuration loading
//!
//! Coordinates the layered sources, lowest precedence first:
//! defaults -> global document -> project document -> override document -> env vars.
//! The result is an explicit value handed to each command; there is no global.

use crate::primitives::{ConfigError, ConfigLayer, ConfigSource};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use toml::{Table, Value};
use tracing::{debug, warn};

use super::{config::EffectiveConfig, config::defaults, env::EnvironmentConfig, schema};

/// Project document, relative to the project root
pub const PROJECT_CONFIG: &str = ".config/bnn.toml";

/// Files or directories that mark a project root
pub const PROJECT_MARKERS: &[&str] = &[
    ".git",
    ".bnn",
    "Cargo.toml",
    "package.json",
    "pyproject.toml",
];

/// Global document name under the user config root
pub const GLOBAL_CONFIG_FILE: &str = "config.toml";

/// Where each persisted layer lives for this invocation
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigPaths {
    /// `None` when the platform has no user config directory
    pub global: Option<PathBuf>,
    /// Starting point of the upward project search
    pub working_dir: PathBuf,
}

impl ConfigPaths {
    /// Platform config root and the current directory
    pub fn discover() -> Result<Self, ConfigError> {
        let global = directories::BaseDirs::new().map(|dirs| {
            dirs.config_dir()
                .join(defaults::APP_NAME)
                .join(GLOBAL_CONFIG_FILE)
        });
        let working_dir =
            std::env::current_dir().map_err(|e| ConfigError::CurrentDirError { source: e })?;

        Ok(Self {
            global,
            working_dir,
        })
    }

    pub fn new(global: impl Into<PathBuf>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            global: Some(global.into()),
            working_dir: working_dir.into(),
        }
    }

    /// Existing or would-be project document of the nearest project root
    pub fn project(&self) -> Option<PathBuf> {
        find_project_root(&self.working_dir).map(|root| root.join(PROJECT_CONFIG))
    }

    /// Path a mutation of `layer` targets
    ///
    /// Outside any project the project layer lands in the working directory.
    pub fn layer_path(&self, layer: ConfigLayer) -> Result<PathBuf, ConfigError> {
        match layer {
            ConfigLayer::Global => self.global.clone().ok_or(ConfigError::NoConfigDir),
            ConfigLayer::Project => Ok(self
                .project()
                .unwrap_or_else(|| self.working_dir.join(PROJECT_CONFIG))),
        }
    }
}

/// Walk upward from `start` to the nearest directory holding the project
/// document or one of [`PROJECT_MARKERS`]
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| {
            dir.join(PROJECT_CONFIG).is_file()
                || PROJECT_MARKERS.iter().any(|marker| dir.join(marker).exists())
        })
        .map(Path::to_path_buf)
}

/// Deep-merge `incoming` onto `base`
///
/// Tables merge recursively; anything else (scalars, arrays, or a table
/// meeting a non-table) is replaced wholesale by the incoming value.
pub fn deep_merge(base: &mut Table, incoming: Table) {
    for (key, value) in incoming {
        let Value::Table(next) = value else {
            base.insert(key, value);
            continue;
        };
        if let Some(Value::Table(existing)) = base.get_mut(&key) {
            deep_merge(existing, next);
            continue;
        }
        base.insert(key, Value::Table(next));
    }
}

/// Read and parse one document. `Ok(None)` when the file is absent or unreadable.
pub fn load_document(layer: ConfigSource, path: &Path) -> Result<Option<Table>, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(%layer, path = %path.display(), "Configuration source absent");
            return Ok(None);
        }
        Err(e) => {
            warn!(%layer, path = %path.display(), error = %e, "Skipping unreadable configuration source");
            return Ok(None);
        }
    };

    parse_document(layer, path, &content).map(Some)
}

/// Parse document text, attributing failures to `layer` and `path`
pub fn parse_document(layer: ConfigSource, path: &Path, content: &str) -> Result<Table, ConfigError> {
    toml::from_str::<Table>(content).map_err(|e| ConfigError::SourceParse {
        layer,
        path: path.to_path_buf(),
        message: e.to_string().trim().to_string(),
    })
}

/// Merges every configuration source into one [`EffectiveConfig`]
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    paths: ConfigPaths,
    environment: EnvironmentConfig,
    defaults: Option<Table>,
}

impl ConfigResolver {
    pub fn new(paths: ConfigPaths, environment: EnvironmentConfig) -> Self {
        Self {
            paths,
            environment,
            defaults: None,
        }
    }

    /// Resolver over the real config root, working directory and `BNN_*` vars
    pub fn from_process() -> Result<Self, ConfigError> {
        Ok(Self::new(ConfigPaths::discover()?, EnvironmentConfig::load()?))
    }

    /// Replace the built-in defaults source
    pub fn with_defaults(mut self, defaults: Table) -> Self {
        self.defaults = Some(defaults);
        self
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    /// Merge all sources; no partial result is returned on failure
    pub fn resolve(&self, override_path: Option<&Path>) -> Result<EffectiveConfig, ConfigError> {
        let mut merged = match &self.defaults {
            Some(defaults) => defaults.clone(),
            None => EffectiveConfig::defaults_table()?,
        };

        let mut documents: Vec<(ConfigSource, PathBuf)> = Vec::new();
        if let Some(global) = &self.paths.global {
            documents.push((ConfigSource::Global, global.clone()));
        }
        if let Some(project) = self.paths.project() {
            documents.push((ConfigSource::Project, project));
        }

        for (layer, path) in documents {
            if let Some(table) = load_document(layer, &path)? {
                schema::validate_table(&table).map_err(|e| e.in_layer(layer))?;
                debug!(%layer, path = %path.display(), "Merging configuration source");
                deep_merge(&mut merged, table);
            }
        }

        if let Some(path) = override_path {
            let content = fs::read_to_string(path).map_err(|e| ConfigError::SourceRead {
                layer: ConfigSource::Override,
                path: path.to_path_buf(),
                source: e,
            })?;
            let table = parse_document(ConfigSource::Override, path, &content)?;
            schema::validate_table(&table).map_err(|e| e.in_layer(ConfigSource::Override))?;
            debug!(path = %path.display(), "Merging override document");
            deep_merge(&mut merged, table);
        }

        deep_merge(&mut merged, self.environment.to_overlay());

        schema::validate_table(&merged)?;
        Value::Table(merged)
            .try_into::<EffectiveConfig>()
            .map_err(|e| ConfigError::schema("configuration", format!("is malformed: {e}")))
    }
}

impl EffectiveConfig {
    /// Load config: defaults -> global -> project -> override -> env vars
    pub fn load(override_path: Option<&Path>) -> Result<Self, ConfigError> {
        ConfigResolver::from_process()?.resolve(override_path)
    }
}

#[cfg(test)]
mod tests {
    include!("loader.test.rs");
}
