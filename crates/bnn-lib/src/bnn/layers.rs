//! Layer documents on disk
//!
//! [`ConfigMutator`] reads and rewrites exactly one persisted layer (global or
//! project). Every write is read-modify-write of the whole document, replaced
//! atomically; concurrent writers to the same layer race last-write-wins.

use crate::application::config::EffectiveConfig;
use crate::application::loader::{ConfigPaths, load_document, parse_document};
use crate::application::schema;
use crate::bnn::secrets::{STDIN_SENTINEL, SecretInput, is_secret_key, read_piped_value};
use crate::bnn::template::TemplateEngine;
use crate::primitives::{ConfigError, ConfigLayer, ConfigSource};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use toml::{Table, Value};
use tracing::{debug, info};

/// Right-hand side of a `key=value` update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetValue {
    /// Value typed on the command line
    Literal(String),
    /// Value to be read from piped stdin
    Stdin,
}

impl SetValue {
    pub fn parse(raw: &str) -> Self {
        if raw == STDIN_SENTINEL {
            SetValue::Stdin
        } else {
            SetValue::Literal(raw.to_string())
        }
    }
}

/// Split a `key=value` argument
pub fn parse_assignment(raw: &str) -> Result<(String, SetValue), ConfigError> {
    let Some((key, value)) = raw.split_once('=') else {
        return Err(ConfigError::ParseError {
            value: raw.to_string(),
            reason: "expected KEY=VALUE".to_string(),
        });
    };
    let key = key.trim();
    if key.is_empty() {
        return Err(ConfigError::ParseError {
            value: raw.to_string(),
            reason: "key must not be empty".to_string(),
        });
    }
    Ok((key.to_string(), SetValue::parse(value)))
}

pub struct ConfigMutator {
    paths: ConfigPaths,
}

impl ConfigMutator {
    pub fn new(paths: ConfigPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    /// File backing `layer`
    pub fn path(&self, layer: ConfigLayer) -> Result<PathBuf, ConfigError> {
        self.paths.layer_path(layer)
    }

    /// Current document of `layer`; empty when the file does not exist
    pub fn read(&self, layer: ConfigLayer) -> Result<Table, ConfigError> {
        let path = self.path(layer)?;
        Ok(load_document(ConfigSource::from(layer), &path)?.unwrap_or_default())
    }

    /// Apply every update, then write the document once
    ///
    /// All keys and values are validated before anything is written. Secret
    /// keys only accept [`SetValue::Stdin`]; the stream is read at most once.
    pub fn set_many(
        &self,
        layer: ConfigLayer,
        updates: &[(String, SetValue)],
        input: &mut dyn SecretInput,
    ) -> Result<PathBuf, ConfigError> {
        let stdin_keys: Vec<&str> = updates
            .iter()
            .filter(|(_, value)| *value == SetValue::Stdin)
            .map(|(key, _)| key.as_str())
            .collect();
        if let [_, second, ..] = stdin_keys.as_slice() {
            return Err(ConfigError::SecretStdinUnavailable {
                key: second.to_string(),
                reason: "only one value per invocation can be read from stdin".to_string(),
            });
        }

        for (key, value) in updates {
            schema::require_field(key)?;
            if is_secret_key(key) && matches!(value, SetValue::Literal(_)) {
                return Err(ConfigError::SecretViaArgvRejected { key: key.clone() });
            }
        }

        let mut coerced = Vec::with_capacity(updates.len());
        for (key, value) in updates {
            let field = schema::require_field(key)?;
            let raw = match value {
                SetValue::Literal(raw) => raw.clone(),
                SetValue::Stdin => read_piped_value(key, input)?,
            };
            coerced.push((key.as_str(), schema::coerce_literal(field, &raw)?));
        }

        let path = self.path(layer)?;
        let mut document = self.read(layer)?;
        for (key, value) in coerced {
            set_path(&mut document, key, value);
            debug!(%layer, key, "Updated configuration key");
        }

        write_document(&path, &document)?;
        info!(%layer, path = %path.display(), count = updates.len(), "Configuration updated");
        Ok(path)
    }

    /// Remove existing leaves; returns how many were removed
    ///
    /// The file is left untouched when nothing was removed.
    pub fn unset_many(&self, layer: ConfigLayer, keys: &[String]) -> Result<usize, ConfigError> {
        let path = self.path(layer)?;
        let mut document = self.read(layer)?;

        let removed = keys
            .iter()
            .filter(|key| remove_path(&mut document, key))
            .count();

        if removed > 0 {
            write_document(&path, &document)?;
            info!(%layer, path = %path.display(), removed, "Configuration keys removed");
        } else {
            debug!(%layer, "No configuration keys matched; document untouched");
        }
        Ok(removed)
    }

    /// Write the commented starter document for `layer`
    pub fn init_layer(&self, layer: ConfigLayer) -> Result<PathBuf, ConfigError> {
        let path = self.path(layer)?;
        if path.exists() {
            return Err(ConfigError::AlreadyExists { path });
        }

        let content = TemplateEngine::new()?.render_config(layer, &EffectiveConfig::default())?;
        write_atomic(&path, &content)?;
        info!(%layer, path = %path.display(), "Configuration initialized");
        Ok(path)
    }

    /// Replace `layer` with `payload` after validating it as a full document
    pub fn import_document(&self, payload: &str, layer: ConfigLayer) -> Result<PathBuf, ConfigError> {
        let path = self.path(layer)?;
        let source = ConfigSource::from(layer);
        let table = parse_document(source, &path, payload)?;
        schema::validate_table(&table).map_err(|e| e.in_layer(source))?;

        write_atomic(&path, payload)?;
        info!(%layer, path = %path.display(), "Configuration imported");
        Ok(path)
    }
}

/// Set a dotted key, creating intermediate tables and replacing any
/// non-table value found along the way
pub fn set_path(document: &mut Table, dotted: &str, value: Value) {
    let mut segments: Vec<&str> = dotted.split('.').collect();
    let Some(leaf) = segments.pop() else {
        return;
    };

    let mut current = document;
    for segment in segments {
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Table(Table::new()));
        if !entry.is_table() {
            *entry = Value::Table(Table::new());
        }
        let Value::Table(next) = entry else {
            return;
        };
        current = next;
    }
    current.insert(leaf.to_string(), value);
}

/// Value at a dotted key
pub fn get_path<'a>(document: &'a Table, dotted: &str) -> Option<&'a Value> {
    let mut segments = dotted.split('.');
    let mut value = document.get(segments.next()?)?;
    for segment in segments {
        value = value.as_table()?.get(segment)?;
    }
    Some(value)
}

/// Remove a dotted leaf; `false` when the path does not exist
pub fn remove_path(document: &mut Table, dotted: &str) -> bool {
    let mut segments: Vec<&str> = dotted.split('.').collect();
    let Some(leaf) = segments.pop() else {
        return false;
    };

    let mut current = document;
    for segment in segments {
        match current.get_mut(segment) {
            Some(Value::Table(next)) => current = next,
            _ => return false,
        }
    }
    current.remove(leaf).is_some()
}

fn write_document(path: &Path, document: &Table) -> Result<(), ConfigError> {
    let content = toml::to_string(document).map_err(|e| ConfigError::SerializeFailed {
        reason: e.to_string(),
    })?;
    write_atomic(path, &content)
}

/// Write through a temp file in the destination directory, then rename over
/// the target
pub fn write_atomic(path: &Path, content: &str) -> Result<(), ConfigError> {
    let failed = |source: std::io::Error| ConfigError::WriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).map_err(failed)?;

    let mut temp = tempfile::NamedTempFile::new_in(&parent).map_err(failed)?;
    temp.write_all(content.as_bytes()).map_err(failed)?;
    temp.as_file().sync_all().map_err(failed)?;
    temp.persist(path).map_err(|e| failed(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    include!("layers.test.rs");
}
