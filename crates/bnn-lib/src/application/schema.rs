//! Field table for configuration documents
//!
//! Every layer, every `config set` and every environment value is checked
//! against [`FIELDS`] so failures name the dotted key and the expected shape.

use crate::primitives::*;
use toml::{Table, Value};

/// Enumerated value sets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceSet {
    Thinking,
    Resolution,
    AspectRatio,
    Naming,
    LogLevel,
}

impl ChoiceSet {
    /// Parse user input and return the canonical spelling
    pub fn canonicalize(&self, raw: &str) -> Result<String, ConfigError> {
        Ok(match self {
            ChoiceSet::Thinking => raw.parse::<ThinkingLevel>()?.as_str(),
            ChoiceSet::Resolution => raw.parse::<Resolution>()?.as_str(),
            ChoiceSet::AspectRatio => raw.parse::<AspectRatio>()?.as_str(),
            ChoiceSet::Naming => raw.parse::<NamingScheme>()?.as_str(),
            ChoiceSet::LogLevel => raw.parse::<LogLevel>()?.as_str(),
        })
    }

    pub fn allowed(&self) -> Vec<String> {
        match self {
            ChoiceSet::Thinking => ThinkingLevel::allowed_values(),
            ChoiceSet::Resolution => Resolution::allowed_values(),
            ChoiceSet::AspectRatio => AspectRatio::allowed_values(),
            ChoiceSet::Naming => NamingScheme::allowed_values(),
            ChoiceSet::LogLevel => LogLevel::allowed_values(),
        }
    }
}

/// Shape of a single leaf value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Non-empty string
    Text,
    /// String that must never travel through argv
    Secret,
    /// `http://` or `https://` URL
    Url,
    /// Filesystem path
    Path,
    /// Integer >= 1
    PositiveInteger,
    Choice(ChoiceSet),
}

impl FieldKind {
    /// Human-readable expectation used in validation errors
    pub fn expectation(&self) -> String {
        match self {
            FieldKind::Text | FieldKind::Secret => "must be a non-empty string".to_string(),
            FieldKind::Url => "must be an http(s) URL string".to_string(),
            FieldKind::Path => "must be a path string".to_string(),
            FieldKind::PositiveInteger => "must be an integer >= 1".to_string(),
            FieldKind::Choice(set) => format!("must be one of: {}", set.allowed().join(", ")),
        }
    }
}

/// One configurable leaf
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub key: &'static str,
    pub kind: FieldKind,
    pub description: &'static str,
}

pub const SECTIONS: &[&str] = &["api", "model", "output", "session", "logging"];

pub const FIELDS: &[Field] = &[
    Field {
        key: "api.key",
        kind: FieldKind::Secret,
        description: "Provider API key",
    },
    Field {
        key: "api.endpoint",
        kind: FieldKind::Url,
        description: "Base URL of the image API",
    },
    Field {
        key: "model.default",
        kind: FieldKind::Text,
        description: "Model used when --model is not given",
    },
    Field {
        key: "model.thinking",
        kind: FieldKind::Choice(ChoiceSet::Thinking),
        description: "Reasoning level before drawing",
    },
    Field {
        key: "output.directory",
        kind: FieldKind::Path,
        description: "Where generated images are written",
    },
    Field {
        key: "output.resolution",
        kind: FieldKind::Choice(ChoiceSet::Resolution),
        description: "Output resolution",
    },
    Field {
        key: "output.aspect_ratio",
        kind: FieldKind::Choice(ChoiceSet::AspectRatio),
        description: "Output aspect ratio",
    },
    Field {
        key: "output.naming",
        kind: FieldKind::Choice(ChoiceSet::Naming),
        description: "Output file naming scheme",
    },
    Field {
        key: "session.directory",
        kind: FieldKind::Path,
        description: "Where session records are stored",
    },
    Field {
        key: "session.max_history",
        kind: FieldKind::PositiveInteger,
        description: "Sessions retained before pruning",
    },
    Field {
        key: "logging.level",
        kind: FieldKind::Choice(ChoiceSet::LogLevel),
        description: "Log verbosity",
    },
];

/// Look up a dotted key
pub fn field(key: &str) -> Option<&'static Field> {
    FIELDS.iter().find(|field| field.key == key)
}

/// Look up a dotted key, failing with a schema error for unknown keys
pub fn require_field(key: &str) -> Result<&'static Field, ConfigError> {
    field(key).ok_or_else(|| {
        ConfigError::schema(
            key,
            format!(
                "is not a recognised key (known keys: {})",
                FIELDS
                    .iter()
                    .map(|field| field.key)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        )
    })
}

/// Check one value against its field
pub fn validate_value(field: &Field, value: &Value) -> Result<(), ConfigError> {
    let invalid = || ConfigError::schema(field.key, field.kind.expectation());
    match field.kind {
        FieldKind::Text | FieldKind::Secret => match value.as_str() {
            Some(text) if !text.trim().is_empty() => Ok(()),
            _ => Err(invalid()),
        },
        FieldKind::Url => match value.as_str() {
            Some(url) if url.starts_with("http://") || url.starts_with("https://") => Ok(()),
            _ => Err(invalid()),
        },
        FieldKind::Path => value.as_str().map(|_| ()).ok_or_else(invalid),
        FieldKind::PositiveInteger => match value.as_integer() {
            Some(n) if n >= 1 => Ok(()),
            _ => Err(invalid()),
        },
        FieldKind::Choice(set) => {
            let raw = value.as_str().ok_or_else(invalid)?;
            set.canonicalize(raw).map(|_| ()).map_err(|_| invalid())
        }
    }
}

/// Turn a literal string (argv, environment) into a typed, validated value
pub fn coerce_literal(field: &Field, raw: &str) -> Result<Value, ConfigError> {
    let invalid = || ConfigError::schema(field.key, field.kind.expectation());
    let value = match field.kind {
        FieldKind::PositiveInteger => {
            Value::Integer(raw.trim().parse::<i64>().map_err(|_| invalid())?)
        }
        FieldKind::Choice(set) => Value::String(set.canonicalize(raw).map_err(|_| invalid())?),
        FieldKind::Text | FieldKind::Secret | FieldKind::Url | FieldKind::Path => {
            Value::String(raw.to_string())
        }
    };
    validate_value(field, &value)?;
    Ok(value)
}

/// Validate a whole document: known sections, known keys, well-typed leaves
pub fn validate_table(table: &Table) -> Result<(), ConfigError> {
    for (section, body) in table {
        if !SECTIONS.contains(&section.as_str()) {
            return Err(ConfigError::schema(
                section.as_str(),
                format!(
                    "is not a recognised section (expected one of: {})",
                    SECTIONS.join(", ")
                ),
            ));
        }
        let Some(body) = body.as_table() else {
            return Err(ConfigError::schema(section.as_str(), "must be a table"));
        };
        for (name, value) in body {
            let dotted = format!("{section}.{name}");
            let field = require_field(&dotted)?;
            validate_value(field, value)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    include!("schema.test.rs");
}
