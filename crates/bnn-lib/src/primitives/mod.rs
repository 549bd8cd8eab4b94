//! bnn primitives - core types, errors, and coordination
//!
//! Central collection of shared types that form the foundation of bnn.
//! Configuration enums drive both the schema and the command line, and every
//! error projects onto a stable [`ErrorKind`] for machine-readable output.

use clap::ValueEnum;
use clap::builder::PossibleValue;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

// Shared macros and patterns
mod shared;
use shared::impl_fromstr_for_value_enum;

/// bnn domain value sets and configuration layers
pub mod bnn;
pub use bnn::*;

/// Log levels for structured logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LogLevel {
    Error = 0,
    Warning = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl LogLevel {
    /// Raise the level by `steps` (one per `-v` flag), saturating at trace
    pub fn raised_by(self, steps: u8) -> Self {
        LogLevel::from_verbosity((self as u8).saturating_add(steps))
    }

    pub fn from_verbosity(verbosity: u8) -> Self {
        match verbosity {
            0 => LogLevel::Error,
            1 => LogLevel::Warning,
            2 => LogLevel::Info,
            3 => LogLevel::Debug,
            4.. => LogLevel::Trace,
        }
    }

    /// Directive understood by `tracing_subscriber::EnvFilter`
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warning => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl ValueEnum for LogLevel {
    fn value_variants<'a>() -> &'a [Self] {
        &[
            Self::Error,
            Self::Warning,
            Self::Info,
            Self::Debug,
            Self::Trace,
        ]
    }

    fn to_possible_value(&self) -> Option<PossibleValue> {
        match self {
            Self::Error => Some(PossibleValue::new("error")),
            Self::Warning => Some(PossibleValue::new("warn")),
            Self::Info => Some(PossibleValue::new("info")),
            Self::Debug => Some(PossibleValue::new("debug")),
            Self::Trace => Some(PossibleValue::new("trace")),
        }
    }
}

impl_fromstr_for_value_enum!(LogLevel, "invalid log level");

/// Logger configuration derived from the effective configuration
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub level: LogLevel,
    pub color: bool,
}

// ============================================================================
// STRUCTURED ERROR TYPES
// ============================================================================

/// Stable classification of every user-facing failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    SourceParseError,
    SchemaValidationError,
    SecretViaArgvRejected,
    SecretStdinUnavailable,
    AlreadyExists,
    SessionNotFound,
    NoContinuationImage,
    PruneIoError,
    IoError,
    ApiError,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::SourceParseError => "source_parse_error",
            ErrorKind::SchemaValidationError => "schema_validation_error",
            ErrorKind::SecretViaArgvRejected => "secret_via_argv_rejected",
            ErrorKind::SecretStdinUnavailable => "secret_stdin_unavailable",
            ErrorKind::AlreadyExists => "already_exists",
            ErrorKind::SessionNotFound => "session_not_found",
            ErrorKind::NoContinuationImage => "no_continuation_image",
            ErrorKind::PruneIoError => "prune_io_error",
            ErrorKind::IoError => "io_error",
            ErrorKind::ApiError => "api_error",
            ErrorKind::Internal => "internal",
        }
    }

    /// Find the first typed bnn error in an `anyhow` chain
    pub fn of(error: &anyhow::Error) -> Self {
        for cause in error.chain() {
            if let Some(e) = cause.downcast_ref::<ConfigError>() {
                return e.kind();
            }
            if let Some(e) = cause.downcast_ref::<SessionError>() {
                return e.kind();
            }
            if let Some(e) = cause.downcast_ref::<PruneIoError>() {
                return e.kind();
            }
            if let Some(e) = cause.downcast_ref::<crate::api::ApiError>() {
                return e.kind();
            }
            if cause.downcast_ref::<std::io::Error>().is_some() {
                return ErrorKind::IoError;
            }
        }
        ErrorKind::Internal
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration resolution and mutation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse {layer} configuration '{path}': {message}")]
    SourceParse {
        layer: ConfigSource,
        path: PathBuf,
        message: String,
    },

    #[error("Failed to read {layer} configuration '{path}': {source}")]
    SourceRead {
        layer: ConfigSource,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid configuration{origin}: '{key}' {expected}")]
    SchemaValidation {
        key: String,
        expected: String,
        /// Empty, or ` in <layer> layer` when the offending source is known
        origin: String,
    },

    #[error(
        "Refusing to set secret '{key}' from a command-line argument; pipe it instead: echo $VALUE | bnn config set {key}=-"
    )]
    SecretViaArgvRejected { key: String },

    #[error("Cannot read secret '{key}' from stdin: {reason}")]
    SecretStdinUnavailable { key: String, reason: String },

    #[error("Configuration already exists at '{path}'")]
    AlreadyExists { path: PathBuf },

    #[error("Failed to write configuration '{path}': {source}")]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize configuration: {reason}")]
    SerializeFailed { reason: String },

    #[error("Failed to parse configuration value '{value}': {reason}")]
    ParseError { value: String, reason: String },

    #[error("Failed to parse environment variables: {source}")]
    EnvironmentParsingFailed {
        #[from]
        source: envy::Error,
    },

    #[error("Failed to get current directory: {source}")]
    CurrentDirError { source: std::io::Error },

    #[error("Could not determine the user configuration directory")]
    NoConfigDir,
}

impl ConfigError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConfigError::SourceParse { .. } => ErrorKind::SourceParseError,
            ConfigError::SchemaValidation { .. } | ConfigError::ParseError { .. } => {
                ErrorKind::SchemaValidationError
            }
            ConfigError::SecretViaArgvRejected { .. } => ErrorKind::SecretViaArgvRejected,
            ConfigError::SecretStdinUnavailable { .. } => ErrorKind::SecretStdinUnavailable,
            ConfigError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            ConfigError::SourceRead { .. }
            | ConfigError::WriteFailed { .. }
            | ConfigError::CurrentDirError { .. }
            | ConfigError::NoConfigDir => ErrorKind::IoError,
            ConfigError::SerializeFailed { .. } | ConfigError::EnvironmentParsingFailed { .. } => {
                ErrorKind::Internal
            }
        }
    }

    pub(crate) fn schema(key: impl Into<String>, expected: impl Into<String>) -> Self {
        ConfigError::SchemaValidation {
            key: key.into(),
            expected: expected.into(),
            origin: String::new(),
        }
    }

    /// Attach the offending layer to a schema error
    pub(crate) fn in_layer(self, layer: ConfigSource) -> Self {
        match self {
            ConfigError::SchemaValidation { key, expected, .. } => ConfigError::SchemaValidation {
                key,
                expected,
                origin: format!(" in {layer} layer"),
            },
            other => other,
        }
    }
}

/// Session persistence errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session '{id}' not found")]
    NotFound { id: String },

    #[error("Session '{id}' has no image to continue from")]
    NoContinuationImage { id: String },

    #[error("Session storage I/O failed at '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to encode session '{id}': {source}")]
    Encode {
        id: String,
        source: serde_json::Error,
    },

    #[error("Failed to read image '{path}': {source}")]
    ImageRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid embedded image data: {reason}")]
    InvalidImageData { reason: String },
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::NotFound { .. } => ErrorKind::SessionNotFound,
            SessionError::NoContinuationImage { .. } => ErrorKind::NoContinuationImage,
            SessionError::Io { .. } | SessionError::ImageRead { .. } => ErrorKind::IoError,
            SessionError::Encode { .. } | SessionError::InvalidImageData { .. } => {
                ErrorKind::Internal
            }
        }
    }
}

/// A single session record that could not be removed while pruning
///
/// Never propagated out of a prune batch; logged and counted as skipped.
#[derive(Debug, Error)]
#[error("Failed to prune session '{id}' at '{path}': {source}")]
pub struct PruneIoError {
    pub id: String,
    pub path: PathBuf,
    pub source: std::io::Error,
}

impl PruneIoError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::PruneIoError
    }
}

/// Logger initialization errors
#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("Failed to initialize tracing subscriber: {reason}")]
    InitializationFailed { reason: String },
}

#[cfg(test)]
mod bnn_tests {
    use super::*;
    include!("bnn.test.rs");
}

#[cfg(test)]
mod tests {
    include!("mod.test.rs");
}
