//! Secret classification and the piped-stdin secret channel
//!
//! Secrets never travel through argv: `bnn config set api.key=-` reads the
//! value from a non-interactive stdin instead.

use crate::primitives::ConfigError;
use std::io::{self, IsTerminal, Read};
use toml::{Table, Value};

/// Last path segments that mark a key as secret (case-insensitive)
pub const SECRET_SEGMENTS: &[&str] = &["key", "token", "secret", "password"];

/// Value meaning "read this from piped stdin"
pub const STDIN_SENTINEL: &str = "-";

/// Whether the last segment of a dotted key names a secret
pub fn is_secret_key(key: &str) -> bool {
    let last = key.rsplit('.').next().unwrap_or(key);
    SECRET_SEGMENTS
        .iter()
        .any(|segment| last.eq_ignore_ascii_case(segment))
}

/// Mask a secret for display, keeping the last four characters of long values
pub fn mask(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{tail}")
}

/// Mask every string stored under a secret key, recursively
pub fn redact_table(table: &mut Table) {
    for (key, value) in table.iter_mut() {
        match value {
            Value::Table(inner) => redact_table(inner),
            Value::String(text) if is_secret_key(key) => *text = mask(text),
            _ => {}
        }
    }
}

/// Source of piped secret values
pub trait SecretInput {
    /// `false` when the stream is an interactive terminal
    fn is_piped(&self) -> bool;

    /// Read the whole stream
    fn read_all(&mut self) -> io::Result<String>;
}

/// Process stdin
pub struct StdinSecretInput;

impl SecretInput for StdinSecretInput {
    fn is_piped(&self) -> bool {
        !io::stdin().is_terminal()
    }

    fn read_all(&mut self) -> io::Result<String> {
        let mut buffer = String::new();
        io::stdin().lock().read_to_string(&mut buffer)?;
        Ok(buffer)
    }
}

/// In-memory stand-in for a pipe (or a terminal when `content` is `None`)
#[derive(Debug, Clone, Default)]
pub struct BufferedSecretInput {
    content: Option<String>,
}

impl BufferedSecretInput {
    pub fn piped(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
        }
    }

    pub fn terminal() -> Self {
        Self { content: None }
    }
}

impl SecretInput for BufferedSecretInput {
    fn is_piped(&self) -> bool {
        self.content.is_some()
    }

    fn read_all(&mut self) -> io::Result<String> {
        Ok(self.content.take().unwrap_or_default())
    }
}

/// Read a value for `key` from a piped stream; trailing whitespace only is trimmed
pub fn read_piped_value(key: &str, input: &mut dyn SecretInput) -> Result<String, ConfigError> {
    let unavailable = |reason: &str| ConfigError::SecretStdinUnavailable {
        key: key.to_string(),
        reason: reason.to_string(),
    };

    if !input.is_piped() {
        return Err(unavailable("stdin is an interactive terminal, pipe the value in"));
    }

    let raw = input
        .read_all()
        .map_err(|e| unavailable(&format!("read failed: {e}")))?;
    let value = raw.trim_end().to_string();
    if value.is_empty() {
        return Err(unavailable("stdin was empty"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    include!("secrets.test.rs");
}
