//! Tracing subscriber setup
//!
//! Log lines go to stderr through the indicatif writer so they never tear an
//! active spinner. The level arrives explicitly from the resolved
//! configuration.

use crate::primitives::*;
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Crates whose logs stay at warn unless `RUST_LOG` says otherwise
const QUIET_CRATES: &[&str] = &["reqwest", "hyper_util", "h2", "mio"];

/// Handle returned by a successful [`Logger::init`]
#[derive(Debug, Clone)]
pub struct Logger {
    level: LogLevel,
}

impl Logger {
    /// Install the subscriber for this process
    pub fn init(config: &LoggerConfig) -> Result<Self, LoggerError> {
        let indicatif_layer = IndicatifLayer::new();

        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(Self::filter_directive(config.level)));

        let fmt_layer = fmt::layer()
            .with_writer(indicatif_layer.get_stderr_writer())
            .with_ansi(config.color)
            .with_target(false)
            .compact();

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(indicatif_layer)
            .try_init()
            .map_err(|e| LoggerError::InitializationFailed {
                reason: e.to_string(),
            })?;

        tracing::debug!(level = %config.level, color = config.color, "Logger initialized");
        Ok(Self {
            level: config.level,
        })
    }

    /// Default filter: bnn at `level`, noisy dependencies at warn
    pub fn filter_directive(level: LogLevel) -> String {
        let mut directives = vec![format!("bnn={}", level.as_filter())];
        directives.push(format!("bnn_lib={}", level.as_filter()));
        directives.extend(QUIET_CRATES.iter().map(|name| format!("{name}=warn")));
        directives.push("warn".to_string());
        directives.join(",")
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }
}

#[cfg(test)]
mod tests {
    include!("mod.test.rs");
}
