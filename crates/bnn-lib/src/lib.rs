//! # bnn Library
//!
//! Image generation and editing from the command line, with layered
//! configuration and resumable editing sessions.
//!
//! ## Core Modules
//!
//! - [`primitives`] - Value sets, structured errors and error kinds
//! - [`application`] - CLI, configuration resolution and command handlers
//! - [`bnn`] - Layer mutation, session storage, edit turns and the interactive loop
//! - [`api`] - The image edit capability and its Gemini client
//! - [`display`] - User-facing output behind provider traits
//! - [`logger`] - Structured logging with progress-aware output

pub mod api;
pub mod application;
pub mod bnn;
pub mod display;
pub mod logger;
pub mod primitives;

// Re-export commonly used types for convenience
pub use application::{Cli, CliConfig, Commands, EffectiveConfig, execute_command};
pub use logger::Logger;
pub use primitives::{ConfigError, ErrorKind, LogLevel, LoggerError, SessionError};

// Private imports for the main function
use anyhow::Result;
use application::cli::ConfigCommand;
use application::{ConfigResolver, LiveCommandContext};
use display::StyleManager;
use serde_json::json;
use std::process::ExitCode;
use tracing::warn;

/// Parse arguments, resolve configuration and run the command
///
/// Failures are printed (as JSON under `--json`) and mapped to exit status 1.
pub async fn main() -> ExitCode {
    let config = CliConfig::load();
    let json = config.global.json;

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            report_error(&error, json);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: CliConfig) -> Result<()> {
    let resolver = ConfigResolver::from_process()?;
    let (effective, unresolved) = match resolver.resolve(config.global.config.as_deref()) {
        Ok(effective) => (effective, None),
        Err(error) if repairs_configuration(config.command.as_ref()) => {
            (EffectiveConfig::default(), Some(error))
        }
        Err(error) => return Err(error.into()),
    };

    let logger_config =
        effective.to_logger_config(config.global.verbose, console::colors_enabled_stderr());
    let _logger = Logger::init(&logger_config)?;
    if let Some(error) = unresolved {
        warn!(kind = %error.kind(), error = %error, "Continuing with default configuration");
    }

    let context =
        LiveCommandContext::new(config.global.clone(), effective, resolver.paths().clone())?;
    execute_command(config, &context).await
}

/// Config subcommands that only need layer paths, so they still run while a
/// layer fails validation
fn repairs_configuration(command: Option<&Commands>) -> bool {
    matches!(
        command,
        Some(Commands::Config {
            command: ConfigCommand::Set { .. }
                | ConfigCommand::Unset { .. }
                | ConfigCommand::Init { .. }
                | ConfigCommand::Import { .. }
                | ConfigCommand::Path
        })
    )
}

/// `{"error":{"kind","message"}}` document for `--json` mode
pub fn error_document(error: &anyhow::Error) -> serde_json::Value {
    json!({
        "error": {
            "kind": ErrorKind::of(error).as_str(),
            "message": format!("{error:#}"),
        }
    })
}

fn report_error(error: &anyhow::Error, json: bool) {
    if json {
        println!("{}", error_document(error));
    } else {
        let styling = StyleManager::detect();
        eprintln!("{}", styling.format_error(&format!("{error:#}")));
    }
}

#[cfg(test)]
mod tests {
    include!("lib.test.rs");
}
