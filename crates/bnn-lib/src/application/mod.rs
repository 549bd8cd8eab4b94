//! Application layer modules
//!
//! Organizes the CLI interface, configuration resolution and command dispatch.

pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
#[cfg(any(test, feature = "test-utils"))]
pub mod context_mocks;
pub mod env;
pub mod loader;
pub mod schema;

// Re-export main types for convenience
pub use cli::{Cli, CliConfig, Commands};
pub use commands::{execute_command, execute_command_with_context};
pub use config::EffectiveConfig;
pub use context::{CommandContext, LiveCommandContext};
pub use loader::{ConfigPaths, ConfigResolver};
