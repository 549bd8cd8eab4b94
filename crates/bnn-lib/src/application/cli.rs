use crate::primitives::{AspectRatio, ConfigLayer, Resolution, ThinkingLevel};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// bnn CLI - image generation and editing
#[derive(Debug, Clone, Parser)]
#[command(name = "bnn")]
#[command(about = "Generate and edit images with a Gemini image model")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Options shared by every command
    #[command(flatten)]
    pub global: GlobalArgs,

    /// bnn commands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Configuration loaded from CLI
pub struct CliConfig {
    pub global: GlobalArgs,
    pub command: Option<Commands>,
}

impl CliConfig {
    /// Load configuration from command line arguments
    pub fn load() -> Self {
        Self::from(Cli::parse())
    }
}

impl From<Cli> for CliConfig {
    fn from(cli: Cli) -> Self {
        Self {
            global: cli.global,
            command: cli.command,
        }
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// Extra configuration document merged above the project layer
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Machine-readable JSON on stdout
    #[arg(long, global = true)]
    pub json: bool,

    /// Raise log verbosity (repeatable)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Answer yes to confirmations
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,
}

/// Per-invocation overrides of the effective configuration; never persisted
#[derive(Debug, Clone, Default, Args)]
pub struct ModelArgs {
    #[arg(short, long, help = "Model name")]
    pub model: Option<String>,

    #[arg(short, long, ignore_case = true, help = "Output resolution")]
    pub resolution: Option<Resolution>,

    #[arg(short, long, ignore_case = true, help = "Output aspect ratio")]
    pub aspect_ratio: Option<AspectRatio>,

    #[arg(short, long, ignore_case = true, help = "Model thinking level")]
    pub thinking: Option<ThinkingLevel>,

    /// Reference images sent alongside the prompt
    #[arg(long = "ref", value_name = "IMAGE")]
    pub references: Vec<PathBuf>,

    /// Exact output file, bypassing the naming scheme
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Target layer of a mutating `config` command (global unless `--project`)
#[derive(Debug, Clone, Default, Args)]
pub struct LayerArgs {
    #[arg(long, conflicts_with = "project", help = "Write the user-wide document")]
    pub global: bool,

    #[arg(long, help = "Write the project's .config/bnn.toml")]
    pub project: bool,
}

impl LayerArgs {
    pub fn layer(&self) -> ConfigLayer {
        if self.project {
            ConfigLayer::Project
        } else {
            ConfigLayer::Global
        }
    }
}

/// Available bnn commands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Generate an image from a text prompt
    Generate {
        #[arg(help = "What to draw")]
        prompt: String,

        #[command(flatten)]
        options: ModelArgs,
    },

    /// Edit an image, or continue editing a session
    Edit {
        #[arg(help = "How to change the image")]
        prompt: String,

        /// Image to start a new session from
        #[arg(short, long, value_name = "PATH")]
        image: Option<PathBuf>,

        /// Continue the session with this id
        #[arg(short, long, value_name = "ID", conflicts_with_all = ["image", "continue_latest"])]
        session: Option<String>,

        /// Continue the most recently updated session
        #[arg(short, long = "continue", conflicts_with = "image")]
        continue_latest: bool,

        /// Keep editing the same session from a prompt loop
        #[arg(long)]
        interactive: bool,

        #[command(flatten)]
        options: ModelArgs,
    },

    /// Inspect and change configuration layers
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Manage stored editing sessions
    Session {
        #[command(subcommand)]
        command: SessionCommand,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum ConfigCommand {
    /// Print one effective value
    Get {
        #[arg(help = "Dotted key, e.g. output.resolution")]
        key: String,
    },

    /// Print the whole effective configuration
    List,

    /// Set keys in one layer; use KEY=- to read a secret from piped stdin
    Set {
        #[arg(required = true, value_name = "KEY=VALUE")]
        assignments: Vec<String>,

        #[command(flatten)]
        layer: LayerArgs,
    },

    /// Remove keys from one layer
    Unset {
        #[arg(required = true, value_name = "KEY")]
        keys: Vec<String>,

        #[command(flatten)]
        layer: LayerArgs,
    },

    /// Write a commented starter document
    Init {
        #[command(flatten)]
        layer: LayerArgs,
    },

    /// Replace a layer with a validated document
    Import {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[command(flatten)]
        layer: LayerArgs,
    },

    /// Show where each layer lives
    Path,
}

#[derive(Debug, Clone, Subcommand)]
pub enum SessionCommand {
    /// List sessions, most recently updated first
    List,

    /// Show one session's history
    Show {
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Delete one session
    Delete {
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Delete every session
    Clear,

    /// Keep only the most recently updated sessions
    Prune {
        #[arg(long, value_name = "N", help = "Sessions to keep (default: session.max_history)")]
        keep: Option<usize>,
    },
}

#[cfg(test)]
mod tests {
    include!("cli.test.rs");
}
