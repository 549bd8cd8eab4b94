//! Hermetic environment for end-to-end runs
//!
//! Every path the CLI touches (config root, data root, project, outputs and
//! sessions) lives under one temporary directory. The same layout serves
//! in-process runs through [`TestEnvironment::context`] and binary runs
//! through [`TestEnvironment::command`].

use anyhow::{Context, Result};
use bnn_lib::application::cli::GlobalArgs;
use bnn_lib::application::env::EnvironmentConfig;
use bnn_lib::application::{ConfigPaths, ConfigResolver, EffectiveConfig, LiveCommandContext};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Variables that would leak the developer's setup into a run
const ISOLATED_VARS: &[&str] = &[
    "BNN_API_KEY",
    "BNN_API_ENDPOINT",
    "BNN_MODEL",
    "BNN_THINKING",
    "BNN_OUTPUT_DIR",
    "BNN_RESOLUTION",
    "BNN_ASPECT_RATIO",
    "RUST_LOG",
];

pub struct TestEnvironment {
    /// Keeps the tree alive for the lifetime of the environment
    pub temp_dir: TempDir,
    pub root_path: PathBuf,
    /// Project root (holds a `.git` marker) and the process working directory
    pub work_path: PathBuf,
    pub config_home: PathBuf,
    pub data_home: PathBuf,
    pub output_path: PathBuf,
    pub sessions_path: PathBuf,
}

impl TestEnvironment {
    /// Fresh tree with a global document pointing outputs and sessions
    /// inside it and sequential output naming
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let root_path = temp_dir.path().to_path_buf();
        let work_path = root_path.join("work");
        let config_home = root_path.join("config");
        let data_home = root_path.join("data");
        let output_path = root_path.join("out");
        let sessions_path = data_home.join("bnn").join("sessions");

        fs::create_dir_all(work_path.join(".git"))?;
        fs::create_dir_all(config_home.join("bnn"))?;
        fs::create_dir_all(&output_path)?;

        let env = Self {
            temp_dir,
            root_path,
            work_path,
            config_home,
            data_home,
            output_path,
            sessions_path,
        };
        env.write_global(&format!(
            "[output]\ndirectory = '{}'\nnaming = \"sequential\"\n\n[session]\ndirectory = '{}'\n",
            env.output_path.display(),
            env.sessions_path.display()
        ))?;
        Ok(env)
    }

    pub fn global_config(&self) -> PathBuf {
        self.config_home.join("bnn").join("config.toml")
    }

    pub fn project_config(&self) -> PathBuf {
        self.work_path.join(".config").join("bnn.toml")
    }

    pub fn write_global(&self, content: &str) -> Result<()> {
        fs::write(self.global_config(), content).context("writing global config")
    }

    /// Append TOML to the global document
    pub fn append_global(&self, content: &str) -> Result<()> {
        let mut existing = fs::read_to_string(self.global_config()).unwrap_or_default();
        existing.push('\n');
        existing.push_str(content);
        self.write_global(&existing)
    }

    pub fn write_project(&self, content: &str) -> Result<()> {
        let path = self.project_config();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content).context("writing project config")
    }

    /// Write an input image under the work directory
    pub fn write_image(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.work_path.join(name);
        fs::write(&path, bytes)?;
        Ok(path)
    }

    pub fn paths(&self) -> ConfigPaths {
        ConfigPaths::new(self.global_config(), &self.work_path)
    }

    /// Resolve configuration as the binary would, with `vars` as the environment
    pub fn resolve(&self, vars: &[(&str, &str)]) -> Result<EffectiveConfig> {
        let environment = EnvironmentConfig::from_pairs(vars.iter().copied())?;
        Ok(ConfigResolver::new(self.paths(), environment).resolve(None)?)
    }

    /// Live command context talking to `endpoint` with a test key
    pub fn context(&self, endpoint: &str, flags: GlobalArgs) -> Result<LiveCommandContext> {
        let config = self.resolve(&[
            ("BNN_API_KEY", "e2e-test-key-0001"),
            ("BNN_API_ENDPOINT", endpoint),
        ])?;
        Ok(LiveCommandContext::new(flags, config, self.paths())?)
    }

    /// Binary invocation isolated to this tree
    pub fn command(&self, program: impl AsRef<Path>) -> assert_cmd::Command {
        let mut command = assert_cmd::Command::new(program.as_ref());
        command
            .current_dir(&self.work_path)
            .env("HOME", &self.root_path)
            .env("XDG_CONFIG_HOME", &self.config_home)
            .env("XDG_DATA_HOME", &self.data_home)
            .env("NO_COLOR", "1");
        for var in ISOLATED_VARS {
            command.env_remove(var);
        }
        command
    }

    /// Saved outputs, sorted by name
    pub fn outputs(&self) -> Result<Vec<PathBuf>> {
        list_files(&self.output_path, "png")
    }

    /// Session record files, sorted by name
    pub fn session_records(&self) -> Result<Vec<PathBuf>> {
        list_files(&self.sessions_path, "json")
    }
}

fn list_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == extension))
        .collect();
    files.sort();
    Ok(files)
}
