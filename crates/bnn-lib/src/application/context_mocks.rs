//! Mock command context for testing
//!
//! Everything lives under one caller-owned root directory: the global layer at
//! `config/bnn/config.toml`, a project at `work/`, sessions in `sessions/` and
//! outputs in `out/`.

use super::cli::GlobalArgs;
use super::config::EffectiveConfig;
use super::context::{CommandContext, InputProvider};
use super::loader::ConfigPaths;
use crate::api::{ImageEditor, MockImageEditor};
use crate::bnn::layers::ConfigMutator;
use crate::bnn::secrets::{BufferedSecretInput, SecretInput};
use crate::bnn::store::SessionStore;
use crate::display::{DisplayProvider, MockDisplayProvider};
use std::fs;
use std::io::{self, BufRead, Cursor, Write};
use std::path::{Path, PathBuf};

/// Scripted stdin: a secret pipe (or terminal) and interactive lines
#[derive(Debug, Clone)]
pub struct MockInputProvider {
    secret: BufferedSecretInput,
    script: String,
}

impl Default for MockInputProvider {
    fn default() -> Self {
        Self {
            secret: BufferedSecretInput::terminal(),
            script: String::new(),
        }
    }
}

impl InputProvider for MockInputProvider {
    fn secret_input(&self) -> Box<dyn SecretInput> {
        Box::new(self.secret.clone())
    }

    fn lines(&self) -> Box<dyn BufRead> {
        Box::new(Cursor::new(self.script.clone().into_bytes()))
    }

    fn prompt_echo(&self) -> Box<dyn Write> {
        Box::new(io::sink())
    }
}

pub struct MockCommandContext {
    root: PathBuf,
    display: MockDisplayProvider,
    input: MockInputProvider,
    editor: MockImageEditor,
    config: EffectiveConfig,
    paths: ConfigPaths,
    store: SessionStore,
    mutator: ConfigMutator,
    flags: GlobalArgs,
}

impl MockCommandContext {
    /// Context rooted at `root`, with an API key and outputs under `root/out`
    pub fn new(root: &Path) -> io::Result<Self> {
        let work = root.join("work");
        fs::create_dir_all(work.join(".bnn"))?;
        let paths = ConfigPaths::new(root.join("config").join("bnn").join("config.toml"), work);

        let mut config = EffectiveConfig::default();
        config.api.key = Some("test-api-key-1234".to_string());
        config.output.directory = root.join("out");
        config.session.directory = root.join("sessions");

        Ok(Self {
            root: root.to_path_buf(),
            display: MockDisplayProvider::new(),
            input: MockInputProvider::default(),
            editor: MockImageEditor::new(),
            store: SessionStore::new(config.session.directory.clone(), config.session.max_history),
            mutator: ConfigMutator::new(paths.clone()),
            config,
            paths,
            flags: GlobalArgs::default(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn with_editor(mut self, editor: MockImageEditor) -> Self {
        self.editor = editor;
        self
    }

    /// Replace the configuration; the session store follows its `[session]`
    pub fn with_config(mut self, config: EffectiveConfig) -> Self {
        self.store = SessionStore::new(config.session.directory.clone(), config.session.max_history);
        self.config = config;
        self
    }

    pub fn with_json(mut self) -> Self {
        self.flags.json = true;
        self
    }

    pub fn with_yes(mut self) -> Self {
        self.flags.yes = true;
        self
    }

    /// Pipe `content` to stdin for secret reads
    pub fn with_piped_secret(mut self, content: &str) -> Self {
        self.input.secret = BufferedSecretInput::piped(content);
        self
    }

    /// Lines fed to the interactive loop
    pub fn with_script(mut self, script: &str) -> Self {
        self.input.script = script.to_string();
        self
    }

    pub fn display_mock(&self) -> &MockDisplayProvider {
        &self.display
    }

    pub fn editor_mock(&self) -> &MockImageEditor {
        &self.editor
    }
}

impl CommandContext for MockCommandContext {
    fn display(&self) -> &dyn DisplayProvider {
        &self.display
    }

    fn input(&self) -> &dyn InputProvider {
        &self.input
    }

    fn editor(&self) -> &dyn ImageEditor {
        &self.editor
    }

    fn config(&self) -> &EffectiveConfig {
        &self.config
    }

    fn config_paths(&self) -> &ConfigPaths {
        &self.paths
    }

    fn store(&self) -> &SessionStore {
        &self.store
    }

    fn mutator(&self) -> &ConfigMutator {
        &self.mutator
    }

    fn flags(&self) -> &GlobalArgs {
        &self.flags
    }
}
