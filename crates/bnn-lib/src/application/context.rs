//! Command context
//!
//! Each invocation builds one context that owns everything a command touches:
//! the resolved configuration, the session store, the layer mutator, the
//! image API and the terminal. Handlers only see the [`CommandContext`]
//! trait, so tests swap in [`super::context_mocks::MockCommandContext`].

use crate::api::{ApiError, GeminiClient, ImageEditor};
use crate::application::cli::GlobalArgs;
use crate::application::config::EffectiveConfig;
use crate::application::loader::ConfigPaths;
use crate::bnn::layers::ConfigMutator;
use crate::bnn::naming::OutputNamer;
use crate::bnn::secrets::{SecretInput, StdinSecretInput};
use crate::bnn::store::SessionStore;
use crate::display::{DisplayProvider, LiveDisplayProvider};
use std::io::{self, BufRead, Write};

/// Provider trait for the process's input streams
pub trait InputProvider {
    /// Stream that `config set KEY=-` reads from
    fn secret_input(&self) -> Box<dyn SecretInput>;

    /// Lines for the interactive loop
    fn lines(&self) -> Box<dyn BufRead>;

    /// Where the interactive loop writes its prompt
    fn prompt_echo(&self) -> Box<dyn Write>;
}

/// Everything a command handler may use
pub trait CommandContext {
    fn display(&self) -> &dyn DisplayProvider;

    fn input(&self) -> &dyn InputProvider;

    fn editor(&self) -> &dyn ImageEditor;

    /// Effective configuration before per-command flag overrides
    fn config(&self) -> &EffectiveConfig;

    fn config_paths(&self) -> &ConfigPaths;

    fn store(&self) -> &SessionStore;

    fn mutator(&self) -> &ConfigMutator;

    fn flags(&self) -> &GlobalArgs;

    /// Output namer for the configured directory and scheme
    fn namer(&self) -> OutputNamer {
        let output = &self.config().output;
        OutputNamer::new(output.directory.clone(), output.naming)
    }
}

/// Live implementation of InputProvider
pub struct LiveInputProvider {
    json: bool,
}

impl InputProvider for LiveInputProvider {
    fn secret_input(&self) -> Box<dyn SecretInput> {
        Box::new(StdinSecretInput)
    }

    fn lines(&self) -> Box<dyn BufRead> {
        Box::new(io::stdin().lock())
    }

    fn prompt_echo(&self) -> Box<dyn Write> {
        if self.json {
            Box::new(io::stderr())
        } else {
            Box::new(io::stdout())
        }
    }
}

/// Production context for one invocation
pub struct LiveCommandContext {
    display: LiveDisplayProvider,
    input: LiveInputProvider,
    editor: GeminiClient,
    config: EffectiveConfig,
    paths: ConfigPaths,
    store: SessionStore,
    mutator: ConfigMutator,
    flags: GlobalArgs,
}

impl LiveCommandContext {
    pub fn new(
        flags: GlobalArgs,
        config: EffectiveConfig,
        paths: ConfigPaths,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            display: LiveDisplayProvider::new(flags.json),
            input: LiveInputProvider { json: flags.json },
            editor: GeminiClient::from_config(&config.api)?,
            store: SessionStore::new(config.session.directory.clone(), config.session.max_history),
            mutator: ConfigMutator::new(paths.clone()),
            config,
            paths,
            flags,
        })
    }
}

impl CommandContext for LiveCommandContext {
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
