pub mod edit;
pub mod image;
pub mod layers;
pub mod naming;
pub mod repl;
pub mod secrets;
pub mod store;
pub mod template;

// Re-export main types for convenience
pub use edit::{EditOptions, EditTurn, TurnInput, TurnOutcome};
pub use image::{ImagePayload, ImageSource};
pub use layers::{ConfigMutator, SetValue};
pub use naming::OutputNamer;
pub use repl::{InteractiveLoop, LoopSummary};
pub use secrets::{SecretInput, StdinSecretInput};
pub use store::{Session, SessionEntry, SessionStore, SessionSummary};
pub use template::TemplateEngine;
