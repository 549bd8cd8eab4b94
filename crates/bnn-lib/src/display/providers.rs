//! Display provider traits for dependency injection
//!
//! Every user-facing line goes through these traits so command handlers can
//! be exercised against [`super::MockDisplayProvider`] without a terminal.

/// Provider trait for all user-facing communication
pub trait DisplayProvider: Send + Sync {
    /// Status messages with semantic meaning
    fn status(&self) -> Box<dyn StatusProvider>;

    /// Spinners for operations of unknown duration
    fn progress(&self) -> Box<dyn ProgressProvider>;

    /// Interactive confirmations
    fn prompt(&self) -> Box<dyn PromptProvider>;

    /// Tables, key/value listings and machine-readable documents
    fn table(&self) -> Box<dyn StructuredProvider>;
}

/// Provider trait for status updates and user feedback
pub trait StatusProvider {
    /// A success status with optional details
    fn success(&self, item: &str, details: &str);

    /// An error status with details
    fn error(&self, item: &str, details: &str);

    fn warning(&self, message: &str);

    fn info(&self, message: &str);

    /// A plain line without status symbols
    fn message(&self, text: &str);

    /// A muted, secondary line
    fn subtle(&self, text: &str);

    /// A header for a section of output
    fn section(&self, title: &str);

    /// A bulleted list
    fn list(&self, items: &[&str]);
}

pub trait ProgressProvider {
    fn spinner(&self, message: &str) -> Box<dyn ProgressTracker>;
}

/// Handle on a running spinner
pub trait ProgressTracker {
    /// Stop with a failure message
    fn abandon(&self, message: &str);

    /// Stop and erase the spinner line
    fn finish_clear(&self);
}

pub trait PromptProvider {
    /// Yes/no question, `false` when it cannot be asked
    fn confirm(&self, message: &str) -> bool;
}

pub trait StructuredProvider {
    fn table(&self, headers: &[&str], rows: &[Vec<String>]);

    /// Aligned key/value pairs
    fn properties(&self, pairs: &[(&str, String)]);

    /// A JSON document on stdout
    fn json(&self, value: &serde_json::Value);
}
