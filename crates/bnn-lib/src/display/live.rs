//! Live display provider
//!
//! Writes through `console` terminals, draws spinners with `indicatif` and
//! asks questions with `dialoguer`. In JSON mode every human-oriented line is
//! moved to stderr so stdout carries only the document.

use super::providers::*;
use super::styling::StyleManager;
use console::Term;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;

const SPINNER_TICK: Duration = Duration::from_millis(100);

/// Production [`DisplayProvider`] owning the spinner area for one invocation
pub struct LiveDisplayProvider {
    styling: StyleManager,
    multi_progress: MultiProgress,
    json: bool,
}

impl LiveDisplayProvider {
    pub fn new(json: bool) -> Self {
        Self {
            styling: StyleManager::detect(),
            multi_progress: MultiProgress::new(),
            json,
        }
    }

    fn human_term(&self) -> Term {
        if self.json {
            Term::stderr()
        } else {
            Term::stdout()
        }
    }
}

impl DisplayProvider for LiveDisplayProvider {
    fn status(&self) -> Box<dyn StatusProvider> {
        Box::new(LiveStatusProvider {
            styling: self.styling.clone(),
            term: self.human_term(),
        })
    }

    fn progress(&self) -> Box<dyn ProgressProvider> {
        Box::new(LiveProgressProvider {
            parent: self.multi_progress.clone(),
            hidden: self.json,
        })
    }

    fn prompt(&self) -> Box<dyn PromptProvider> {
        Box::new(LivePromptProvider)
    }

    fn table(&self) -> Box<dyn StructuredProvider> {
        Box::new(LiveStructuredProvider {
            styling: self.styling.clone(),
            term: self.human_term(),
        })
    }
}

struct LiveStatusProvider {
    styling: StyleManager,
    term: Term,
}

impl LiveStatusProvider {
    fn emit(&self, line: &str) {
        // A closed pipe is not worth failing a command over
        let _ = self.term.write_line(line);
    }
}

fn with_details(item: &str, details: &str) -> String {
    if details.is_empty() {
        item.to_string()
    } else {
        format!("{item}: {details}")
    }
}

impl StatusProvider for LiveStatusProvider {
    fn success(&self, item: &str, details: &str) {
        self.emit(&self.styling.format_success(&with_details(item, details)));
    }

    fn error(&self, item: &str, details: &str) {
        self.emit(&self.styling.format_error(&with_details(item, details)));
    }

    fn warning(&self, message: &str) {
        self.emit(&self.styling.format_warning(message));
    }

    fn info(&self, message: &str) {
        self.emit(&self.styling.format_info(message));
    }

    fn message(&self, text: &str) {
        self.emit(text);
    }

    fn subtle(&self, text: &str) {
        self.emit(&self.styling.style_subtle(text));
    }

    fn section(&self, title: &str) {
        self.emit("");
        self.emit(&self.styling.style_emphasis(title));
    }

    fn list(&self, items: &[&str]) {
        for item in items {
            self.emit(&format!("  {} {}", self.styling.bullet(), item));
        }
    }
}

struct LiveProgressProvider {
    parent: MultiProgress,
    hidden: bool,
}

impl ProgressProvider for LiveProgressProvider {
    fn spinner(&self, message: &str) -> Box<dyn ProgressTracker> {
        if self.hidden {
            return Box::new(SpinnerTracker {
                bar: ProgressBar::hidden(),
            });
        }

        let style = ProgressStyle::with_template("{spinner:.cyan} {msg} {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        let bar = self
            .parent
            .add(ProgressBar::new_spinner().with_style(style));
        bar.set_message(message.to_string());
        bar.enable_steady_tick(SPINNER_TICK);
        Box::new(SpinnerTracker { bar })
    }
}

struct SpinnerTracker {
    bar: ProgressBar,
}

impl ProgressTracker for SpinnerTracker {
    fn abandon(&self, message: &str) {
        self.bar.abandon_with_message(message.to_string());
    }

    fn finish_clear(&self) {
        self.bar.finish_and_clear();
    }
}

struct LivePromptProvider;

impl PromptProvider for LivePromptProvider {
    fn confirm(&self, message: &str) -> bool {
        if !Term::stderr().is_term() {
            return false;
        }
        dialoguer::Confirm::new()
            .with_prompt(message)
            .default(false)
            .interact()
            .unwrap_or(false)
    }
}

struct LiveStructuredProvider {
    styling: StyleManager,
    term: Term,
}

impl StructuredProvider for LiveStructuredProvider {
    fn table(&self, headers: &[&str], rows: &[Vec<String>]) {
        let _ = self
            .term
            .write_line(&self.styling.render_table(headers, rows));
    }

    fn properties(&self, pairs: &[(&str, String)]) {
        let width = pairs.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
        for (key, value) in pairs {
            let padded = format!("{key:width$}");
            let _ = self
                .term
                .write_line(&format!("{}  {}", self.styling.style_subtle(&padded), value));
        }
    }

    fn json(&self, value: &serde_json::Value) {
        let rendered = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
        let _ = Term::stdout().write_line(&rendered);
    }
}
