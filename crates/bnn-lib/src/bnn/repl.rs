//! Interactive editing loop
//!
//! Reads one line at a time. Lines starting with `/` are meta-commands; any
//! other non-empty line is an edit prompt applied to the active session. The
//! session stays on disk whichever way the loop ends.

use crate::bnn::edit::{EditTurn, TurnInput};
use crate::display::DisplayProvider;
use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::debug;

pub const PROMPT: &str = "bnn> ";
const COMMAND_SENTINEL: char = '/';
const HISTORY_TAIL: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaCommand {
    Help,
    Save,
    Undo,
    History,
    Quit,
}

struct CommandSpec {
    name: &'static str,
    command: MetaCommand,
    summary: &'static str,
}

const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "help",
        command: MetaCommand::Help,
        summary: "show this list",
    },
    CommandSpec {
        name: "save",
        command: MetaCommand::Save,
        summary: "show where the last image was saved",
    },
    CommandSpec {
        name: "undo",
        command: MetaCommand::Undo,
        summary: "drop the last output from this run's stack",
    },
    CommandSpec {
        name: "history",
        command: MetaCommand::History,
        summary: "summarise the session history",
    },
    CommandSpec {
        name: "quit",
        command: MetaCommand::Quit,
        summary: "leave the loop",
    },
    CommandSpec {
        name: "exit",
        command: MetaCommand::Quit,
        summary: "leave the loop",
    },
];

impl MetaCommand {
    /// Case-insensitive lookup by name, without the sentinel
    pub fn lookup(name: &str) -> Option<Self> {
        COMMANDS
            .iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(name))
            .map(|entry| entry.command)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Quit,
}

/// Counters reported when the loop ends
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopSummary {
    pub turns: usize,
    pub failures: usize,
}

pub struct InteractiveLoop<'a> {
    turn: &'a EditTurn<'a>,
    display: &'a dyn DisplayProvider,
    session_id: String,
    outputs: Vec<PathBuf>,
    summary: LoopSummary,
}

impl<'a> InteractiveLoop<'a> {
    /// `last_output` seeds the undo stack with the edit that opened the loop
    pub fn new(
        turn: &'a EditTurn<'a>,
        display: &'a dyn DisplayProvider,
        session_id: impl Into<String>,
        last_output: Option<PathBuf>,
    ) -> Self {
        Self {
            turn,
            display,
            session_id: session_id.into(),
            outputs: last_output.into_iter().collect(),
            summary: LoopSummary::default(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn last_output(&self) -> Option<&PathBuf> {
        self.outputs.last()
    }

    /// Run until `/quit` or end of input, echoing the prompt to `echo`
    pub async fn run<R: BufRead, W: Write>(
        &mut self,
        mut input: R,
        mut echo: W,
    ) -> Result<LoopSummary> {
        self.display.status().info(&format!(
            "Editing session {}. Type /help for commands.",
            self.session_id
        ));

        loop {
            write!(echo, "{PROMPT}").context("Failed to write prompt")?;
            echo.flush().context("Failed to write prompt")?;

            let mut line = String::new();
            let read = input
                .read_line(&mut line)
                .context("Failed to read interactive input")?;
            if read == 0 {
                debug!("Interactive input closed");
                break;
            }
            if self.handle_line(&line).await == LoopControl::Quit {
                break;
            }
        }

        Ok(self.summary.clone())
    }

    pub async fn handle_line(&mut self, line: &str) -> LoopControl {
        let line = line.trim();
        if line.is_empty() {
            return LoopControl::Continue;
        }
        match line.strip_prefix(COMMAND_SENTINEL) {
            Some(command) => self.dispatch(command.trim()),
            None => {
                self.apply_edit(line).await;
                LoopControl::Continue
            }
        }
    }

    fn dispatch(&mut self, raw: &str) -> LoopControl {
        let name = raw.split_whitespace().next().unwrap_or_default();
        let Some(command) = MetaCommand::lookup(name) else {
            self.display.status().warning(&format!(
                "Unknown command '/{name}'. Type /help for commands."
            ));
            return LoopControl::Continue;
        };

        let status = self.display.status();
        match command {
            MetaCommand::Help => {
                let lines: Vec<String> = COMMANDS
                    .iter()
                    .map(|entry| format!("/{:<8} {}", entry.name, entry.summary))
                    .collect();
                let items: Vec<&str> = lines.iter().map(String::as_str).collect();
                status.section("Commands");
                status.list(&items);
                status.subtle("Anything else is sent as an edit prompt.");
            }
            MetaCommand::Save => match self.outputs.last() {
                Some(path) => status.info(&format!("Already saved to {}", path.display())),
                None => status.info("Nothing generated yet"),
            },
            MetaCommand::Undo => match self.outputs.pop() {
                Some(path) => {
                    status.info(&format!("Dropped {} from this run", path.display()));
                    status.subtle("The file and the session history are kept.");
                }
                None => status.info("Nothing to undo"),
            },
            MetaCommand::History => self.show_history(),
            MetaCommand::Quit => {
                status.info(&format!(
                    "Session {} saved; continue later with --session {}",
                    self.session_id, self.session_id
                ));
                return LoopControl::Quit;
            }
        }
        LoopControl::Continue
    }

    fn show_history(&self) {
        let status = self.display.status();
        let Some(session) = self.turn.store().get(&self.session_id) else {
            status.warning(&format!("Session {} no longer exists", self.session_id));
            return;
        };

        status.section(&format!(
            "Session {} ({} entries)",
            session.id,
            session.history.len()
        ));
        let skip = session.history.len().saturating_sub(HISTORY_TAIL);
        let lines: Vec<String> = session
            .history
            .iter()
            .enumerate()
            .skip(skip)
            .map(|(index, entry)| format!("{}. {}", index + 1, entry.prompt))
            .collect();
        if lines.is_empty() {
            status.subtle("No edits yet");
        } else {
            let items: Vec<&str> = lines.iter().map(String::as_str).collect();
            status.list(&items);
        }
    }

    async fn apply_edit(&mut self, prompt: &str) {
        let spinner = self.display.progress().spinner("Editing image...");
        match self
            .turn
            .run(&self.session_id, prompt, TurnInput::Continue, None)
            .await
        {
            Ok(outcome) => {
                spinner.finish_clear();
                let status = self.display.status();
                status.success("Saved", &outcome.output.display().to_string());
                if let Some(text) = &outcome.response.text {
                    status.subtle(text);
                }
                self.outputs.push(outcome.output);
                self.summary.turns += 1;
            }
            Err(e) => {
                spinner.abandon("Edit failed");
                self.display.status().error("Edit failed", &format!("{e:#}"));
                self.summary.failures += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    include!("repl.test.rs");
}
