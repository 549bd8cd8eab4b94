//! Mock display provider for testing
//!
//! Records every display call for assertions and answers confirmations from
//! preset responses.

use super::providers::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

type CallLog = Arc<Mutex<Vec<DisplayCall>>>;

/// [`DisplayProvider`] that records all calls
#[derive(Clone, Default)]
pub struct MockDisplayProvider {
    calls: CallLog,
    confirmations: Arc<Mutex<HashMap<String, bool>>>,
}

impl MockDisplayProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_calls(&self) -> Vec<DisplayCall> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    /// Answer the confirmation `message` with `response` (unset prompts answer no)
    pub fn set_confirm_response(&self, message: &str, response: bool) {
        if let Ok(mut confirmations) = self.confirmations.lock() {
            confirmations.insert(message.to_string(), response);
        }
    }

    pub fn has_call(&self, expected: &DisplayCall) -> bool {
        self.get_calls().contains(expected)
    }

    pub fn count_calls(&self, call_type: &str) -> usize {
        self.get_calls()
            .iter()
            .filter(|call| call.call_type() == call_type)
            .count()
    }

    /// Every recorded call flattened to text, one entry per call
    pub fn transcript(&self) -> Vec<String> {
        self.get_calls().iter().map(DisplayCall::text).collect()
    }

    /// Whether any recorded call mentions `needle`
    pub fn mentions(&self, needle: &str) -> bool {
        self.transcript().iter().any(|line| line.contains(needle))
    }

    /// The last JSON document emitted
    pub fn last_json(&self) -> Option<serde_json::Value> {
        self.get_calls().into_iter().rev().find_map(|call| match call {
            DisplayCall::StructuredJson { value } => Some(value),
            _ => None,
        })
    }
}

fn record(calls: &CallLog, call: DisplayCall) {
    if let Ok(mut calls) = calls.lock() {
        calls.push(call);
    }
}

impl DisplayProvider for MockDisplayProvider {
    fn status(&self) -> Box<dyn StatusProvider> {
        Box::new(MockStatusProvider {
            calls: self.calls.clone(),
        })
    }

    fn progress(&self) -> Box<dyn ProgressProvider> {
        Box::new(MockProgressProvider {
            calls: self.calls.clone(),
        })
    }

    fn prompt(&self) -> Box<dyn PromptProvider> {
        Box::new(MockPromptProvider {
            calls: self.calls.clone(),
            confirmations: self.confirmations.clone(),
        })
    }

    fn table(&self) -> Box<dyn StructuredProvider> {
        Box::new(MockStructuredProvider {
            calls: self.calls.clone(),
        })
    }
}

/// Recorded display call
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayCall {
    StatusSuccess { item: String, details: String },
    StatusError { item: String, details: String },
    StatusWarning { message: String },
    StatusInfo { message: String },
    StatusMessage { text: String },
    StatusSubtle { text: String },
    StatusSection { title: String },
    StatusList { items: Vec<String> },

    ProgressSpinner { message: String },
    ProgressFinish { message: String },
    ProgressAbandon { message: String },

    PromptConfirm { message: String, response: bool },

    StructuredTable { headers: Vec<String>, rows: Vec<Vec<String>> },
    StructuredProperties { pairs: Vec<(String, String)> },
    StructuredJson { value: serde_json::Value },
}

impl DisplayCall {
    pub fn call_type(&self) -> &'static str {
        match self {
            DisplayCall::StatusSuccess { .. } => "status_success",
            DisplayCall::StatusError { .. } => "status_error",
            DisplayCall::StatusWarning { .. } => "status_warning",
            DisplayCall::StatusInfo { .. } => "status_info",
            DisplayCall::StatusMessage { .. } => "status_message",
            DisplayCall::StatusSubtle { .. } => "status_subtle",
            DisplayCall::StatusSection { .. } => "status_section",
            DisplayCall::StatusList { .. } => "status_list",
            DisplayCall::ProgressSpinner { .. } => "progress_spinner",
            DisplayCall::ProgressFinish { .. } => "progress_finish",
            DisplayCall::ProgressAbandon { .. } => "progress_abandon",
            DisplayCall::PromptConfirm { .. } => "prompt_confirm",
            DisplayCall::StructuredTable { .. } => "structured_table",
            DisplayCall::StructuredProperties { .. } => "structured_properties",
            DisplayCall::StructuredJson { .. } => "structured_json",
        }
    }

    /// Human-readable rendering used by [`MockDisplayProvider::transcript`]
    pub fn text(&self) -> String {
        match self {
            DisplayCall::StatusSuccess { item, details }
            | DisplayCall::StatusError { item, details } => format!("{item}: {details}"),
            DisplayCall::StatusWarning { message: text }
            | DisplayCall::StatusInfo { message: text }
            | DisplayCall::StatusMessage { text }
            | DisplayCall::StatusSubtle { text }
            | DisplayCall::StatusSection { title: text }
            | DisplayCall::ProgressSpinner { message: text }
            | DisplayCall::ProgressFinish { message: text }
            | DisplayCall::ProgressAbandon { message: text }
            | DisplayCall::PromptConfirm { message: text, .. } => text.clone(),
            DisplayCall::StatusList { items } => items.join("\n"),
            DisplayCall::StructuredTable { headers, rows } => std::iter::once(headers.join(" "))
                .chain(rows.iter().map(|row| row.join(" ")))
                .collect::<Vec<_>>()
                .join("\n"),
            DisplayCall::StructuredProperties { pairs } => pairs
                .iter()
                .map(|(key, value)| format!("{key} {value}"))
                .collect::<Vec<_>>()
                .join("\n"),
            DisplayCall::StructuredJson { value } => value.to_string(),
        }
    }
}

struct MockStatusProvider {
    calls: CallLog,
}

impl StatusProvider for MockStatusProvider {
    fn success(&self, item: &str, details: &str) {
        record(
            &self.calls,
            DisplayCall::StatusSuccess {
                item: item.to_string(),
                details: details.to_string(),
            },
        );
    }

    fn error(&self, item: &str, details: &str) {
        record(
            &self.calls,
            DisplayCall::StatusError {
                item: item.to_string(),
                details: details.to_string(),
            },
        );
    }

    fn warning(&self, message: &str) {
        record(&self.calls, DisplayCall::StatusWarning { message: message.to_string() });
    }

    fn info(&self, message: &str) {
        record(&self.calls, DisplayCall::StatusInfo { message: message.to_string() });
    }

    fn message(&self, text: &str) {
        record(&self.calls, DisplayCall::StatusMessage { text: text.to_string() });
    }

    fn subtle(&self, text: &str) {
        record(&self.calls, DisplayCall::StatusSubtle { text: text.to_string() });
    }

    fn section(&self, title: &str) {
        record(&self.calls, DisplayCall::StatusSection { title: title.to_string() });
    }

    fn list(&self, items: &[&str]) {
        record(
            &self.calls,
            DisplayCall::StatusList {
                items: items.iter().map(|s| s.to_string()).collect(),
            },
        );
    }
}

struct MockProgressProvider {
    calls: CallLog,
}

impl ProgressProvider for MockProgressProvider {
    fn spinner(&self, message: &str) -> Box<dyn ProgressTracker> {
        record(&self.calls, DisplayCall::ProgressSpinner { message: message.to_string() });
        Box::new(MockProgressTracker {
            calls: self.calls.clone(),
        })
    }
}

struct MockProgressTracker {
    calls: CallLog,
}

impl ProgressTracker for MockProgressTracker {
    fn abandon(&self, message: &str) {
        record(&self.calls, DisplayCall::ProgressAbandon { message: message.to_string() });
    }

    fn finish_clear(&self) {
        record(&self.calls, DisplayCall::ProgressFinish { message: String::new() });
    }
}

struct MockPromptProvider {
    calls: CallLog,
    confirmations: Arc<Mutex<HashMap<String, bool>>>,
}

impl PromptProvider for MockPromptProvider {
    fn confirm(&self, message: &str) -> bool {
        let response = self
            .confirmations
            .lock()
            .ok()
            .and_then(|confirmations| confirmations.get(message).copied())
            .unwrap_or(false);
        record(
            &self.calls,
            DisplayCall::PromptConfirm {
                message: message.to_string(),
                response,
            },
        );
        response
    }
}

struct MockStructuredProvider {
    calls: CallLog,
}

impl StructuredProvider for MockStructuredProvider {
    fn table(&self, headers: &[&str], rows: &[Vec<String>]) {
        record(
            &self.calls,
            DisplayCall::StructuredTable {
                headers: headers.iter().map(|s| s.to_string()).collect(),
                rows: rows.to_vec(),
            },
        );
    }

    fn properties(&self, pairs: &[(&str, String)]) {
        record(
            &self.calls,
            DisplayCall::StructuredProperties {
                pairs: pairs
                    .iter()
                    .map(|(key, value)| (key.to_string(), value.clone()))
                    .collect(),
            },
        );
    }

    fn json(&self, value: &serde_json::Value) {
        record(&self.calls, DisplayCall::StructuredJson { value: value.clone() });
    }
}
