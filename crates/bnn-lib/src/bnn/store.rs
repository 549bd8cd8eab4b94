//! Durable session records
//!
//! One JSON document per session under the store directory, named
//! `<id>.json`. Records are rewritten whole; two processes appending to the
//! same session race last-write-wins. A record that fails to parse is treated
//! exactly like a missing one.

use crate::bnn::image::{ImagePayload, ImageSource};
use crate::primitives::{PruneIoError, SessionError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const RECORD_EXTENSION: &str = "json";
const ID_LEN: usize = 8;

/// One completed edit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEntry {
    pub prompt: String,
    pub output: PathBuf,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<ImagePayload>,
}

/// Multi-turn editing context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_image: Option<ImageSource>,
    #[serde(default)]
    pub history: Vec<SessionEntry>,
}

impl Session {
    /// Image the next edit starts from: the newest embedded output, else the
    /// original input
    pub fn continuation_image(&self) -> Option<ImageSource> {
        self.history
            .iter()
            .rev()
            .find_map(|entry| entry.image_data.clone().map(ImageSource::Embedded))
            .or_else(|| self.input_image.clone())
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            model: self.model.clone(),
            history_count: self.history.len(),
            last_prompt: self.history.last().map(|entry| entry.prompt.clone()),
        }
    }
}

/// Listing projection of a [`Session`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub model: String,
    pub history_count: usize,
    pub last_prompt: Option<String>,
}

/// CRUD, listing and retention over session records
///
/// Callers always receive owned copies; nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct SessionStore {
    directory: PathBuf,
    max_history: usize,
}

impl SessionStore {
    pub fn new(directory: impl Into<PathBuf>, max_history: usize) -> Self {
        Self {
            directory: directory.into(),
            max_history: max_history.max(1),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.directory.join(format!("{id}.{RECORD_EXTENSION}"))
    }

    /// Start a new session, persist it and apply retention
    pub fn create(
        &self,
        model: &str,
        input_image: Option<ImageSource>,
    ) -> Result<Session, SessionError> {
        let id = self.fresh_id();
        let now = Utc::now();
        let session = Session {
            id,
            created_at: now,
            updated_at: now,
            model: model.to_string(),
            input_image,
            history: Vec::new(),
        };

        self.save(&session)?;
        info!(id = %session.id, model, "Session created");

        match self.prune(self.max_history) {
            Ok(0) => {}
            Ok(removed) => debug!(removed, "Pruned old sessions"),
            Err(e) => warn!(error = %e, "Session pruning skipped"),
        }
        Ok(session)
    }

    fn fresh_id(&self) -> String {
        loop {
            let id: String = uuid::Uuid::new_v4()
                .simple()
                .to_string()
                .chars()
                .take(ID_LEN)
                .collect();
            if !self.record_path(&id).exists() {
                return id;
            }
        }
    }

    /// Load a session; `None` for unknown ids and for unreadable records
    pub fn get(&self, id: &str) -> Option<Session> {
        if !is_valid_id(id) {
            return None;
        }
        read_named_record(&self.record_path(id))
    }

    /// Write a whole record, replacing any previous one
    pub fn save(&self, session: &Session) -> Result<(), SessionError> {
        let content =
            serde_json::to_string_pretty(session).map_err(|e| SessionError::Encode {
                id: session.id.clone(),
                source: e,
            })?;
        let path = self.record_path(&session.id);
        write_record(&self.directory, &path, &content).map_err(|e| SessionError::Io { path, source: e })
    }

    /// Record a completed edit; `Ok(None)` when the session does not exist
    pub fn append_entry(
        &self,
        id: &str,
        prompt: &str,
        output: &Path,
        image_data: Option<ImagePayload>,
    ) -> Result<Option<Session>, SessionError> {
        let Some(mut session) = self.get(id) else {
            return Ok(None);
        };

        let timestamp = Utc::now().max(session.updated_at);
        session.history.push(SessionEntry {
            prompt: prompt.to_string(),
            output: output.to_path_buf(),
            timestamp,
            image_data,
        });
        session.updated_at = timestamp;

        self.save(&session)?;
        debug!(id, entries = session.history.len(), "Session entry appended");
        Ok(Some(session))
    }

    /// Payload that continues `id`; see [`Session::continuation_image`]
    pub fn last_image_data(&self, id: &str) -> Option<ImageSource> {
        self.get(id)?.continuation_image()
    }

    /// Summaries ordered most recently updated first; ties by id
    pub fn list(&self) -> Result<Vec<SessionSummary>, SessionError> {
        let mut summaries: Vec<SessionSummary> = self
            .record_paths()?
            .iter()
            .filter_map(|path| read_named_record(path))
            .map(|session| session.summary())
            .collect();

        summaries.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(summaries)
    }

    /// Most recently updated session
    pub fn latest(&self) -> Result<Option<SessionSummary>, SessionError> {
        Ok(self.list()?.into_iter().next())
    }

    /// Remove one session; `false` when it did not exist
    pub fn delete(&self, id: &str) -> Result<bool, SessionError> {
        if !is_valid_id(id) {
            return Ok(false);
        }
        let path = self.record_path(id);
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(id, "Session deleted");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(SessionError::Io { path, source: e }),
        }
    }

    /// Number of record files, readable or not
    ///
    /// This is what [`SessionStore::clear`] would remove.
    pub fn record_count(&self) -> Result<usize, SessionError> {
        Ok(self.record_paths()?.len())
    }

    /// Remove every record; returns how many were removed
    pub fn clear(&self) -> Result<usize, SessionError> {
        let mut removed = 0;
        for path in self.record_paths()? {
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove session record"),
            }
        }
        info!(removed, "Sessions cleared");
        Ok(removed)
    }

    /// Keep the `max_history` most recently updated sessions, delete the rest
    ///
    /// Individual deletion failures are logged and skipped; the count only
    /// includes records actually removed.
    pub fn prune(&self, max_history: usize) -> Result<usize, SessionError> {
        self.prune_with(max_history, |path| fs::remove_file(path))
    }

    fn prune_with<F>(&self, max_history: usize, remove: F) -> Result<usize, SessionError>
    where
        F: Fn(&Path) -> io::Result<()>,
    {
        let mut removed = 0;
        for summary in self.list()?.into_iter().skip(max_history) {
            let path = self.record_path(&summary.id);
            match remove(&path) {
                Ok(()) => removed += 1,
                Err(source) => {
                    let error = PruneIoError {
                        id: summary.id,
                        path,
                        source,
                    };
                    warn!(kind = %error.kind(), error = %error, "Skipping session during prune");
                }
            }
        }
        Ok(removed)
    }

    fn record_paths(&self) -> Result<Vec<PathBuf>, SessionError> {
        let entries = match fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(SessionError::Io {
                    path: self.directory.clone(),
                    source: e,
                });
            }
        };

        Ok(entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path.extension().and_then(|ext| ext.to_str()) == Some(RECORD_EXTENSION)
            })
            .collect())
    }
}

fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn read_record(path: &Path) -> Option<Session> {
    let content = fs::read_to_string(path).ok()?;
    match serde_json::from_str::<Session>(&content) {
        Ok(session) => Some(session),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Ignoring unreadable session record");
            None
        }
    }
}

/// Like [`read_record`], but only when the embedded id matches the file name
fn read_named_record(path: &Path) -> Option<Session> {
    let session = read_record(path)?;
    let stem = path.file_stem().and_then(|stem| stem.to_str());
    if stem == Some(session.id.as_str()) {
        Some(session)
    } else {
        debug!(
            path = %path.display(),
            id = %session.id,
            "Ignoring session record whose id does not match its file name"
        );
        None
    }
}

fn write_record(directory: &Path, path: &Path, content: &str) -> io::Result<()> {
    fs::create_dir_all(directory)?;
    let mut temp = tempfile::NamedTempFile::new_in(directory)?;
    temp.write_all(content.as_bytes())?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    include!("store.test.rs");
}
