//! One edit turn against a session
//!
//! Fetch the continuation image, call the image API, write the result and
//! append it to the session history. Shared by `generate`, `edit` and the
//! interactive loop.

use crate::api::{EditRequest, EditResponse, ImageEditor};
use crate::bnn::image::ImagePayload;
use crate::bnn::naming::OutputNamer;
use crate::bnn::store::{Session, SessionStore};
use crate::primitives::{AspectRatio, Resolution, SessionError, ThinkingLevel};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Model parameters fixed for every turn of one invocation
#[derive(Debug, Clone, PartialEq)]
pub struct EditOptions {
    pub model: String,
    pub resolution: Resolution,
    pub aspect_ratio: AspectRatio,
    pub thinking: ThinkingLevel,
    pub reference_images: Vec<ImagePayload>,
}

/// Where the turn's input image comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnInput {
    /// Text only; the session's images are not sent
    Generate,
    /// The session's continuation image; its absence is an error
    Continue,
}

#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub output: PathBuf,
    pub session: Session,
    pub response: EditResponse,
}

pub struct EditTurn<'a> {
    store: &'a SessionStore,
    editor: &'a dyn ImageEditor,
    namer: OutputNamer,
    options: EditOptions,
}

impl<'a> EditTurn<'a> {
    pub fn new(
        store: &'a SessionStore,
        editor: &'a dyn ImageEditor,
        namer: OutputNamer,
        options: EditOptions,
    ) -> Self {
        Self {
            store,
            editor,
            namer,
            options,
        }
    }

    pub fn store(&self) -> &SessionStore {
        self.store
    }

    /// Run one turn; `output` bypasses the naming scheme
    pub async fn run(
        &self,
        session_id: &str,
        prompt: &str,
        input: TurnInput,
        output: Option<&Path>,
    ) -> Result<TurnOutcome> {
        let input_image = match input {
            TurnInput::Generate => None,
            TurnInput::Continue => {
                if self.store.get(session_id).is_none() {
                    return Err(SessionError::NotFound {
                        id: session_id.to_string(),
                    }
                    .into());
                }
                let source = self.store.last_image_data(session_id).ok_or_else(|| {
                    SessionError::NoContinuationImage {
                        id: session_id.to_string(),
                    }
                })?;
                Some(source.to_payload()?)
            }
        };

        let request = EditRequest {
            model: self.options.model.clone(),
            prompt: prompt.to_string(),
            input_image,
            resolution: self.options.resolution,
            aspect_ratio: self.options.aspect_ratio,
            thinking: self.options.thinking,
            reference_images: self.options.reference_images.clone(),
        };
        let response = self.editor.edit(request).await?;

        let path = match output {
            Some(path) => path.to_path_buf(),
            None => self
                .namer
                .next_path(prompt, response.image_data.extension()),
        };
        response
            .image_data
            .save(&path)
            .with_context(|| format!("Failed to write output image '{}'", path.display()))?;

        let session = self
            .store
            .append_entry(session_id, prompt, &path, Some(response.image_data.clone()))?
            .ok_or_else(|| SessionError::NotFound {
                id: session_id.to_string(),
            })?;

        info!(session = session_id, output = %path.display(), "Edit turn completed");
        Ok(TurnOutcome {
            output: path,
            session,
            response,
        })
    }
}

#[cfg(test)]
mod tests {
    include!("edit.test.rs");
}
