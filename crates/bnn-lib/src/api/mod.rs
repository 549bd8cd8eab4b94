//! # API Module
//!
//! The image edit/generate capability consumed by commands and the
//! interactive loop, plus its Gemini implementation.
//!
//! ## Modules
//!
//! - [`gemini`] - `generateContent` client over `reqwest`
//! - `mock` - scripted [`ImageEditor`] for tests (`test-utils` feature)

use crate::bnn::image::ImagePayload;
use crate::primitives::{AspectRatio, ErrorKind, Resolution, ThinkingLevel};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

pub mod gemini;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use gemini::GeminiClient;
#[cfg(any(test, feature = "test-utils"))]
pub use mock::MockImageEditor;

/// Upstream image API failures
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No API key configured; pipe one in with: echo $KEY | bnn config set api.key=-")]
    MissingApiKey,

    #[error("HTTP request failed: {source}")]
    RequestFailed {
        #[from]
        source: reqwest::Error,
    },

    #[error("Image API returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Image API response contained no image{}", model_note(.text))]
    NoImage { text: Option<String> },

    #[error("Invalid image API response: {reason}")]
    InvalidResponse { reason: String },
}

fn model_note(text: &Option<String>) -> String {
    text.as_deref()
        .map(|text| format!(" (model said: {text})"))
        .unwrap_or_default()
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::ApiError
    }
}

/// One edit or generation call
#[derive(Debug, Clone, PartialEq)]
pub struct EditRequest {
    pub model: String,
    pub prompt: String,
    /// `None` generates from text alone
    pub input_image: Option<ImagePayload>,
    pub resolution: Resolution,
    pub aspect_ratio: AspectRatio,
    pub thinking: ThinkingLevel,
    pub reference_images: Vec<ImagePayload>,
}

/// Result of a successful call
#[derive(Debug, Clone, PartialEq)]
pub struct EditResponse {
    pub image_data: ImagePayload,
    pub text: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub sources: Vec<String>,
}

/// The edit/generate capability
pub trait ImageEditor: Send + Sync {
    fn edit(
        &self,
        request: EditRequest,
    ) -> Pin<Box<dyn Future<Output = Result<EditResponse, ApiError>> + Send + '_>>;
}
