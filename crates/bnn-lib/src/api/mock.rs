//! Scripted [`ImageEditor`] for tests

use super::{ApiError, EditRequest, EditResponse, ImageEditor};
use crate::bnn::image::{self, ImagePayload};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

/// Smallest PNG header [`crate::bnn::image::dimensions`] understands (1x1)
pub const MOCK_PNG: &[u8] = &[
    0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13, b'I', b'H', b'D', b'R', 0, 0, 0,
    1, 0, 0, 0, 1, 8, 6, 0, 0, 0,
];

enum Scripted {
    Success(EditResponse),
    Failure { status: u16, message: String },
}

/// Replies from a queue, falling back to a 1x1 PNG; records every request
#[derive(Clone, Default)]
pub struct MockImageEditor {
    script: Arc<Mutex<VecDeque<Scripted>>>,
    requests: Arc<Mutex<Vec<EditRequest>>>,
}

impl MockImageEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply carrying `bytes`
    pub fn with_image(self, bytes: &[u8]) -> Self {
        self.push(Scripted::Success(Self::response_for(bytes)));
        self
    }

    /// Queue an upstream failure
    pub fn with_failure(self, status: u16, message: &str) -> Self {
        self.push(Scripted::Failure {
            status,
            message: message.to_string(),
        });
        self
    }

    fn push(&self, reply: Scripted) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(reply);
        }
    }

    pub fn response_for(bytes: &[u8]) -> EditResponse {
        let size = image::dimensions(bytes);
        EditResponse {
            image_data: ImagePayload::from_bytes(bytes, None),
            text: None,
            width: size.map(|(width, _)| width),
            height: size.map(|(_, height)| height),
            sources: Vec::new(),
        }
    }

    pub fn requests(&self) -> Vec<EditRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

impl ImageEditor for MockImageEditor {
    fn edit(
        &self,
        request: EditRequest,
    ) -> Pin<Box<dyn Future<Output = Result<EditResponse, ApiError>> + Send + '_>> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        let next = self.script.lock().ok().and_then(|mut script| script.pop_front());
        let result = match next {
            Some(Scripted::Success(response)) => Ok(response),
            Some(Scripted::Failure { status, message }) => Err(ApiError::Status { status, message }),
            None => Ok(Self::response_for(MOCK_PNG)),
        };
        Box::pin(async move { result })
    }
}
