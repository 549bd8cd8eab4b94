//! Canned image API response bodies for mockito servers

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::json;

pub use bnn_lib::api::mock::MOCK_PNG;

/// Successful `generateContent` body carrying `image` and an optional text part
pub fn image_body(image: &[u8], text: Option<&str>) -> String {
    let mut parts = Vec::new();
    if let Some(text) = text {
        parts.push(json!({ "text": text }));
    }
    parts.push(json!({
        "inlineData": { "mimeType": "image/png", "data": BASE64.encode(image) }
    }));

    json!({ "candidates": [{ "content": { "parts": parts } }] }).to_string()
}

/// Successful body whose only part is text, e.g. a refusal
pub fn text_only_body(text: &str) -> String {
    json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] }).to_string()
}

/// Upstream error body in the API's `{"error":{...}}` shape
pub fn error_body(status: u16, message: &str) -> String {
    json!({
        "error": { "code": status, "message": message, "status": "INVALID_ARGUMENT" }
    })
    .to_string()
}
