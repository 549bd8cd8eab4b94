//! Gemini `generateContent` client
//!
//! Images travel as `inlineData` parts ahead of the prompt text. One request
//! per call; there are no retries.

use super::{ApiError, EditRequest, EditResponse, ImageEditor};
use crate::application::config::ApiConfig;
use crate::bnn::image::{self, ImagePayload};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Client;
use serde_json::{Map, Value, json};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tracing::{debug, trace};

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const API_KEY_HEADER: &str = "x-goog-api-key";

pub struct GeminiClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(endpoint: &str, api_key: Option<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("bnn/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        Self::new(&config.endpoint, config.key.clone())
    }

    pub fn url_for_model(&self, model: &str) -> String {
        let model = model.trim();
        let path = model.strip_prefix("models/").unwrap_or(model);
        format!("{}/models/{path}:generateContent", self.endpoint)
    }

    pub async fn generate_content(&self, request: &EditRequest) -> Result<EditResponse, ApiError> {
        let api_key = self.api_key.as_deref().ok_or(ApiError::MissingApiKey)?;
        let url = self.url_for_model(&request.model);
        let body = request_body(request);

        debug!(
            model = %request.model,
            resolution = %request.resolution,
            aspect_ratio = %request.aspect_ratio,
            has_input = request.input_image.is_some(),
            references = request.reference_images.len(),
            "Calling image API"
        );

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        trace!(status = status.as_u16(), bytes = text.len(), "Image API responded");

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        let payload: Value =
            serde_json::from_str(&text).map_err(|e| ApiError::InvalidResponse {
                reason: e.to_string(),
            })?;
        parse_response(&payload)
    }
}

impl ImageEditor for GeminiClient {
    fn edit(
        &self,
        request: EditRequest,
    ) -> Pin<Box<dyn Future<Output = Result<EditResponse, ApiError>> + Send + '_>> {
        Box::pin(async move { self.generate_content(&request).await })
    }
}

fn inline_part(payload: &ImagePayload) -> Value {
    json!({
        "inlineData": {
            "mimeType": payload.mime_type,
            "data": payload.data,
        }
    })
}

/// JSON body for one request
pub fn request_body(request: &EditRequest) -> Value {
    let mut parts: Vec<Value> = Vec::new();
    if let Some(input) = &request.input_image {
        parts.push(inline_part(input));
    }
    parts.extend(request.reference_images.iter().map(inline_part));
    parts.push(json!({ "text": request.prompt }));

    let mut image_config = Map::new();
    image_config.insert(
        "imageSize".to_string(),
        Value::String(request.resolution.api_size().to_string()),
    );
    if let Some(ratio) = request.aspect_ratio.api_ratio() {
        image_config.insert("aspectRatio".to_string(), Value::String(ratio));
    }

    json!({
        "contents": [{ "role": "user", "parts": parts }],
        "generationConfig": {
            "responseModalities": ["TEXT", "IMAGE"],
            "imageConfig": image_config,
            "thinkingConfig": { "thinkingLevel": request.thinking.as_str() },
        },
    })
}

/// Pull the first inline image, the text parts and grounding sources
pub fn parse_response(payload: &Value) -> Result<EditResponse, ApiError> {
    let candidates = payload
        .get("candidates")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut image_data: Option<ImagePayload> = None;
    let mut texts: Vec<String> = Vec::new();
    let mut sources: Vec<String> = Vec::new();

    for candidate in &candidates {
        let parts = candidate
            .get("content")
            .and_then(|content| content.get("parts"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        for part in &parts {
            if part.get("thought").and_then(Value::as_bool) == Some(true) {
                continue;
            }
            if let Some(text) = part.get("text").and_then(Value::as_str) {
                if !text.trim().is_empty() {
                    texts.push(text.trim().to_string());
                }
                continue;
            }

            let Some(inline) = part.get("inlineData").or_else(|| part.get("inline_data")) else {
                continue;
            };
            let data = inline.get("data").and_then(Value::as_str).unwrap_or_default();
            if data.is_empty() || image_data.is_some() {
                continue;
            }
            let mime_type = inline
                .get("mimeType")
                .or_else(|| inline.get("mime_type"))
                .and_then(Value::as_str)
                .unwrap_or(image::DEFAULT_MIME);
            image_data = Some(ImagePayload {
                mime_type: mime_type.to_string(),
                data: data.to_string(),
            });
        }

        let chunks = candidate
            .get("groundingMetadata")
            .and_then(|metadata| metadata.get("groundingChunks"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        for chunk in &chunks {
            let uri = chunk
                .get("web")
                .and_then(|web| web.get("uri"))
                .and_then(Value::as_str);
            if let Some(uri) = uri {
                if !sources.iter().any(|known| known == uri) {
                    sources.push(uri.to_string());
                }
            }
        }
    }

    let text = (!texts.is_empty()).then(|| texts.join("\n"));
    let Some(mut image_data) = image_data else {
        return Err(ApiError::NoImage { text });
    };

    let bytes = BASE64
        .decode(image_data.data.as_bytes())
        .map_err(|e| ApiError::InvalidResponse {
            reason: format!("image data is not base64: {e}"),
        })?;
    if let Some(sniffed) = image::sniff_mime(&bytes) {
        image_data.mime_type = sniffed.to_string();
    }
    let dimensions = image::dimensions(&bytes);

    Ok(EditResponse {
        image_data,
        text,
        width: dimensions.map(|(width, _)| width),
        height: dimensions.map(|(_, height)| height),
        sources,
    })
}

/// Human-readable message from an error body
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("error")
                .and_then(|error| error.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "empty response body".to_string()
            } else {
                trimmed.chars().take(200).collect()
            }
        })
}

#[cfg(test)]
mod tests {
    include!("gemini.test.rs");
}
