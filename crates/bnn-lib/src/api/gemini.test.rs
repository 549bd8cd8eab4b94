use super::*;
use crate::primitives::{AspectRatio, Resolution, ThinkingLevel};
use mockito::{Matcher, Server};

const PNG_1X1: &[u8] = &[
    0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13, b'I', b'H', b'D', b'R', 0, 0, 0,
    1, 0, 0, 0, 1, 8, 6, 0, 0, 0,
];

fn request() -> EditRequest {
    EditRequest {
        model: "gemini-test".to_string(),
        prompt: "make it blue".to_string(),
        input_image: Some(ImagePayload {
            mime_type: "image/jpeg".to_string(),
            data: "aW5wdXQ=".to_string(),
        }),
        resolution: Resolution::TwoK,
        aspect_ratio: AspectRatio::Landscape16x9,
        thinking: ThinkingLevel::High,
        reference_images: vec![ImagePayload {
            mime_type: "image/png".to_string(),
            data: "cmVm".to_string(),
        }],
    }
}

fn image_response() -> Value {
    json!({
        "candidates": [{
            "content": {
                "parts": [
                    { "text": "thinking...", "thought": true },
                    { "text": "Here you go." },
                    { "inlineData": { "mimeType": "image/png", "data": BASE64.encode(PNG_1X1) } }
                ]
            },
            "groundingMetadata": {
                "groundingChunks": [
                    { "web": { "uri": "https://a.example" } },
                    { "web": { "uri": "https://a.example" } },
                    { "web": { "uri": "https://b.example" } }
                ]
            }
        }]
    })
}

#[test]
fn test_request_body_orders_images_before_text() {
    let body = request_body(&request());
    let parts = body["contents"][0]["parts"].as_array().unwrap();

    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0]["inlineData"]["mimeType"], "image/jpeg");
    assert_eq!(parts[1]["inlineData"]["data"], "cmVm");
    assert_eq!(parts[2]["text"], "make it blue");

    let config = &body["generationConfig"];
    assert_eq!(config["responseModalities"], json!(["TEXT", "IMAGE"]));
    assert_eq!(config["imageConfig"]["imageSize"], "2K");
    assert_eq!(config["imageConfig"]["aspectRatio"], "16:9");
    assert_eq!(config["thinkingConfig"]["thinkingLevel"], "high");
}

#[test]
fn test_request_body_omits_auto_aspect_ratio() {
    let mut request = request();
    request.aspect_ratio = AspectRatio::Auto;
    request.input_image = None;
    request.reference_images.clear();

    let body = request_body(&request);
    assert!(body["generationConfig"]["imageConfig"].get("aspectRatio").is_none());
    assert_eq!(body["contents"][0]["parts"].as_array().unwrap().len(), 1);
}

#[test]
fn test_parse_response_extracts_image_text_and_sources() {
    let response = parse_response(&image_response()).unwrap();

    assert_eq!(response.image_data.mime_type, "image/png");
    assert_eq!(response.text.as_deref(), Some("Here you go."));
    assert_eq!(response.sources, ["https://a.example", "https://b.example"]);
    assert_eq!((response.width, response.height), (Some(1), Some(1)));
}

#[test]
fn test_parse_response_without_image_is_error() {
    let payload = json!({
        "candidates": [{ "content": { "parts": [{ "text": "I cannot draw that." }] } }]
    });
    let err = parse_response(&payload).unwrap_err();
    assert!(matches!(err, ApiError::NoImage { .. }));
    assert!(err.to_string().contains("I cannot draw that."));
}

#[test]
fn test_url_for_model_accepts_prefixed_names() {
    let client = GeminiClient::new("https://api.example/v1beta/", Some("k".to_string())).unwrap();
    assert_eq!(
        client.url_for_model("models/gemini-x"),
        "https://api.example/v1beta/models/gemini-x:generateContent"
    );
}

#[tokio::test]
async fn test_generate_content_posts_with_api_key_header() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/models/gemini-test:generateContent")
        .match_header("x-goog-api-key", "secret-key")
        .match_body(Matcher::PartialJson(json!({
            "generationConfig": { "imageConfig": { "imageSize": "2K" } }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(image_response().to_string())
        .expect(1)
        .create_async()
        .await;

    let client = GeminiClient::new(&server.url(), Some("secret-key".to_string())).unwrap();
    let response = client.edit(request()).await.unwrap();

    assert_eq!(response.image_data.decode().unwrap(), PNG_1X1);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_generate_content_surfaces_upstream_error_message() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/models/gemini-test:generateContent")
        .with_status(400)
        .with_body(r#"{"error":{"code":400,"message":"API key not valid"}}"#)
        .create_async()
        .await;

    let client = GeminiClient::new(&server.url(), Some("bad".to_string())).unwrap();
    let err = client.generate_content(&request()).await.unwrap_err();

    match err {
        ApiError::Status { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "API key not valid");
        }
        other => panic!("expected Status, got {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_api_key_fails_before_any_request() {
    let client = GeminiClient::new("http://127.0.0.1:9", Some("   ".to_string())).unwrap();
    let err = client.generate_content(&request()).await.unwrap_err();
    assert!(matches!(err, ApiError::MissingApiKey));
    assert_eq!(err.kind(), crate::primitives::ErrorKind::ApiError);
}
