use super::*;
use crate::api::MockImageEditor;
use crate::api::mock::MOCK_PNG;
use crate::bnn::image::ImageSource;
use crate::primitives::NamingScheme;
use std::fs;
use tempfile::TempDir;

fn options() -> EditOptions {
    EditOptions {
        model: "m1".to_string(),
        resolution: Resolution::OneK,
        aspect_ratio: AspectRatio::Auto,
        thinking: ThinkingLevel::Low,
        reference_images: Vec::new(),
    }
}

fn input_payload() -> ImagePayload {
    ImagePayload::from_bytes(b"GIF89a\x02\x00\x03\x00", None)
}

#[tokio::test]
async fn test_continue_sends_input_image_and_records_entry() {
    let temp = TempDir::new().unwrap();
    let store = SessionStore::new(temp.path().join("sessions"), 10);
    let editor = MockImageEditor::new();
    let namer = OutputNamer::new(temp.path().join("out"), NamingScheme::Sequential);
    let turn = EditTurn::new(&store, &editor, namer, options());

    let session = store
        .create("m1", Some(ImageSource::Embedded(input_payload())))
        .unwrap();
    let outcome = turn
        .run(&session.id, "add a hat", TurnInput::Continue, None)
        .await
        .unwrap();

    assert_eq!(outcome.output, temp.path().join("out").join("bnn-0001.png"));
    assert_eq!(fs::read(&outcome.output).unwrap(), MOCK_PNG);
    assert_eq!(outcome.session.history.len(), 1);
    assert_eq!(outcome.session.history[0].prompt, "add a hat");

    let requests = editor.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].input_image, Some(input_payload()));
    assert_eq!(requests[0].model, "m1");
}

#[tokio::test]
async fn test_second_turn_continues_from_first_output() {
    let temp = TempDir::new().unwrap();
    let store = SessionStore::new(temp.path().join("sessions"), 10);
    let editor = MockImageEditor::new();
    let namer = OutputNamer::new(temp.path().join("out"), NamingScheme::Sequential);
    let turn = EditTurn::new(&store, &editor, namer, options());

    let session = store
        .create("m1", Some(ImageSource::Embedded(input_payload())))
        .unwrap();
    turn.run(&session.id, "one", TurnInput::Continue, None)
        .await
        .unwrap();
    let second = turn
        .run(&session.id, "two", TurnInput::Continue, None)
        .await
        .unwrap();

    let requests = editor.requests();
    assert_eq!(
        requests[1].input_image,
        Some(ImagePayload::from_bytes(MOCK_PNG, None))
    );
    assert_eq!(second.output.file_name().unwrap(), "bnn-0002.png");
    assert_eq!(second.session.history.len(), 2);
}

#[tokio::test]
async fn test_generate_sends_no_input_image() {
    let temp = TempDir::new().unwrap();
    let store = SessionStore::new(temp.path().join("sessions"), 10);
    let editor = MockImageEditor::new();
    let namer = OutputNamer::new(temp.path(), NamingScheme::Sequential);
    let turn = EditTurn::new(&store, &editor, namer, options());

    let session = store.create("m1", None).unwrap();
    let explicit = temp.path().join("chosen.png");
    let outcome = turn
        .run(&session.id, "a cat", TurnInput::Generate, Some(&explicit))
        .await
        .unwrap();

    assert_eq!(outcome.output, explicit);
    assert!(explicit.exists());
    assert_eq!(editor.requests()[0].input_image, None);
}

#[tokio::test]
async fn test_continue_without_image_is_rejected_before_api_call() {
    let temp = TempDir::new().unwrap();
    let store = SessionStore::new(temp.path().join("sessions"), 10);
    let editor = MockImageEditor::new();
    let namer = OutputNamer::new(temp.path(), NamingScheme::Sequential);
    let turn = EditTurn::new(&store, &editor, namer, options());

    let session = store.create("m1", None).unwrap();
    let err = turn
        .run(&session.id, "edit", TurnInput::Continue, None)
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<SessionError>(),
        Some(SessionError::NoContinuationImage { .. })
    ));
    assert!(editor.requests().is_empty());
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let temp = TempDir::new().unwrap();
    let store = SessionStore::new(temp.path().join("sessions"), 10);
    let editor = MockImageEditor::new();
    let namer = OutputNamer::new(temp.path(), NamingScheme::Sequential);
    let turn = EditTurn::new(&store, &editor, namer, options());

    let err = turn
        .run("deadbeef", "edit", TurnInput::Continue, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SessionError>(),
        Some(SessionError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_api_failure_leaves_session_unchanged() {
    let temp = TempDir::new().unwrap();
    let store = SessionStore::new(temp.path().join("sessions"), 10);
    let editor = MockImageEditor::new().with_failure(429, "quota exceeded");
    let namer = OutputNamer::new(temp.path().join("out"), NamingScheme::Sequential);
    let turn = EditTurn::new(&store, &editor, namer, options());

    let session = store
        .create("m1", Some(ImageSource::Embedded(input_payload())))
        .unwrap();
    let err = turn
        .run(&session.id, "edit", TurnInput::Continue, None)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("quota exceeded"));
    assert!(store.get(&session.id).unwrap().history.is_empty());
    assert!(!temp.path().join("out").exists());
}

#[tokio::test]
async fn test_response_dimensions_and_bytes_follow_the_reply() {
    let temp = TempDir::new().unwrap();
    let store = SessionStore::new(temp.path().join("sessions"), 10);
    let mut wide = MOCK_PNG.to_vec();
    wide[19] = 3;
    let editor = MockImageEditor::new().with_image(&wide);
    let namer = OutputNamer::new(temp.path().join("out"), NamingScheme::Sequential);
    let turn = EditTurn::new(&store, &editor, namer, options());

    let session = store.create("m1", None).unwrap();
    let outcome = turn
        .run(&session.id, "a banner", TurnInput::Generate, None)
        .await
        .unwrap();

    assert_eq!(outcome.response.width, Some(3));
    assert_eq!(outcome.response.height, Some(1));
    assert_eq!(fs::read(&outcome.output).unwrap(), wide);
}
