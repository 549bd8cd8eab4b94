use super::*;
use crate::api::MockImageEditor;
use crate::bnn::edit::EditOptions;
use crate::bnn::image::{ImagePayload, ImageSource};
use crate::bnn::naming::OutputNamer;
use crate::bnn::store::SessionStore;
use crate::display::{DisplayCall, MockDisplayProvider};
use crate::primitives::{AspectRatio, NamingScheme, Resolution, ThinkingLevel};
use std::io::Cursor;
use tempfile::TempDir;

struct Fixture {
    temp: TempDir,
    store: SessionStore,
    session_id: String,
}

impl Fixture {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let store = SessionStore::new(temp.path().join("sessions"), 10);
        let input = ImagePayload::from_bytes(b"GIF89a\x01\x00\x01\x00", None);
        let session = store
            .create("m1", Some(ImageSource::Embedded(input)))
            .unwrap();
        Self {
            temp,
            store,
            session_id: session.id,
        }
    }

    fn turn<'a>(&'a self, editor: &'a MockImageEditor) -> EditTurn<'a> {
        let options = EditOptions {
            model: "m1".to_string(),
            resolution: Resolution::OneK,
            aspect_ratio: AspectRatio::Auto,
            thinking: ThinkingLevel::Low,
            reference_images: Vec::new(),
        };
        let namer = OutputNamer::new(self.temp.path().join("out"), NamingScheme::Sequential);
        EditTurn::new(&self.store, editor, namer, options)
    }
}

async fn drive(
    fixture: &Fixture,
    editor: &MockImageEditor,
    display: &MockDisplayProvider,
    script: &str,
) -> (LoopSummary, String) {
    let turn = fixture.turn(editor);
    let mut repl = InteractiveLoop::new(&turn, display, fixture.session_id.clone(), None);
    let mut echo = Vec::new();
    let summary = repl.run(Cursor::new(script), &mut echo).await.unwrap();
    (summary, String::from_utf8(echo).unwrap())
}

#[test]
fn test_lookup_is_case_insensitive_with_exit_alias() {
    assert_eq!(MetaCommand::lookup("HELP"), Some(MetaCommand::Help));
    assert_eq!(MetaCommand::lookup("exit"), Some(MetaCommand::Quit));
    assert_eq!(MetaCommand::lookup("redo"), None);
}

#[tokio::test]
async fn test_prompts_become_edits_until_end_of_input() {
    let fixture = Fixture::new();
    let editor = MockImageEditor::new();
    let display = MockDisplayProvider::new();

    let (summary, echo) = drive(&fixture, &editor, &display, "add a hat\nmake it red\n").await;

    assert_eq!(summary, LoopSummary { turns: 2, failures: 0 });
    assert_eq!(echo.matches(PROMPT).count(), 3);
    assert_eq!(editor.requests().len(), 2);

    let session = fixture.store.get(&fixture.session_id).unwrap();
    let prompts: Vec<&str> = session.history.iter().map(|e| e.prompt.as_str()).collect();
    assert_eq!(prompts, ["add a hat", "make it red"]);
    assert_eq!(display.count_calls("status_success"), 2);
}

#[tokio::test]
async fn test_blank_lines_are_ignored_and_quit_stops_reading() {
    let fixture = Fixture::new();
    let editor = MockImageEditor::new();
    let display = MockDisplayProvider::new();

    let (summary, echo) = drive(&fixture, &editor, &display, "\n   \n/quit\nnever sent\n").await;

    assert_eq!(summary, LoopSummary::default());
    assert_eq!(echo.matches(PROMPT).count(), 3);
    assert!(editor.requests().is_empty());
    assert!(fixture.store.get(&fixture.session_id).is_some());
}

#[tokio::test]
async fn test_unknown_command_warns_and_continues() {
    let fixture = Fixture::new();
    let editor = MockImageEditor::new();
    let display = MockDisplayProvider::new();

    let (summary, _) = drive(&fixture, &editor, &display, "/frobnicate\nadd a hat\n/exit\n").await;

    assert!(display.has_call(&DisplayCall::StatusWarning {
        message: "Unknown command '/frobnicate'. Type /help for commands.".to_string()
    }));
    assert_eq!(summary.turns, 1);
}

#[tokio::test]
async fn test_save_and_undo_work_on_the_output_stack() {
    let fixture = Fixture::new();
    let editor = MockImageEditor::new();
    let display = MockDisplayProvider::new();

    drive(&fixture, &editor, &display, "/save\nadd a hat\n/save\n/undo\n/undo\n").await;

    let infos: Vec<String> = display
        .get_calls()
        .into_iter()
        .filter_map(|call| match call {
            DisplayCall::StatusInfo { message } => Some(message),
            _ => None,
        })
        .skip(1)
        .collect();
    assert_eq!(infos[0], "Nothing generated yet");
    assert!(infos[1].starts_with("Already saved to "));
    assert!(infos[1].ends_with("bnn-0001.png"));
    assert!(infos[2].starts_with("Dropped "));
    assert_eq!(infos[3], "Nothing to undo");

    // undo never rewrites the durable session
    let session = fixture.store.get(&fixture.session_id).unwrap();
    assert_eq!(session.history.len(), 1);
    assert!(fixture.temp.path().join("out/bnn-0001.png").exists());
}

#[tokio::test]
async fn test_failed_edit_is_reported_and_loop_continues() {
    let fixture = Fixture::new();
    let editor = MockImageEditor::new().with_failure(500, "upstream exploded");
    let display = MockDisplayProvider::new();

    let (summary, _) = drive(&fixture, &editor, &display, "first\nsecond\n").await;

    assert_eq!(summary, LoopSummary { turns: 1, failures: 1 });
    assert_eq!(display.count_calls("status_error"), 1);
    assert!(display.mentions("upstream exploded"));
    assert_eq!(fixture.store.get(&fixture.session_id).unwrap().history.len(), 1);
}

#[tokio::test]
async fn test_history_lists_durable_prompts() {
    let fixture = Fixture::new();
    let editor = MockImageEditor::new();
    let display = MockDisplayProvider::new();

    drive(&fixture, &editor, &display, "/history\none\ntwo\n/history\n").await;

    assert!(display.mentions("No edits yet"));
    assert!(display.has_call(&DisplayCall::StatusSection {
        title: format!("Session {} (2 entries)", fixture.session_id)
    }));
    assert!(display.has_call(&DisplayCall::StatusList {
        items: vec!["1. one".to_string(), "2. two".to_string()]
    }));
}

#[tokio::test]
async fn test_seeded_output_is_undoable() {
    let fixture = Fixture::new();
    let editor = MockImageEditor::new();
    let display = MockDisplayProvider::new();
    let turn = fixture.turn(&editor);

    let mut repl = InteractiveLoop::new(
        &turn,
        &display,
        fixture.session_id.clone(),
        Some(PathBuf::from("first.png")),
    );
    assert_eq!(repl.last_output(), Some(&PathBuf::from("first.png")));
    assert_eq!(repl.handle_line("/undo").await, LoopControl::Continue);
    assert_eq!(repl.last_output(), None);
    assert_eq!(repl.handle_line(" /QUIT ").await, LoopControl::Quit);
}
