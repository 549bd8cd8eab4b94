use super::*;
use crate::api::MockImageEditor;
use crate::api::mock::MOCK_PNG;
use crate::application::cli::Cli;
use crate::application::context_mocks::MockCommandContext;
use crate::display::DisplayCall;
use crate::primitives::ErrorKind;
use clap::Parser;
use tempfile::TempDir;

const INPUT_GIF: &[u8] = b"GIF89a\x04\x00\x02\x00";

async fn run(context: &MockCommandContext, args: &[&str]) -> Result<()> {
    let cli = Cli::try_parse_from(std::iter::once("bnn").chain(args.iter().copied())).unwrap();
    execute_command_with_context(cli.command.unwrap(), context).await
}

fn input_image(context: &MockCommandContext) -> String {
    let path = context.root().join("input.gif");
    fs::write(&path, INPUT_GIF).unwrap();
    path.display().to_string()
}

// ===== GENERATE TESTS =====

mod generate_tests {
    use super::*;

    #[tokio::test]
    async fn it_creates_a_session_with_one_entry() {
        let temp = TempDir::new().unwrap();
        let context = MockCommandContext::new(temp.path()).unwrap().with_json();

        run(&context, &["generate", "a red fox", "--resolution", "2k"])
            .await
            .unwrap();

        let report = context.display_mock().last_json().unwrap();
        let id = report["session_id"].as_str().unwrap();
        let session = context.store().get(id).unwrap();
        assert_eq!(session.history.len(), 1);
        assert_eq!(session.history[0].prompt, "a red fox");
        assert!(session.input_image.is_none());
        assert_eq!(fs::read(&session.history[0].output).unwrap(), MOCK_PNG);
        assert!(session.history[0].output.starts_with(temp.path().join("out")));

        let request = &context.editor_mock().requests()[0];
        assert_eq!(request.input_image, None);
        assert_eq!(request.resolution.as_str(), "2k");
        assert_eq!(request.model, context.config().model.default);
    }

    #[tokio::test]
    async fn it_honours_explicit_output_and_references() {
        let temp = TempDir::new().unwrap();
        let context = MockCommandContext::new(temp.path()).unwrap();
        let reference = input_image(&context);
        let output = temp.path().join("chosen.png");

        run(
            &context,
            &[
                "generate",
                "a cat",
                "--ref",
                &reference,
                "--output",
                &output.display().to_string(),
            ],
        )
        .await
        .unwrap();

        assert!(output.exists());
        let request = &context.editor_mock().requests()[0];
        assert_eq!(request.reference_images.len(), 1);
        assert_eq!(request.reference_images[0].mime_type, "image/gif");
        assert_eq!(context.display_mock().count_calls("status_success"), 1);
    }

    #[tokio::test]
    async fn it_discards_the_session_when_the_api_fails() {
        let temp = TempDir::new().unwrap();
        let context = MockCommandContext::new(temp.path())
            .unwrap()
            .with_editor(MockImageEditor::new().with_failure(403, "API key not valid"));

        let err = run(&context, &["generate", "a cat"]).await.unwrap_err();

        assert_eq!(ErrorKind::of(&err), ErrorKind::ApiError);
        assert!(context.store().list().unwrap().is_empty());
        assert_eq!(context.display_mock().count_calls("progress_abandon"), 1);
    }
}

// ===== EDIT TESTS =====

mod edit_tests {
    use super::*;

    #[tokio::test]
    async fn it_starts_a_session_from_an_image() {
        let temp = TempDir::new().unwrap();
        let context = MockCommandContext::new(temp.path()).unwrap().with_json();
        let image = input_image(&context);

        run(&context, &["edit", "add a hat", "--image", &image])
            .await
            .unwrap();

        let report = context.display_mock().last_json().unwrap();
        let session = context
            .store()
            .get(report["session_id"].as_str().unwrap())
            .unwrap();
        assert_eq!(
            session.input_image,
            Some(ImageSource::Embedded(ImagePayload::from_bytes(INPUT_GIF, None)))
        );
        assert_eq!(
            context.editor_mock().requests()[0].input_image,
            Some(ImagePayload::from_bytes(INPUT_GIF, None))
        );
    }

    #[tokio::test]
    async fn it_continues_a_session_from_its_last_output() {
        let temp = TempDir::new().unwrap();
        let context = MockCommandContext::new(temp.path()).unwrap();
        let image = input_image(&context);
        run(&context, &["edit", "one", "--image", &image]).await.unwrap();
        let id = context.store().latest().unwrap().unwrap().id;

        run(&context, &["edit", "two", "--session", &id]).await.unwrap();

        let requests = context.editor_mock().requests();
        assert_eq!(
            requests[1].input_image,
            Some(ImagePayload::from_bytes(MOCK_PNG, None))
        );
        let session = context.store().get(&id).unwrap();
        assert_eq!(session.history.len(), 2);
        assert_eq!(context.store().list().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn it_continues_the_latest_session() {
        let temp = TempDir::new().unwrap();
        let context = MockCommandContext::new(temp.path()).unwrap();
        run(&context, &["generate", "a cat"]).await.unwrap();
        let id = context.store().latest().unwrap().unwrap().id;

        run(&context, &["edit", "make it blue", "--continue"])
            .await
            .unwrap();

        assert_eq!(context.store().get(&id).unwrap().history.len(), 2);
    }

    #[tokio::test]
    async fn it_reports_unknown_sessions() {
        let temp = TempDir::new().unwrap();
        let context = MockCommandContext::new(temp.path()).unwrap();

        let err = run(&context, &["edit", "x", "--session", "deadbeef"])
            .await
            .unwrap_err();
        assert_eq!(ErrorKind::of(&err), ErrorKind::SessionNotFound);

        let err = run(&context, &["edit", "x", "--continue"]).await.unwrap_err();
        assert_eq!(ErrorKind::of(&err), ErrorKind::SessionNotFound);
        assert!(context.editor_mock().requests().is_empty());
    }

    #[tokio::test]
    async fn it_rejects_a_session_without_images() {
        let temp = TempDir::new().unwrap();
        let context = MockCommandContext::new(temp.path()).unwrap();
        let session = context.store().create("m1", None).unwrap();

        let err = run(&context, &["edit", "x", "--session", &session.id])
            .await
            .unwrap_err();
        assert_eq!(ErrorKind::of(&err), ErrorKind::NoContinuationImage);
        // a continued session is never discarded
        assert!(context.store().get(&session.id).is_some());
    }

    #[tokio::test]
    async fn it_requires_an_edit_target() {
        let temp = TempDir::new().unwrap();
        let context = MockCommandContext::new(temp.path()).unwrap();
        let err = run(&context, &["edit", "x"]).await.unwrap_err();
        assert!(err.to_string().contains("Nothing to edit"));
    }

    #[tokio::test]
    async fn it_runs_the_interactive_loop_on_the_same_session() {
        let temp = TempDir::new().unwrap();
        let context = MockCommandContext::new(temp.path())
            .unwrap()
            .with_script("brighter\n\n/undo\nwarmer\n/quit\n");
        let image = input_image(&context);

        run(&context, &["edit", "crop", "--image", &image, "--interactive"])
            .await
            .unwrap();

        let session = context.store().latest().unwrap().unwrap();
        assert_eq!(session.history_count, 3);
        assert_eq!(session.last_prompt.as_deref(), Some("warmer"));
        assert!(context.display_mock().has_call(&DisplayCall::StatusInfo {
            message: "2 edit(s) this run, 0 failed".to_string()
        }));
    }

    #[tokio::test]
    async fn it_refuses_interactive_json() {
        let temp = TempDir::new().unwrap();
        let context = MockCommandContext::new(temp.path()).unwrap().with_json();
        let err = run(&context, &["edit", "x", "--continue", "--interactive"])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("--interactive"));
    }
}

// ===== CONFIG TESTS =====

mod config_tests {
    use super::*;

    #[tokio::test]
    async fn it_masks_secrets_in_get_and_list() {
        let temp = TempDir::new().unwrap();
        let context = MockCommandContext::new(temp.path()).unwrap();

        run(&context, &["config", "get", "api.key"]).await.unwrap();
        assert!(context.display_mock().has_call(&DisplayCall::StatusMessage {
            text: "****1234".to_string()
        }));

        run(&context, &["config", "list"]).await.unwrap();
        assert!(context.display_mock().mentions("api.key ****1234"));
        assert!(!context.display_mock().mentions("test-api-key"));
    }

    #[tokio::test]
    async fn it_prints_json_values() {
        let temp = TempDir::new().unwrap();
        let context = MockCommandContext::new(temp.path()).unwrap().with_json();

        run(&context, &["config", "get", "session.max_history"])
            .await
            .unwrap();
        assert_eq!(
            context.display_mock().last_json().unwrap(),
            json!({ "key": "session.max_history", "value": 50 })
        );

        run(&context, &["config", "list"]).await.unwrap();
        let listing = context.display_mock().last_json().unwrap();
        assert_eq!(listing["output"]["resolution"], "1k");
        assert_eq!(listing["api"]["key"], "****1234");
    }

    #[tokio::test]
    async fn it_rejects_unknown_keys_on_get() {
        let temp = TempDir::new().unwrap();
        let context = MockCommandContext::new(temp.path()).unwrap();
        let err = run(&context, &["config", "get", "output.colour"])
            .await
            .unwrap_err();
        assert_eq!(ErrorKind::of(&err), ErrorKind::SchemaValidationError);
    }

    #[tokio::test]
    async fn it_sets_values_in_the_chosen_layer() {
        let temp = TempDir::new().unwrap();
        let context = MockCommandContext::new(temp.path()).unwrap();

        run(
            &context,
            &["config", "set", "output.resolution=4K", "model.thinking=high", "--project"],
        )
        .await
        .unwrap();

        let project = context.mutator().read(ConfigLayer::Project).unwrap();
        assert_eq!(project["output"]["resolution"].as_str(), Some("4k"));
        assert_eq!(project["model"]["thinking"].as_str(), Some("high"));
        assert!(context.mutator().read(ConfigLayer::Global).unwrap().is_empty());
    }

    #[tokio::test]
    async fn it_enforces_the_secret_policy() {
        let temp = TempDir::new().unwrap();
        let context = MockCommandContext::new(temp.path()).unwrap();
        let err = run(&context, &["config", "set", "api.key=literal-secret"])
            .await
            .unwrap_err();
        assert_eq!(ErrorKind::of(&err), ErrorKind::SecretViaArgvRejected);

        let err = run(&context, &["config", "set", "api.key=-"]).await.unwrap_err();
        assert_eq!(ErrorKind::of(&err), ErrorKind::SecretStdinUnavailable);

        let context = context.with_piped_secret("abc123\n");
        run(&context, &["config", "set", "api.key=-"]).await.unwrap();
        let global = context.mutator().read(ConfigLayer::Global).unwrap();
        assert_eq!(global["api"]["key"].as_str(), Some("abc123"));
        assert!(!context.display_mock().mentions("abc123"));
    }

    #[tokio::test]
    async fn it_unsets_keys_and_counts_them() {
        let temp = TempDir::new().unwrap();
        let context = MockCommandContext::new(temp.path()).unwrap().with_json();
        run(&context, &["config", "set", "output.naming=prompt"])
            .await
            .unwrap();

        run(&context, &["config", "unset", "output.naming", "model.default"])
            .await
            .unwrap();
        assert_eq!(context.display_mock().last_json().unwrap()["removed"], 1);

        run(&context, &["config", "unset", "output.naming"]).await.unwrap();
        assert_eq!(context.display_mock().last_json().unwrap()["removed"], 0);
    }

    #[tokio::test]
    async fn it_initializes_a_layer_once() {
        let temp = TempDir::new().unwrap();
        let context = MockCommandContext::new(temp.path()).unwrap();

        run(&context, &["config", "init"]).await.unwrap();
        let path = context.mutator().path(ConfigLayer::Global).unwrap();
        assert!(path.exists());

        let err = run(&context, &["config", "init", "--global"]).await.unwrap_err();
        assert_eq!(ErrorKind::of(&err), ErrorKind::AlreadyExists);
    }

    #[tokio::test]
    async fn it_imports_only_valid_documents() {
        let temp = TempDir::new().unwrap();
        let context = MockCommandContext::new(temp.path()).unwrap();
        let bad = temp.path().join("bad.toml");
        fs::write(&bad, "[output]\nresolution = \"8k\"\n").unwrap();
        let good = temp.path().join("good.toml");
        fs::write(&good, "# team defaults\n[output]\nresolution = \"2k\"\n").unwrap();

        let err = run(&context, &["config", "import", &bad.display().to_string(), "--project"])
            .await
            .unwrap_err();
        assert_eq!(ErrorKind::of(&err), ErrorKind::SchemaValidationError);

        run(&context, &["config", "import", &good.display().to_string(), "--project"])
            .await
            .unwrap();
        let written = fs::read_to_string(context.mutator().path(ConfigLayer::Project).unwrap())
            .unwrap();
        assert!(written.starts_with("# team defaults"));
    }

    #[tokio::test]
    async fn it_lists_layer_paths() {
        let temp = TempDir::new().unwrap();
        let context = MockCommandContext::new(temp.path()).unwrap().with_json();
        run(&context, &["config", "init"]).await.unwrap();

        run(&context, &["config", "path"]).await.unwrap();
        let paths = context.display_mock().last_json().unwrap();
        let names: Vec<&str> = paths
            .as_array()
            .unwrap()
            .iter()
            .map(|entry| entry["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["global", "project", "sessions"]);
        assert_eq!(paths[0]["exists"], true);
        assert_eq!(paths[1]["exists"], false);
    }
}

// ===== SESSION TESTS =====

mod session_tests {
    use super::*;

    #[tokio::test]
    async fn it_lists_sessions_as_json() {
        let temp = TempDir::new().unwrap();
        let context = MockCommandContext::new(temp.path()).unwrap().with_json();
        run(&context, &["generate", "first"]).await.unwrap();

        run(&context, &["session", "list"]).await.unwrap();
        let listing = context.display_mock().last_json().unwrap();
        assert_eq!(listing.as_array().unwrap().len(), 1);
        assert_eq!(listing[0]["history_count"], 1);
        assert_eq!(listing[0]["last_prompt"], "first");
    }

    #[tokio::test]
    async fn it_shows_history_without_image_data() {
        let temp = TempDir::new().unwrap();
        let context = MockCommandContext::new(temp.path()).unwrap().with_json();
        run(&context, &["generate", "first"]).await.unwrap();
        let id = context.store().latest().unwrap().unwrap().id;

        run(&context, &["session", "show", &id]).await.unwrap();
        let shown = context.display_mock().last_json().unwrap();
        assert_eq!(shown["id"], id.as_str());
        assert_eq!(shown["history"][0]["prompt"], "first");
        assert!(shown["history"][0].get("image_data").is_none());
        assert_eq!(shown["input_image"], "(none)");
    }

    #[tokio::test]
    async fn it_reports_missing_sessions_on_show_and_delete() {
        let temp = TempDir::new().unwrap();
        let context = MockCommandContext::new(temp.path()).unwrap();

        let err = run(&context, &["session", "show", "nope"]).await.unwrap_err();
        assert_eq!(ErrorKind::of(&err), ErrorKind::SessionNotFound);
        let err = run(&context, &["session", "delete", "nope"]).await.unwrap_err();
        assert_eq!(ErrorKind::of(&err), ErrorKind::SessionNotFound);
    }

    #[tokio::test]
    async fn it_deletes_one_session() {
        let temp = TempDir::new().unwrap();
        let context = MockCommandContext::new(temp.path()).unwrap();
        let session = context.store().create("m1", None).unwrap();

        run(&context, &["session", "delete", &session.id]).await.unwrap();
        assert!(context.store().get(&session.id).is_none());
    }

    #[tokio::test]
    async fn it_asks_before_clearing() {
        let temp = TempDir::new().unwrap();
        let context = MockCommandContext::new(temp.path()).unwrap();
        context.store().create("m1", None).unwrap();
        context.store().create("m1", None).unwrap();

        run(&context, &["session", "clear"]).await.unwrap();
        assert_eq!(context.store().list().unwrap().len(), 2);
        assert!(context.display_mock().has_call(&DisplayCall::PromptConfirm {
            message: "Delete all 2 session(s)?".to_string(),
            response: false,
        }));

        context
            .display_mock()
            .set_confirm_response("Delete all 2 session(s)?", true);
        run(&context, &["session", "clear"]).await.unwrap();
        assert!(context.store().list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn it_counts_unreadable_records_when_asking_to_clear() {
        let temp = TempDir::new().unwrap();
        let context = MockCommandContext::new(temp.path()).unwrap();
        let directory = context.store().directory().to_path_buf();
        fs::create_dir_all(&directory).unwrap();
        fs::write(directory.join("broken01.json"), "{ not json").unwrap();
        fs::write(directory.join("broken02.json"), "[]").unwrap();
        assert!(context.store().list().unwrap().is_empty());

        run(&context, &["session", "clear"]).await.unwrap();
        assert!(context.display_mock().has_call(&DisplayCall::PromptConfirm {
            message: "Delete all 2 session(s)?".to_string(),
            response: false,
        }));
        assert!(directory.join("broken01.json").is_file());
        assert!(directory.join("broken02.json").is_file());
    }

    #[tokio::test]
    async fn it_reports_a_declined_clear_as_json() {
        let temp = TempDir::new().unwrap();
        let context = MockCommandContext::new(temp.path()).unwrap().with_json();
        context.store().create("m1", None).unwrap();

        run(&context, &["session", "clear"]).await.unwrap();
        assert_eq!(
            context.display_mock().last_json().unwrap(),
            json!({ "removed": 0, "cancelled": true })
        );
        assert_eq!(context.store().list().unwrap().len(), 1);

        context
            .display_mock()
            .set_confirm_response("Delete all 1 session(s)?", true);
        run(&context, &["session", "clear"]).await.unwrap();
        assert_eq!(
            context.display_mock().last_json().unwrap(),
            json!({ "removed": 1, "cancelled": false })
        );
    }

    #[tokio::test]
    async fn it_clears_without_asking_when_confirmed_up_front() {
        let temp = TempDir::new().unwrap();
        let context = MockCommandContext::new(temp.path()).unwrap().with_yes();
        context.store().create("m1", None).unwrap();

        run(&context, &["session", "clear"]).await.unwrap();
        assert!(context.store().list().unwrap().is_empty());
        assert_eq!(context.display_mock().count_calls("prompt_confirm"), 0);
    }

    #[tokio::test]
    async fn it_prunes_to_the_requested_size() {
        let temp = TempDir::new().unwrap();
        let context = MockCommandContext::new(temp.path()).unwrap().with_json();
        for _ in 0..4 {
            context.store().create("m1", None).unwrap();
        }

        run(&context, &["session", "prune", "--keep", "1"]).await.unwrap();
        assert_eq!(
            context.display_mock().last_json().unwrap(),
            json!({ "kept": 1, "removed": 3 })
        );
        assert_eq!(context.store().list().unwrap().len(), 1);

        let err = run(&context, &["session", "prune", "--keep", "0"]).await.unwrap_err();
        assert!(err.to_string().contains("at least 1"));
    }

    #[tokio::test]
    async fn it_prunes_to_max_history_by_default() {
        let temp = TempDir::new().unwrap();
        let base = MockCommandContext::new(temp.path()).unwrap();
        // seeded under the default cap so creation itself prunes nothing
        for _ in 0..4 {
            base.store().create("m1", None).unwrap();
        }
        let mut config = base.config().clone();
        config.session.max_history = 2;
        let context = base.with_config(config).with_json();
        assert_eq!(context.store().list().unwrap().len(), 4);

        run(&context, &["session", "prune"]).await.unwrap();
        assert_eq!(
            context.display_mock().last_json().unwrap(),
            json!({ "kept": 2, "removed": 2 })
        );
    }
}
