//! In-process end-to-end runs
//!
//! Commands go through the live context: real configuration resolution, the
//! real Gemini client against a mockito server, and real session and output
//! files inside a [`TestEnvironment`].

use anyhow::Result;
use bnn_lib::application::cli::{Cli, GlobalArgs};
use bnn_lib::application::execute_command_with_context;
use bnn_lib::bnn::{ImageSource, SessionStore};
use bnn_lib::primitives::{AspectRatio, ErrorKind};
use bnn_tests::fixtures::MOCK_PNG;
use bnn_tests::{TestEnvironment, error_body, image_body, text_only_body};
use clap::Parser;
use mockito::{Matcher, Server, ServerGuard};

const GENERATE_PATH: &str = r"^/models/[^/]+:generateContent$";

async fn run(env: &TestEnvironment, server: &ServerGuard, args: &[&str]) -> Result<()> {
    let cli = Cli::try_parse_from(std::iter::once("bnn").chain(args.iter().copied()))?;
    let context = env.context(&server.url(), GlobalArgs::default())?;
    let command = cli.command.expect("test invocations always name a command");
    execute_command_with_context(command, &context).await
}

fn store(env: &TestEnvironment) -> SessionStore {
    SessionStore::new(env.sessions_path.clone(), 50)
}

#[tokio::test]
async fn generate_saves_output_and_records_session() -> Result<()> {
    let env = TestEnvironment::new()?;
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Regex(GENERATE_PATH.to_string()))
        .match_header("x-goog-api-key", "e2e-test-key-0001")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(image_body(MOCK_PNG, Some("A red fox.")))
        .expect(1)
        .create_async()
        .await;

    run(&env, &server, &["generate", "a red fox"]).await?;
    mock.assert_async().await;

    let outputs = env.outputs()?;
    assert_eq!(outputs, vec![env.output_path.join("bnn-0001.png")]);
    assert_eq!(std::fs::read(&outputs[0])?, MOCK_PNG);

    let sessions = store(&env).list()?;
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].history_count, 1);
    assert_eq!(sessions[0].last_prompt.as_deref(), Some("a red fox"));
    assert_eq!(sessions[0].model, "gemini-3-pro-image-preview");
    Ok(())
}

#[tokio::test]
async fn continue_sends_previous_output_upstream() -> Result<()> {
    let env = TestEnvironment::new()?;
    let mut server = Server::new_async().await;

    let first = server
        .mock("POST", Matcher::Regex(GENERATE_PATH.to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(image_body(MOCK_PNG, None))
        .expect(1)
        .create_async()
        .await;
    run(&env, &server, &["generate", "a lighthouse"]).await?;
    first.assert_async().await;
    first.remove_async().await;

    let second = server
        .mock("POST", Matcher::Regex(GENERATE_PATH.to_string()))
        .match_body(Matcher::Regex("inlineData".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(image_body(MOCK_PNG, None))
        .expect(1)
        .create_async()
        .await;
    run(&env, &server, &["edit", "add a storm", "--continue"]).await?;
    second.assert_async().await;

    let sessions = store(&env).list()?;
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].history_count, 2);
    assert_eq!(sessions[0].last_prompt.as_deref(), Some("add a storm"));
    assert_eq!(env.outputs()?.len(), 2);
    Ok(())
}

#[tokio::test]
async fn edit_from_image_embeds_the_input() -> Result<()> {
    let env = TestEnvironment::new()?;
    let input = env.write_image("photo.png", MOCK_PNG)?;
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Regex(GENERATE_PATH.to_string()))
        .match_body(Matcher::Regex("inlineData".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(image_body(MOCK_PNG, None))
        .expect(1)
        .create_async()
        .await;

    let input_arg = input.display().to_string();
    run(
        &env,
        &server,
        &["edit", "make it night", "--image", &input_arg, "-r", "2K"],
    )
    .await?;
    mock.assert_async().await;

    let summary = store(&env).latest()?.expect("session recorded");
    let session = store(&env).get(&summary.id).expect("session readable");
    assert!(matches!(session.input_image, Some(ImageSource::Embedded(_))));
    assert_eq!(session.history.len(), 1);
    Ok(())
}

#[tokio::test]
async fn upstream_error_leaves_no_session_or_output() -> Result<()> {
    let env = TestEnvironment::new()?;
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", Matcher::Regex(GENERATE_PATH.to_string()))
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(error_body(400, "Prompt was blocked"))
        .create_async()
        .await;

    let error = run(&env, &server, &["generate", "something"])
        .await
        .unwrap_err();

    assert_eq!(ErrorKind::of(&error), ErrorKind::ApiError);
    assert!(format!("{error:#}").contains("Prompt was blocked"));
    assert!(env.outputs()?.is_empty());
    assert!(env.session_records()?.is_empty());
    Ok(())
}

#[tokio::test]
async fn text_only_reply_is_reported_as_missing_image() -> Result<()> {
    let env = TestEnvironment::new()?;
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", Matcher::Regex(GENERATE_PATH.to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(text_only_body("I can't draw that."))
        .create_async()
        .await;

    let error = run(&env, &server, &["generate", "something"])
        .await
        .unwrap_err();

    assert_eq!(ErrorKind::of(&error), ErrorKind::ApiError);
    assert!(format!("{error:#}").contains("I can't draw that."));
    assert!(env.session_records()?.is_empty());
    Ok(())
}

#[tokio::test]
async fn prune_keeps_the_most_recent_sessions() -> Result<()> {
    let env = TestEnvironment::new()?;
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", Matcher::Regex(GENERATE_PATH.to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(image_body(MOCK_PNG, None))
        .expect(3)
        .create_async()
        .await;

    for prompt in ["one", "two", "three"] {
        run(&env, &server, &["generate", prompt]).await?;
    }
    assert_eq!(env.session_records()?.len(), 3);

    run(&env, &server, &["session", "prune", "--keep", "1"]).await?;

    let remaining = store(&env).list()?;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].last_prompt.as_deref(), Some("three"));
    Ok(())
}

#[tokio::test]
async fn project_config_set_changes_the_next_resolution() -> Result<()> {
    let env = TestEnvironment::new()?;
    let server = Server::new_async().await;

    run(
        &env,
        &server,
        &["config", "set", "--project", "output.aspect_ratio=16:9"],
    )
    .await?;

    assert!(env.project_config().is_file());
    let config = env.resolve(&[])?;
    assert_eq!(config.output.aspect_ratio, AspectRatio::Landscape16x9);
    Ok(())
}
