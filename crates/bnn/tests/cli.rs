//! Binary-level checks: argument parsing, exit codes, stdin handling and the
//! JSON contract on stdout
#![cfg(target_os = "linux")]

use anyhow::Result;
use bnn_tests::fixtures::MOCK_PNG;
use bnn_tests::{TestEnvironment, image_body};
use mockito::{Matcher, Server};
use predicates::prelude::*;
use serde_json::Value;

const BIN: &str = env!("CARGO_BIN_EXE_bnn");

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is a JSON document")
}

#[test]
fn help_lists_the_command_surface() {
    let env = TestEnvironment::new().unwrap();
    env.command(BIN)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("edit"))
        .stdout(predicate::str::contains("config"))
        .stdout(predicate::str::contains("session"));
}

#[test]
fn unknown_resolution_is_a_usage_error() {
    let env = TestEnvironment::new().unwrap();
    env.command(BIN)
        .args(["generate", "a cat", "-r", "8k"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn config_get_reads_the_merged_value() {
    let env = TestEnvironment::new().unwrap();
    env.write_project("[output]\nresolution = \"4k\"\n").unwrap();

    env.command(BIN)
        .args(["config", "get", "output.resolution"])
        .assert()
        .success()
        .stdout(predicate::str::contains("4k"));
}

#[test]
fn invalid_layer_can_be_repaired_with_config_set() {
    let env = TestEnvironment::new().unwrap();
    env.append_global("[model]\nthinking = \"extreme\"\n").unwrap();

    env.command(BIN)
        .args(["config", "get", "model.thinking"])
        .assert()
        .failure()
        .code(1);

    env.command(BIN)
        .args(["config", "set", "model.thinking=high"])
        .assert()
        .success();
    let repaired = std::fs::read_to_string(env.global_config()).unwrap();
    assert!(repaired.contains("high"));
    assert!(!repaired.contains("extreme"));

    env.command(BIN)
        .args(["config", "get", "model.thinking"])
        .assert()
        .success()
        .stdout(predicate::str::contains("high"));
}

#[test]
fn invalid_layer_can_be_repaired_with_config_unset() {
    let env = TestEnvironment::new().unwrap();
    env.write_project("[output]\nresolution = \"8k\"\n").unwrap();

    env.command(BIN)
        .args(["config", "unset", "--project", "output.resolution"])
        .assert()
        .success();

    env.command(BIN)
        .args(["--json", "config", "get", "output.resolution"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"1k\""));
    assert!(!std::fs::read_to_string(env.project_config()).unwrap().contains("8k"));
}

#[test]
fn config_init_refuses_to_overwrite() {
    let env = TestEnvironment::new().unwrap();

    env.command(BIN)
        .args(["config", "init", "--project"])
        .assert()
        .success();
    assert!(env.project_config().is_file());

    let output = env
        .command(BIN)
        .args(["--json", "config", "init", "--project"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout_json(&output)["error"]["kind"], "already_exists");
}

#[test]
fn secret_on_argv_is_rejected_and_not_written() {
    let env = TestEnvironment::new().unwrap();
    let before = std::fs::read_to_string(env.global_config()).unwrap();

    let output = env
        .command(BIN)
        .args(["--json", "config", "set", "api.key=sk-leaked-1234"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        stdout_json(&output)["error"]["kind"],
        "secret_via_argv_rejected"
    );
    let after = std::fs::read_to_string(env.global_config()).unwrap();
    assert_eq!(before, after);
    assert!(!after.contains("sk-leaked-1234"));
}

#[test]
fn secret_from_pipe_is_stored_and_masked() {
    let env = TestEnvironment::new().unwrap();

    env.command(BIN)
        .args(["config", "set", "api.key=-"])
        .write_stdin("sk-piped-secret-5678\n")
        .assert()
        .success();

    let stored = std::fs::read_to_string(env.global_config()).unwrap();
    assert!(stored.contains("sk-piped-secret-5678"));

    let output = env
        .command(BIN)
        .args(["--json", "config", "get", "api.key"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["value"], "****5678");

    env.command(BIN)
        .args(["config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("****5678"))
        .stdout(predicate::str::contains("sk-piped-secret-5678").not());
}

#[test]
fn config_path_reports_every_location() {
    let env = TestEnvironment::new().unwrap();

    let output = env
        .command(BIN)
        .args(["--json", "config", "path"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let document = stdout_json(&output);
    let entries = document.as_array().unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["name"], "global");
    assert_eq!(
        entries[0]["path"],
        env.global_config().display().to_string()
    );
    assert_eq!(entries[0]["exists"], true);
    assert_eq!(entries[1]["name"], "project");
    assert_eq!(entries[1]["exists"], false);
    assert_eq!(entries[2]["name"], "sessions");
}

#[test]
fn session_list_is_empty_json_array() {
    let env = TestEnvironment::new().unwrap();

    let output = env
        .command(BIN)
        .args(["--json", "session", "list"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_json(&output), serde_json::json!([]));
}

#[test]
fn unknown_session_yields_error_document() {
    let env = TestEnvironment::new().unwrap();

    let output = env
        .command(BIN)
        .args(["--json", "edit", "brighter", "--session", "does-not-exist"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let document = stdout_json(&output);
    assert_eq!(document["error"]["kind"], "session_not_found");
    assert!(
        document["error"]["message"]
            .as_str()
            .unwrap()
            .contains("does-not-exist")
    );
}

#[test]
fn missing_api_key_fails_without_leaving_a_session() {
    let env = TestEnvironment::new().unwrap();

    let output = env
        .command(BIN)
        .args(["--json", "generate", "a cat"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout_json(&output)["error"]["kind"], "api_error");
    assert!(env.session_records().unwrap().is_empty());
}

#[test]
fn generate_then_clear_round_trip() -> Result<()> {
    let env = TestEnvironment::new()?;
    let mut server = Server::new();
    let mock = server
        .mock("POST", Matcher::Regex(r":generateContent$".to_string()))
        .match_header("x-goog-api-key", "sk-env-key-0042")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(image_body(MOCK_PNG, Some("Done.")))
        .expect(1)
        .create();

    let output = env
        .command(BIN)
        .env("BNN_API_KEY", "sk-env-key-0042")
        .env("BNN_API_ENDPOINT", server.url())
        .args(["--json", "generate", "a paper boat"])
        .output()?;
    mock.assert();
    assert!(output.status.success());

    let document = stdout_json(&output);
    assert_eq!(document["history_count"], 1);
    assert_eq!(document["text"], "Done.");
    assert_eq!(
        document["output"],
        env.output_path.join("bnn-0001.png").display().to_string()
    );
    assert_eq!(env.session_records()?.len(), 1);

    // no terminal to confirm on, so an unforced clear is declined
    env.command(BIN)
        .args(["session", "clear"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cancelled"));
    assert_eq!(env.session_records()?.len(), 1);

    let output = env
        .command(BIN)
        .args(["--json", "--yes", "session", "clear"])
        .output()?;
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["removed"], 1);
    assert!(env.session_records()?.is_empty());
    Ok(())
}
