use super::*;
use anyhow::Context;
use clap::Parser;

fn command(args: &[&str]) -> Option<Commands> {
    Cli::try_parse_from(std::iter::once("bnn").chain(args.iter().copied()))
        .unwrap()
        .command
}

#[test]
fn test_error_document_uses_the_typed_kind_under_context() {
    let error = Err::<(), _>(SessionError::NotFound {
        id: "abc".to_string(),
    })
    .context("Failed to continue session")
    .unwrap_err();

    let document = error_document(&error);
    assert_eq!(document["error"]["kind"], "session_not_found");
    assert_eq!(
        document["error"]["message"],
        "Failed to continue session: Session 'abc' not found"
    );
}

#[test]
fn test_error_document_falls_back_to_internal() {
    let document = error_document(&anyhow::anyhow!("something odd"));
    assert_eq!(document["error"]["kind"], "internal");
    assert_eq!(document["error"]["message"], "something odd");
}

#[test]
fn test_layer_mutations_run_without_a_valid_configuration() {
    for args in [
        &["config", "set", "output.resolution=2k"][..],
        &["config", "unset", "output.resolution"],
        &["config", "init", "--project"],
        &["config", "import", "saved.toml"],
        &["config", "path"],
    ] {
        assert!(repairs_configuration(command(args).as_ref()), "{args:?}");
    }

    for args in [
        &["config", "get", "output.resolution"][..],
        &["config", "list"],
        &["generate", "a cat"],
        &["session", "list"],
    ] {
        assert!(!repairs_configuration(command(args).as_ref()), "{args:?}");
    }
    assert!(!repairs_configuration(None));
}
