use super::*;
use clap::CommandFactory;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("bnn").chain(args.iter().copied())).unwrap()
}

#[test]
fn test_cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn test_generate_collects_overrides_and_references() {
    let cli = parse(&[
        "generate",
        "a red fox",
        "--resolution",
        "2K",
        "--aspect-ratio",
        "16:9",
        "--ref",
        "a.png",
        "--ref",
        "b.png",
        "-o",
        "fox.png",
    ]);

    match cli.command {
        Some(Commands::Generate { prompt, options }) => {
            assert_eq!(prompt, "a red fox");
            assert_eq!(options.resolution, Some(Resolution::TwoK));
            assert_eq!(options.aspect_ratio, Some(AspectRatio::Landscape16x9));
            assert_eq!(options.references, [PathBuf::from("a.png"), PathBuf::from("b.png")]);
            assert_eq!(options.output, Some(PathBuf::from("fox.png")));
            assert_eq!(options.model, None);
        }
        other => panic!("expected generate, got {other:?}"),
    }
}

#[test]
fn test_global_flags_are_accepted_after_the_subcommand() {
    let cli = parse(&["session", "list", "--json", "-vv", "--config", "extra.toml"]);
    assert!(cli.global.json);
    assert_eq!(cli.global.verbose, 2);
    assert_eq!(cli.global.config, Some(PathBuf::from("extra.toml")));
}

#[test]
fn test_edit_session_conflicts_with_image() {
    let result = Cli::try_parse_from(["bnn", "edit", "x", "--image", "a.png", "--session", "abc"]);
    assert!(result.is_err());

    let result = Cli::try_parse_from(["bnn", "edit", "x", "--session", "abc", "--continue"]);
    assert!(result.is_err());
}

#[test]
fn test_edit_continue_flag() {
    let cli = parse(&["edit", "brighter", "--continue", "--interactive"]);
    match cli.command {
        Some(Commands::Edit {
            continue_latest,
            interactive,
            image,
            session,
            ..
        }) => {
            assert!(continue_latest);
            assert!(interactive);
            assert!(image.is_none());
            assert!(session.is_none());
        }
        other => panic!("expected edit, got {other:?}"),
    }
}

#[test]
fn test_config_set_defaults_to_global_layer() {
    let cli = parse(&["config", "set", "output.resolution=2k", "model.thinking=high"]);
    match cli.command {
        Some(Commands::Config {
            command: ConfigCommand::Set { assignments, layer },
        }) => {
            assert_eq!(assignments.len(), 2);
            assert_eq!(layer.layer(), ConfigLayer::Global);
        }
        other => panic!("expected config set, got {other:?}"),
    }
}

#[test]
fn test_config_layer_flags_conflict() {
    let cli = parse(&["config", "init", "--project"]);
    match cli.command {
        Some(Commands::Config {
            command: ConfigCommand::Init { layer },
        }) => assert_eq!(layer.layer(), ConfigLayer::Project),
        other => panic!("expected config init, got {other:?}"),
    }

    assert!(Cli::try_parse_from(["bnn", "config", "init", "--global", "--project"]).is_err());
}

#[test]
fn test_invalid_enum_values_are_rejected() {
    assert!(Cli::try_parse_from(["bnn", "generate", "x", "--resolution", "8k"]).is_err());
    assert!(Cli::try_parse_from(["bnn", "generate", "x", "--thinking", "extreme"]).is_err());
}

#[test]
fn test_session_prune_keep() {
    let cli = parse(&["session", "prune", "--keep", "3"]);
    assert!(matches!(
        cli.command,
        Some(Commands::Session {
            command: SessionCommand::Prune { keep: Some(3) }
        })
    ));
}
