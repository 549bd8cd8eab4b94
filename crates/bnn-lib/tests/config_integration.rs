use bnn_lib::application::config::EffectiveConfig;
use bnn_lib::application::env::EnvironmentConfig;
use bnn_lib::application::loader::{ConfigPaths, ConfigResolver};
use bnn_lib::bnn::layers::{ConfigMutator, SetValue};
use bnn_lib::bnn::secrets::BufferedSecretInput;
use bnn_lib::primitives::{ConfigError, ConfigLayer, ErrorKind, Resolution, ThinkingLevel};
use std::fs;
use tempfile::TempDir;

fn workspace() -> (TempDir, ConfigPaths) {
    let temp = TempDir::new().unwrap();
    let work = temp.path().join("work");
    fs::create_dir_all(work.join(".git")).unwrap();
    let paths = ConfigPaths::new(temp.path().join("global/bnn/config.toml"), work);
    (temp, paths)
}

fn set(mutator: &ConfigMutator, layer: ConfigLayer, key: &str, value: &str) {
    mutator
        .set_many(
            layer,
            &[(key.to_string(), SetValue::Literal(value.to_string()))],
            &mut BufferedSecretInput::terminal(),
        )
        .unwrap();
}

#[test]
fn test_mutations_flow_through_resolution() {
    let (_temp, paths) = workspace();
    let mutator = ConfigMutator::new(paths.clone());

    set(&mutator, ConfigLayer::Global, "output.resolution", "2k");
    set(&mutator, ConfigLayer::Global, "model.thinking", "high");
    set(&mutator, ConfigLayer::Project, "output.resolution", "4k");

    let resolver = ConfigResolver::new(paths, EnvironmentConfig::default());
    let config = resolver.resolve(None).unwrap();

    assert_eq!(config.output.resolution, Resolution::FourK);
    assert_eq!(config.model.thinking, ThinkingLevel::High);
}

#[test]
fn test_environment_outranks_every_document() {
    let (temp, paths) = workspace();
    let mutator = ConfigMutator::new(paths.clone());
    set(&mutator, ConfigLayer::Project, "model.default", "from-project");

    let override_path = temp.path().join("override.toml");
    fs::write(&override_path, "[model]\ndefault = \"from-override\"\n").unwrap();

    let environment = EnvironmentConfig::from_pairs([("BNN_MODEL", "from-env")]).unwrap();
    let config = ConfigResolver::new(paths, environment)
        .resolve(Some(&override_path))
        .unwrap();

    assert_eq!(config.model.default, "from-env");
}

#[test]
fn test_secret_set_from_pipe_resolves_and_redacts() {
    let (_temp, paths) = workspace();
    let mutator = ConfigMutator::new(paths.clone());

    mutator
        .set_many(
            ConfigLayer::Global,
            &[("api.key".to_string(), SetValue::Stdin)],
            &mut BufferedSecretInput::piped("sk-integration-9876\n"),
        )
        .unwrap();

    let config = ConfigResolver::new(paths, EnvironmentConfig::default())
        .resolve(None)
        .unwrap();
    assert_eq!(config.api.key.as_deref(), Some("sk-integration-9876"));

    let redacted = config.to_redacted_table().unwrap();
    assert_eq!(redacted["api"]["key"].as_str(), Some("****9876"));
}

#[test]
fn test_initialized_layer_resolves_to_defaults() {
    let (_temp, paths) = workspace();
    let mutator = ConfigMutator::new(paths.clone());

    let path = mutator.init_layer(ConfigLayer::Global).unwrap();
    assert!(path.is_file());

    let config = ConfigResolver::new(paths, EnvironmentConfig::default())
        .resolve(None)
        .unwrap();
    assert_eq!(config, EffectiveConfig::default());
}

#[test]
fn test_invalid_layer_document_blocks_resolution() {
    let (_temp, paths) = workspace();
    let project = paths.layer_path(ConfigLayer::Project).unwrap();
    fs::create_dir_all(project.parent().unwrap()).unwrap();
    fs::write(&project, "[output]\nresolution = \"8k\"\n").unwrap();

    let error = ConfigResolver::new(paths, EnvironmentConfig::default())
        .resolve(None)
        .unwrap_err();

    assert!(matches!(error, ConfigError::SchemaValidation { .. }));
    assert_eq!(error.kind(), ErrorKind::SchemaValidationError);
}
