use super::*;
use crate::primitives::{ErrorKind, Resolution, ThinkingLevel};
use tempfile::TempDir;

/// Sandbox with a global config root and a project directory marked by `.git`
struct Sandbox {
    _temp: TempDir,
    global: PathBuf,
    project: PathBuf,
}

impl Sandbox {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let global = temp.path().join("config").join("bnn").join("config.toml");
        let project = temp.path().join("work").join("project");
        fs::create_dir_all(project.join(".git")).unwrap();
        Self {
            _temp: temp,
            global,
            project,
        }
    }

    fn write_global(&self, content: &str) {
        fs::create_dir_all(self.global.parent().unwrap()).unwrap();
        fs::write(&self.global, content).unwrap();
    }

    fn write_project(&self, content: &str) {
        let path = self.project.join(PROJECT_CONFIG);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn resolver(&self) -> ConfigResolver {
        self.resolver_with_env(EnvironmentConfig::default())
    }

    fn resolver_with_env(&self, environment: EnvironmentConfig) -> ConfigResolver {
        ConfigResolver::new(ConfigPaths::new(&self.global, &self.project), environment)
    }
}

fn table(source: &str) -> Table {
    toml::from_str(source).unwrap()
}

#[test]
fn test_resolve_without_sources_returns_defaults() {
    let sandbox = Sandbox::new();
    let config = sandbox.resolver().resolve(None).unwrap();
    assert_eq!(config, EffectiveConfig::default());
}

#[test]
fn test_layer_precedence_scenario() {
    let sandbox = Sandbox::new();
    sandbox.write_global("[output]\nresolution = \"2k\"\n");
    sandbox.write_project("[model]\ndefault = \"m2\"\n");

    let defaults = table(
        r#"
[model]
default = "m1"

[output]
resolution = "1k"
"#,
    );
    let config = sandbox
        .resolver()
        .with_defaults(defaults)
        .resolve(None)
        .unwrap();

    assert_eq!(config.model.default, "m2");
    assert_eq!(config.output.resolution, Resolution::TwoK);
}

#[test]
fn test_project_overrides_global_for_shared_keys() {
    let sandbox = Sandbox::new();
    sandbox.write_global("[model]\ndefault = \"global-model\"\nthinking = \"high\"\n");
    sandbox.write_project("[model]\ndefault = \"project-model\"\n");

    let config = sandbox.resolver().resolve(None).unwrap();
    assert_eq!(config.model.default, "project-model");
    assert_eq!(config.model.thinking, ThinkingLevel::High);
}

#[test]
fn test_override_document_beats_project() {
    let sandbox = Sandbox::new();
    sandbox.write_project("[model]\ndefault = \"project-model\"\n");
    let override_path = sandbox.project.join("ci.toml");
    fs::write(&override_path, "[model]\ndefault = \"override-model\"\n").unwrap();

    let config = sandbox.resolver().resolve(Some(&override_path)).unwrap();
    assert_eq!(config.model.default, "override-model");
}

#[test]
fn test_environment_beats_everything() {
    let sandbox = Sandbox::new();
    sandbox.write_global("[model]\ndefault = \"global-model\"\n");
    let override_path = sandbox.project.join("ci.toml");
    fs::write(&override_path, "[model]\ndefault = \"override-model\"\n").unwrap();

    let env = EnvironmentConfig {
        model: Some("env-model".to_string()),
        resolution: Some("nonsense".to_string()),
        ..Default::default()
    };
    let config = sandbox
        .resolver_with_env(env)
        .resolve(Some(&override_path))
        .unwrap();

    assert_eq!(config.model.default, "env-model");
    assert_eq!(
        config.output.resolution,
        Resolution::OneK,
        "invalid env value is ignored"
    );
}

#[test]
fn test_missing_override_is_an_error() {
    let sandbox = Sandbox::new();
    let missing = sandbox.project.join("nope.toml");
    let err = sandbox.resolver().resolve(Some(&missing)).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::SourceRead {
            layer: ConfigSource::Override,
            ..
        }
    ));
}

#[test]
fn test_unparsable_source_names_layer_and_path() {
    let sandbox = Sandbox::new();
    sandbox.write_project("[model\ndefault = ");

    let err = sandbox.resolver().resolve(None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SourceParseError);
    match err {
        ConfigError::SourceParse { layer, path, .. } => {
            assert_eq!(layer, ConfigSource::Project);
            assert!(path.ends_with(PROJECT_CONFIG));
        }
        other => panic!("expected SourceParse, got {other:?}"),
    }
}

#[test]
fn test_unknown_key_names_offending_layer() {
    let sandbox = Sandbox::new();
    sandbox.write_global("[output]\nquality = \"max\"\n");

    let err = sandbox.resolver().resolve(None).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("global layer"), "{message}");
    assert!(message.contains("output.quality"), "{message}");
}

#[test]
fn test_invalid_enum_in_project_names_key_and_expected_set() {
    let sandbox = Sandbox::new();
    sandbox.write_project("[output]\naspect_ratio = \"7:3\"\n");

    let err = sandbox.resolver().resolve(None).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("project layer"));
    assert!(message.contains("output.aspect_ratio"));
    assert!(message.contains("16:9"));
}

#[test]
fn test_project_found_from_nested_directory() {
    let sandbox = Sandbox::new();
    sandbox.write_project("[model]\ndefault = \"nested\"\n");
    let nested = sandbox.project.join("src").join("deep");
    fs::create_dir_all(&nested).unwrap();

    let resolver = ConfigResolver::new(
        ConfigPaths::new(&sandbox.global, &nested),
        EnvironmentConfig::default(),
    );
    assert_eq!(resolver.resolve(None).unwrap().model.default, "nested");
}

#[test]
fn test_find_project_root_prefers_nearest_marker() {
    let sandbox = Sandbox::new();
    let inner = sandbox.project.join("packages").join("inner");
    fs::create_dir_all(&inner).unwrap();
    fs::write(inner.join("package.json"), "{}").unwrap();

    assert_eq!(find_project_root(&inner), Some(inner.clone()));
    assert_eq!(
        find_project_root(&sandbox.project.join("packages")),
        Some(sandbox.project.clone())
    );
}

#[test]
fn test_layer_path_outside_project_uses_working_dir() {
    let temp = TempDir::new().unwrap();
    let paths = ConfigPaths::new(temp.path().join("global.toml"), temp.path());
    let expected = temp.path().join(PROJECT_CONFIG);
    // The temp dir may sit below a marker on some machines; only assert when it does not.
    if paths.project().is_none() {
        assert_eq!(paths.layer_path(ConfigLayer::Project).unwrap(), expected);
    }
    assert_eq!(
        paths.layer_path(ConfigLayer::Global).unwrap(),
        temp.path().join("global.toml")
    );
}

#[test]
fn test_deep_merge_recurses_into_tables() {
    let mut base = table("[output]\nresolution = \"1k\"\nnaming = \"prompt\"\n");
    deep_merge(&mut base, table("[output]\nresolution = \"4k\"\n"));

    assert_eq!(base["output"]["resolution"].as_str(), Some("4k"));
    assert_eq!(base["output"]["naming"].as_str(), Some("prompt"));
}

#[test]
fn test_deep_merge_replaces_arrays_without_concatenation() {
    let mut base = table("refs = [\"a\", \"b\"]\n");
    deep_merge(&mut base, table("refs = [\"c\"]\n"));
    assert_eq!(base["refs"].as_array().unwrap().len(), 1);
}

#[test]
fn test_deep_merge_table_against_scalar_takes_incoming_verbatim() {
    let mut base = table("[model]\ndefault = \"m1\"\n");
    deep_merge(&mut base, table("model = \"flat\"\n"));
    assert_eq!(base["model"].as_str(), Some("flat"));

    let mut base = table("model = \"flat\"\n");
    deep_merge(&mut base, table("[model]\ndefault = \"m1\"\n"));
    let model = base["model"].as_table().unwrap();
    assert_eq!(model.len(), 1);
    assert_eq!(model["default"].as_str(), Some("m1"));
}
