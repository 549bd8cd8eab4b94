use super::*;
use crate::bnn::secrets::BufferedSecretInput;
use crate::primitives::ErrorKind;
use tempfile::TempDir;

struct Fixture {
    _temp: TempDir,
    mutator: ConfigMutator,
}

impl Fixture {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let project = temp.path().join("project");
        fs::create_dir_all(project.join(".git")).unwrap();
        let mutator = ConfigMutator::new(ConfigPaths::new(
            temp.path().join("config").join("bnn").join("config.toml"),
            project,
        ));
        Self {
            _temp: temp,
            mutator,
        }
    }

    fn set(&self, pairs: &[(&str, &str)]) -> Result<PathBuf, ConfigError> {
        let updates: Vec<(String, SetValue)> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), SetValue::parse(value)))
            .collect();
        self.mutator
            .set_many(ConfigLayer::Global, &updates, &mut BufferedSecretInput::terminal())
    }
}

#[test]
fn test_read_missing_layer_is_empty() {
    let fixture = Fixture::new();
    assert!(fixture.mutator.read(ConfigLayer::Global).unwrap().is_empty());
    assert!(fixture.mutator.read(ConfigLayer::Project).unwrap().is_empty());
}

#[test]
fn test_set_many_is_non_destructive() {
    let fixture = Fixture::new();
    fixture
        .set(&[("model.default", "m1"), ("output.resolution", "2k")])
        .unwrap();
    fixture
        .set(&[("output.naming", "prompt"), ("model.thinking", "HIGH")])
        .unwrap();

    let document = fixture.mutator.read(ConfigLayer::Global).unwrap();
    assert_eq!(document["model"]["default"].as_str(), Some("m1"));
    assert_eq!(document["output"]["resolution"].as_str(), Some("2k"));
    assert_eq!(document["output"]["naming"].as_str(), Some("prompt"));
    assert_eq!(
        document["model"]["thinking"].as_str(),
        Some("high"),
        "enum values are stored canonically"
    );
}

#[test]
fn test_set_many_preserves_sibling_order() {
    let fixture = Fixture::new();
    let path = fixture.mutator.path(ConfigLayer::Global).unwrap();
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(
        &path,
        "[output]\nnaming = \"prompt\"\ndirectory = \"out\"\nresolution = \"1k\"\n",
    )
    .unwrap();

    fixture.set(&[("output.directory", "renders")]).unwrap();

    let document = fixture.mutator.read(ConfigLayer::Global).unwrap();
    let keys: Vec<&String> = document["output"].as_table().unwrap().keys().collect();
    assert_eq!(keys, ["naming", "directory", "resolution"]);
    assert_eq!(document["output"]["directory"].as_str(), Some("renders"));
}

#[test]
fn test_set_integer_field_is_stored_as_integer() {
    let fixture = Fixture::new();
    fixture.set(&[("session.max_history", "7")]).unwrap();
    let document = fixture.mutator.read(ConfigLayer::Global).unwrap();
    assert_eq!(document["session"]["max_history"].as_integer(), Some(7));
}

#[test]
fn test_literal_secret_is_rejected_and_nothing_written() {
    let fixture = Fixture::new();
    let err = fixture
        .set(&[("model.default", "m1"), ("api.key", "literal-secret")])
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SecretViaArgvRejected);
    assert!(err.to_string().contains("api.key=-"));
    assert!(!fixture.mutator.path(ConfigLayer::Global).unwrap().exists());
}

#[test]
fn test_secret_via_sentinel_reads_piped_value() {
    let fixture = Fixture::new();
    let updates = vec![("api.key".to_string(), SetValue::Stdin)];
    fixture
        .mutator
        .set_many(
            ConfigLayer::Global,
            &updates,
            &mut BufferedSecretInput::piped("abc123\n"),
        )
        .unwrap();

    let document = fixture.mutator.read(ConfigLayer::Global).unwrap();
    assert_eq!(document["api"]["key"].as_str(), Some("abc123"));
}

#[test]
fn test_sentinel_on_terminal_fails() {
    let fixture = Fixture::new();
    let err = fixture.set(&[("api.key", "-")]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SecretStdinUnavailable);
}

#[test]
fn test_only_one_sentinel_per_call() {
    let fixture = Fixture::new();
    let updates = vec![
        ("api.key".to_string(), SetValue::Stdin),
        ("model.default".to_string(), SetValue::Stdin),
    ];
    let err = fixture
        .mutator
        .set_many(
            ConfigLayer::Global,
            &updates,
            &mut BufferedSecretInput::piped("abc123"),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SecretStdinUnavailable);
}

#[test]
fn test_set_rejects_unknown_key_and_invalid_value() {
    let fixture = Fixture::new();

    let err = fixture.set(&[("output.quality", "max")]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SchemaValidationError);
    assert!(err.to_string().contains("output.quality"));

    let err = fixture.set(&[("output.resolution", "8k")]).unwrap_err();
    assert!(err.to_string().contains("1k, 2k, 4k"));

    assert!(!fixture.mutator.path(ConfigLayer::Global).unwrap().exists());
}

#[test]
fn test_unset_missing_key_leaves_file_untouched() {
    let fixture = Fixture::new();
    let path = fixture.mutator.path(ConfigLayer::Global).unwrap();
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let original = "# hand written\n[model]\ndefault   =   \"m1\"\n";
    fs::write(&path, original).unwrap();

    let removed = fixture
        .mutator
        .unset_many(
            ConfigLayer::Global,
            &["output.resolution".to_string(), "model.default.deeper".to_string()],
        )
        .unwrap();

    assert_eq!(removed, 0);
    assert_eq!(fs::read_to_string(&path).unwrap(), original);
}

#[test]
fn test_unset_counts_removed_keys() {
    let fixture = Fixture::new();
    fixture
        .set(&[("model.default", "m1"), ("output.naming", "sequential")])
        .unwrap();

    let removed = fixture
        .mutator
        .unset_many(
            ConfigLayer::Global,
            &[
                "model.default".to_string(),
                "model.default".to_string(),
                "output.missing".to_string(),
            ],
        )
        .unwrap();

    assert_eq!(removed, 1);
    let document = fixture.mutator.read(ConfigLayer::Global).unwrap();
    assert!(document["model"].as_table().unwrap().is_empty());
    assert_eq!(document["output"]["naming"].as_str(), Some("sequential"));
}

#[test]
fn test_init_layer_writes_template_once() {
    let fixture = Fixture::new();
    let path = fixture.mutator.init_layer(ConfigLayer::Project).unwrap();
    assert!(path.ends_with(".config/bnn.toml"));

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.starts_with('#'));

    let err = fixture.mutator.init_layer(ConfigLayer::Project).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    assert_eq!(fs::read_to_string(&path).unwrap(), content);
}

#[test]
fn test_import_replaces_layer_verbatim() {
    let fixture = Fixture::new();
    fixture.set(&[("model.default", "old")]).unwrap();

    let payload = "# imported\n[output]\nresolution = \"4k\"\n";
    let path = fixture
        .mutator
        .import_document(payload, ConfigLayer::Global)
        .unwrap();

    assert_eq!(fs::read_to_string(path).unwrap(), payload);
    let document = fixture.mutator.read(ConfigLayer::Global).unwrap();
    assert!(document.get("model").is_none());
}

#[test]
fn test_import_rejects_invalid_document() {
    let fixture = Fixture::new();
    fixture.set(&[("model.default", "kept")]).unwrap();

    let err = fixture
        .mutator
        .import_document("[output]\nresolution = \"16k\"\n", ConfigLayer::Global)
        .unwrap_err();
    assert!(err.to_string().contains("global layer"));

    let err = fixture
        .mutator
        .import_document("[output\n", ConfigLayer::Global)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SourceParseError);

    let document = fixture.mutator.read(ConfigLayer::Global).unwrap();
    assert_eq!(document["model"]["default"].as_str(), Some("kept"));
}

#[test]
fn test_set_path_replaces_scalar_on_the_way() {
    let mut document: Table = toml::from_str("model = \"flat\"\n").unwrap();
    set_path(&mut document, "model.default", Value::String("m1".to_string()));
    assert_eq!(document["model"]["default"].as_str(), Some("m1"));
}

#[test]
fn test_get_path_walks_tables_only() {
    let document: Table = toml::from_str("[output]\nresolution = \"2k\"\n").unwrap();
    assert_eq!(
        get_path(&document, "output.resolution").and_then(Value::as_str),
        Some("2k")
    );
    assert!(get_path(&document, "output.resolution.deeper").is_none());
    assert!(get_path(&document, "model.default").is_none());
    assert!(get_path(&document, "output").is_some_and(Value::is_table));
}

#[test]
fn test_remove_path_does_not_descend_into_scalars() {
    let mut document: Table = toml::from_str("model = \"flat\"\n").unwrap();
    assert!(!remove_path(&mut document, "model.default"));
    assert!(remove_path(&mut document, "model"));
    assert!(document.is_empty());
}

#[test]
fn test_parse_assignment() {
    assert_eq!(
        parse_assignment("model.default=a=b").unwrap(),
        ("model.default".to_string(), SetValue::Literal("a=b".to_string()))
    );
    assert_eq!(
        parse_assignment("api.key=-").unwrap(),
        ("api.key".to_string(), SetValue::Stdin)
    );
    assert!(parse_assignment("model.default").is_err());
    assert!(parse_assignment("=value").is_err());
}
