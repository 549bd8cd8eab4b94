use super::*;

fn table(source: &str) -> Table {
    toml::from_str(source).unwrap()
}

#[test]
fn test_every_field_belongs_to_a_known_section() {
    for field in FIELDS {
        let section = field.key.split('.').next().unwrap();
        assert!(SECTIONS.contains(&section), "{} has unknown section", field.key);
    }
}

#[test]
fn test_validate_accepts_full_document() {
    let doc = table(
        r#"
[api]
key = "k"
endpoint = "https://example.test/v1"

[model]
default = "m1"
thinking = "HIGH"

[output]
directory = "out"
resolution = "2k"
aspect_ratio = "16:9"
naming = "prompt"

[session]
directory = "/tmp/sessions"
max_history = 3

[logging]
level = "debug"
"#,
    );
    assert!(validate_table(&doc).is_ok());
}

#[test]
fn test_validate_rejects_unknown_section() {
    let err = validate_table(&table("[colors]\nprimary = \"red\"\n")).unwrap_err();
    match err {
        ConfigError::SchemaValidation { key, expected, .. } => {
            assert_eq!(key, "colors");
            assert!(expected.contains("api, model, output, session, logging"));
        }
        other => panic!("expected SchemaValidation, got {other:?}"),
    }
}

#[test]
fn test_validate_rejects_unknown_key() {
    let err = validate_table(&table("[output]\nformat = \"png\"\n")).unwrap_err();
    match err {
        ConfigError::SchemaValidation { key, .. } => assert_eq!(key, "output.format"),
        other => panic!("expected SchemaValidation, got {other:?}"),
    }
}

#[test]
fn test_validate_rejects_bad_enum_with_expected_set() {
    let err = validate_table(&table("[output]\nresolution = \"8k\"\n")).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("output.resolution"));
    assert!(message.contains("1k, 2k, 4k"));
}

#[test]
fn test_validate_rejects_section_that_is_not_a_table() {
    let err = validate_table(&table("model = \"m1\"\n")).unwrap_err();
    assert!(err.to_string().contains("must be a table"));
}

#[test]
fn test_validate_rejects_zero_max_history() {
    assert!(validate_table(&table("[session]\nmax_history = 0\n")).is_err());
    assert!(validate_table(&table("[session]\nmax_history = \"5\"\n")).is_err());
}

#[test]
fn test_coerce_literal_types_values() {
    let max = field("session.max_history").unwrap();
    assert_eq!(coerce_literal(max, "7").unwrap(), Value::Integer(7));
    assert!(coerce_literal(max, "seven").is_err());

    let ratio = field("output.aspect_ratio").unwrap();
    assert_eq!(
        coerce_literal(ratio, "Square").unwrap(),
        Value::String("1:1".to_string())
    );

    let endpoint = field("api.endpoint").unwrap();
    assert!(coerce_literal(endpoint, "ftp://nope").is_err());
}

#[test]
fn test_require_field_lists_known_keys() {
    let err = require_field("api.token").unwrap_err();
    assert!(err.to_string().contains("api.key"));
}
