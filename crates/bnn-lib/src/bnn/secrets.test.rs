use super::*;

#[test]
fn test_secret_classification_uses_last_segment() {
    assert!(is_secret_key("api.key"));
    assert!(is_secret_key("api.KEY"));
    assert!(is_secret_key("provider.auth.Token"));
    assert!(is_secret_key("password"));
    assert!(is_secret_key("vault.secret"));

    assert!(!is_secret_key("api.endpoint"));
    assert!(!is_secret_key("key.endpoint"));
    assert!(!is_secret_key("api.keys"));
    assert!(!is_secret_key("output.api_key_hint"));
}

#[test]
fn test_mask_keeps_tail_of_long_values() {
    assert_eq!(mask("short"), "****");
    assert_eq!(mask("12345678"), "****");
    assert_eq!(mask("sk-0123456789"), "****6789");
}

#[test]
fn test_redact_table_only_touches_secret_strings() {
    let mut table: Table = toml::from_str(
        r#"
[api]
key = "sk-0123456789"
endpoint = "https://example.test"

[nested.deeper]
token = "abcdefghijkl"
count = 3
"#,
    )
    .unwrap();

    redact_table(&mut table);

    assert_eq!(table["api"]["key"].as_str(), Some("****6789"));
    assert_eq!(table["api"]["endpoint"].as_str(), Some("https://example.test"));
    assert_eq!(table["nested"]["deeper"]["token"].as_str(), Some("****ijkl"));
    assert_eq!(table["nested"]["deeper"]["count"].as_integer(), Some(3));
}

#[test]
fn test_read_piped_value_trims_trailing_whitespace_only() {
    let mut input = BufferedSecretInput::piped("  abc123 \n\n");
    assert_eq!(read_piped_value("api.key", &mut input).unwrap(), "  abc123");
}

#[test]
fn test_read_piped_value_rejects_terminal() {
    let mut input = BufferedSecretInput::terminal();
    let err = read_piped_value("api.key", &mut input).unwrap_err();
    assert!(matches!(err, ConfigError::SecretStdinUnavailable { .. }));
    assert!(err.to_string().contains("terminal"));
}

#[test]
fn test_read_piped_value_rejects_empty_stream() {
    let mut input = BufferedSecretInput::piped("\n");
    let err = read_piped_value("api.key", &mut input).unwrap_err();
    assert!(err.to_string().contains("empty"));
}

#[test]
fn test_buffered_input_is_consumed_once() {
    let mut input = BufferedSecretInput::piped("value");
    assert_eq!(input.read_all().unwrap(), "value");
    assert_eq!(input.read_all().unwrap(), "");
}
