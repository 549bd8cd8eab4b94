use super::*;

#[test]
fn test_config_defaults() {
    let config = EffectiveConfig::default();
    assert_eq!(config.api.key, None);
    assert_eq!(config.api.endpoint, defaults::API_ENDPOINT);
    assert_eq!(config.model.default, defaults::MODEL);
    assert_eq!(config.model.thinking, ThinkingLevel::Low);
    assert_eq!(config.output.directory, PathBuf::from("."));
    assert_eq!(config.output.resolution, Resolution::OneK);
    assert_eq!(config.output.aspect_ratio, AspectRatio::Auto);
    assert_eq!(config.output.naming, NamingScheme::Timestamp);
    assert_eq!(config.session.max_history, 50);
    assert!(config.session.directory.ends_with("sessions"));
    assert_eq!(config.logging.level, LogLevel::Warning);
}

#[test]
fn test_defaults_table_round_trips_through_serde() {
    let table = EffectiveConfig::defaults_table().unwrap();
    assert!(table.get("api").unwrap().as_table().unwrap().get("key").is_none());
    assert_eq!(
        table["output"]["resolution"].as_str(),
        Some("1k"),
        "enums serialize with canonical spelling"
    );

    let parsed: EffectiveConfig = toml::Value::Table(table).try_into().unwrap();
    assert_eq!(parsed, EffectiveConfig::default());
}

#[test]
fn test_deny_unknown_fields() {
    let result: Result<EffectiveConfig, _> = toml::from_str(
        r#"
[output]
colour = "red"
"#,
    );
    assert!(result.is_err());
}

#[test]
fn test_partial_document_fills_defaults() {
    let config: EffectiveConfig = toml::from_str(
        r#"
[model]
default = "m2"
"#,
    )
    .unwrap();
    assert_eq!(config.model.default, "m2");
    assert_eq!(config.model.thinking, ThinkingLevel::Low);
    assert_eq!(config.output, OutputConfig::default());
}

#[test]
fn test_logger_config_raises_level() {
    let config = EffectiveConfig::default();
    let logger = config.to_logger_config(2, false);
    assert_eq!(logger.level, LogLevel::Debug);
    assert!(!logger.color);
}

#[test]
fn test_redacted_table_masks_api_key() {
    let mut config = EffectiveConfig::default();
    config.api.key = Some("sk-abcdef123456".to_string());

    let table = config.to_redacted_table().unwrap();
    let key = table["api"]["key"].as_str().unwrap();
    assert!(!key.contains("abcdef"));
    assert!(key.ends_with("3456"));
}
