use super::*;

#[test]
fn test_from_pairs_reads_prefixed_variables_only() {
    let env = EnvironmentConfig::from_pairs([
        ("BNN_MODEL", "m3"),
        ("BNN_RESOLUTION", "2k"),
        ("MODEL", "ignored"),
        ("HOME", "/home/someone"),
    ])
    .unwrap();

    assert_eq!(env.model.as_deref(), Some("m3"));
    assert_eq!(env.resolution.as_deref(), Some("2k"));
    assert_eq!(env.api_key, None);
}

#[test]
fn test_empty_environment_yields_empty_overlay() {
    let env = EnvironmentConfig::default();
    assert!(env.to_overlay().is_empty());
}

#[test]
fn test_overlay_places_values_under_sections() {
    let env = EnvironmentConfig {
        api_key: Some("secret-value".to_string()),
        thinking: Some("HIGH".to_string()),
        output_dir: Some("renders".to_string()),
        ..Default::default()
    };

    let overlay = env.to_overlay();
    assert_eq!(overlay["api"]["key"].as_str(), Some("secret-value"));
    assert_eq!(overlay["model"]["thinking"].as_str(), Some("high"));
    assert_eq!(overlay["output"]["directory"].as_str(), Some("renders"));
}

#[test]
fn test_invalid_values_are_ignored() {
    let env = EnvironmentConfig {
        resolution: Some("16k".to_string()),
        aspect_ratio: Some("7:3".to_string()),
        thinking: Some("extreme".to_string()),
        api_endpoint: Some("not-a-url".to_string()),
        model: Some("m9".to_string()),
        ..Default::default()
    };

    let overlay = env.to_overlay();
    assert_eq!(overlay["model"]["default"].as_str(), Some("m9"));
    assert!(overlay["model"].get("thinking").is_none());
    assert!(overlay.get("output").is_none());
    assert!(overlay.get("api").is_none());
}

#[test]
fn test_blank_values_are_ignored() {
    let env = EnvironmentConfig {
        api_key: Some("   ".to_string()),
        model: Some(String::new()),
        ..Default::default()
    };

    assert!(env.to_overlay().is_empty());
}

#[test]
fn test_non_canonical_spellings_are_ignored() {
    let env = EnvironmentConfig::from_pairs([
        ("BNN_THINKING", "minimal"),
        ("BNN_RESOLUTION", "4096"),
        ("BNN_ASPECT_RATIO", "portrait"),
    ])
    .unwrap();

    assert!(env.to_overlay().is_empty());
}
