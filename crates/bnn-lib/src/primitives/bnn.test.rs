#[test]
fn test_resolution_parsing_is_case_insensitive() {
    assert_eq!("2K".parse::<Resolution>().unwrap(), Resolution::TwoK);
    assert_eq!("4k".parse::<Resolution>().unwrap(), Resolution::FourK);
    assert!("8k".parse::<Resolution>().is_err());
    assert!("1024".parse::<Resolution>().is_err());
}

#[test]
fn test_resolution_api_size() {
    assert_eq!(Resolution::OneK.api_size(), "1K");
    assert_eq!(Resolution::FourK.api_size(), "4K");
    assert_eq!(Resolution::TwoK.to_string(), "2k");
}

#[test]
fn test_aspect_ratio_auto_has_no_api_ratio() {
    assert_eq!(AspectRatio::Auto.api_ratio(), None);
    assert_eq!(
        AspectRatio::Landscape16x9.api_ratio(),
        Some("16:9".to_string())
    );
    assert_eq!(
        "16:9".parse::<AspectRatio>().unwrap(),
        AspectRatio::Landscape16x9
    );
}

#[test]
fn test_only_canonical_spellings_are_accepted() {
    assert!("landscape".parse::<AspectRatio>().is_err());
    assert!("square".parse::<AspectRatio>().is_err());
    assert!("minimal".parse::<ThinkingLevel>().is_err());
    assert!("seq".parse::<NamingScheme>().is_err());
    assert!("4096".parse::<Resolution>().is_err());
    assert_eq!(
        "SEQUENTIAL".parse::<NamingScheme>().unwrap(),
        NamingScheme::Sequential
    );
}

#[test]
fn test_aspect_ratio_rejects_unknown_ratio() {
    let err = "7:3".parse::<AspectRatio>().unwrap_err();
    assert!(err.to_string().contains("21:9"));
}

#[test]
fn test_enums_serialize_canonically() {
    #[derive(serde::Serialize, serde::Deserialize)]
    struct Document {
        resolution: Resolution,
        thinking: ThinkingLevel,
        naming: NamingScheme,
    }

    let document: Document = toml::from_str(
        r#"
resolution = "2K"
thinking = "HIGH"
naming = "Sequential"
"#,
    )
    .unwrap();
    assert_eq!(document.resolution, Resolution::TwoK);
    assert_eq!(document.thinking, ThinkingLevel::High);
    assert_eq!(document.naming, NamingScheme::Sequential);

    let rendered = toml::to_string(&document).unwrap();
    assert!(rendered.contains("resolution = \"2k\""));
    assert!(rendered.contains("thinking = \"high\""));
    assert!(rendered.contains("naming = \"sequential\""));
}

#[test]
fn test_config_source_ordering_matches_precedence() {
    assert!(ConfigSource::Defaults < ConfigSource::Global);
    assert!(ConfigSource::Global < ConfigSource::Project);
    assert!(ConfigSource::Project < ConfigSource::Override);
    assert!(ConfigSource::Override < ConfigSource::Environment);
    assert_eq!(ConfigSource::from(ConfigLayer::Project), ConfigSource::Project);
    assert_eq!(ConfigLayer::Global.to_string(), "global");
}
