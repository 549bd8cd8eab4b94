use super::*;

macro_rules! test_enum_completeness {
    ($enum_type:ty, $test_name:ident) => {
        #[test]
        fn $test_name() {
            for variant in <$enum_type>::value_variants() {
                let possible_value = variant.to_possible_value();
                assert!(
                    possible_value.is_some(),
                    "PossibleValue should exist for all variants"
                );

                let primary_name = possible_value.unwrap().get_name().to_string();
                let parsed: Result<$enum_type, _> = primary_name.parse();
                assert_eq!(
                    parsed.unwrap(),
                    *variant,
                    "Primary name '{}' should parse back to its variant",
                    primary_name
                );
            }
        }
    };
}

test_enum_completeness!(LogLevel, test_log_level_completeness);
test_enum_completeness!(Resolution, test_resolution_completeness);
test_enum_completeness!(AspectRatio, test_aspect_ratio_completeness);
test_enum_completeness!(ThinkingLevel, test_thinking_level_completeness);
test_enum_completeness!(NamingScheme, test_naming_scheme_completeness);

#[test]
fn test_log_level_from_verbosity() {
    assert_eq!(LogLevel::from_verbosity(0), LogLevel::Error);
    assert_eq!(LogLevel::from_verbosity(2), LogLevel::Info);
    assert_eq!(LogLevel::from_verbosity(200), LogLevel::Trace);
}

#[test]
fn test_log_level_raised_by_saturates() {
    assert_eq!(LogLevel::Warning.raised_by(1), LogLevel::Info);
    assert_eq!(LogLevel::Warning.raised_by(0), LogLevel::Warning);
    assert_eq!(LogLevel::Debug.raised_by(u8::MAX), LogLevel::Trace);
}

#[test]
fn test_log_level_accepts_only_canonical_names() {
    assert_eq!("WARN".parse::<LogLevel>().unwrap(), LogLevel::Warning);
    assert_eq!("error".parse::<LogLevel>().unwrap(), LogLevel::Error);
    assert!("warning".parse::<LogLevel>().is_err());
    assert!("err".parse::<LogLevel>().is_err());
    assert_eq!(LogLevel::Warning.as_filter(), "warn");
}

#[test]
fn test_log_level_deserializes_through_the_string_parser() {
    let level: LogLevel = serde_json::from_str("\"DEBUG\"").unwrap();
    assert_eq!(level, LogLevel::Debug);
    assert_eq!(LogLevel::try_from("trace".to_string()).unwrap(), LogLevel::Trace);

    let err = serde_json::from_str::<LogLevel>("\"verbose\"").unwrap_err();
    assert!(err.to_string().contains("error, warn, info, debug, trace"));
}

#[test]
fn test_parse_error_lists_allowed_values() {
    let err = "loud".parse::<LogLevel>().unwrap_err();
    let message = err.to_string();
    assert!(message.contains("loud"));
    assert!(message.contains("error, warn, info, debug, trace"));
    assert_eq!(err.kind(), ErrorKind::SchemaValidationError);
}

#[test]
fn test_schema_error_in_layer_names_layer() {
    let err = ConfigError::schema("output.resolution", "must be one of: 1k, 2k, 4k")
        .in_layer(ConfigSource::Project);
    assert_eq!(
        err.to_string(),
        "Invalid configuration in project layer: 'output.resolution' must be one of: 1k, 2k, 4k"
    );
}

#[test]
fn test_error_kind_strings_are_stable() {
    assert_eq!(ErrorKind::SourceParseError.as_str(), "source_parse_error");
    assert_eq!(
        ErrorKind::SecretViaArgvRejected.as_str(),
        "secret_via_argv_rejected"
    );
    assert_eq!(ErrorKind::SessionNotFound.to_string(), "session_not_found");
}

#[test]
fn test_error_kind_of_anyhow_chain() {
    let err = anyhow::Error::new(SessionError::NotFound {
        id: "abc".to_string(),
    })
    .context("while continuing");
    assert_eq!(ErrorKind::of(&err), ErrorKind::SessionNotFound);

    let plain = anyhow::anyhow!("something else");
    assert_eq!(ErrorKind::of(&plain), ErrorKind::Internal);
}

#[test]
fn test_config_error_kinds() {
    let err = ConfigError::SecretViaArgvRejected {
        key: "api.key".to_string(),
    };
    assert_eq!(err.kind(), ErrorKind::SecretViaArgvRejected);
    assert!(err.to_string().contains("api.key=-"));

    let err = ConfigError::AlreadyExists {
        path: PathBuf::from("/tmp/bnn.toml"),
    };
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
}
