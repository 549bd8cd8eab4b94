use super::*;

#[test]
fn test_filter_directive_scopes_level_to_bnn() {
    let directive = Logger::filter_directive(LogLevel::Debug);
    assert!(directive.starts_with("bnn=debug,bnn_lib=debug"));
    assert!(directive.contains("reqwest=warn"));
    assert!(directive.contains("hyper_util=warn"));
    assert!(directive.ends_with(",warn"));
}

#[test]
fn test_filter_directive_parses() {
    for level in [LogLevel::Error, LogLevel::Warning, LogLevel::Trace] {
        let directive = Logger::filter_directive(level);
        assert!(EnvFilter::try_new(&directive).is_ok(), "{directive}");
    }
}
