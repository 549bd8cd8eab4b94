use super::*;
use crate::application::schema;

#[test]
fn test_rendered_template_is_valid_config() {
    let engine = TemplateEngine::new().unwrap();
    let rendered = engine
        .render_config(ConfigLayer::Global, &EffectiveConfig::default())
        .unwrap();

    let table: toml::Table = toml::from_str(&rendered).unwrap();
    schema::validate_table(&table).unwrap();

    let parsed: EffectiveConfig = toml::Value::Table(table).try_into().unwrap();
    let defaults = EffectiveConfig::default();
    assert_eq!(parsed.model, defaults.model);
    assert_eq!(parsed.output, defaults.output);
    assert_eq!(parsed.logging, defaults.logging);
    assert_eq!(parsed.session.max_history, defaults.session.max_history);
}

#[test]
fn test_rendered_template_documents_secret_policy() {
    let engine = TemplateEngine::new().unwrap();
    let rendered = engine
        .render_config(ConfigLayer::Project, &EffectiveConfig::default())
        .unwrap();

    assert!(rendered.starts_with("# bnn project configuration"));
    assert!(rendered.contains("bnn config set api.key=-"));
    assert!(rendered.contains("# key = \"\""));
    assert!(rendered.contains("one of: 1k, 2k, 4k"));
}

#[test]
fn test_rendered_template_does_not_html_escape() {
    let engine = TemplateEngine::new().unwrap();
    let mut config = EffectiveConfig::default();
    config.api.endpoint = "https://example.test/v1?a=1&b=2".to_string();

    let rendered = engine.render_config(ConfigLayer::Global, &config).unwrap();
    assert!(rendered.contains("a=1&b=2"));
}
