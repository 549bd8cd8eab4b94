use crate::application::config::EffectiveConfig;
use crate::primitives::*;
use handlebars::Handlebars;
use std::collections::HashMap;

const CONFIG_TEMPLATE: &str = "config.toml";

/// Renders the commented starter document written by `config init`
pub struct TemplateEngine {
    handlebars: Handlebars<'static>,
}

impl TemplateEngine {
    pub fn new() -> Result<Self, ConfigError> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        // TOML, not HTML
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars
            .register_template_string(
                CONFIG_TEMPLATE,
                include_str!("../../templates/config.toml.hbs"),
            )
            .map_err(|e| ConfigError::SerializeFailed {
                reason: e.to_string(),
            })?;

        Ok(Self { handlebars })
    }

    /// Starter document for `layer` filled with `defaults`
    pub fn render_config(
        &self,
        layer: ConfigLayer,
        defaults: &EffectiveConfig,
    ) -> Result<String, ConfigError> {
        let mut vars: HashMap<&str, String> = HashMap::new();
        vars.insert("layer", layer.to_string());
        vars.insert("endpoint", defaults.api.endpoint.clone());
        vars.insert("model", defaults.model.default.clone());
        vars.insert("thinking", defaults.model.thinking.as_str());
        vars.insert("thinking_values", ThinkingLevel::allowed_values().join(", "));
        vars.insert(
            "output_directory",
            defaults.output.directory.display().to_string(),
        );
        vars.insert("resolution", defaults.output.resolution.as_str());
        vars.insert("resolution_values", Resolution::allowed_values().join(", "));
        vars.insert("aspect_ratio", defaults.output.aspect_ratio.as_str());
        vars.insert(
            "aspect_ratio_values",
            AspectRatio::allowed_values().join(", "),
        );
        vars.insert("naming", defaults.output.naming.as_str());
        vars.insert("naming_values", NamingScheme::allowed_values().join(", "));
        vars.insert(
            "session_directory",
            defaults.session.directory.display().to_string(),
        );
        vars.insert("max_history", defaults.session.max_history.to_string());
        vars.insert("log_level", defaults.logging.level.as_str());
        vars.insert("log_level_values", LogLevel::allowed_values().join(", "));

        self.handlebars
            .render(CONFIG_TEMPLATE, &vars)
            .map_err(|e| ConfigError::SerializeFailed {
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    include!("template.test.rs");
}
