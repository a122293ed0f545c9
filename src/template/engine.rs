//! Template engine for node specs
//!
//! Uses minijinja with its standard syntax (`{{ }}`, `{% %}`, `{# #}`),
//! strict undefined handling, and block whitespace trimming so `{% for %}`
//! loops produce clean YAML.

use minijinja::{Environment, UndefinedBehavior};

use super::context::TemplateContext;
use super::error::TemplateError;

/// Template engine for node spec rendering
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TemplateEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateEngine").finish_non_exhaustive()
    }
}

impl TemplateEngine {
    /// Create a new template engine
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_keep_trailing_newline(true);

        env.add_filter("quote", filters::quote);
        env.add_filter("required", filters::required);

        Self { env }
    }

    /// Render a template string with the given context
    ///
    /// # Errors
    ///
    /// Returns `TemplateError` if the syntax is invalid, a referenced variable
    /// is undefined, or a filter fails.
    pub fn render(&self, template: &str, ctx: &TemplateContext) -> Result<String, TemplateError> {
        self.env
            .render_str(template, ctx.to_value())
            .map_err(TemplateError::from)
    }
}

mod filters {
    use minijinja::{Error, ErrorKind, Value};

    /// Emit a string as a double-quoted scalar, safe inside YAML
    ///
    /// Usage: `{{ node.config | quote }}`
    pub fn quote(value: &str) -> String {
        serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value))
    }

    /// Fail when the value is undefined or empty
    ///
    /// Usage: `{{ node.version | required }}`
    pub fn required(value: Value) -> Result<Value, Error> {
        if value.is_undefined() || value.is_none() || value.as_str() == Some("") {
            Err(Error::new(
                ErrorKind::UndefinedError,
                "required value is empty",
            ))
        } else {
            Ok(value)
        }
    }
}
