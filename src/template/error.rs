//! Template error types

use std::fmt;

/// Errors that can occur during template operations
#[derive(Debug)]
pub enum TemplateError {
    /// Template rendering failed (syntax error, undefined variable, filter failure)
    Render(minijinja::Error),
    /// Node has no template body to render
    MissingBody(String),
}

impl TemplateError {
    /// Create a missing body error for a node
    pub fn missing_body(node: &str) -> Self {
        Self::MissingBody(node.to_string())
    }
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Render(e) => write!(f, "template render error: {}", e),
            Self::MissingBody(node) => write!(
                f,
                "node '{}' has no nodeSpec and its NodeType defines none",
                node
            ),
        }
    }
}

impl std::error::Error for TemplateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Render(e) => Some(e),
            Self::MissingBody(_) => None,
        }
    }
}

impl From<minijinja::Error> for TemplateError {
    fn from(err: minijinja::Error) -> Self {
        Self::Render(err)
    }
}
