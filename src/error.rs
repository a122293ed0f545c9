//! Error types for the Labweaver operator

use thiserror::Error;

/// Main error type for Labweaver operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Kubernetes API error (transport or server failure)
    #[error("kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// A referenced object does not exist
    #[error("{kind} '{name}' not found")]
    NotFound {
        /// Kind of the missing object
        kind: String,
        /// Name of the missing object
        name: String,
    },

    /// Create raced with another writer and the object already exists
    #[error("{kind} '{name}' already exists")]
    AlreadyExists {
        /// Kind of the existing object
        kind: String,
        /// Name of the existing object
        name: String,
    },

    /// Invalid arguments handed to a public entry point
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Template substitution or schema decode failed
    #[error("render error: {0}")]
    Render(String),

    /// Validation error for CRD specs
    #[error("validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// No builder is registered for the requested dependency kind
    #[error("unsupported resource kind: {0}")]
    Unsupported(String),
}

impl Error {
    /// Create a not-found error for the given kind and name
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Create an already-exists error for the given kind and name
    pub fn already_exists(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::AlreadyExists {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Create a bad request error with the given message
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    /// Create a render error with the given message
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Create a validation error with the given message
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a serialization error with the given message
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Create an unsupported kind error
    pub fn unsupported(kind: impl Into<String>) -> Self {
        Self::Unsupported(kind.into())
    }

    /// Returns true for the not-found variant
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether retrying the whole reconciliation can succeed
    ///
    /// Contract violations and deterministic render failures return the same
    /// result on every attempt, so they wait for a spec change instead.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Kube(_) | Self::NotFound { .. } | Self::AlreadyExists { .. } => true,
            Self::BadRequest(_)
            | Self::Render(_)
            | Self::Validation(_)
            | Self::Serialization(_)
            | Self::Unsupported(_) => false,
        }
    }
}

impl From<crate::template::TemplateError> for Error {
    fn from(err: crate::template::TemplateError) -> Self {
        Self::Render(err.to_string())
    }
}
