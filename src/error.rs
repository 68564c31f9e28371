//! Error types for the NetBox provider.

use thiserror::Error;

use crate::schema::Diagnostic;

/// Errors that can occur while serving provider operations.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The requested object was not found in NetBox.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A validation error occurred.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The provider (or a handler) has not been configured correctly.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested resource or data source type is not registered.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The HTTP request to NetBox could not be completed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// NetBox rejected the API token (authentication/authorization failure).
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// NetBox is temporarily unavailable.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// NetBox rejected the request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Operation not implemented.
    #[error("Unimplemented: {0}")]
    Unimplemented(String),
}

impl ProviderError {
    /// Get the error message as a string.
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(msg) => msg,
            Self::Validation(msg) => msg,
            Self::Configuration(msg) => msg,
            Self::UnknownResource(msg) => msg,
            Self::Serialization(_err) => "serialization error (see Debug output)",
            Self::Http(_err) => "http error (see Debug output)",
            Self::PermissionDenied(msg) => msg,
            Self::Unavailable(msg) => msg,
            Self::InvalidRequest(msg) => msg,
            Self::Unimplemented(msg) => msg,
        }
    }
}

impl From<ProviderError> for Diagnostic {
    fn from(err: ProviderError) -> Self {
        Diagnostic::error(err.to_string())
    }
}

/// The NetBox API client could not be constructed.
///
/// Carries the underlying failure message verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ConstructionError {
    message: String,
}

impl ConstructionError {
    /// Wrap an underlying construction failure.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The underlying failure message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Render this failure the way the host shows it to the user.
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error("Unable to Create NetBox API Client").with_detail(format!(
            "An unexpected error occurred when creating the NetBox API client. \
             If the error is not clear, please contact the provider developers.\n\n\
             NetBox Client Error: {}",
            self.message
        ))
    }
}
