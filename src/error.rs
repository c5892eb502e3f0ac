//! Error handling and custom error types
//!
//! Provides unified error handling across the crate using thiserror. Provider
//! errors and the generic communication wrapper are distinct variants so the
//! pipeline boundary can decide between re-raising and wrapping by type.

use crate::models::ConnectionMethod;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Config(String),

    #[error("Cannot send empty request to Gemini via {method} method.")]
    EmptyConversation { method: ConnectionMethod },

    /// Non-success status or undecodable body reported by the provider.
    /// The message already starts with `API Error`.
    #[error("{0}")]
    Api(String),

    #[error("Failed to communicate with {method} endpoint or process response: {message}")]
    Communication {
        method: ConnectionMethod,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] dotenvy::Error),
}

impl Error {
    pub fn is_provider_error(&self) -> bool {
        matches!(self, Error::Api(_))
    }

    /// Wrap anything that is not a provider error into [`Error::Communication`].
    pub fn into_communication(self, method: ConnectionMethod) -> Self {
        if self.is_provider_error() {
            return self;
        }
        Error::Communication {
            method,
            message: self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_passes_through_unchanged() {
        let err = Error::Api("API Error via proxy (500 Internal Server Error): overloaded".into())
            .into_communication(ConnectionMethod::Proxy);
        assert!(matches!(err, Error::Api(_)));
        assert_eq!(
            err.to_string(),
            "API Error via proxy (500 Internal Server Error): overloaded"
        );
    }

    #[test]
    fn test_other_errors_are_wrapped_with_method() {
        let err = Error::EmptyConversation {
            method: ConnectionMethod::Direct,
        }
        .into_communication(ConnectionMethod::Direct);
        assert_eq!(
            err.to_string(),
            "Failed to communicate with direct endpoint or process response: \
             Cannot send empty request to Gemini via direct method."
        );
    }
}
