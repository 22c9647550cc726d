//! Error types for the `docqa` crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while building or querying a document collection.
#[derive(Debug, Error)]
pub enum RagError {
    /// The source document could not be read or parsed.
    #[error("load error ({}): {message}", path.display())]
    LoadError {
        /// The file that failed to load.
        path: PathBuf,
        /// A description of the failure.
        message: String,
    },

    /// Invalid chunking parameters or missing configuration.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Credentials were missing or rejected by the provider.
    #[error("authentication error ({provider}): {message}")]
    AuthError {
        /// The remote provider that rejected the credentials.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The provider signalled throttling. Safe to retry with backoff.
    #[error("rate limited ({provider}): {message}")]
    RateLimitError {
        /// The remote provider that throttled the request.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The embedding service failed for a reason other than auth or throttling.
    #[error("embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The generation service failed for a reason other than auth or throttling.
    #[error("generation error ({provider}): {message}")]
    GenerationError {
        /// The generation provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A vector store failure: dimension mismatch, unknown collection, or
    /// backend corruption. Never retried.
    #[error("store error ({backend}): {message}")]
    StoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A remote service returned a response whose shape could not be decoded.
    #[error("parse error ({provider}): {message}")]
    ParseError {
        /// The remote provider that returned the response.
        provider: String,
        /// A description of the failure.
        message: String,
    },
}

impl RagError {
    /// Whether the retry layer may re-attempt the failed call.
    ///
    /// Rate limiting and transient embedding/generation failures are
    /// retryable. Auth, config, load, parse, and store failures are not,
    /// since repeating those yields the same outcome.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RagError::RateLimitError { .. }
                | RagError::EmbeddingError { .. }
                | RagError::GenerationError { .. }
        )
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        let throttled = RagError::RateLimitError {
            provider: "watsonx".into(),
            message: "429".into(),
        };
        let auth = RagError::AuthError { provider: "watsonx".into(), message: "401".into() };
        let store = RagError::StoreError { backend: "inmemory".into(), message: "dim".into() };
        let config = RagError::ConfigError("overlap".into());

        assert!(throttled.is_retryable());
        assert!(!auth.is_retryable());
        assert!(!store.is_retryable());
        assert!(!config.is_retryable());
    }

    #[test]
    fn display_includes_provider() {
        let err = RagError::EmbeddingError {
            provider: "openai".into(),
            message: "boom".into(),
        };
        assert_eq!(err.to_string(), "embedding error (openai): boom");
    }
}
