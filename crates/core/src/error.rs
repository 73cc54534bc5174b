//! Error types for the Lectern domain.
//!
//! Uses `thiserror` for ergonomic error definitions. `UpstreamError` carries
//! the HTTP-level status that drives retry decisions; the top-level `Error`
//! is the taxonomy the QA pipeline surfaces to its caller. No failure is
//! swallowed inside the pipeline — either a complete result is returned or
//! one of these variants propagates to the boundary.

use thiserror::Error;

/// The top-level error type for all Lectern operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The embedding service returned no vector for the question.
    #[error("embedding service returned no vector for the question")]
    EmbeddingFailure,

    /// A non-retryable status from an upstream service, surfaced immediately.
    #[error("upstream rejected the request: {0}")]
    UpstreamRejected(#[source] UpstreamError),

    /// A retryable status persisted past the configured attempt budget.
    #[error("upstream retries exhausted after {attempts} attempts: {source}")]
    UpstreamExhausted {
        attempts: usize,
        #[source]
        source: UpstreamError,
    },

    /// The generation call succeeded at the transport level but produced no
    /// usable content.
    #[error("generation call returned no usable content")]
    GenerationFailure,

    /// The user has no messages left; nothing was invoked.
    #[error("message quota exhausted for user {user}")]
    QuotaExceeded { user: String },

    // --- Configuration errors ---
    #[error("configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// A failure observed while calling one of the upstream HTTP services.
///
/// The status code is what the retry layer inspects to decide whether the
/// failure is transient.
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    #[error("API request failed: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    #[error("network error: {0}")]
    Network(String),
}

impl UpstreamError {
    /// The HTTP status that caused this failure, if one was observed.
    ///
    /// Transport-level failures (DNS, connection reset) have no status and
    /// are never retried.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status_code, .. } => Some(*status_code),
            Self::Network(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_error_displays_status() {
        let err = Error::UpstreamRejected(UpstreamError::Api {
            status_code: 500,
            message: "Internal Server Error".into(),
        });
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("Internal Server Error"));
    }

    #[test]
    fn exhausted_error_displays_attempts() {
        let err = Error::UpstreamExhausted {
            attempts: 6,
            source: UpstreamError::Api {
                status_code: 503,
                message: "Service Unavailable".into(),
            },
        };
        assert!(err.to_string().contains("6 attempts"));
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn status_code_extraction() {
        let api = UpstreamError::Api {
            status_code: 429,
            message: "rate limited".into(),
        };
        assert_eq!(api.status_code(), Some(429));

        let network = UpstreamError::Network("connection refused".into());
        assert_eq!(network.status_code(), None);
    }

    #[test]
    fn quota_error_names_user() {
        let err = Error::QuotaExceeded {
            user: "student@example.edu".into(),
        };
        assert!(err.to_string().contains("student@example.edu"));
    }
}
