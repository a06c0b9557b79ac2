//! Error types for the jobs client.
//!
//! Only HTTP 429 is ever handled locally (retried or converted into
//! [`JobsError::RateLimitExceeded`]); every other failure surfaces to the
//! caller on the first attempt with its original status preserved.

use thiserror::Error;

use crate::transport::TransportError;

/// Result type alias for jobs client operations.
pub type JobsResult<T> = Result<T, JobsError>;

/// Comprehensive error type for jobs client operations.
#[derive(Debug, Error)]
pub enum JobsError {
    /// Configuration error (invalid API key, base URL, etc.)
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message describing the configuration issue.
        message: String,
    },

    /// Authentication error (invalid or missing API key).
    #[error("Authentication failed: {message}")]
    Authentication {
        /// Error message from the API.
        message: String,
    },

    /// Retry attempts on HTTP 429 were exhausted.
    #[error("Rate limit exceeded after {attempts} attempts (HTTP {status_code})")]
    RateLimitExceeded {
        /// HTTP status code that triggered the retries (always 429).
        status_code: u16,
        /// Number of attempts consumed before giving up.
        attempts: u32,
    },

    /// Cumulative polling wait reached the configured ceiling.
    #[error("{message}")]
    PollingTimeout {
        /// Rendered message (plain or rate-limited variant).
        message: String,
        /// Seconds accumulated when the budget was exceeded.
        waited_secs: u64,
        /// The configured wait budget in seconds.
        budget_secs: u64,
        /// True if the budget was exhausted while the server rate-limited us.
        rate_limited: bool,
    },

    /// API error status other than 429. Never retried.
    #[error("API error (HTTP {status_code}): {message}")]
    Api {
        /// HTTP status code.
        status_code: u16,
        /// Error message.
        message: String,
        /// Request ID for debugging.
        request_id: Option<String>,
    },

    /// Network-level transport failure, passed through unchanged.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Job payload that does not match the protocol, including a status
    /// value outside the closed set.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Error message.
        message: String,
    },

    /// Job result field could not be decoded under the requested mode.
    #[error("Result decode error: {message}")]
    ResultDecode {
        /// Error message.
        message: String,
    },

    /// Request serialization failure.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message.
        message: String,
    },
}

impl JobsError {
    /// Returns true if this error came from server-side rate limiting.
    pub fn is_rate_limited(&self) -> bool {
        matches!(
            self,
            JobsError::RateLimitExceeded { .. }
                | JobsError::PollingTimeout {
                    rate_limited: true,
                    ..
                }
        )
    }

    /// Returns the HTTP status code associated with this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            JobsError::RateLimitExceeded { status_code, .. }
            | JobsError::Api { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        JobsError::Configuration {
            message: message.into(),
        }
    }

    /// Creates a protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        JobsError::Protocol {
            message: message.into(),
        }
    }

    /// Creates a polling timeout error.
    ///
    /// The message names the cause: an ordinary pending-status timeout or a
    /// budget exhausted while the server was rate limiting the poll.
    pub fn polling_timeout(waited_secs: u64, budget_secs: u64, rate_limited: bool) -> Self {
        let message = if rate_limited {
            format!(
                "Job polling exceeded the {budget_secs}s wait budget while rate limited \
                 (waited {waited_secs}s)"
            )
        } else {
            format!(
                "Job polling exceeded the {budget_secs}s wait budget \
                 (waited {waited_secs}s, job still pending)"
            )
        };
        JobsError::PollingTimeout {
            message,
            waited_secs,
            budget_secs,
            rate_limited,
        }
    }
}

/// API error response body.
#[derive(Debug, serde::Deserialize)]
pub struct ApiErrorResponse {
    /// The error details.
    pub error: ApiErrorDetail,
}

/// Detailed API error information.
#[derive(Debug, serde::Deserialize)]
pub struct ApiErrorDetail {
    /// The error message.
    pub message: String,
    /// The error code.
    pub code: Option<String>,
}

impl From<serde_json::Error> for JobsError {
    fn from(err: serde_json::Error) -> Self {
        JobsError::Serialization {
            message: err.to_string(),
        }
    }
}
