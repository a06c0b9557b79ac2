//! HTTP transport layer.
//!
//! Isolates the crate from the concrete HTTP client. Everything above this
//! module talks to the [`HttpTransport`] trait, so tests (and embedders with
//! their own connection management) can substitute their own executor.

mod http;

pub use http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, HttpTransportImpl};

use std::time::Duration;
use thiserror::Error;

/// Transport-level errors.
///
/// These cover failures below the HTTP status-code level; responses with an
/// error status are returned as ordinary [`HttpResponse`] values and
/// classified by the caller.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("Connection error: {message}")]
    Connection {
        /// Error message.
        message: String,
    },

    /// Request timed out.
    #[error("Request timed out after {timeout:?}")]
    Timeout {
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// Response could not be read.
    #[error("Invalid response: {message}")]
    InvalidResponse {
        /// Error message.
        message: String,
    },
}
