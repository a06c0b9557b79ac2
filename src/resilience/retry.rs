//! Rate-limit-aware request execution.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::instrument;

use crate::errors::{ApiErrorResponse, JobsError, JobsResult};
use crate::resilience::rate_limit::{retry_after_secs, RateLimitTracker};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};

/// Fallback wait when a 429 response carries no usable `Retry-After`.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 1;

/// Executes requests with a bounded retry loop on HTTP 429.
///
/// Only 429 is handled here: the executor waits out the server's
/// `Retry-After` hint and reissues the request, up to the configured attempt
/// budget. Every other error status is converted to a typed error and
/// returned on the first attempt; transport failures pass through unchanged.
///
/// The shared [`RateLimitTracker`] is updated from every response the server
/// actually produced, success or 429, so subsequent calls on the same client
/// see the latest window counters.
pub struct RetryExecutor {
    transport: Arc<dyn HttpTransport>,
    tracker: Arc<RwLock<RateLimitTracker>>,
    max_attempts: u32,
}

impl RetryExecutor {
    /// Creates a new executor.
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        tracker: Arc<RwLock<RateLimitTracker>>,
        max_attempts: u32,
    ) -> Self {
        Self {
            transport,
            tracker,
            max_attempts,
        }
    }

    /// Issues a request, retrying while the server answers 429.
    ///
    /// Fails with [`JobsError::RateLimitExceeded`] once `max_attempts`
    /// consecutive 429 responses have been consumed.
    #[instrument(skip(self, request), fields(method = ?request.method, path = %request.path))]
    pub async fn execute(&self, request: HttpRequest) -> JobsResult<HttpResponse> {
        let mut attempts_used: u32 = 0;

        loop {
            let response = self.transport.send(request.clone()).await?;

            if response.status == 429 {
                attempts_used += 1;
                self.tracker
                    .write()
                    .await
                    .update_from_headers(&response.headers);

                if attempts_used >= self.max_attempts {
                    return Err(JobsError::RateLimitExceeded {
                        status_code: 429,
                        attempts: attempts_used,
                    });
                }

                let delay =
                    retry_after_secs(&response.headers).unwrap_or(DEFAULT_RETRY_AFTER_SECS);
                tracing::warn!(
                    attempts_used,
                    max_attempts = self.max_attempts,
                    delay_secs = delay,
                    "Rate limited, retrying"
                );
                tokio::time::sleep(Duration::from_secs(delay)).await;
                continue;
            }

            if !response.is_success() {
                return Err(error_from_response(&response));
            }

            self.tracker
                .write()
                .await
                .update_from_headers(&response.headers);
            return Ok(response);
        }
    }
}

impl std::fmt::Debug for RetryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryExecutor")
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

/// Converts a non-429 error response into a typed error.
///
/// Never retried; the original status code is preserved.
pub(crate) fn error_from_response(response: &HttpResponse) -> JobsError {
    let request_id = response.headers.get("x-request-id").cloned();

    let message = response
        .json::<ApiErrorResponse>()
        .map(|body| body.error.message)
        .unwrap_or_else(|_| format!("HTTP error: {}", response.status));

    match response.status {
        401 => JobsError::Authentication { message },
        _ => JobsError::Api {
            status_code: response.status,
            message,
            request_id,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, headers: &[(&str, &str)]) -> HttpResponse {
        HttpResponse {
            status,
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: Vec::new(),
        }
    }

    #[test]
    fn test_error_from_response_classifies_auth() {
        let error = error_from_response(&response(401, &[]));
        assert!(matches!(error, JobsError::Authentication { .. }));
    }

    #[test]
    fn test_error_from_response_preserves_status() {
        let error = error_from_response(&response(503, &[("x-request-id", "req-9")]));
        match error {
            JobsError::Api {
                status_code,
                request_id,
                ..
            } => {
                assert_eq!(status_code, 503);
                assert_eq!(request_id.as_deref(), Some("req-9"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn test_error_from_response_reads_body_message() {
        let mut resp = response(403, &[]);
        resp.body = br#"{"error":{"message":"forbidden","code":"no_access"}}"#.to_vec();

        let error = error_from_response(&resp);
        match error {
            JobsError::Api { message, .. } => assert_eq!(message, "forbidden"),
            other => panic!("expected Api error, got {other:?}"),
        }
    }
}
