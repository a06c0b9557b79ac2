//! Jobs service: submission, status checks, and result polling.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::instrument;

use crate::auth::AuthProvider;
use crate::config::JobsConfig;
use crate::errors::{JobsError, JobsResult};
use crate::resilience::{
    adaptive_interval, error_from_response, retry_after_secs, RateLimitTracker, RetryExecutor,
};
use crate::transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
use crate::types::{Job, JobEnvelope, JobStatus, JobSubmission, ResultDecoding};

/// Polling budget derived from the client configuration.
#[derive(Debug, Clone, Copy)]
struct PollingBudget {
    interval_secs: u64,
    max_wait_secs: u64,
    low_remaining_threshold: u64,
    use_fixed_interval: bool,
}

/// Jobs service.
///
/// Ordinary calls go through the [`RetryExecutor`]; result polling runs its
/// own loop with an inline 429 branch, because a rate-limited poll consumes
/// wait budget rather than a retry attempt. Both paths feed the same shared
/// [`RateLimitTracker`], so backoff decisions in one reflect headers
/// observed by the other.
pub struct JobsService {
    transport: Arc<dyn HttpTransport>,
    auth: Arc<dyn AuthProvider>,
    executor: RetryExecutor,
    tracker: Arc<RwLock<RateLimitTracker>>,
    polling: PollingBudget,
}

impl JobsService {
    /// Creates a new jobs service.
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        auth: Arc<dyn AuthProvider>,
        tracker: Arc<RwLock<RateLimitTracker>>,
        config: &JobsConfig,
    ) -> Self {
        let executor = RetryExecutor::new(
            Arc::clone(&transport),
            Arc::clone(&tracker),
            config.max_rate_limit_retries,
        );

        Self {
            transport,
            auth,
            executor,
            tracker,
            polling: PollingBudget {
                interval_secs: config.polling_interval_secs,
                max_wait_secs: config.polling_wait_secs,
                low_remaining_threshold: config.rate_limit_low_threshold,
                use_fixed_interval: config.use_fixed_interval,
            },
        }
    }

    /// Issues an ordinary API call through the rate-limit retry executor.
    #[instrument(skip(self, body), fields(method = ?method, path = %path))]
    pub async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> JobsResult<HttpResponse> {
        let request = self.build_request(method, path, body)?;
        self.executor.execute(request).await
    }

    /// Submits a job and returns where to poll it.
    ///
    /// The status URL comes from the `Location` header when the API sends
    /// one, otherwise from the envelope's `links.self` member.
    #[instrument(skip(self, body), fields(path = %path))]
    pub async fn submit(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> JobsResult<JobSubmission> {
        let response = self.request(HttpMethod::Post, path, Some(body)).await?;

        let location = response.header("location").map(str::to_string);
        let envelope = parse_envelope(&response)?;

        let status_url = location
            .or_else(|| envelope.data.links.as_ref().and_then(|l| l.self_link.clone()))
            .ok_or_else(|| {
                JobsError::protocol("submission response carries no status URL")
            })?;

        Ok(JobSubmission {
            job_id: envelope.data.id,
            status_url,
        })
    }

    /// Performs a single status check without polling.
    #[instrument(skip(self), fields(status_url = %status_url))]
    pub async fn status(&self, status_url: &str) -> JobsResult<JobStatus> {
        let response = self.request(HttpMethod::Get, status_url, None).await?;
        let envelope = parse_envelope(&response)?;
        Ok(envelope.data.attributes.status)
    }

    /// Polls a status URL until the job reaches a terminal state.
    ///
    /// A 429 answer waits out `Retry-After` (or the configured interval) and
    /// polls again without evaluating a status; a transitional status waits
    /// the adaptively scaled interval. Either wait counts against the
    /// cumulative budget, and meeting the budget fails the call with
    /// [`JobsError::PollingTimeout`] before any further sleep.
    #[instrument(skip(self), fields(status_url = %status_url))]
    pub async fn fetch_result(
        &self,
        status_url: &str,
        decoding: ResultDecoding,
    ) -> JobsResult<Job> {
        let budget = self.polling.max_wait_secs;
        let mut waited_secs: u64 = 0;

        loop {
            let request = self.build_request(HttpMethod::Get, status_url, None)?;
            let response = self.transport.send(request).await?;

            if response.status == 429 {
                self.tracker
                    .write()
                    .await
                    .update_from_headers(&response.headers);

                let delay =
                    retry_after_secs(&response.headers).unwrap_or(self.polling.interval_secs);
                waited_secs = waited_secs.saturating_add(delay);
                if waited_secs >= budget {
                    return Err(JobsError::polling_timeout(waited_secs, budget, true));
                }

                tracing::debug!(delay_secs = delay, waited_secs, "Poll rate limited, waiting");
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

            let envelope = parse_envelope(&response)?;
            let status = envelope.data.attributes.status;

            if status.is_terminal() {
                tracing::debug!(status = %status, waited_secs, "Job reached terminal status");
                return Job::from_envelope(envelope, decoding);
            }

            let base = if self.polling.use_fixed_interval {
                self.polling.interval_secs
            } else {
                retry_after_secs(&response.headers).unwrap_or(self.polling.interval_secs)
            };
            let remaining = self.tracker.read().await.remaining();
            let interval =
                adaptive_interval(base, remaining, self.polling.low_remaining_threshold);

            waited_secs = waited_secs.saturating_add(interval);
            if waited_secs >= budget {
                return Err(JobsError::polling_timeout(waited_secs, budget, false));
            }

            tracing::debug!(
                status = %status,
                interval_secs = interval,
                waited_secs,
                "Job not finished, waiting"
            );
            tokio::time::sleep(Duration::from_secs(interval)).await;
        }
    }

    /// Builds an authenticated HTTP request.
    fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> JobsResult<HttpRequest> {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        self.auth.apply_auth(&mut headers);

        let body = body
            .map(|b| serde_json::to_vec(b))
            .transpose()
            .map_err(|e| JobsError::Serialization {
                message: e.to_string(),
            })?;

        Ok(HttpRequest {
            method,
            path: path.to_string(),
            headers,
            body,
            timeout: None,
        })
    }
}

impl std::fmt::Debug for JobsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobsService")
            .field("polling", &self.polling)
            .finish()
    }
}

/// Parses a job envelope, mapping failures (including an out-of-set status
/// value) to a protocol error.
fn parse_envelope(response: &HttpResponse) -> JobsResult<JobEnvelope> {
    response
        .json::<JobEnvelope>()
        .map_err(|e| JobsError::protocol(format!("malformed job payload: {e}")))
}
