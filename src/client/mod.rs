//! Jobs API client.
//!
//! Wires configuration, authentication, the HTTP transport, and the shared
//! rate-limit tracker into the jobs service.

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::auth::{ApiKeyAuth, AuthProvider};
use crate::config::{JobsConfig, JobsConfigBuilder};
use crate::errors::{JobsError, JobsResult};
use crate::resilience::RateLimitTracker;
use crate::services::JobsService;
use crate::transport::{HttpTransport, HttpTransportImpl};

/// The main jobs API client.
///
/// One client owns one [`RateLimitTracker`]; counters observed by an
/// ordinary call inform backoff decisions during result polling and vice
/// versa, for the lifetime of the client.
///
/// # Example
///
/// ```rust,no_run
/// use asyncjobs_client::{JobsClient, ResultDecoding};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = JobsClient::builder()
///         .api_key("your_api_key")
///         .base_url("https://jobs.example.com/api/v2")
///         .build()?;
///
///     let submission = client
///         .jobs()
///         .submit("jobs", &serde_json::json!({"data": {"type": "export"}}))
///         .await?;
///
///     let job = client
///         .jobs()
///         .fetch_result(&submission.status_url, ResultDecoding::Structured)
///         .await?;
///     println!("{} finished as {}", job.id, job.status);
///     Ok(())
/// }
/// ```
pub struct JobsClient {
    config: JobsConfig,
    jobs_service: JobsService,
    tracker: Arc<RwLock<RateLimitTracker>>,
}

impl JobsClient {
    /// Creates a new client builder.
    pub fn builder() -> JobsClientBuilder {
        JobsClientBuilder::new()
    }

    /// Creates a client from environment variables.
    ///
    /// Reads `JOBS_API_KEY` and `JOBS_BASE_URL`, and optionally
    /// `JOBS_TIMEOUT` and `JOBS_MAX_RATE_LIMIT_RETRIES`.
    pub fn from_env() -> JobsResult<Self> {
        let config = JobsConfig::from_env()?;
        JobsClientBuilder::from_config(config).build()
    }

    /// Returns the jobs service.
    pub fn jobs(&self) -> &JobsService {
        &self.jobs_service
    }

    /// Returns the configuration.
    pub fn config(&self) -> &JobsConfig {
        &self.config
    }

    /// Returns the last-observed rate limit, if any response reported one.
    pub async fn rate_limit_limit(&self) -> Option<u64> {
        self.tracker.read().await.limit()
    }

    /// Returns the last-observed remaining request count, if any response
    /// reported one.
    pub async fn rate_limit_remaining(&self) -> Option<u64> {
        self.tracker.read().await.remaining()
    }
}

impl std::fmt::Debug for JobsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobsClient")
            .field("config", &self.config)
            .finish()
    }
}

/// Builder for the jobs client.
pub struct JobsClientBuilder {
    config_builder: JobsConfigBuilder,
    config: Option<JobsConfig>,
    transport: Option<Arc<dyn HttpTransport>>,
    auth: Option<Arc<dyn AuthProvider>>,
}

impl JobsClientBuilder {
    /// Creates a new client builder.
    pub fn new() -> Self {
        Self {
            config_builder: JobsConfigBuilder::new(),
            config: None,
            transport: None,
            auth: None,
        }
    }

    /// Creates a builder from an existing configuration.
    pub fn from_config(config: JobsConfig) -> Self {
        Self {
            config_builder: JobsConfigBuilder::new(),
            config: Some(config),
            transport: None,
            auth: None,
        }
    }

    /// Sets the API key.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.api_key(api_key);
        self
    }

    /// Sets the base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.base_url(base_url);
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config_builder = self.config_builder.timeout(timeout);
        self
    }

    /// Sets the maximum attempts for a request answered with HTTP 429.
    pub fn max_rate_limit_retries(mut self, retries: u32) -> Self {
        self.config_builder = self.config_builder.max_rate_limit_retries(retries);
        self
    }

    /// Sets the remaining-request threshold below which polling slows down.
    pub fn rate_limit_low_threshold(mut self, threshold: u64) -> Self {
        self.config_builder = self.config_builder.rate_limit_low_threshold(threshold);
        self
    }

    /// Sets the job status polling interval in seconds.
    pub fn polling_interval_secs(mut self, secs: u64) -> Self {
        self.config_builder = self.config_builder.polling_interval_secs(secs);
        self
    }

    /// Sets the cumulative polling wait budget in seconds.
    pub fn polling_wait_secs(mut self, secs: u64) -> Self {
        self.config_builder = self.config_builder.polling_wait_secs(secs);
        self
    }

    /// Forces polling to use the configured interval, ignoring `Retry-After`
    /// hints on transitional status responses.
    pub fn use_fixed_interval(mut self, fixed: bool) -> Self {
        self.config_builder = self.config_builder.use_fixed_interval(fixed);
        self
    }

    /// Sets a custom transport.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets a custom auth provider.
    pub fn auth(mut self, auth: Arc<dyn AuthProvider>) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Builds the client.
    pub fn build(self) -> JobsResult<JobsClient> {
        let config = match self.config {
            Some(config) => config,
            None => self.config_builder.build()?,
        };

        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(t) => t,
            None => Arc::new(
                HttpTransportImpl::new(&config.base_url, config.timeout).map_err(|e| {
                    JobsError::Configuration {
                        message: e.to_string(),
                    }
                })?,
            ),
        };

        let auth: Arc<dyn AuthProvider> = match self.auth {
            Some(a) => a,
            None => Arc::new(ApiKeyAuth::from_string(config.api_key())),
        };

        let tracker = Arc::new(RwLock::new(RateLimitTracker::new()));

        let jobs_service = JobsService::new(
            Arc::clone(&transport),
            Arc::clone(&auth),
            Arc::clone(&tracker),
            &config,
        );

        Ok(JobsClient {
            config,
            jobs_service,
            tracker,
        })
    }
}

impl Default for JobsClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_config() {
        let result = JobsClientBuilder::new().build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_with_required_fields() {
        let result = JobsClientBuilder::new()
            .api_key("test_key_12345")
            .base_url("https://jobs.example.com/api/v2")
            .build();

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_rate_limit_accessors_start_unknown() {
        let client = JobsClientBuilder::new()
            .api_key("test_key")
            .base_url("https://jobs.example.com")
            .build()
            .unwrap();

        assert_eq!(client.rate_limit_limit().await, None);
        assert_eq!(client.rate_limit_remaining().await, None);
    }
}
