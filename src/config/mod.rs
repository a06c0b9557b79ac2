//! Configuration module for the jobs client.
//!
//! Provides configuration management including API keys, base URLs,
//! timeouts, and the rate-limit/polling budgets used by the request
//! executor and the job polling loop.

use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use crate::errors::{JobsError, JobsResult};

/// Default request timeout (60 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default maximum attempts for a request answered with HTTP 429.
pub const DEFAULT_MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Default remaining-request threshold below which polling slows down.
pub const DEFAULT_RATE_LIMIT_LOW_THRESHOLD: u64 = 3;

/// Default job status polling interval in seconds.
pub const DEFAULT_POLLING_INTERVAL_SECS: u64 = 10;

/// Default cumulative polling wait budget in seconds.
pub const DEFAULT_POLLING_WAIT_SECS: u64 = 180;

/// Configuration for the jobs client.
#[derive(Clone)]
pub struct JobsConfig {
    /// API key for authentication (stored securely).
    pub(crate) api_key: SecretString,
    /// Base URL for API requests.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum attempts for a request answered with HTTP 429.
    pub max_rate_limit_retries: u32,
    /// Remaining-request threshold below which polling slows down.
    pub rate_limit_low_threshold: u64,
    /// Job status polling interval in seconds.
    pub polling_interval_secs: u64,
    /// Cumulative polling wait budget in seconds.
    pub polling_wait_secs: u64,
    /// Always poll at `polling_interval_secs`, ignoring `Retry-After` hints
    /// on transitional status responses.
    pub use_fixed_interval: bool,
}

impl JobsConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> JobsConfigBuilder {
        JobsConfigBuilder::new()
    }

    /// Creates a configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `JOBS_API_KEY` (required): API key for authentication
    /// - `JOBS_BASE_URL` (required): Base URL of the job API
    /// - `JOBS_TIMEOUT` (optional): Request timeout in seconds
    /// - `JOBS_MAX_RATE_LIMIT_RETRIES` (optional): Maximum 429 retry attempts
    pub fn from_env() -> JobsResult<Self> {
        let api_key = std::env::var("JOBS_API_KEY").map_err(|_| {
            JobsError::configuration("JOBS_API_KEY environment variable not set")
        })?;
        let base_url = std::env::var("JOBS_BASE_URL").map_err(|_| {
            JobsError::configuration("JOBS_BASE_URL environment variable not set")
        })?;

        let mut builder = JobsConfigBuilder::new().api_key(api_key).base_url(base_url);

        if let Ok(timeout_str) = std::env::var("JOBS_TIMEOUT") {
            if let Ok(timeout_secs) = timeout_str.parse::<u64>() {
                builder = builder.timeout(Duration::from_secs(timeout_secs));
            }
        }

        if let Ok(retries_str) = std::env::var("JOBS_MAX_RATE_LIMIT_RETRIES") {
            if let Ok(retries) = retries_str.parse::<u32>() {
                builder = builder.max_rate_limit_retries(retries);
            }
        }

        builder.build()
    }

    /// Returns the API key (exposing the secret).
    pub(crate) fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// Returns the API key hint (last 4 characters) for debugging.
    pub fn api_key_hint(&self) -> String {
        let key = self.api_key.expose_secret();
        if key.len() > 4 {
            format!("...{}", &key[key.len() - 4..])
        } else {
            "****".to_string()
        }
    }
}

impl std::fmt::Debug for JobsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobsConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("max_rate_limit_retries", &self.max_rate_limit_retries)
            .field("rate_limit_low_threshold", &self.rate_limit_low_threshold)
            .field("polling_interval_secs", &self.polling_interval_secs)
            .field("polling_wait_secs", &self.polling_wait_secs)
            .field("use_fixed_interval", &self.use_fixed_interval)
            .finish()
    }
}

/// Builder for `JobsConfig`.
#[derive(Default)]
pub struct JobsConfigBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    timeout: Option<Duration>,
    max_rate_limit_retries: Option<u32>,
    rate_limit_low_threshold: Option<u64>,
    polling_interval_secs: Option<u64>,
    polling_wait_secs: Option<u64>,
    use_fixed_interval: bool,
}

impl JobsConfigBuilder {
    /// Creates a new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the maximum attempts for a request answered with HTTP 429.
    pub fn max_rate_limit_retries(mut self, retries: u32) -> Self {
        self.max_rate_limit_retries = Some(retries);
        self
    }

    /// Sets the remaining-request threshold below which polling slows down.
    pub fn rate_limit_low_threshold(mut self, threshold: u64) -> Self {
        self.rate_limit_low_threshold = Some(threshold);
        self
    }

    /// Sets the job status polling interval in seconds.
    pub fn polling_interval_secs(mut self, secs: u64) -> Self {
        self.polling_interval_secs = Some(secs);
        self
    }

    /// Sets the cumulative polling wait budget in seconds.
    pub fn polling_wait_secs(mut self, secs: u64) -> Self {
        self.polling_wait_secs = Some(secs);
        self
    }

    /// Forces polling to use the configured interval, ignoring `Retry-After`
    /// hints on transitional status responses.
    pub fn use_fixed_interval(mut self, fixed: bool) -> Self {
        self.use_fixed_interval = fixed;
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> JobsResult<JobsConfig> {
        let api_key = self
            .api_key
            .ok_or_else(|| JobsError::configuration("API key is required"))?;

        if api_key.is_empty() {
            return Err(JobsError::configuration("API key cannot be empty"));
        }

        let base_url = self
            .base_url
            .ok_or_else(|| JobsError::configuration("Base URL is required"))?
            .trim_end_matches('/')
            .to_string();

        if !base_url.starts_with("https://") {
            return Err(JobsError::configuration("Base URL must use HTTPS"));
        }

        let max_rate_limit_retries = self
            .max_rate_limit_retries
            .unwrap_or(DEFAULT_MAX_RATE_LIMIT_RETRIES);
        if max_rate_limit_retries < 1 {
            return Err(JobsError::configuration(
                "max_rate_limit_retries must be at least 1",
            ));
        }

        Ok(JobsConfig {
            api_key: SecretString::new(api_key),
            base_url,
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            max_rate_limit_retries,
            rate_limit_low_threshold: self
                .rate_limit_low_threshold
                .unwrap_or(DEFAULT_RATE_LIMIT_LOW_THRESHOLD),
            polling_interval_secs: self
                .polling_interval_secs
                .unwrap_or(DEFAULT_POLLING_INTERVAL_SECS),
            polling_wait_secs: self.polling_wait_secs.unwrap_or(DEFAULT_POLLING_WAIT_SECS),
            use_fixed_interval: self.use_fixed_interval,
        })
    }
}
