//! Resilience layer for the jobs client.
//!
//! Tracks server-reported rate limit counters, computes adaptive polling
//! backoff from them, and wraps request execution in a bounded 429 retry
//! loop.

mod backoff;
mod rate_limit;
mod retry;

pub use backoff::adaptive_interval;
pub use rate_limit::{
    retry_after_secs, RateLimitTracker, HEADER_RATE_LIMIT, HEADER_RATE_REMAINING,
    HEADER_RETRY_AFTER,
};
pub use retry::{RetryExecutor, DEFAULT_RETRY_AFTER_SECS};

pub(crate) use retry::error_from_response;
