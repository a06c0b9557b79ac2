//! Rate limit tracking from response headers.

use std::collections::HashMap;

/// Header carrying the request limit for the current window.
pub const HEADER_RATE_LIMIT: &str = "x-ratelimit-limit";

/// Header carrying the remaining requests in the current window.
pub const HEADER_RATE_REMAINING: &str = "x-ratelimit-remaining";

/// Header carrying the minimum wait before retrying after a 429.
pub const HEADER_RETRY_AFTER: &str = "retry-after";

/// Last-observed rate limit counters.
///
/// Both values start unknown and are overwritten whenever a response carries
/// the corresponding header. A response missing a header leaves the existing
/// value untouched, so the tracker always reflects the most recently
/// completed response that said anything about the limit.
#[derive(Debug, Default)]
pub struct RateLimitTracker {
    limit: Option<u64>,
    remaining: Option<u64>,
}

impl RateLimitTracker {
    /// Creates a tracker with both counters unknown.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the last-observed request limit, if any response reported one.
    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    /// Returns the last-observed remaining request count, if any response
    /// reported one.
    pub fn remaining(&self) -> Option<u64> {
        self.remaining
    }

    /// Updates the counters from response headers.
    ///
    /// Malformed or missing header values are silently ignored; this never
    /// fails and never resets a previously observed value.
    pub fn update_from_headers(&mut self, headers: &HashMap<String, String>) {
        if let Some(limit) = headers
            .get(HEADER_RATE_LIMIT)
            .and_then(|v| parse_counter(v))
        {
            self.limit = Some(limit);
        }

        if let Some(remaining) = headers
            .get(HEADER_RATE_REMAINING)
            .and_then(|v| parse_counter(v))
        {
            self.remaining = Some(remaining);
        }
    }
}

/// Parses a rate-limit counter header value as a non-negative integer.
fn parse_counter(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}

/// Reads the `Retry-After` header as whole seconds.
///
/// Returns `None` when the header is absent or unparsable; callers pick
/// their own fallback.
pub fn retry_after_secs(headers: &HashMap<String, String>) -> Option<u64> {
    headers
        .get(HEADER_RETRY_AFTER)
        .and_then(|v| v.trim().parse::<u64>().ok())
}
