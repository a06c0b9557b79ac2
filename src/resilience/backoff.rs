//! Adaptive polling backoff.

/// Scales a polling interval when the rate limit window is nearly spent.
///
/// With `remaining` unknown or above `low_threshold` the base interval is
/// returned unchanged. At or below the threshold the interval is multiplied
/// by `2 + (low_threshold - remaining)`: twice the base right at the
/// threshold, growing by one base interval for every further unit the
/// remaining count drops. The scaling is deterministic; there is no jitter.
pub fn adaptive_interval(base_secs: u64, remaining: Option<u64>, low_threshold: u64) -> u64 {
    match remaining {
        Some(remaining) if remaining <= low_threshold => {
            let scale = 2 + (low_threshold - remaining);
            base_secs.saturating_mul(scale)
        }
        _ => base_secs,
    }
}
