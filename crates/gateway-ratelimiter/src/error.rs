use thiserror::Error;

/// Errors surfaced by the rate limiter and security-rate-limiter components.
#[derive(Debug, Error)]
pub enum RateLimiterError {
    /// The caller's key has exceeded its window/attempt budget.
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    LimitExceeded { retry_after_secs: u64 },

    /// The key is currently blocked by the security-rate-limiter.
    #[error("key is blocked until {block_until_millis}")]
    Blocked { block_until_millis: u64 },

    /// The backing counter store failed; the caller decides whether this is
    /// fail-open (rate limiter) or fail-closed.
    #[error("counter store error: {0}")]
    Store(#[from] gateway_counterstore::StoreError),
}
