//! Fixed-window rate limiting for the gateway.
//!
//! Two flavors share a [`gateway_counterstore::CounterStore`]:
//!
//! - [`RateLimiter`]: classifies each request against a `(window, max_requests)`
//!   budget keyed however the caller likes (by IP, API key, route, ...).
//! - [`SecurityRateLimiter`]: an anti-abuse variant for login/reset-password
//!   style endpoints. It counts failures and, once `max_attempts` is hit,
//!   blocks the key outright for `block_duration`.
//!
//! # Examples
//!
//! ```
//! use gateway_counterstore::MemoryCounterStore;
//! use gateway_ratelimiter::{RateLimiter, RateLimiterConfigBuilder};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() {
//! let store = Arc::new(MemoryCounterStore::with_default_interval());
//! let limiter = RateLimiter::new(
//!     store,
//!     RateLimiterConfigBuilder::new()
//!         .max_requests(100)
//!         .window(Duration::from_secs(1))
//!         .build(),
//! );
//!
//! let verdict = limiter.check("ip:203.0.113.5", false).await;
//! if !verdict.allowed {
//!     println!("retry after {}s", verdict.retry_after_secs);
//! }
//! # }
//! ```

mod config;
mod error;
mod events;
mod limiter;

pub use config::{
    RateLimiterConfig, RateLimiterConfigBuilder, SecurityRateLimiterConfig,
    SecurityRateLimiterConfigBuilder,
};
pub use error::RateLimiterError;
pub use events::RateLimiterEvent;
pub use limiter::{RateLimitVerdict, RateLimiter, SecurityRateLimiter, SecurityVerdict};
