use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use gateway_counterstore::CounterStore;

use crate::config::{RateLimiterConfig, SecurityRateLimiterConfig};
use crate::events::RateLimiterEvent;

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// The outcome of a [`RateLimiter::check`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitVerdict {
    pub allowed: bool,
    pub limit: usize,
    pub remaining: usize,
    pub reset_at_millis: u64,
    pub window_millis: u64,
    pub retry_after_secs: u64,
}

impl RateLimitVerdict {
    /// The `X-RateLimit-*` response headers for this verdict, carried on
    /// both admitted and refused requests.
    pub fn headers(&self) -> [(&'static str, String); 4] {
        [
            ("X-RateLimit-Limit", self.limit.to_string()),
            ("X-RateLimit-Remaining", self.remaining.to_string()),
            ("X-RateLimit-Reset", self.reset_at_millis.to_string()),
            ("X-RateLimit-Window", self.window_millis.to_string()),
        ]
    }
}

/// A keyed fixed-window rate limiter backed by a [`CounterStore`].
///
/// The current window index is `now_ms / window_ms`; the counter key is
/// `"{key}:{window_index}"`. Store errors are treated as fail-open: the
/// caller is admitted and the error is reported via `tracing::error!` when
/// the `tracing` feature is enabled.
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    config: Arc<RateLimiterConfig>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, config: RateLimiterConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    /// Classifies one admission attempt for `key`. `skip` lets the caller
    /// apply a `skip_fn` decision made from request context the limiter does
    /// not itself understand: when `true`, the verdict is always allow and
    /// the counter is left untouched.
    pub async fn check(&self, key: &str, skip: bool) -> RateLimitVerdict {
        let window_millis = self.config.window.as_millis().max(1) as u64;
        let now = now_millis();
        let window_index = now / window_millis;
        let reset_at_millis = (window_index + 1) * window_millis;

        if skip {
            return RateLimitVerdict {
                allowed: true,
                limit: self.config.max_requests,
                remaining: self.config.max_requests,
                reset_at_millis,
                window_millis,
                retry_after_secs: 0,
            };
        }

        let counter_key = format!("{key}:{window_index}");
        let count = match self
            .store
            .increment(&counter_key, Duration::from_millis(window_millis))
            .await
        {
            Ok(value) => value as usize,
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::error!(error = %_err, key, "counter store failed, allowing request");
                return RateLimitVerdict {
                    allowed: true,
                    limit: self.config.max_requests,
                    remaining: self.config.max_requests,
                    reset_at_millis,
                    window_millis,
                    retry_after_secs: 0,
                };
            }
        };

        let allowed = count <= self.config.max_requests;
        let remaining = self.config.max_requests.saturating_sub(count);
        let retry_after_secs = if allowed {
            0
        } else {
            reset_at_millis.saturating_sub(now).div_ceil(1000)
        };

        if allowed {
            self.config
                .event_listeners
                .emit(&RateLimiterEvent::PermitAcquired {
                    pattern_name: self.config.name.clone(),
                    timestamp: Instant::now(),
                    key: key.to_string(),
                    remaining,
                });
        } else {
            self.config
                .event_listeners
                .emit(&RateLimiterEvent::PermitRejected {
                    pattern_name: self.config.name.clone(),
                    timestamp: Instant::now(),
                    key: key.to_string(),
                    retry_after_secs,
                });
        }

        RateLimitVerdict {
            allowed,
            limit: self.config.max_requests,
            remaining,
            reset_at_millis,
            window_millis,
            retry_after_secs,
        }
    }
}

/// The outcome of a [`SecurityRateLimiter`] check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityVerdict {
    /// The key has attempts remaining this window.
    Allowed { attempts: usize, max_attempts: usize },
    /// The key just crossed `max_attempts` and has been blocked.
    Blocked { block_until_millis: u64 },
    /// The key was already blocked from a prior failure.
    AlreadyBlocked { block_until_millis: u64 },
}

/// Anti-abuse counterpart to [`RateLimiter`]: counts failures via
/// [`SecurityRateLimiter::record_failure`] and, once `max_attempts` is hit,
/// blocks the key outright for `block_duration` regardless of further
/// attempts, until [`SecurityRateLimiter::record_success`] or
/// [`SecurityRateLimiter::unblock`] clears it.
pub struct SecurityRateLimiter {
    store: Arc<dyn CounterStore>,
    config: Arc<SecurityRateLimiterConfig>,
}

impl SecurityRateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, config: SecurityRateLimiterConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    fn block_key(key: &str) -> String {
        format!("block:{key}")
    }

    fn attempts_key(key: &str) -> String {
        format!("attempts:{key}")
    }

    /// Returns the current status of `key` without recording an attempt.
    pub async fn status(&self, key: &str) -> SecurityVerdict {
        if let Ok(Some(block_until_millis)) = self.store.get(&Self::block_key(key)).await {
            return SecurityVerdict::AlreadyBlocked {
                block_until_millis: block_until_millis as u64,
            };
        }
        let attempts = self
            .store
            .get(&Self::attempts_key(key))
            .await
            .ok()
            .flatten()
            .unwrap_or(0) as usize;
        SecurityVerdict::Allowed {
            attempts,
            max_attempts: self.config.max_attempts,
        }
    }

    /// Records a failed operation for `key`, blocking it once `max_attempts`
    /// is reached.
    pub async fn record_failure(&self, key: &str) -> SecurityVerdict {
        if let Ok(Some(block_until_millis)) = self.store.get(&Self::block_key(key)).await {
            return SecurityVerdict::AlreadyBlocked {
                block_until_millis: block_until_millis as u64,
            };
        }

        let attempts = self
            .store
            .increment(&Self::attempts_key(key), self.config.attempt_window)
            .await
            .unwrap_or(1) as usize;

        if attempts >= self.config.max_attempts {
            let block_until_millis = now_millis() + self.config.block_duration.as_millis() as u64;
            let _ = self
                .store
                .set(
                    &Self::block_key(key),
                    block_until_millis as i64,
                    self.config.block_duration,
                )
                .await;

            self.config
                .event_listeners
                .emit(&RateLimiterEvent::KeyBlocked {
                    pattern_name: self.config.name.clone(),
                    timestamp: Instant::now(),
                    key: key.to_string(),
                    block_until_millis,
                });

            SecurityVerdict::Blocked { block_until_millis }
        } else {
            SecurityVerdict::Allowed {
                attempts,
                max_attempts: self.config.max_attempts,
            }
        }
    }

    /// Records a successful operation for `key`, resetting its attempt
    /// counter. Only the attempt counter is touched, so unrelated keys are
    /// unaffected.
    pub async fn record_success(&self, key: &str) {
        let _ = self
            .store
            .set(&Self::attempts_key(key), 0, self.config.attempt_window)
            .await;
    }

    /// Explicitly lifts a block on `key`, regardless of how it was imposed.
    pub async fn unblock(&self, key: &str) {
        let _ = self
            .store
            .set(&Self::block_key(key), 0, Duration::from_secs(0))
            .await;
        let _ = self
            .store
            .set(&Self::attempts_key(key), 0, self.config.attempt_window)
            .await;

        self.config
            .event_listeners
            .emit(&RateLimiterEvent::KeyUnblocked {
                pattern_name: self.config.name.clone(),
                timestamp: Instant::now(),
                key: key.to_string(),
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RateLimiterConfigBuilder, SecurityRateLimiterConfigBuilder};
    use gateway_counterstore::MemoryCounterStore;

    fn memory_store() -> Arc<dyn CounterStore> {
        Arc::new(MemoryCounterStore::new(Duration::from_secs(30)))
    }

    #[tokio::test]
    async fn admits_requests_within_limit() {
        let limiter = RateLimiter::new(
            memory_store(),
            RateLimiterConfigBuilder::new()
                .max_requests(2)
                .window(Duration::from_secs(60))
                .build(),
        );

        let first = limiter.check("ip:1.2.3.4", false).await;
        assert!(first.allowed);
        assert_eq!(first.remaining, 1);

        let second = limiter.check("ip:1.2.3.4", false).await;
        assert!(second.allowed);
        assert_eq!(second.remaining, 0);
    }

    #[tokio::test]
    async fn refuses_requests_over_limit() {
        let limiter = RateLimiter::new(
            memory_store(),
            RateLimiterConfigBuilder::new()
                .max_requests(1)
                .window(Duration::from_secs(60))
                .build(),
        );

        assert!(limiter.check("ip:1.2.3.4", false).await.allowed);
        let third = limiter.check("ip:1.2.3.4", false).await;
        assert!(!third.allowed);
        assert!(third.retry_after_secs > 0);
    }

    #[tokio::test]
    async fn distinct_keys_have_independent_budgets() {
        let limiter = RateLimiter::new(
            memory_store(),
            RateLimiterConfigBuilder::new()
                .max_requests(1)
                .window(Duration::from_secs(60))
                .build(),
        );

        assert!(limiter.check("ip:1.2.3.4", false).await.allowed);
        assert!(limiter.check("ip:5.6.7.8", false).await.allowed);
    }

    #[tokio::test]
    async fn skip_never_touches_the_counter() {
        let limiter = RateLimiter::new(
            memory_store(),
            RateLimiterConfigBuilder::new()
                .max_requests(1)
                .window(Duration::from_secs(60))
                .build(),
        );

        for _ in 0..5 {
            assert!(limiter.check("ip:1.2.3.4", true).await.allowed);
        }
        assert!(limiter.check("ip:1.2.3.4", false).await.allowed);
    }

    #[tokio::test]
    async fn security_limiter_blocks_after_max_attempts() {
        let limiter = SecurityRateLimiter::new(
            memory_store(),
            SecurityRateLimiterConfigBuilder::new()
                .max_attempts(3)
                .attempt_window(Duration::from_secs(60))
                .block_duration(Duration::from_secs(3600))
                .build(),
        );

        assert!(matches!(
            limiter.record_failure("user:alice").await,
            SecurityVerdict::Allowed { .. }
        ));
        assert!(matches!(
            limiter.record_failure("user:alice").await,
            SecurityVerdict::Allowed { .. }
        ));
        assert!(matches!(
            limiter.record_failure("user:alice").await,
            SecurityVerdict::Blocked { .. }
        ));
        assert!(matches!(
            limiter.record_failure("user:alice").await,
            SecurityVerdict::AlreadyBlocked { .. }
        ));
    }

    #[tokio::test]
    async fn success_resets_attempts_without_clearing_other_keys() {
        let store = memory_store();
        let limiter = SecurityRateLimiter::new(
            Arc::clone(&store),
            SecurityRateLimiterConfigBuilder::new()
                .max_attempts(3)
                .build(),
        );

        limiter.record_failure("user:alice").await;
        limiter.record_failure("user:bob").await;
        limiter.record_success("user:alice").await;

        assert!(matches!(
            limiter.status("user:alice").await,
            SecurityVerdict::Allowed { attempts: 0, .. }
        ));
        assert!(matches!(
            limiter.status("user:bob").await,
            SecurityVerdict::Allowed { attempts: 1, .. }
        ));
    }

    #[tokio::test]
    async fn unblock_lifts_a_block() {
        let limiter = SecurityRateLimiter::new(
            memory_store(),
            SecurityRateLimiterConfigBuilder::new()
                .max_attempts(1)
                .block_duration(Duration::from_secs(3600))
                .build(),
        );

        limiter.record_failure("user:alice").await;
        assert!(matches!(
            limiter.status("user:alice").await,
            SecurityVerdict::AlreadyBlocked { .. }
        ));

        limiter.unblock("user:alice").await;
        assert!(matches!(
            limiter.status("user:alice").await,
            SecurityVerdict::Allowed { .. }
        ));
    }
}
