use std::time::Duration;

use gateway_core::EventListeners;

use crate::events::RateLimiterEvent;

/// Configuration for the fixed-window [`crate::RateLimiter`].
pub struct RateLimiterConfig {
    pub(crate) window: Duration,
    pub(crate) max_requests: usize,
    pub(crate) event_listeners: EventListeners<RateLimiterEvent>,
    pub(crate) name: String,
}

/// Builder for [`RateLimiterConfig`].
pub struct RateLimiterConfigBuilder {
    window: Duration,
    max_requests: usize,
    event_listeners: EventListeners<RateLimiterEvent>,
    name: String,
}

impl Default for RateLimiterConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiterConfigBuilder {
    /// Creates a new builder.
    ///
    /// Defaults: `max_requests: 100`, `window: 1s`, `name: "<unnamed>"`.
    pub fn new() -> Self {
        Self {
            window: Duration::from_secs(1),
            max_requests: 100,
            event_listeners: EventListeners::new(),
            name: "<unnamed>".to_string(),
        }
    }

    /// Sets the maximum number of requests admitted per window.
    pub fn max_requests(mut self, max_requests: usize) -> Self {
        self.max_requests = max_requests;
        self
    }

    /// Sets the fixed-window duration. The window boundary is aligned to
    /// `now_ms / window_ms`, not to first-request time.
    pub fn window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Sets the name for this rate limiter instance (used in events).
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback invoked when a request is admitted.
    pub fn on_permit_acquired<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, usize) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(gateway_core::FnListener::new(move |event| {
                if let RateLimiterEvent::PermitAcquired { key, remaining, .. } = event {
                    f(key, *remaining);
                }
            }));
        self
    }

    /// Registers a callback invoked when a request is refused.
    pub fn on_permit_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, u64) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(gateway_core::FnListener::new(move |event| {
                if let RateLimiterEvent::PermitRejected {
                    key,
                    retry_after_secs,
                    ..
                } = event
                {
                    f(key, *retry_after_secs);
                }
            }));
        self
    }

    /// Builds the [`RateLimiterConfig`].
    pub fn build(self) -> RateLimiterConfig {
        RateLimiterConfig {
            window: self.window,
            max_requests: self.max_requests,
            event_listeners: self.event_listeners,
            name: self.name,
        }
    }
}

/// Configuration for the [`crate::SecurityRateLimiter`] anti-abuse variant.
pub struct SecurityRateLimiterConfig {
    pub(crate) attempt_window: Duration,
    pub(crate) max_attempts: usize,
    pub(crate) block_duration: Duration,
    pub(crate) event_listeners: EventListeners<RateLimiterEvent>,
    pub(crate) name: String,
}

/// Builder for [`SecurityRateLimiterConfig`].
pub struct SecurityRateLimiterConfigBuilder {
    attempt_window: Duration,
    max_attempts: usize,
    block_duration: Duration,
    event_listeners: EventListeners<RateLimiterEvent>,
    name: String,
}

impl Default for SecurityRateLimiterConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SecurityRateLimiterConfigBuilder {
    /// Creates a new builder.
    ///
    /// Defaults: `max_attempts: 5`, `attempt_window: 15m`, `block_duration: 1h`.
    pub fn new() -> Self {
        Self {
            attempt_window: Duration::from_secs(15 * 60),
            max_attempts: 5,
            block_duration: Duration::from_secs(60 * 60),
            event_listeners: EventListeners::new(),
            name: "<unnamed>".to_string(),
        }
    }

    pub fn max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn attempt_window(mut self, window: Duration) -> Self {
        self.attempt_window = window;
        self
    }

    pub fn block_duration(mut self, duration: Duration) -> Self {
        self.block_duration = duration;
        self
    }

    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback invoked when a key is blocked.
    pub fn on_key_blocked<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, u64) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(gateway_core::FnListener::new(move |event| {
                if let RateLimiterEvent::KeyBlocked {
                    key,
                    block_until_millis,
                    ..
                } = event
                {
                    f(key, *block_until_millis);
                }
            }));
        self
    }

    pub fn build(self) -> SecurityRateLimiterConfig {
        SecurityRateLimiterConfig {
            attempt_window: self.attempt_window,
            max_attempts: self.max_attempts,
            block_duration: self.block_duration,
            event_listeners: self.event_listeners,
            name: self.name,
        }
    }
}
