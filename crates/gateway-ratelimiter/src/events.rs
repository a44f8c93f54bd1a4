use std::time::Instant;

use gateway_core::ResilienceEvent;

/// Events emitted by [`crate::RateLimiter`] and [`crate::SecurityRateLimiter`].
#[derive(Debug, Clone)]
pub enum RateLimiterEvent {
    /// A request was admitted under the window's limit.
    PermitAcquired {
        pattern_name: String,
        timestamp: Instant,
        key: String,
        remaining: usize,
    },
    /// A request was refused for exceeding the window's limit.
    PermitRejected {
        pattern_name: String,
        timestamp: Instant,
        key: String,
        retry_after_secs: u64,
    },
    /// A key crossed `max_attempts` and was placed under a block.
    KeyBlocked {
        pattern_name: String,
        timestamp: Instant,
        key: String,
        block_until_millis: u64,
    },
    /// A key's block was lifted, either explicitly or after a success.
    KeyUnblocked {
        pattern_name: String,
        timestamp: Instant,
        key: String,
    },
}

impl ResilienceEvent for RateLimiterEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RateLimiterEvent::PermitAcquired { .. } => "permit_acquired",
            RateLimiterEvent::PermitRejected { .. } => "permit_rejected",
            RateLimiterEvent::KeyBlocked { .. } => "key_blocked",
            RateLimiterEvent::KeyUnblocked { .. } => "key_unblocked",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            RateLimiterEvent::PermitAcquired { timestamp, .. }
            | RateLimiterEvent::PermitRejected { timestamp, .. }
            | RateLimiterEvent::KeyBlocked { timestamp, .. }
            | RateLimiterEvent::KeyUnblocked { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            RateLimiterEvent::PermitAcquired { pattern_name, .. }
            | RateLimiterEvent::PermitRejected { pattern_name, .. }
            | RateLimiterEvent::KeyBlocked { pattern_name, .. }
            | RateLimiterEvent::KeyUnblocked { pattern_name, .. } => pattern_name,
        }
    }
}
