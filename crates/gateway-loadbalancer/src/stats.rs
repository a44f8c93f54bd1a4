//! Per-target request accounting, read by [`crate::LoadBalancer::stats`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Atomically-updated counters for one target. Cheap to read concurrently
/// with writes; no lock is held across a request.
#[derive(Debug, Default)]
pub(crate) struct TargetStats {
    requests: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
    total_response_time_micros: AtomicU64,
}

impl TargetStats {
    pub(crate) fn record(&self, success: bool, response_time: Duration) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        if success {
            self.successes.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }
        self.total_response_time_micros
            .fetch_add(response_time.as_micros() as u64, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> TargetStatsSnapshot {
        let requests = self.requests.load(Ordering::Relaxed);
        let total_micros = self.total_response_time_micros.load(Ordering::Relaxed);
        TargetStatsSnapshot {
            requests,
            successes: self.successes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            average_response_time: if requests == 0 {
                Duration::ZERO
            } else {
                Duration::from_micros(total_micros / requests)
            },
        }
    }
}

/// A point-in-time read of one target's [`TargetStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TargetStatsSnapshot {
    pub requests: u64,
    pub successes: u64,
    pub failures: u64,
    pub average_response_time: Duration,
}
