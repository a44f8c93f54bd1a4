use std::time::{Duration, Instant};

use gateway_core::ResilienceEvent;

/// Events emitted by [`crate::LoadBalancer`].
#[derive(Debug, Clone)]
pub enum LoadBalancerEvent {
    /// `select_next` returned a target (the `base_url`).
    TargetSelected {
        pattern_name: String,
        timestamp: Instant,
        target: String,
    },
    /// `select_next` skipped a target whose circuit breaker is open, while
    /// scanning for the next usable one.
    TargetSkippedCircuitOpen {
        pattern_name: String,
        timestamp: Instant,
        target: String,
    },
    /// No target in the healthy subset was usable.
    NoHealthyServers {
        pattern_name: String,
        timestamp: Instant,
    },
    /// A proxied call to a target completed, successfully or not.
    RequestRecorded {
        pattern_name: String,
        timestamp: Instant,
        target: String,
        success: bool,
        response_time: Duration,
    },
}

impl ResilienceEvent for LoadBalancerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LoadBalancerEvent::TargetSelected { .. } => "target_selected",
            LoadBalancerEvent::TargetSkippedCircuitOpen { .. } => "target_skipped_circuit_open",
            LoadBalancerEvent::NoHealthyServers { .. } => "no_healthy_servers",
            LoadBalancerEvent::RequestRecorded { .. } => "request_recorded",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            LoadBalancerEvent::TargetSelected { timestamp, .. }
            | LoadBalancerEvent::TargetSkippedCircuitOpen { timestamp, .. }
            | LoadBalancerEvent::NoHealthyServers { timestamp, .. }
            | LoadBalancerEvent::RequestRecorded { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            LoadBalancerEvent::TargetSelected { pattern_name, .. }
            | LoadBalancerEvent::TargetSkippedCircuitOpen { pattern_name, .. }
            | LoadBalancerEvent::NoHealthyServers { pattern_name, .. }
            | LoadBalancerEvent::RequestRecorded { pattern_name, .. } => pattern_name,
        }
    }
}
