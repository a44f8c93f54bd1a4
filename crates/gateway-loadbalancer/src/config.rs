use std::time::Duration;

use gateway_core::{EventListeners, Target};
use gateway_healthcheck::ProbePolicy;

use crate::events::LoadBalancerEvent;

/// Per-target circuit breaker settings for the resilient variant. Mirrors
/// the handful of knobs callers tune most often on
/// [`gateway_circuitbreaker::CircuitBreakerConfigBuilder`]; anything more
/// exotic (slow-call detection, time-based windows) should be configured by
/// driving that builder directly and composing it into a custom
/// [`crate::ProxyClient`].
#[derive(Debug, Clone)]
pub struct CircuitBreakerPolicy {
    pub(crate) failure_rate_threshold: f64,
    pub(crate) failure_threshold: Option<usize>,
    pub(crate) sliding_window_size: usize,
    pub(crate) minimum_number_of_calls: usize,
    pub(crate) wait_duration_in_open: Duration,
    pub(crate) permitted_calls_in_half_open: usize,
}

impl Default for CircuitBreakerPolicy {
    fn default() -> Self {
        Self {
            failure_rate_threshold: 0.5,
            failure_threshold: None,
            sliding_window_size: 20,
            minimum_number_of_calls: 10,
            wait_duration_in_open: Duration::from_secs(30),
            permitted_calls_in_half_open: 1,
        }
    }
}

impl CircuitBreakerPolicy {
    pub fn builder() -> CircuitBreakerPolicyBuilder {
        CircuitBreakerPolicyBuilder::default()
    }
}

#[derive(Default)]
pub struct CircuitBreakerPolicyBuilder {
    policy: CircuitBreakerPolicy,
}

impl CircuitBreakerPolicyBuilder {
    pub fn failure_rate_threshold(mut self, rate: f64) -> Self {
        self.policy.failure_rate_threshold = rate;
        self
    }

    /// Sets the absolute failure count at which the breaker trips, evaluated
    /// as an OR alongside `failure_rate_threshold` once `minimum_number_of_calls`
    /// requests have been observed.
    ///
    /// Default: None (rate threshold only)
    pub fn failure_threshold(mut self, count: usize) -> Self {
        self.policy.failure_threshold = Some(count);
        self
    }

    pub fn sliding_window_size(mut self, size: usize) -> Self {
        self.policy.sliding_window_size = size;
        self
    }

    pub fn minimum_number_of_calls(mut self, n: usize) -> Self {
        self.policy.minimum_number_of_calls = n;
        self
    }

    pub fn wait_duration_in_open(mut self, duration: Duration) -> Self {
        self.policy.wait_duration_in_open = duration;
        self
    }

    pub fn permitted_calls_in_half_open(mut self, n: usize) -> Self {
        self.policy.permitted_calls_in_half_open = n;
        self
    }

    pub fn build(self) -> CircuitBreakerPolicy {
        self.policy
    }
}

/// Configuration for [`crate::LoadBalancer`].
pub struct LoadBalancerConfig {
    pub(crate) targets: Vec<Target>,
    pub(crate) probe_policy: ProbePolicy,
    pub(crate) health_check_interval: Duration,
    pub(crate) health_check_initial_delay: Duration,
    pub(crate) health_check_timeout: Duration,
    pub(crate) success_threshold: u32,
    pub(crate) failure_threshold: u32,
    pub(crate) proxy_timeout: Duration,
    pub(crate) circuit_breaker: Option<CircuitBreakerPolicy>,
    pub(crate) event_listeners: EventListeners<LoadBalancerEvent>,
    pub(crate) name: String,
}

/// Builder for [`LoadBalancerConfig`].
pub struct LoadBalancerConfigBuilder {
    targets: Vec<Target>,
    probe_policy: ProbePolicy,
    health_check_interval: Duration,
    health_check_initial_delay: Duration,
    health_check_timeout: Duration,
    success_threshold: u32,
    failure_threshold: u32,
    proxy_timeout: Duration,
    circuit_breaker: Option<CircuitBreakerPolicy>,
    event_listeners: EventListeners<LoadBalancerEvent>,
    name: String,
}

impl Default for LoadBalancerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadBalancerConfigBuilder {
    /// Creates a new builder.
    ///
    /// Defaults: no targets, HTTP probe of `/` every 10s with a 2s timeout,
    /// 2 consecutive successes to recover / 3 consecutive failures to trip,
    /// a 30s proxy timeout, and no per-target circuit breaker.
    pub fn new() -> Self {
        Self {
            targets: Vec::new(),
            probe_policy: ProbePolicy::default(),
            health_check_interval: Duration::from_secs(10),
            health_check_initial_delay: Duration::from_secs(0),
            health_check_timeout: Duration::from_secs(2),
            success_threshold: 2,
            failure_threshold: 3,
            proxy_timeout: Duration::from_secs(30),
            circuit_breaker: None,
            event_listeners: EventListeners::new(),
            name: "<unnamed>".to_string(),
        }
    }

    /// Adds a backend target to the rotation.
    pub fn target(mut self, target: Target) -> Self {
        self.targets.push(target);
        self
    }

    /// Sets the full target list, replacing any already added.
    pub fn targets(mut self, targets: Vec<Target>) -> Self {
        self.targets = targets;
        self
    }

    /// Sets the health probe policy (endpoint, expected status codes, body
    /// match, custom headers).
    pub fn probe_policy(mut self, policy: ProbePolicy) -> Self {
        self.probe_policy = policy;
        self
    }

    pub fn health_check_interval(mut self, interval: Duration) -> Self {
        self.health_check_interval = interval;
        self
    }

    pub fn health_check_initial_delay(mut self, delay: Duration) -> Self {
        self.health_check_initial_delay = delay;
        self
    }

    pub fn health_check_timeout(mut self, timeout: Duration) -> Self {
        self.health_check_timeout = timeout;
        self
    }

    pub fn success_threshold(mut self, threshold: u32) -> Self {
        self.success_threshold = threshold;
        self
    }

    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    /// Sets the timeout applied to each proxied upstream call.
    pub fn proxy_timeout(mut self, timeout: Duration) -> Self {
        self.proxy_timeout = timeout;
        self
    }

    /// Enables the resilient variant: each target gets its own circuit
    /// breaker, skipped by `select_next` while open.
    pub fn circuit_breaker(mut self, policy: CircuitBreakerPolicy) -> Self {
        self.circuit_breaker = Some(policy);
        self
    }

    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback invoked whenever `select_next` returns a target.
    pub fn on_target_selected<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(gateway_core::FnListener::new(move |event| {
                if let LoadBalancerEvent::TargetSelected { target, .. } = event {
                    f(target);
                }
            }));
        self
    }

    /// Registers a callback invoked when no healthy target is available.
    pub fn on_no_healthy_servers<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners
            .add(gateway_core::FnListener::new(move |event| {
                if matches!(event, LoadBalancerEvent::NoHealthyServers { .. }) {
                    f();
                }
            }));
        self
    }

    /// Builds the [`LoadBalancerConfig`].
    pub fn build(self) -> LoadBalancerConfig {
        LoadBalancerConfig {
            targets: self.targets,
            probe_policy: self.probe_policy,
            health_check_interval: self.health_check_interval,
            health_check_initial_delay: self.health_check_initial_delay,
            health_check_timeout: self.health_check_timeout,
            success_threshold: self.success_threshold,
            failure_threshold: self.failure_threshold,
            proxy_timeout: self.proxy_timeout,
            circuit_breaker: self.circuit_breaker,
            event_listeners: self.event_listeners,
            name: self.name,
        }
    }
}
