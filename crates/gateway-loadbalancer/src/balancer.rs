use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use gateway_circuitbreaker::{CircuitBreaker, CircuitBreakerError, CircuitBreakerLayer};
use gateway_core::{Target, TargetKey};
use gateway_healthcheck::{HealthCheckWrapper, HealthStatus, TargetProbe};
use tokio::sync::Mutex;
use tower::Service;

use crate::config::LoadBalancerConfig;
use crate::error::LoadBalancerError;
use crate::events::LoadBalancerEvent;
use crate::proxy::{ProxyClient, ProxyError, ProxyRequest, ProxyResponse, ProxyService};
use crate::stats::{TargetStats, TargetStatsSnapshot};

type TargetBreaker = Mutex<CircuitBreaker<ProxyService, ProxyRequest, ProxyResponse, ProxyError>>;

/// Round-robin load balancer over a fixed set of health-checked targets.
///
/// When `config.circuit_breaker` is set, each target also gets its own
/// [`gateway_circuitbreaker::CircuitBreaker`]; `select_next` then skips
/// targets whose breaker is open in addition to ones the health checker has
/// marked unusable.
pub struct LoadBalancer {
    targets: Vec<Target>,
    health_checker: HealthCheckWrapper<Target, TargetProbe>,
    cursor: AtomicUsize,
    stats: HashMap<TargetKey, TargetStats>,
    breakers: Option<HashMap<TargetKey, TargetBreaker>>,
    client: Arc<dyn ProxyClient>,
    config: Arc<LoadBalancerConfig>,
}

impl LoadBalancer {
    /// Builds a load balancer and starts its background health-check task.
    /// Targets are assumed healthy until the first probe says otherwise, so
    /// `select_next` can return a target immediately after construction
    /// rather than waiting out the first `health_check_interval`.
    pub async fn new(config: LoadBalancerConfig, client: Arc<dyn ProxyClient>) -> Self {
        let mut health_builder = HealthCheckWrapper::builder()
            .with_checker(TargetProbe::new(config.probe_policy.clone()))
            .with_interval(config.health_check_interval)
            .with_initial_delay(config.health_check_initial_delay)
            .with_timeout(config.health_check_timeout)
            .with_success_threshold(config.success_threshold)
            .with_failure_threshold(config.failure_threshold);

        for target in &config.targets {
            health_builder = health_builder
                .with_context_assumed_healthy(target.clone(), target.key().to_string());
        }

        let health_checker = health_builder.build();
        health_checker.start().await;

        let stats = config
            .targets
            .iter()
            .map(|t| (t.key(), TargetStats::default()))
            .collect();

        let breakers = config.circuit_breaker.as_ref().map(|policy| {
            config
                .targets
                .iter()
                .map(|target| {
                    let mut builder = CircuitBreakerLayer::<ProxyResponse, ProxyError>::builder()
                        .failure_rate_threshold(policy.failure_rate_threshold)
                        .sliding_window_size(policy.sliding_window_size)
                        .minimum_number_of_calls(policy.minimum_number_of_calls)
                        .wait_duration_in_open(policy.wait_duration_in_open)
                        .permitted_calls_in_half_open(policy.permitted_calls_in_half_open)
                        .failure_classifier(|res: &Result<ProxyResponse, ProxyError>| match res {
                            Ok(response) => response.status.as_u16() >= 500,
                            Err(_) => true,
                        })
                        .name(target.key().to_string());
                    if let Some(count) = policy.failure_threshold {
                        builder = builder.failure_count_threshold(count);
                    }
                    let layer = builder.build();
                    let service = ProxyService::new(Arc::clone(&client), target.clone());
                    (target.key(), Mutex::new(layer.layer_fn(service)))
                })
                .collect::<HashMap<_, _>>()
        });

        Self {
            targets: config.targets.clone(),
            health_checker,
            cursor: AtomicUsize::new(0),
            stats,
            breakers,
            client,
            config: Arc::new(config),
        }
    }

    /// Returns the next target from the healthy subset, advancing the
    /// rotation cursor modulo the subset's length. In the resilient
    /// variant, targets whose circuit breaker is open are skipped via a
    /// bounded forward scan (never recursive) before giving up.
    pub async fn select_next(&self) -> Option<Target> {
        let statuses = self.health_checker.get_all_statuses().await;
        let usable: HashMap<&str, HealthStatus> = statuses
            .iter()
            .map(|(name, status)| (name.as_str(), *status))
            .collect();

        let subset: Vec<&Target> = self
            .targets
            .iter()
            .filter(|t| {
                usable
                    .get(t.key().to_string().as_str())
                    .map_or(false, HealthStatus::is_usable)
            })
            .collect();

        if subset.is_empty() {
            self.emit(LoadBalancerEvent::NoHealthyServers {
                pattern_name: self.config.name.clone(),
                timestamp: Instant::now(),
            });
            return None;
        }

        let len = subset.len();
        let start = self.cursor.fetch_add(1, Ordering::Relaxed) % len;

        let Some(breakers) = &self.breakers else {
            let target = subset[start].clone();
            self.emit_selected(&target);
            return Some(target);
        };

        for i in 0..len {
            let target = subset[(start + i) % len];
            let open = match breakers.get(&target.key()) {
                Some(mutex) => mutex.lock().await.is_open(),
                None => false,
            };
            if open {
                self.emit(LoadBalancerEvent::TargetSkippedCircuitOpen {
                    pattern_name: self.config.name.clone(),
                    timestamp: Instant::now(),
                    target: target.base_url(),
                });
                continue;
            }
            let target = target.clone();
            self.emit_selected(&target);
            return Some(target);
        }

        self.emit(LoadBalancerEvent::NoHealthyServers {
            pattern_name: self.config.name.clone(),
            timestamp: Instant::now(),
        });
        None
    }

    /// Proxies `request` to `target` (honoring the configured
    /// `proxy_timeout`) and records the outcome in both this balancer's
    /// stats and, in the resilient variant, the target's circuit breaker.
    pub async fn execute(
        &self,
        target: &Target,
        request: ProxyRequest,
    ) -> Result<ProxyResponse, LoadBalancerError> {
        let start = Instant::now();
        let timeout = self.config.proxy_timeout;

        let result = if let Some(breakers) = &self.breakers {
            let mutex = breakers.get(&target.key());
            match mutex {
                Some(mutex) => {
                    let mut breaker = mutex.lock().await;
                    let ready = std::future::poll_fn(|cx| Service::poll_ready(&mut *breaker, cx)).await;
                    match ready {
                        Err(err) => Err(err),
                        Ok(()) => {
                            let fut = Service::call(&mut *breaker, request);
                            drop(breaker);
                            match tokio::time::timeout(timeout, fut).await {
                                Ok(res) => res,
                                Err(_) => Err(CircuitBreakerError::Inner(ProxyError::new(format!(
                                    "proxy call to {} timed out after {:?}",
                                    target.base_url(),
                                    timeout
                                )))),
                            }
                        }
                    }
                }
                None => Err(CircuitBreakerError::Inner(ProxyError::new(format!(
                    "no circuit breaker registered for {}",
                    target.base_url()
                )))),
            }
        } else {
            match tokio::time::timeout(timeout, self.client.call(target, request)).await {
                Ok(res) => res.map_err(CircuitBreakerError::Inner),
                Err(_) => Err(CircuitBreakerError::Inner(ProxyError::new(format!(
                    "proxy call to {} timed out after {:?}",
                    target.base_url(),
                    timeout
                )))),
            }
        };

        let elapsed = start.elapsed();
        match result {
            Ok(response) => {
                let success = response.status.as_u16() < 500;
                self.record_request(target, success, elapsed);
                Ok(response)
            }
            Err(CircuitBreakerError::OpenCircuit) => {
                self.record_request(target, false, elapsed);
                Err(LoadBalancerError::CircuitOpen {
                    target: target.base_url(),
                })
            }
            Err(CircuitBreakerError::Inner(err)) => {
                self.record_request(target, false, elapsed);
                Err(LoadBalancerError::Proxy(err))
            }
        }
    }

    /// Updates this target's request counters. Called by `execute`, and
    /// exposed directly so a caller proxying outside of `execute` (e.g. a
    /// host that terminates HTTP itself) can still report outcomes.
    pub fn record_request(&self, target: &Target, success: bool, response_time: Duration) {
        if let Some(stats) = self.stats.get(&target.key()) {
            stats.record(success, response_time);
        }
        self.emit(LoadBalancerEvent::RequestRecorded {
            pattern_name: self.config.name.clone(),
            timestamp: Instant::now(),
            target: target.base_url(),
            success,
            response_time,
        });
    }

    /// A snapshot of every target's request counters.
    pub fn stats(&self) -> HashMap<TargetKey, TargetStatsSnapshot> {
        self.stats
            .iter()
            .map(|(key, stats)| (key.clone(), stats.snapshot()))
            .collect()
    }

    /// The health status of every configured target, in configuration
    /// order.
    pub async fn health(&self) -> Vec<(TargetKey, HealthStatus)> {
        let statuses: HashMap<String, HealthStatus> = self
            .health_checker
            .get_all_statuses()
            .await
            .into_iter()
            .collect();
        self.targets
            .iter()
            .map(|t| {
                let status = statuses
                    .get(&t.key().to_string())
                    .copied()
                    .unwrap_or(HealthStatus::Unknown);
                (t.key(), status)
            })
            .collect()
    }

    /// Stops the background health-check task. Best-effort: any in-flight
    /// probe is abandoned, not awaited.
    pub async fn destroy(&self) {
        self.health_checker.stop().await;
    }

    fn emit_selected(&self, target: &Target) {
        self.emit(LoadBalancerEvent::TargetSelected {
            pattern_name: self.config.name.clone(),
            timestamp: Instant::now(),
            target: target.base_url(),
        });
    }

    fn emit(&self, event: LoadBalancerEvent) {
        self.config.event_listeners.emit(&event);
    }
}
