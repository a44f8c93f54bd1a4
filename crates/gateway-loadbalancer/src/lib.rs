//! Round-robin load balancing over health-checked backend targets.
//!
//! [`LoadBalancer`] owns an ordered set of [`gateway_core::Target`]s, runs a
//! [`gateway_healthcheck::HealthCheckWrapper`] in the background to track
//! which of them are usable, and rotates through the usable subset with an
//! `AtomicUsize` cursor. Passing [`config::CircuitBreakerPolicy`] to the
//! builder turns on the resilient variant: each target gets its own
//! [`gateway_circuitbreaker::CircuitBreaker`], and `select_next` skips
//! targets whose breaker is open.
//!
//! This crate does not speak HTTP itself — the host implements [`ProxyClient`]
//! to actually perform the upstream call.
//!
//! # Examples
//!
//! ```no_run
//! use async_trait::async_trait;
//! use gateway_core::{Scheme, Target};
//! use gateway_loadbalancer::{LoadBalancer, LoadBalancerConfigBuilder, ProxyClient, ProxyError, ProxyRequest, ProxyResponse};
//! use std::sync::Arc;
//!
//! struct NoopClient;
//!
//! #[async_trait]
//! impl ProxyClient for NoopClient {
//!     async fn call(&self, _target: &Target, _request: ProxyRequest) -> Result<ProxyResponse, ProxyError> {
//!         Ok(ProxyResponse {
//!             status: http::StatusCode::OK,
//!             headers: http::HeaderMap::new(),
//!             body: bytes::Bytes::new(),
//!         })
//!     }
//! }
//!
//! # async fn example() {
//! let config = LoadBalancerConfigBuilder::new()
//!     .target(Target::new(Scheme::Http, "backend-a.internal", 8080))
//!     .target(Target::new(Scheme::Http, "backend-b.internal", 8080))
//!     .build();
//!
//! let lb = LoadBalancer::new(config, Arc::new(NoopClient)).await;
//! if let Some(target) = lb.select_next().await {
//!     println!("routing to {}", target.base_url());
//! }
//! # }
//! ```

mod balancer;
mod config;
mod error;
mod events;
mod proxy;
mod stats;

pub use balancer::LoadBalancer;
pub use config::{
    CircuitBreakerPolicy, CircuitBreakerPolicyBuilder, LoadBalancerConfig,
    LoadBalancerConfigBuilder,
};
pub use error::LoadBalancerError;
pub use events::LoadBalancerEvent;
pub use proxy::{ProxyClient, ProxyError, ProxyRequest, ProxyResponse};
pub use stats::TargetStatsSnapshot;
