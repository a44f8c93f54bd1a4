//! In-process API gateway middleware.
//!
//! [`Gateway`] composes fixed-window rate limiting, IP filtering, request
//! validation, security headers, and a health-checked, circuit-breaking
//! round-robin load balancer into one middleware entrypoint
//! ([`Gateway::handle`]) that a host HTTP server calls from its own request
//! pipeline. The gateway does not parse HTTP itself — see [`RequestHandle`]
//! and [`ResponseHandle`] for the adaptation seam.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use gateway::{GatewayConfig, GatewayOutcome};
//! use gateway_counterstore::MemoryCounterStore;
//! use gateway_ratelimiter::RateLimiterConfigBuilder;
//!
//! # async fn example(req: &mut dyn gateway::RequestHandle, res: &mut dyn gateway::ResponseHandle) {
//! let store = Arc::new(MemoryCounterStore::with_default_interval());
//! let config = GatewayConfig::builder()
//!     .rate_limiter(
//!         RateLimiterConfigBuilder::new()
//!             .max_requests(100)
//!             .window(Duration::from_secs(1))
//!             .build(),
//!         store,
//!         Arc::new(|req: &dyn gateway::RequestHandle| {
//!             req.client_addr().map(|a| a.ip().to_string()).unwrap_or_default()
//!         }),
//!         None,
//!     )
//!     .build();
//!
//! let gateway = gateway::Gateway::new(config).await.expect("valid config");
//! if gateway.handle(req, res).await == GatewayOutcome::Terminated {
//!     return;
//! }
//! # }
//! ```

mod config;
mod error;
mod gateway;
mod request;

pub use config::{GatewayConfig, GatewayConfigBuilder, KeyFn, SkipFn};
pub use error::{ConfigError, GatewayError};
pub use gateway::{Gateway, GatewayOutcome};
pub use request::{RequestHandle, ResponseHandle};

// Re-exported so a host assembling a `GatewayConfig` does not need to add
// every component crate as its own direct dependency.
pub use gateway_counterstore::{CounterStore, MemoryCounterStore, RemoteBackend, RemoteCounterStore};
pub use gateway_headers::{HstsConfig, SecurityHeaders, SecurityHeadersBuilder};
pub use gateway_ipfilter::{FilterMode, IpFilterConfig, IpFilterConfigBuilder, IpRule, RuleAction};
pub use gateway_loadbalancer::{
    LoadBalancerConfig, LoadBalancerConfigBuilder, ProxyClient, ProxyError, ProxyRequest,
    ProxyResponse,
};
pub use gateway_ratelimiter::{
    RateLimiterConfig, RateLimiterConfigBuilder, SecurityRateLimiterConfig,
    SecurityRateLimiterConfigBuilder, SecurityVerdict,
};
pub use gateway_validator::{FieldRule, FieldType, Location, ValidatorConfig, ValidatorConfigBuilder};

pub(crate) fn now_millis() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
