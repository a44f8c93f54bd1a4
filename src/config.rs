//! Assembles every component's config into the one [`GatewayConfig`] that
//! [`crate::Gateway::new`] consumes, following this crate family's
//! `XConfig`/`XConfigBuilder` split.

use std::sync::Arc;

use gateway_counterstore::CounterStore;
use gateway_headers::SecurityHeaders;
use gateway_ipfilter::IpFilterConfig;
use gateway_loadbalancer::{LoadBalancerConfig, ProxyClient};
use gateway_ratelimiter::{RateLimiterConfig, SecurityRateLimiterConfig};
use gateway_validator::ValidatorConfig;

use crate::request::RequestHandle;

/// Derives the key a rate limiter or security rate limiter admits/blocks by.
/// Typically `"ip:{addr}"` or `"user:{id}"`, extracted from whatever the host
/// request carries (client address, an auth header, a route parameter).
pub type KeyFn = Arc<dyn Fn(&dyn RequestHandle) -> String + Send + Sync>;

/// Lets a caller exempt requests from the business rate limiter (internal
/// health checks, already-authenticated service-to-service traffic, ...).
pub type SkipFn = Arc<dyn Fn(&dyn RequestHandle) -> bool + Send + Sync>;

pub(crate) struct RateLimiterSettings {
    pub(crate) config: RateLimiterConfig,
    pub(crate) store: Arc<dyn CounterStore>,
    pub(crate) key_fn: KeyFn,
    pub(crate) skip_fn: Option<SkipFn>,
}

pub(crate) struct SecurityRateLimiterSettings {
    pub(crate) config: SecurityRateLimiterConfig,
    pub(crate) store: Arc<dyn CounterStore>,
    pub(crate) key_fn: KeyFn,
}

pub(crate) struct LoadBalancerSettings {
    pub(crate) config: LoadBalancerConfig,
    pub(crate) client: Arc<dyn ProxyClient>,
}

/// The gateway's full configuration: every stage is independently optional
/// (an absent stage is skipped by [`crate::Gateway::handle`]), except that
/// `Gateway::new` rejects a config with neither a rate limiter nor a load
/// balancer — a gateway that does nothing at all is almost certainly a
/// misconfiguration rather than an intentional no-op.
pub struct GatewayConfig {
    pub(crate) security_headers: Option<SecurityHeaders>,
    pub(crate) ip_filter: Option<IpFilterConfig>,
    pub(crate) security_rate_limiter: Option<SecurityRateLimiterSettings>,
    pub(crate) validator: Option<ValidatorConfig>,
    pub(crate) rate_limiter: Option<RateLimiterSettings>,
    pub(crate) load_balancer: Option<LoadBalancerSettings>,
    pub(crate) name: String,
}

impl GatewayConfig {
    pub fn builder() -> GatewayConfigBuilder {
        GatewayConfigBuilder::new()
    }
}

/// Builder for [`GatewayConfig`].
#[derive(Default)]
pub struct GatewayConfigBuilder {
    security_headers: Option<SecurityHeaders>,
    ip_filter: Option<IpFilterConfig>,
    security_rate_limiter: Option<SecurityRateLimiterSettings>,
    validator: Option<ValidatorConfig>,
    rate_limiter: Option<RateLimiterSettings>,
    load_balancer: Option<LoadBalancerSettings>,
    name: Option<String>,
}

impl GatewayConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables the security-headers stage with the given policy.
    pub fn security_headers(mut self, headers: SecurityHeaders) -> Self {
        self.security_headers = Some(headers);
        self
    }

    /// Enables the IP-filter stage.
    pub fn ip_filter(mut self, config: IpFilterConfig) -> Self {
        self.ip_filter = Some(config);
        self
    }

    /// Enables the anti-abuse security rate limiter, keyed by `key_fn`.
    pub fn security_rate_limiter(
        mut self,
        config: SecurityRateLimiterConfig,
        store: Arc<dyn CounterStore>,
        key_fn: KeyFn,
    ) -> Self {
        self.security_rate_limiter = Some(SecurityRateLimiterSettings {
            config,
            store,
            key_fn,
        });
        self
    }

    /// Enables the request-validator stage.
    pub fn validator(mut self, config: ValidatorConfig) -> Self {
        self.validator = Some(config);
        self
    }

    /// Enables the business (fixed-window) rate limiter, keyed by `key_fn`
    /// and optionally exempting requests for which `skip_fn` returns `true`.
    pub fn rate_limiter(
        mut self,
        config: RateLimiterConfig,
        store: Arc<dyn CounterStore>,
        key_fn: KeyFn,
        skip_fn: Option<SkipFn>,
    ) -> Self {
        self.rate_limiter = Some(RateLimiterSettings {
            config,
            store,
            key_fn,
            skip_fn,
        });
        self
    }

    /// Enables the load-balancer/reverse-proxy stage.
    pub fn load_balancer(mut self, config: LoadBalancerConfig, client: Arc<dyn ProxyClient>) -> Self {
        self.load_balancer = Some(LoadBalancerSettings { config, client });
        self
    }

    /// Sets a name for this gateway instance, used in log fields.
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn build(self) -> GatewayConfig {
        GatewayConfig {
            security_headers: self.security_headers,
            ip_filter: self.ip_filter,
            security_rate_limiter: self.security_rate_limiter,
            validator: self.validator,
            rate_limiter: self.rate_limiter,
            load_balancer: self.load_balancer,
            name: self.name.unwrap_or_else(|| "<unnamed>".to_string()),
        }
    }
}
