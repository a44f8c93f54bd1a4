//! The single middleware entrypoint: composes every configured stage in the
//! fixed order the ambient stack's data-flow diagram specifies.

use serde_json::{Map, Value};

use gateway_ipfilter::{derive_client_ip, IpFilter};
use gateway_loadbalancer::{LoadBalancer, ProxyRequest};
use gateway_ratelimiter::{RateLimiter, SecurityRateLimiter, SecurityVerdict};
use gateway_validator::{Location, RequestValidator, RequestValues};

use crate::config::{GatewayConfig, KeyFn, SkipFn};
use crate::error::{ConfigError, GatewayError};
use crate::request::{RequestHandle, ResponseHandle};

/// Whether the pipeline produced a final response or the request should be
/// forwarded to the host's own next handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayOutcome {
    /// A stage sent a terminal response; the host must not continue routing.
    Terminated,
    /// No stage terminated the request (or no load balancer is configured);
    /// the host should forward it to its own next handler.
    Continue,
}

struct RateLimiterStage {
    limiter: RateLimiter,
    key_fn: KeyFn,
    skip_fn: Option<SkipFn>,
}

struct SecurityRateLimiterStage {
    limiter: SecurityRateLimiter,
    key_fn: KeyFn,
}

/// The composed gateway: owns every configured component and exposes the one
/// [`Gateway::handle`] entrypoint the host calls from its own middleware hook.
pub struct Gateway {
    name: String,
    security_headers: Option<gateway_headers::SecurityHeaders>,
    ip_filter: Option<IpFilter>,
    security_rate_limiter: Option<SecurityRateLimiterStage>,
    validator: Option<RequestValidator>,
    rate_limiter: Option<RateLimiterStage>,
    load_balancer: Option<LoadBalancer>,
}

impl Gateway {
    /// Validates `config`, constructs every configured component, and starts
    /// the load balancer's background health-check task if one is present.
    ///
    /// Fails with [`ConfigError::NothingConfigured`] if neither a rate
    /// limiter nor a load balancer is configured — such a gateway would do
    /// nothing at all, which is almost certainly a misconfiguration.
    pub async fn new(config: GatewayConfig) -> Result<Self, ConfigError> {
        if config.rate_limiter.is_none() && config.load_balancer.is_none() {
            return Err(ConfigError::NothingConfigured);
        }

        let ip_filter = config.ip_filter.map(IpFilter::new);

        let security_rate_limiter = config.security_rate_limiter.map(|settings| {
            SecurityRateLimiterStage {
                limiter: SecurityRateLimiter::new(settings.store, settings.config),
                key_fn: settings.key_fn,
            }
        });

        let rate_limiter = config.rate_limiter.map(|settings| RateLimiterStage {
            limiter: RateLimiter::new(settings.store, settings.config),
            key_fn: settings.key_fn,
            skip_fn: settings.skip_fn,
        });

        let load_balancer = match config.load_balancer {
            Some(settings) => Some(LoadBalancer::new(settings.config, settings.client).await),
            None => None,
        };

        Ok(Self {
            name: config.name,
            security_headers: config.security_headers,
            ip_filter,
            security_rate_limiter,
            validator: config.validator,
            rate_limiter,
            load_balancer,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stops the load balancer's background health-check task, if any.
    /// Best-effort: failures while releasing resources are logged, not
    /// raised.
    pub async fn destroy(&self) {
        if let Some(lb) = &self.load_balancer {
            lb.destroy().await;
        }
    }

    /// Reports a failed security-sensitive operation (e.g. a failed login)
    /// for `key` to the anti-abuse security rate limiter, if configured. The
    /// gateway's own pipeline never calls this itself — only the host, which
    /// alone knows whether the guarded operation actually failed, can.
    pub async fn report_auth_failure(&self, key: &str) -> Option<SecurityVerdict> {
        let stage = self.security_rate_limiter.as_ref()?;
        Some(stage.limiter.record_failure(key).await)
    }

    /// Reports a successful security-sensitive operation for `key`, clearing
    /// its attempt counter.
    pub async fn report_auth_success(&self, key: &str) {
        if let Some(stage) = &self.security_rate_limiter {
            stage.limiter.record_success(key).await;
        }
    }

    /// Lifts a security-rate-limiter block on `key` ahead of its TTL.
    pub async fn unblock(&self, key: &str) {
        if let Some(stage) = &self.security_rate_limiter {
            stage.limiter.unblock(key).await;
        }
    }

    /// Runs every configured stage in order, short-circuiting on the first
    /// stage that produces a terminal response.
    pub async fn handle(
        &self,
        req: &mut dyn RequestHandle,
        res: &mut dyn ResponseHandle,
    ) -> GatewayOutcome {
        self.apply_security_headers(req, res);

        if let Some(outcome) = self.run_ip_filter(req, res) {
            return outcome;
        }
        if let Some(outcome) = self.run_security_rate_limiter(req, res).await {
            return outcome;
        }
        if let Some(outcome) = self.run_validator(req, res) {
            return outcome;
        }
        if let Some(outcome) = self.run_rate_limiter(req, res).await {
            return outcome;
        }
        self.run_load_balancer(req, res).await
    }

    fn apply_security_headers(&self, req: &dyn RequestHandle, res: &mut dyn ResponseHandle) {
        let Some(headers) = &self.security_headers else {
            return;
        };
        let forwarded_proto = req.header("x-forwarded-proto");
        let secure = gateway_headers::is_secure(req.secure(), forwarded_proto);
        let (set, removed) = headers.apply(secure);
        for (name, value) in set {
            res.set_header(&name, &value);
        }
        for name in removed {
            res.remove_header(&name);
        }
    }

    fn run_ip_filter(
        &self,
        req: &dyn RequestHandle,
        res: &mut dyn ResponseHandle,
    ) -> Option<GatewayOutcome> {
        let filter = self.ip_filter.as_ref()?;

        let client_ip = derive_client_ip(
            req.header("x-forwarded-for"),
            req.header("x-real-ip"),
            req.client_addr().map(|addr| addr.ip()),
            filter.trust_proxy(),
        )?;

        let decision = filter.check(client_ip);
        if decision.allowed {
            return None;
        }

        #[cfg(feature = "tracing")]
        tracing::warn!(gateway = %self.name, ip = %client_ip, "ip blocked by filter rule");

        Some(self.terminate(res, &GatewayError::IpBlocked))
    }

    async fn run_security_rate_limiter(
        &self,
        req: &dyn RequestHandle,
        res: &mut dyn ResponseHandle,
    ) -> Option<GatewayOutcome> {
        let stage = self.security_rate_limiter.as_ref()?;
        let key = (stage.key_fn)(req);

        match stage.limiter.status(&key).await {
            SecurityVerdict::AlreadyBlocked { block_until_millis } => Some(self.terminate(
                res,
                &GatewayError::Blocked { block_until_millis },
            )),
            SecurityVerdict::Allowed { .. } | SecurityVerdict::Blocked { .. } => None,
        }
    }

    fn run_validator(
        &self,
        req: &mut dyn RequestHandle,
        res: &mut dyn ResponseHandle,
    ) -> Option<GatewayOutcome> {
        let validator = self.validator.as_ref()?;

        let headers = headers_to_map(req.headers());
        let method = req.method().as_str().to_string();
        let content_type = req.content_type().map(|s| s.to_string());
        let query = req.query().clone();
        let body = req.body().clone();
        let params = req.params().clone();

        let values = RequestValues {
            method: &method,
            content_type: content_type.as_deref(),
            headers: &headers,
            query: &query,
            body: &body,
            params: &params,
        };

        match validator.validate(&values) {
            Ok(sanitized) => {
                for (location, fields) in sanitized {
                    if location == Location::Headers {
                        continue;
                    }
                    for (field, value) in fields {
                        req.set_field(location, &field, value);
                    }
                }
                None
            }
            Err(err) => Some(self.terminate(res, &GatewayError::ValidationFailed(err))),
        }
    }

    async fn run_rate_limiter(
        &self,
        req: &dyn RequestHandle,
        res: &mut dyn ResponseHandle,
    ) -> Option<GatewayOutcome> {
        let stage = self.rate_limiter.as_ref()?;
        let key = (stage.key_fn)(req);
        let skip = stage.skip_fn.as_ref().map(|f| f(req)).unwrap_or(false);

        let verdict = stage.limiter.check(&key, skip).await;
        for (name, value) in verdict.headers() {
            res.set_header(name, &value);
        }

        if verdict.allowed {
            None
        } else {
            Some(self.terminate(
                res,
                &GatewayError::RateLimited {
                    retry_after_secs: verdict.retry_after_secs,
                },
            ))
        }
    }

    async fn run_load_balancer(
        &self,
        req: &dyn RequestHandle,
        res: &mut dyn ResponseHandle,
    ) -> GatewayOutcome {
        let Some(lb) = &self.load_balancer else {
            return GatewayOutcome::Continue;
        };

        let Some(target) = lb.select_next().await else {
            self.terminate(res, &GatewayError::NoHealthyServers);
            return GatewayOutcome::Terminated;
        };

        let proxy_request = ProxyRequest {
            method: req.method().clone(),
            path: req.path().to_string(),
            headers: req.headers().clone(),
            body: req.raw_body(),
        };

        match lb.execute(&target, proxy_request).await {
            Ok(response) => {
                res.set_status(response.status);
                for (name, value) in response.headers.iter() {
                    if let Ok(value) = value.to_str() {
                        res.set_header(name.as_str(), value);
                    }
                }
                res.send_body(response.body);
                res.finish();
            }
            Err(err) => {
                self.terminate(res, &GatewayError::from(err));
            }
        }

        GatewayOutcome::Terminated
    }

    fn terminate(&self, res: &mut dyn ResponseHandle, err: &GatewayError) -> GatewayOutcome {
        #[cfg(feature = "tracing")]
        tracing::debug!(gateway = %self.name, error = %err, "request terminated by gateway stage");
        let (status, body) = err.to_response();
        res.send_json(status, &body);
        GatewayOutcome::Terminated
    }
}

fn headers_to_map(headers: &http::HeaderMap) -> Map<String, Value> {
    let mut map = Map::new();
    for name in headers.keys() {
        if let Some(value) = headers.get(name).and_then(|v| v.to_str().ok()) {
            map.insert(name.as_str().to_string(), Value::String(value.to_string()));
        }
    }
    map
}
