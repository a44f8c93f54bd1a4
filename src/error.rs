use thiserror::Error;

use gateway_loadbalancer::{LoadBalancerError, ProxyError};
use gateway_validator::ValidationError;

/// Construction-time configuration errors. Always fatal: `Gateway::new`
/// returns this before any background task is started.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("gateway requires at least one of rate_limiter or load_balancer to be configured")]
    NothingConfigured,
}

/// The terminal, HTTP-facing outcomes the pipeline can produce. Every
/// variant is recovered locally by [`crate::Gateway::handle`] — none of
/// these ever escape past the middleware boundary as a Rust error the host
/// has to handle; they are turned into a response before `handle` returns.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("client is blocked until {block_until_millis}")]
    Blocked { block_until_millis: u64 },

    #[error("ip blocked by filter rule")]
    IpBlocked,

    #[error(transparent)]
    ValidationFailed(#[from] ValidationError),

    #[error("no healthy servers available")]
    NoHealthyServers,

    #[error("circuit open for target {target}")]
    CircuitOpen { target: String },

    #[error("upstream proxy error: {0}")]
    Upstream(#[from] ProxyError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<LoadBalancerError> for GatewayError {
    fn from(err: LoadBalancerError) -> Self {
        match err {
            LoadBalancerError::NoHealthyServers => GatewayError::NoHealthyServers,
            LoadBalancerError::CircuitOpen { target } => GatewayError::CircuitOpen { target },
            LoadBalancerError::Proxy(err) => GatewayError::Upstream(err),
        }
    }
}

impl GatewayError {
    /// The status code and JSON body the gateway sends for this error, per
    /// the error-handling design's fixed status/code pairing.
    pub fn to_response(&self) -> (http::StatusCode, serde_json::Value) {
        use http::StatusCode;

        match self {
            GatewayError::RateLimited { retry_after_secs } => (
                StatusCode::TOO_MANY_REQUESTS,
                serde_json::json!({
                    "error": "Too Many Requests",
                    "message": "rate limit exceeded",
                    "retryAfter": retry_after_secs,
                }),
            ),
            GatewayError::Blocked { block_until_millis } => (
                StatusCode::TOO_MANY_REQUESTS,
                serde_json::json!({
                    "error": "Too Many Requests",
                    "message": "temporarily blocked after repeated failures",
                    "blockUntil": block_until_millis,
                }),
            ),
            GatewayError::IpBlocked => (
                StatusCode::FORBIDDEN,
                serde_json::json!({
                    "error": "Forbidden",
                    "code": "IP_BLOCKED",
                    "timestamp": crate::now_millis(),
                }),
            ),
            GatewayError::ValidationFailed(err) => (StatusCode::BAD_REQUEST, err.to_json()),
            GatewayError::NoHealthyServers => (
                StatusCode::SERVICE_UNAVAILABLE,
                serde_json::json!({
                    "error": "Service Unavailable",
                    "code": "NO_HEALTHY_SERVERS",
                }),
            ),
            GatewayError::CircuitOpen { target } => (
                StatusCode::SERVICE_UNAVAILABLE,
                serde_json::json!({
                    "error": "Service Unavailable",
                    "code": "CIRCUIT_OPEN",
                    "target": target,
                }),
            ),
            GatewayError::Upstream(err) => (
                StatusCode::BAD_GATEWAY,
                serde_json::json!({
                    "error": "Bad Gateway",
                    "message": err.to_string(),
                }),
            ),
            GatewayError::Internal(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({
                    "error": "Internal server error",
                    "message": message,
                }),
            ),
        }
    }
}
