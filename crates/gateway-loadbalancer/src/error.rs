use thiserror::Error;

/// Errors surfaced by [`crate::LoadBalancer`] and the [`crate::ProxyClient`] it drives.
#[derive(Debug, Error)]
pub enum LoadBalancerError {
    /// No target in the healthy subset was available to serve the request
    /// (either the subset was empty, or every candidate's circuit breaker
    /// was open).
    #[error("no healthy servers available")]
    NoHealthyServers,

    /// The selected target's circuit breaker is open.
    #[error("circuit open for target {target}")]
    CircuitOpen { target: String },

    /// The upstream call itself failed (connect error, timeout, reset, ...).
    #[error("proxy error: {0}")]
    Proxy(#[from] crate::proxy::ProxyError),
}
