//! The reverse-proxy seam: this crate decides *which* target to call, the
//! host decides *how* to actually speak HTTP to it.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use bytes::Bytes;
use gateway_core::Target;
use http::HeaderMap;
use thiserror::Error;
use tower::Service;

/// The inbound request data the host extracts before handing it to the
/// balancer. Deliberately plain data rather than a trait object: the
/// balancer reuses it as the `Req` type of a [`tower::Service`] so it can be
/// wrapped by a per-target [`gateway_circuitbreaker::CircuitBreaker`].
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: http::Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// The upstream's response, relayed back by the host.
#[derive(Debug, Clone)]
pub struct ProxyResponse {
    pub status: http::StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Failure to reach or get a response from an upstream target.
#[derive(Debug, Error, Clone)]
#[error("{message}")]
pub struct ProxyError {
    pub message: String,
}

impl ProxyError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Implemented by the host to perform the actual upstream HTTP call.
///
/// `target = scheme://host:port`; implementations are expected to honor
/// `change_origin` semantics (rewrite `Host` to the target) and the
/// balancer's configured `proxy_timeout` themselves, since only the host
/// holds the HTTP client.
#[async_trait]
pub trait ProxyClient: Send + Sync {
    async fn call(&self, target: &Target, request: ProxyRequest) -> Result<ProxyResponse, ProxyError>;
}

/// Adapts a `(ProxyClient, Target)` pair into a [`tower::Service`] so a
/// single target can be wrapped by its own
/// [`gateway_circuitbreaker::CircuitBreaker`]. One instance is created per
/// target and is cheap to clone (an `Arc` and a `Target`).
#[derive(Clone)]
pub(crate) struct ProxyService {
    client: Arc<dyn ProxyClient>,
    target: Target,
}

impl ProxyService {
    pub(crate) fn new(client: Arc<dyn ProxyClient>, target: Target) -> Self {
        Self { client, target }
    }
}

impl Service<ProxyRequest> for ProxyService {
    type Response = ProxyResponse;
    type Error = ProxyError;
    type Future = Pin<Box<dyn Future<Output = Result<ProxyResponse, ProxyError>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ProxyRequest) -> Self::Future {
        let client = Arc::clone(&self.client);
        let target = self.target.clone();
        Box::pin(async move { client.call(&target, req).await })
    }
}
