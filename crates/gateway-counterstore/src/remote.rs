use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;

use crate::error::StoreError;
use crate::store::CounterStore;

/// A thin seam onto a remote cache server (e.g. Redis, Memcached).
///
/// This crate deliberately does not depend on any specific cache client; a
/// host application wires in its own implementation. `increment` must be a
/// single round trip that reproduces the init-then-preserve TTL semantics
/// documented on [`CounterStore::increment`]: a missing or expired key is
/// created at `1` with `ttl` armed, an existing key is incremented with its
/// current TTL left untouched.
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<i64>, StoreError>;
    async fn set(&self, key: &str, value: i64, ttl: Duration) -> Result<(), StoreError>;
    async fn increment(&self, key: &str, ttl: Duration) -> Result<i64, StoreError>;
    async fn clear(&self) -> Result<(), StoreError>;
    async fn ping(&self) -> Result<(), StoreError>;
}

/// A [`CounterStore`] that delegates every operation to a [`RemoteBackend`].
///
/// Liveness is tracked by a background task that pings the backend on an
/// interval and records the result in an [`AtomicBool`], since `ping` is
/// async and [`CounterStore::is_healthy`] is not.
pub struct RemoteCounterStore<B: RemoteBackend + 'static> {
    backend: Arc<B>,
    healthy: Arc<AtomicBool>,
    pinger: Option<JoinHandle<()>>,
}

impl<B: RemoteBackend + 'static> RemoteCounterStore<B> {
    /// Wraps `backend`, pinging it every `ping_interval` to track liveness.
    pub fn new(backend: B, ping_interval: Duration) -> Self {
        let backend = Arc::new(backend);
        let healthy = Arc::new(AtomicBool::new(true));

        let ping_backend = Arc::clone(&backend);
        let ping_healthy = Arc::clone(&healthy);
        let pinger = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(ping_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let ok = ping_backend.ping().await.is_ok();
                ping_healthy.store(ok, Ordering::Relaxed);
            }
        });

        Self {
            backend,
            healthy,
            pinger: Some(pinger),
        }
    }
}

impl<B: RemoteBackend + 'static> Drop for RemoteCounterStore<B> {
    fn drop(&mut self) {
        if let Some(handle) = self.pinger.take() {
            handle.abort();
        }
    }
}

#[async_trait]
impl<B: RemoteBackend + 'static> CounterStore for RemoteCounterStore<B> {
    async fn get(&self, key: &str) -> Result<Option<i64>, StoreError> {
        self.backend.get(key).await
    }

    async fn set(&self, key: &str, value: i64, ttl: Duration) -> Result<(), StoreError> {
        self.backend.set(key, value, ttl).await
    }

    async fn increment(&self, key: &str, ttl: Duration) -> Result<i64, StoreError> {
        self.backend.increment(key, ttl).await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.backend.clear().await
    }

    fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Relaxed)
    }
}
