use std::sync::Arc;
use std::time::Duration;

use crate::memory::MemoryCounterStore;
use crate::remote::{RemoteBackend, RemoteCounterStore};
use crate::store::CounterStore;

/// Which backend a [`CounterStoreFactory`] should build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Memory,
    Remote,
}

/// Builds a rate limiter's [`CounterStore`] from configuration.
///
/// Requesting [`StoreKind::Remote`] without a usable backend is not an error:
/// the factory falls back to [`MemoryCounterStore`] and logs a warning, since
/// a rate limiter that fails closed on a cache outage is worse than one that
/// degrades to per-instance limiting.
pub struct CounterStoreFactory;

impl CounterStoreFactory {
    /// Builds an in-memory store with the given reap interval.
    pub fn memory(reap_interval: Duration) -> Arc<dyn CounterStore> {
        Arc::new(MemoryCounterStore::new(reap_interval))
    }

    /// Builds a remote store, or falls back to an in-memory one if `backend`
    /// is `None` (the caller could not construct/connect it).
    pub fn remote_or_fallback<B: RemoteBackend + 'static>(
        backend: Option<B>,
        ping_interval: Duration,
        reap_interval: Duration,
    ) -> Arc<dyn CounterStore> {
        match backend {
            Some(backend) => Arc::new(RemoteCounterStore::new(backend, ping_interval)),
            None => {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    "remote counter store backend unavailable, falling back to in-memory store"
                );
                Arc::new(MemoryCounterStore::new(reap_interval))
            }
        }
    }
}
