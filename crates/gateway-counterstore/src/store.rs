use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;

/// A keyed integer store with atomic increment and TTL, backing the rate
/// limiter and security-rate-limiter components.
///
/// Implementations must make [`CounterStore::increment`] atomic: concurrent
/// callers incrementing the same key must never observe lost updates.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Returns the current value for `key`, or `None` if it does not exist or
    /// has expired.
    async fn get(&self, key: &str) -> Result<Option<i64>, StoreError>;

    /// Records `(value, now + ttl)`, overwriting any prior value and TTL.
    async fn set(&self, key: &str, value: i64, ttl: Duration) -> Result<(), StoreError>;

    /// Atomically increments `key` and returns the new value.
    ///
    /// If the key is missing or expired, it is initialized to `1` and armed
    /// with `ttl`. If the key already exists, its value is incremented by one
    /// and its existing TTL is preserved (not extended).
    async fn increment(&self, key: &str, ttl: Duration) -> Result<i64, StoreError>;

    /// Removes all keys known to this store.
    async fn clear(&self) -> Result<(), StoreError>;

    /// Best-effort, synchronous liveness probe.
    fn is_healthy(&self) -> bool;
}
