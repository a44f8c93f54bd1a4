use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::error::StoreError;
use crate::store::CounterStore;

#[derive(Debug, Clone, Copy)]
struct CounterRecord {
    value: i64,
    expires_at: Instant,
}

impl CounterRecord {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// An in-process [`CounterStore`] backed by a mutex-guarded hash map.
///
/// A background task periodically sweeps expired entries so memory does not
/// grow unbounded under a steady stream of distinct keys (e.g. per-IP rate
/// limiting). The reaper is purely a memory-management concern: expired
/// entries are already treated as absent by [`get`](CounterStore::get) and
/// [`increment`](CounterStore::increment) regardless of whether the sweep has
/// run yet.
pub struct MemoryCounterStore {
    records: Arc<Mutex<HashMap<String, CounterRecord>>>,
    healthy: Arc<AtomicBool>,
    reaper: Option<JoinHandle<()>>,
}

impl MemoryCounterStore {
    /// Creates a store with a reaper that sweeps every `reap_interval`.
    pub fn new(reap_interval: Duration) -> Self {
        let records: Arc<Mutex<HashMap<String, CounterRecord>>> =
            Arc::new(Mutex::new(HashMap::new()));
        let healthy = Arc::new(AtomicBool::new(true));

        let reaper_records = Arc::clone(&records);
        let reaper = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(reap_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let now = Instant::now();
                let mut guard = reaper_records.lock().await;
                guard.retain(|_, record| !record.is_expired(now));
            }
        });

        Self {
            records,
            healthy,
            reaper: Some(reaper),
        }
    }

    /// Creates a store with the default 30-second reap interval.
    pub fn with_default_interval() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl Drop for MemoryCounterStore {
    fn drop(&mut self) {
        if let Some(handle) = self.reaper.take() {
            handle.abort();
        }
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn get(&self, key: &str) -> Result<Option<i64>, StoreError> {
        let now = Instant::now();
        let guard = self.records.lock().await;
        Ok(guard
            .get(key)
            .filter(|record| !record.is_expired(now))
            .map(|record| record.value))
    }

    async fn set(&self, key: &str, value: i64, ttl: Duration) -> Result<(), StoreError> {
        let mut guard = self.records.lock().await;
        guard.insert(
            key.to_string(),
            CounterRecord {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn increment(&self, key: &str, ttl: Duration) -> Result<i64, StoreError> {
        let now = Instant::now();
        let mut guard = self.records.lock().await;
        let new_value = match guard.get_mut(key) {
            Some(record) if !record.is_expired(now) => {
                record.value += 1;
                record.value
            }
            _ => {
                guard.insert(
                    key.to_string(),
                    CounterRecord {
                        value: 1,
                        expires_at: now + ttl,
                    },
                );
                1
            }
        };
        Ok(new_value)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut guard = self.records.lock().await;
        guard.clear();
        Ok(())
    }

    fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn increment_initializes_new_key_to_one() {
        let store = MemoryCounterStore::with_default_interval();
        let value = store.increment("a", Duration::from_secs(60)).await.unwrap();
        assert_eq!(value, 1);
    }

    #[tokio::test]
    async fn increment_preserves_ttl_of_existing_key() {
        let store = MemoryCounterStore::with_default_interval();
        store.increment("a", Duration::from_millis(50)).await.unwrap();
        let second = store.increment("a", Duration::from_secs(3600)).await.unwrap();
        assert_eq!(second, 2);

        tokio::time::sleep(Duration::from_millis(80)).await;
        let after_expiry = store.get("a").await.unwrap();
        assert_eq!(after_expiry, None, "original short ttl should still apply");
    }

    #[tokio::test]
    async fn increment_after_expiry_restarts_at_one() {
        let store = MemoryCounterStore::with_default_interval();
        store.increment("a", Duration::from_millis(20)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        let value = store.increment("a", Duration::from_secs(60)).await.unwrap();
        assert_eq!(value, 1);
    }

    #[tokio::test]
    async fn set_overwrites_value_and_ttl() {
        let store = MemoryCounterStore::with_default_interval();
        store.set("a", 41, Duration::from_secs(60)).await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), Some(41));
    }

    #[tokio::test]
    async fn clear_removes_all_keys() {
        let store = MemoryCounterStore::with_default_interval();
        store.set("a", 1, Duration::from_secs(60)).await.unwrap();
        store.set("b", 2, Duration::from_secs(60)).await.unwrap();
        store.clear().await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), None);
        assert_eq!(store.get("b").await.unwrap(), None);
    }

    #[tokio::test]
    async fn reaper_evicts_expired_entries_in_background() {
        let store = MemoryCounterStore::new(Duration::from_millis(20));
        store.set("a", 1, Duration::from_millis(10)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        let guard = store.records.lock().await;
        assert!(guard.is_empty());
    }

    #[test]
    fn is_healthy_defaults_to_true() {
        let store = MemoryCounterStore::with_default_interval();
        assert!(store.is_healthy());
    }
}
