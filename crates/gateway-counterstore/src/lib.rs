//! A keyed integer store with atomic increment and TTL.
//!
//! This is the storage primitive behind the rate limiter and
//! security-rate-limiter: both count events per key within a time window and
//! need that counting to be atomic and TTL-bounded whether the gateway runs
//! as a single process or a fleet sharing a remote cache.

mod error;
mod factory;
mod memory;
mod remote;
mod store;

pub use error::StoreError;
pub use factory::{CounterStoreFactory, StoreKind};
pub use memory::MemoryCounterStore;
pub use remote::{RemoteBackend, RemoteCounterStore};
pub use store::CounterStore;
