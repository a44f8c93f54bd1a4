use thiserror::Error;

/// Errors produced by a [`crate::CounterStore`](crate::CounterStore) implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The remote backend rejected or could not complete the operation.
    #[error("remote counter store backend failed: {0}")]
    Backend(String),

    /// The remote backend could not be reached at all (connection-level failure).
    #[error("remote counter store backend unreachable: {0}")]
    Unreachable(String),
}
