//! Abstract persistence trait.
//!
//! By keeping the boundary at raw bytes we enable:
//! - In-memory backends for testing and embedded use
//! - File-based JSON backends for production
//! - Database-backed implementations without touching the core

use crate::error::StoreError;

/// Durable, keyed byte storage.
///
/// # Safety Considerations
/// - `save` must be atomic: a failed write must not leave a corrupted or
///   partial record behind.
/// - Implementations must handle concurrent access to *different* keys;
///   the runner guarantees single-writer-per-key within a run.
pub trait KeyValueBackend: Send + Sync {
    /// Load the bytes stored under `key`, or `None` if absent.
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Atomically replace the bytes stored under `key`.
    fn save(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError>;

    /// Remove the record stored under `key`. Removing an absent key is not
    /// an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}
