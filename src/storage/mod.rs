//! Persistence for snapshots and cumulative seen-sets.
//!
//! The boundary is a byte-level key-value interface (`KeyValueBackend`),
//! sufficient for file-based JSON storage, a key-value store, or a
//! relational table keyed by target. Typed stores layer snapshot and
//! seen-set encoding on top of any backend.

mod file;
mod memory;
mod stores;
mod traits;

pub use file::FileBackend;
pub use memory::MemoryBackend;
pub use stores::{SeenSet, SeenSetStore, SnapshotStore};
pub use traits::KeyValueBackend;
