//! Typed stores layered over a `KeyValueBackend`.
//!
//! `SnapshotStore` holds the latest `Snapshot` per target; `SeenSetStore`
//! holds the cumulative seen-id set per target. Both encode as JSON and
//! namespace their keys so a target's snapshot and seen-set never collide
//! in the shared backend.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::TargetKey;
use crate::error::StoreError;
use crate::snapshot::Snapshot;

use super::traits::KeyValueBackend;

/// Durable storage of the latest snapshot per target.
#[derive(Clone)]
pub struct SnapshotStore {
    backend: Arc<dyn KeyValueBackend>,
}

impl SnapshotStore {
    /// Creates a snapshot store over the given backend.
    #[must_use]
    pub fn new(backend: Arc<dyn KeyValueBackend>) -> Self {
        Self { backend }
    }

    fn record_key(key: &TargetKey) -> String {
        format!("snapshot/{key}")
    }

    /// Loads the last successfully observed snapshot for a target, or
    /// `None` if the target has never completed a check.
    pub fn load(&self, key: &TargetKey) -> Result<Option<Snapshot>, StoreError> {
        let Some(bytes) = self.backend.load(&Self::record_key(key))? else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| StoreError::Corrupt {
                key: key.to_string(),
                reason: format!("snapshot decode failed: {e}"),
            })
    }

    /// Atomically replaces the stored snapshot for the snapshot's target.
    ///
    /// Callers only invoke this after a fully successful
    /// fetch+extract+fingerprint cycle, so the store always reflects the
    /// last successfully observed state.
    pub fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(snapshot)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.backend
            .save(&Self::record_key(&snapshot.target_key), &bytes)
    }

    /// Deletes the stored snapshot for a target. Explicit operator action;
    /// the next check becomes a baseline.
    pub fn reset(&self, key: &TargetKey) -> Result<(), StoreError> {
        self.backend.remove(&Self::record_key(key))
    }
}

/// Persisted cumulative seen-id set record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeenSet {
    /// When the set was last written.
    pub updated: DateTime<Utc>,

    /// Number of ids (redundant with `ids.len()`, kept for humans reading
    /// the JSON file).
    pub count: usize,

    /// Every id ever seen on this target. Only grows.
    pub ids: BTreeSet<String>,
}

impl SeenSet {
    /// Creates a seen-set record updated now.
    #[must_use]
    pub fn new(ids: BTreeSet<String>) -> Self {
        Self {
            updated: Utc::now(),
            count: ids.len(),
            ids,
        }
    }
}

/// Durable storage of the cumulative seen-id set per target.
#[derive(Clone)]
pub struct SeenSetStore {
    backend: Arc<dyn KeyValueBackend>,
}

impl SeenSetStore {
    /// Creates a seen-set store over the given backend.
    #[must_use]
    pub fn new(backend: Arc<dyn KeyValueBackend>) -> Self {
        Self { backend }
    }

    fn record_key(key: &TargetKey) -> String {
        format!("seen/{key}")
    }

    /// Loads the seen-id set for a target. An absent record yields the
    /// empty set — that absence is the "first run" signal.
    pub fn load(&self, key: &TargetKey) -> Result<BTreeSet<String>, StoreError> {
        let Some(bytes) = self.backend.load(&Self::record_key(key))? else {
            return Ok(BTreeSet::new());
        };
        let record: SeenSet =
            serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt {
                key: key.to_string(),
                reason: format!("seen-set decode failed: {e}"),
            })?;
        Ok(record.ids)
    }

    /// Returns true if a seen-set record exists for the target.
    pub fn exists(&self, key: &TargetKey) -> Result<bool, StoreError> {
        Ok(self.backend.load(&Self::record_key(key))?.is_some())
    }

    /// Atomically replaces the seen-id set for a target.
    pub fn save(&self, key: &TargetKey, ids: &BTreeSet<String>) -> Result<(), StoreError> {
        let record = SeenSet::new(ids.clone());
        let bytes = serde_json::to_vec(&record)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.backend.save(&Self::record_key(key), &bytes)
    }

    /// Deletes the seen-id set for a target. Explicit operator action.
    pub fn reset(&self, key: &TargetKey) -> Result<(), StoreError> {
        self.backend.remove(&Self::record_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::Fingerprint;
    use crate::storage::MemoryBackend;

    fn key() -> TargetKey {
        TargetKey::new("ICH", "quality").unwrap()
    }

    fn backend() -> Arc<dyn KeyValueBackend> {
        Arc::new(MemoryBackend::new())
    }

    #[test]
    fn test_snapshot_store_roundtrip() {
        let store = SnapshotStore::new(backend());
        assert!(store.load(&key()).unwrap().is_none());

        let snap = Snapshot::new(key(), Fingerprint::of_text("page"));
        store.save(&snap).unwrap();

        let loaded = store.load(&key()).unwrap().unwrap();
        assert_eq!(loaded.target_key, key());
        assert_eq!(loaded.fingerprint, snap.fingerprint);
    }

    #[test]
    fn test_snapshot_store_reset() {
        let store = SnapshotStore::new(backend());
        store
            .save(&Snapshot::new(key(), Fingerprint::of_text("page")))
            .unwrap();
        store.reset(&key()).unwrap();
        assert!(store.load(&key()).unwrap().is_none());
    }

    #[test]
    fn test_snapshot_store_corrupt_record() {
        let raw = Arc::new(MemoryBackend::new());
        raw.save("snapshot/ICH/quality", b"not json").unwrap();

        let store = SnapshotStore::new(raw);
        let err = store.load(&key()).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn test_seen_set_store_roundtrip() {
        let store = SeenSetStore::new(backend());
        assert!(store.load(&key()).unwrap().is_empty());
        assert!(!store.exists(&key()).unwrap());

        let ids: BTreeSet<String> =
            ["https://x.com/1".to_string(), "https://x.com/2".to_string()].into();
        store.save(&key(), &ids).unwrap();

        assert!(store.exists(&key()).unwrap());
        assert_eq!(store.load(&key()).unwrap(), ids);
    }

    #[test]
    fn test_snapshot_and_seen_keys_do_not_collide() {
        let raw: Arc<dyn KeyValueBackend> = Arc::new(MemoryBackend::new());
        let snapshots = SnapshotStore::new(Arc::clone(&raw));
        let seen = SeenSetStore::new(raw);

        snapshots
            .save(&Snapshot::new(key(), Fingerprint::of_text("page")))
            .unwrap();
        seen.save(&key(), &BTreeSet::from(["a".to_string()]))
            .unwrap();

        assert!(snapshots.load(&key()).unwrap().is_some());
        assert_eq!(seen.load(&key()).unwrap().len(), 1);
    }

    #[test]
    fn test_seen_set_record_count_matches() {
        let ids: BTreeSet<String> = ["a".to_string(), "b".to_string()].into();
        let record = SeenSet::new(ids);
        assert_eq!(record.count, 2);

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"count\":2"));
    }
}
