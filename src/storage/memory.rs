//! In-memory key-value backend.
//!
//! Non-durable; intended for tests and embedded single-run use.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::StoreError;

use super::traits::KeyValueBackend;

/// A `KeyValueBackend` backed by a mutex-guarded map.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    /// Creates an empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().map(|m| m.len()).unwrap_or(0)
    }

    /// Returns true if no records are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueBackend for MemoryBackend {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let records = self
            .records
            .lock()
            .map_err(|_| StoreError::Backend("memory backend lock poisoned".to_string()))?;
        Ok(records.get(key).cloned())
    }

    fn save(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| StoreError::Backend("memory backend lock poisoned".to_string()))?;
        records.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| StoreError::Backend("memory backend lock poisoned".to_string()))?;
        records.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_load_roundtrip() {
        let backend = MemoryBackend::new();
        backend.save("ICH/quality", b"payload").unwrap();
        assert_eq!(backend.load("ICH/quality").unwrap().unwrap(), b"payload");
        assert_eq!(backend.len(), 1);
    }

    #[test]
    fn test_load_absent_is_none() {
        let backend = MemoryBackend::new();
        assert!(backend.load("missing").unwrap().is_none());
    }

    #[test]
    fn test_save_replaces() {
        let backend = MemoryBackend::new();
        backend.save("k", b"v1").unwrap();
        backend.save("k", b"v2").unwrap();
        assert_eq!(backend.load("k").unwrap().unwrap(), b"v2");
        assert_eq!(backend.len(), 1);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let backend = MemoryBackend::new();
        backend.save("k", b"v").unwrap();
        backend.remove("k").unwrap();
        backend.remove("k").unwrap();
        assert!(backend.load("k").unwrap().is_none());
        assert!(backend.is_empty());
    }
}
