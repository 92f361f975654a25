//! File-based key-value backend.
//!
//! One JSON file per key inside a single directory. Writes go to a
//! temporary file first and are renamed into place after an fsync, so a
//! failed write never leaves a corrupted or partial record.
//!
//! Key-to-filename mapping sanitizes the key for the filesystem and
//! appends a short hash of the full key, so distinct keys that sanitize to
//! the same text (e.g. `ICH/quality` vs `ICH_quality`) cannot collide.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::StoreError;

use super::traits::KeyValueBackend;

/// A `KeyValueBackend` storing each record as a file under one directory.
#[derive(Debug)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Opens (creating if needed) a file backend rooted at `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| StoreError::Io {
            key: dir.display().to_string(),
            message: format!("failed to create snapshot directory: {e}"),
        })?;
        Ok(Self { dir })
    }

    /// The directory this backend writes into.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, key: &str) -> PathBuf {
        let sanitized: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let digest = blake3::hash(key.as_bytes()).to_hex();
        self.dir.join(format!("{sanitized}-{}.json", &digest[..8]))
    }

    fn io_err(key: &str, context: &str, e: &std::io::Error) -> StoreError {
        StoreError::Io {
            key: key.to_string(),
            message: format!("{context}: {e}"),
        }
    }
}

impl KeyValueBackend for FileBackend {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.record_path(key);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::io_err(key, "failed to read record", &e)),
        }
    }

    fn save(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let final_path = self.record_path(key);
        let temp_path = final_path.with_extension(format!("tmp.{}", Uuid::new_v4()));

        let result = (|| {
            let mut file = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&temp_path)
                .map_err(|e| Self::io_err(key, "failed to create temp file", &e))?;
            file.write_all(bytes)
                .map_err(|e| Self::io_err(key, "failed to write record", &e))?;
            file.sync_all()
                .map_err(|e| Self::io_err(key, "failed to sync record", &e))?;
            drop(file);

            // Atomic replace.
            fs::rename(&temp_path, &final_path)
                .map_err(|e| Self::io_err(key, "failed to rename record into place", &e))?;

            // Durability of the rename itself.
            if let Ok(dir) = File::open(&self.dir) {
                let _ = dir.sync_all();
            }
            Ok(())
        })();

        if result.is_err() && temp_path.exists() {
            let _ = fs::remove_file(&temp_path);
        }
        result
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.record_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::io_err(key, "failed to remove record", &e)),
        }
    }
}
