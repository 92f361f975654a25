//! Durability tests for file-backed state.
//!
//! Every assertion here crosses an instance boundary: state written by one
//! store/tracker must be readable by a fresh one over the same directory,
//! the way a daily cron invocation picks up yesterday's state.

use std::collections::BTreeSet;
use std::fs;
use std::sync::Arc;

use regwatch::{
    CumulativeTracker, FileBackend, Fingerprint, SeenSetStore, Snapshot, SnapshotStore, StoreError,
    TargetKey,
};
use tempfile::tempdir;

fn ids(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

#[test]
fn seen_set_survives_tracker_restarts() {
    let dir = tempdir().unwrap();
    let key = TargetKey::new("hub", "DemoFeed").unwrap();

    {
        let backend = Arc::new(FileBackend::open(dir.path()).unwrap());
        let tracker = CumulativeTracker::new(SeenSetStore::new(backend));
        let run1 = tracker.merge(&key, &ids(&["x.com/1", "x.com/2"])).unwrap();
        assert!(run1.first_run);
    }

    {
        let backend = Arc::new(FileBackend::open(dir.path()).unwrap());
        let tracker = CumulativeTracker::new(SeenSetStore::new(backend));
        let run2 = tracker.merge(&key, &ids(&["x.com/2", "x.com/3"])).unwrap();
        assert!(!run2.first_run);
        assert_eq!(*run2.actionable_ids(), ids(&["x.com/3"]));
    }

    // Third instance sees the accumulated union.
    let backend = Arc::new(FileBackend::open(dir.path()).unwrap());
    let tracker = CumulativeTracker::new(SeenSetStore::new(backend));
    assert_eq!(
        tracker.load(&key).unwrap(),
        ids(&["x.com/1", "x.com/2", "x.com/3"])
    );
}

#[test]
fn snapshot_survives_store_restart() {
    let dir = tempdir().unwrap();
    let key = TargetKey::new("ICH", "quality").unwrap();
    let snap = Snapshot::new(key.clone(), Fingerprint::of_text("guideline page v1"))
        .with_full_text("guideline page v1");

    {
        let store = SnapshotStore::new(Arc::new(FileBackend::open(dir.path()).unwrap()));
        store.save(&snap).unwrap();
    }

    let store = SnapshotStore::new(Arc::new(FileBackend::open(dir.path()).unwrap()));
    let loaded = store.load(&key).unwrap().unwrap();
    assert_eq!(loaded.fingerprint, snap.fingerprint);
    assert_eq!(loaded.full_text.as_deref(), Some("guideline page v1"));
}

#[test]
fn no_temp_files_left_behind() {
    let dir = tempdir().unwrap();
    let store = SnapshotStore::new(Arc::new(FileBackend::open(dir.path()).unwrap()));

    let key = TargetKey::new("ICH", "quality").unwrap();
    for version in 0..5 {
        store
            .save(&Snapshot::new(
                key.clone(),
                Fingerprint::of_text(&format!("v{version}")),
            ))
            .unwrap();
    }

    let names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names.len(), 1, "expected one record file, got {names:?}");
    assert!(names[0].ends_with(".json"));
    assert!(!names[0].contains(".tmp."));
}

#[test]
fn records_are_plain_json_on_disk() {
    let dir = tempdir().unwrap();
    let backend = Arc::new(FileBackend::open(dir.path()).unwrap());
    let key = TargetKey::new("hub", "DemoFeed").unwrap();

    SeenSetStore::new(backend)
        .save(&key, &ids(&["x.com/1"]))
        .unwrap();

    let entry = fs::read_dir(dir.path()).unwrap().next().unwrap().unwrap();
    let raw = fs::read_to_string(entry.path()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed["count"], 1);
    assert_eq!(parsed["ids"][0], "x.com/1");
    assert!(parsed["updated"].is_string());
}

#[test]
fn hand_corrupted_record_is_reported_not_masked() {
    let dir = tempdir().unwrap();
    let key = TargetKey::new("ICH", "quality").unwrap();

    {
        let store = SnapshotStore::new(Arc::new(FileBackend::open(dir.path()).unwrap()));
        store
            .save(&Snapshot::new(key.clone(), Fingerprint::of_text("v1")))
            .unwrap();
    }

    // Truncate the record on disk, as a partial disk failure would.
    let entry = fs::read_dir(dir.path()).unwrap().next().unwrap().unwrap();
    fs::write(entry.path(), b"{\"target_key\": \"ICH/qual").unwrap();

    let store = SnapshotStore::new(Arc::new(FileBackend::open(dir.path()).unwrap()));
    let err = store.load(&key).unwrap_err();
    assert!(matches!(err, StoreError::Corrupt { .. }));

    // reset clears the corrupt record; the target baselines again.
    store.reset(&key).unwrap();
    assert!(store.load(&key).unwrap().is_none());
}
