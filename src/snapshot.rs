//! Snapshots: the last known full state of one monitored target.
//!
//! A snapshot is replaced wholesale on each successful check that differs
//! from the prior one; the store retains only the latest snapshot per
//! target. Deletion/reset is an explicit operator action, never implicit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{ObservedEntity, TargetKey};
use crate::fingerprint::Fingerprint;

/// The full state of one monitored target at one point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Which target this snapshot belongs to.
    pub target_key: TargetKey,

    /// When the observation was taken.
    pub timestamp: DateTime<Utc>,

    /// Hash + facet summary of the observed content.
    pub fingerprint: Fingerprint,

    /// Entities observed in this check.
    #[serde(default)]
    pub entities: Vec<ObservedEntity>,

    /// Full text of the page, when the target tracks it (enables the
    /// line-level diff; omitted for hash-only targets to keep files small).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_text: Option<String>,
}

impl Snapshot {
    /// Creates a snapshot taken now.
    #[must_use]
    pub fn new(target_key: TargetKey, fingerprint: Fingerprint) -> Self {
        Self {
            target_key,
            timestamp: Utc::now(),
            fingerprint,
            entities: Vec::new(),
            full_text: None,
        }
    }

    /// Attaches observed entities, consuming and returning the snapshot.
    #[must_use]
    pub fn with_entities(mut self, entities: Vec<ObservedEntity>) -> Self {
        self.entities = entities;
        self
    }

    /// Attaches the page's full text, consuming and returning the snapshot.
    #[must_use]
    pub fn with_full_text(mut self, text: impl Into<String>) -> Self {
        self.full_text = Some(text.into());
        self
    }

    /// Number of entities observed in this check.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if `other` carries the same whole-content hash.
    #[must_use]
    pub fn same_content(&self, other: &Self) -> bool {
        self.fingerprint.same_content(&other.fingerprint)
    }
}
