//! Snapshot comparison.
//!
//! `DiffEngine` turns a previous/current snapshot pair into a structured
//! `ChangeReport`. The baseline rule is universal: a target with no prior
//! snapshot never reports changes, regardless of what the current
//! observation contains — deploying a monitor against a source with a large
//! existing catalogue must not flood alerts.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use similar::{ChangeTag, TextDiff};

use crate::entity::{ObservedEntity, TargetKey};
use crate::snapshot::Snapshot;

/// Summary line used for every baseline check.
pub const BASELINE_SUMMARY: &str = "first check - baseline saved";

/// Summary line used when content hashes are equal.
pub const NO_CHANGES_SUMMARY: &str = "no changes detected";

/// Fallback summary when the hash changed but no tracked facet did
/// (incidental whitespace/markup change).
pub const CONTENT_MODIFIED_SUMMARY: &str = "content modified";

/// Outcome classification of one check cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    /// First successful observation; baseline persisted, nothing reported.
    Baseline,
    /// Compared against a prior observation (with or without changes).
    Checked,
    /// Fetch/extract/persistence failure; see `ChangeReport::error`.
    Error,
}

/// Added/removed values for one facet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetDelta {
    /// Values present now but not in the previous snapshot.
    pub added: BTreeSet<String>,
    /// Values present in the previous snapshot but not now.
    pub removed: BTreeSet<String>,
}

impl FacetDelta {
    /// Returns true if neither side of the delta has values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Structured description of what changed (or didn't) between two
/// observations of one target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeReport {
    /// Which target was checked.
    pub target_key: TargetKey,

    /// Outcome classification.
    pub status: CheckStatus,

    /// Failure message when `status == Error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// True when actionable changes were detected.
    pub has_changes: bool,

    /// Timestamp of the previous snapshot, when one existed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_timestamp: Option<DateTime<Utc>>,

    /// Timestamp of the current observation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_timestamp: Option<DateTime<Utc>>,

    /// Entities newly present (compared by id only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub added_entities: Vec<ObservedEntity>,

    /// Entities no longer present (compared by id only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed_entities: Vec<ObservedEntity>,

    /// Per-facet set differences.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub facet_changes: BTreeMap<String, FacetDelta>,

    /// Added lines from the bounded text diff (text-tracking targets only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub added_lines: Vec<String>,

    /// Removed lines from the bounded text diff.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed_lines: Vec<String>,

    /// One-line human-readable summary.
    pub summary: String,
}

impl ChangeReport {
    /// An error entry for a target whose check cycle failed.
    #[must_use]
    pub fn error(target_key: TargetKey, message: impl Into<String>) -> Self {
        Self {
            target_key,
            status: CheckStatus::Error,
            error: Some(message.into()),
            has_changes: false,
            previous_timestamp: None,
            current_timestamp: Some(Utc::now()),
            added_entities: Vec::new(),
            removed_entities: Vec::new(),
            facet_changes: BTreeMap::new(),
            added_lines: Vec::new(),
            removed_lines: Vec::new(),
            summary: "check failed".to_string(),
        }
    }

    pub(crate) fn quiet(target_key: TargetKey, status: CheckStatus, summary: &str) -> Self {
        Self {
            target_key,
            status,
            error: None,
            has_changes: false,
            previous_timestamp: None,
            current_timestamp: None,
            added_entities: Vec::new(),
            removed_entities: Vec::new(),
            facet_changes: BTreeMap::new(),
            added_lines: Vec::new(),
            removed_lines: Vec::new(),
            summary: summary.to_string(),
        }
    }
}

/// Compares snapshots and produces `ChangeReport`s.
#[derive(Debug, Clone)]
pub struct DiffEngine {
    /// Maximum added and removed lines each reported by the text diff.
    /// Keeps reports bounded regardless of document size.
    pub max_diff_lines: usize,
}

impl Default for DiffEngine {
    fn default() -> Self {
        Self { max_diff_lines: 20 }
    }
}

impl DiffEngine {
    /// Creates a diff engine with a custom line-diff bound.
    #[must_use]
    pub fn new(max_diff_lines: usize) -> Self {
        Self { max_diff_lines }
    }

    /// Compares the previous snapshot (if any) against the current one.
    ///
    /// Baseline rule: `previous == None` yields `has_changes = false`
    /// regardless of `current`. Hash equality short-circuits without
    /// computing set or line diffs.
    #[must_use]
    pub fn diff(&self, previous: Option<&Snapshot>, current: &Snapshot) -> ChangeReport {
        let Some(previous) = previous else {
            let mut report = ChangeReport::quiet(
                current.target_key.clone(),
                CheckStatus::Baseline,
                BASELINE_SUMMARY,
            );
            report.current_timestamp = Some(current.timestamp);
            return report;
        };

        let mut report = ChangeReport::quiet(
            current.target_key.clone(),
            CheckStatus::Checked,
            NO_CHANGES_SUMMARY,
        );
        report.previous_timestamp = Some(previous.timestamp);
        report.current_timestamp = Some(current.timestamp);

        // Cheap path: hash equality is authoritative.
        if previous.same_content(current) {
            return report;
        }

        report.has_changes = true;

        // Entity membership, by id only.
        let previous_ids: BTreeSet<&str> =
            previous.entities.iter().map(|e| e.id.as_str()).collect();
        let current_ids: BTreeSet<&str> = current.entities.iter().map(|e| e.id.as_str()).collect();

        report.added_entities = current
            .entities
            .iter()
            .filter(|e| !previous_ids.contains(e.id.as_str()))
            .cloned()
            .collect();
        report.removed_entities = previous
            .entities
            .iter()
            .filter(|e| !current_ids.contains(e.id.as_str()))
            .cloned()
            .collect();

        // Per-facet set differences, over the union of facet names.
        let empty = BTreeSet::new();
        let facet_names: BTreeSet<&String> = previous
            .fingerprint
            .facets
            .keys()
            .chain(current.fingerprint.facets.keys())
            .collect();
        for name in facet_names {
            let old = previous.fingerprint.facet(name).unwrap_or(&empty);
            let new = current.fingerprint.facet(name).unwrap_or(&empty);
            let delta = FacetDelta {
                added: new.difference(old).cloned().collect(),
                removed: old.difference(new).cloned().collect(),
            };
            if !delta.is_empty() {
                report.facet_changes.insert(name.clone(), delta);
            }
        }

        // Bounded line diff when both snapshots track full text.
        if let (Some(old_text), Some(new_text)) =
            (previous.full_text.as_deref(), current.full_text.as_deref())
        {
            let text_diff = TextDiff::from_lines(old_text, new_text);
            for change in text_diff.iter_all_changes() {
                match change.tag() {
                    ChangeTag::Insert if report.added_lines.len() < self.max_diff_lines => {
                        report
                            .added_lines
                            .push(change.value().trim_end_matches('\n').to_string());
                    }
                    ChangeTag::Delete if report.removed_lines.len() < self.max_diff_lines => {
                        report
                            .removed_lines
                            .push(change.value().trim_end_matches('\n').to_string());
                    }
                    _ => {}
                }
            }
        }

        report.summary = self.summarize(previous, current, &report);
        report
    }

    fn summarize(&self, previous: &Snapshot, current: &Snapshot, report: &ChangeReport) -> String {
        let mut parts = Vec::new();

        for (name, delta) in &report.facet_changes {
            if !delta.added.is_empty() {
                parts.push(format!("{} new {name}", delta.added.len()));
            }
            if !delta.removed.is_empty() {
                parts.push(format!("{} removed {name}", delta.removed.len()));
            }
        }

        if !report.added_lines.is_empty() {
            parts.push(format!("{} lines added", report.added_lines.len()));
        }
        if !report.removed_lines.is_empty() {
            parts.push(format!("{} lines removed", report.removed_lines.len()));
        }

        let size_delta = current.fingerprint.content_size as i64
            - previous.fingerprint.content_size as i64;
        if size_delta != 0 {
            parts.push(format!("size delta {size_delta:+} bytes"));
        }

        if parts.is_empty() {
            CONTENT_MODIFIED_SUMMARY.to_string()
        } else {
            parts.join(", ")
        }
    }
}
