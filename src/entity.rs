//! Observed entities and target identity.
//!
//! A `TargetKey` names one independently monitored source/category. An
//! `ObservedEntity` is one discrete thing a monitor can notice on a target:
//! a document link, a guideline code, an article. Entities are immutable
//! values; a later observation of the "same" entity (same id) is a distinct
//! value, not a mutation.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of one monitored target: a source name plus a sub-category,
/// rendered as `source/category` (e.g. `ICH/quality`, `EudraLex/Volume4`).
///
/// # Examples
///
/// ```
/// use regwatch::TargetKey;
///
/// let key = TargetKey::new("ICH", "quality").unwrap();
/// assert_eq!(key.to_string(), "ICH/quality");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TargetKey {
    source: String,
    category: String,
}

impl TargetKey {
    /// Creates a target key from a source name and sub-category.
    ///
    /// Returns `Err` when either part is empty or contains `/`.
    pub fn new(source: impl Into<String>, category: impl Into<String>) -> Result<Self, String> {
        let source = source.into();
        let category = category.into();

        if source.trim().is_empty() {
            return Err("target source cannot be empty".to_string());
        }
        if category.trim().is_empty() {
            return Err("target category cannot be empty".to_string());
        }
        if source.contains('/') {
            return Err(format!("target source cannot contain '/': {source}"));
        }

        Ok(Self { source, category })
    }

    /// The source name (e.g. `ICH`).
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The sub-category within the source (e.g. `quality`).
    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }
}

impl fmt::Display for TargetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.source, self.category)
    }
}

impl FromStr for TargetKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((source, category)) => Self::new(source, category),
            None => Err(format!("target key must be 'source/category', got: {s}")),
        }
    }
}

impl TryFrom<String> for TargetKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TargetKey> for String {
    fn from(key: TargetKey) -> Self {
        key.to_string()
    }
}

/// One discrete thing a monitor noticed on a target.
///
/// The `id` is the stable dedup key — typically a URL or content hash.
/// Equality and hashing use `id` only: a changed title under the same URL
/// is the same entity, which keeps cosmetic title edits from producing
/// duplicate alerts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservedEntity {
    /// Stable dedup key (URL or content hash).
    pub id: String,

    /// Human-readable title.
    pub label: String,

    /// When this observation was made.
    pub observed_at: DateTime<Utc>,

    /// Open key/value map: publish date, category, etc.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl ObservedEntity {
    /// Creates an entity observed now, with no metadata.
    #[must_use]
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            observed_at: Utc::now(),
            metadata: BTreeMap::new(),
        }
    }

    /// Adds a metadata key/value pair, consuming and returning the entity.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

impl PartialEq for ObservedEntity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ObservedEntity {}

impl std::hash::Hash for ObservedEntity {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
