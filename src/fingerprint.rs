//! Content fingerprinting.
//!
//! A `Fingerprint` reduces one observation of a target to a cheaply
//! comparable signature: a whole-content BLAKE3 hash plus zero or more
//! named facets (unordered string sets such as "links" or "codes").
//!
//! Facets are kept in ordered containers (`BTreeMap`/`BTreeSet`), so both
//! the hash input and the persisted JSON are canonical by construction.
//! Re-ordering of DOM elements between fetches therefore cannot produce a
//! spurious diff.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Named, order-independent sets of strings extracted from content.
pub type FacetMap = BTreeMap<String, BTreeSet<String>>;

/// A hash + facet-set summary of a target's content.
///
/// Two fingerprints are compared by whole-content hash first (cheap
/// equality) and facet-by-facet when the hashes differ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    /// Hex-encoded BLAKE3 hash of the canonicalized content.
    pub content_hash: String,

    /// Size of the hashed content in bytes.
    pub content_size: u64,

    /// Extracted facets, keyed by facet name.
    #[serde(default)]
    pub facets: FacetMap,
}

impl Fingerprint {
    /// Fingerprints a piece of content with its extracted facets.
    ///
    /// Deterministic: identical text always yields an identical hash, and
    /// facet sets compare equal regardless of extraction order.
    #[must_use]
    pub fn of(text: &str, facets: FacetMap) -> Self {
        Self {
            content_hash: hash_text(text),
            content_size: text.len() as u64,
            facets,
        }
    }

    /// Fingerprints raw text with no facets.
    #[must_use]
    pub fn of_text(text: &str) -> Self {
        Self::of(text, FacetMap::new())
    }

    /// Returns true if both fingerprints carry the same whole-content hash.
    ///
    /// Hash equality is authoritative for "no change": callers short-circuit
    /// on it without consulting facets.
    #[must_use]
    pub fn same_content(&self, other: &Self) -> bool {
        self.content_hash == other.content_hash
    }

    /// The named facet set, if present.
    #[must_use]
    pub fn facet(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.facets.get(name)
    }
}

/// Stable hex-encoded BLAKE3 hash of a text.
#[must_use]
pub fn hash_text(text: &str) -> String {
    blake3::hash(text.as_bytes()).to_hex().to_string()
}
