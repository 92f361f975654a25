//! Cumulative seen-item tracking for open-ended feed discovery.
//!
//! Rotating news hubs list a sliding window of links: an item can
//! transiently disappear from the page and reappear later. Overwriting the
//! stored state with only the current scrape's ids would re-report such
//! items as "new". The tracker therefore always persists the UNION of the
//! previous and current id sets — the seen-set only grows.

use std::collections::BTreeSet;

use tracing::warn;

use crate::entity::TargetKey;
use crate::error::StoreError;
use crate::storage::SeenSetStore;

/// Result of merging one scrape's ids into a target's seen-set.
#[derive(Debug)]
pub struct MergeOutcome {
    /// Ids in the current scrape that were never seen before.
    pub new_ids: BTreeSet<String>,

    /// True when no seen-set existed for the target. Callers must treat
    /// `new_ids` as not actionable on a first run — reporting an entire
    /// pre-existing catalogue as breaking news is the failure mode the
    /// baseline rule exists to prevent.
    pub first_run: bool,

    /// Set when the union was computed but could not be persisted.
    /// Detection still happened this cycle; memory of it was lost.
    pub persist_error: Option<String>,
}

impl MergeOutcome {
    /// New ids that should be forwarded downstream: empty on a first run.
    #[must_use]
    pub fn actionable_ids(&self) -> &BTreeSet<String> {
        static EMPTY: BTreeSet<String> = BTreeSet::new();
        if self.first_run {
            &EMPTY
        } else {
            &self.new_ids
        }
    }
}

/// Tracks the monotonically growing set of ids ever seen per target.
#[derive(Clone)]
pub struct CumulativeTracker {
    store: SeenSetStore,
}

impl CumulativeTracker {
    /// Creates a tracker over a seen-set store.
    #[must_use]
    pub fn new(store: SeenSetStore) -> Self {
        Self { store }
    }

    /// Loads the seen-id set for a target (empty if absent).
    pub fn load(&self, key: &TargetKey) -> Result<BTreeSet<String>, StoreError> {
        self.store.load(key)
    }

    /// Merges the current scrape's ids into the target's seen-set.
    ///
    /// Computes `new_ids = current − previous` and persists
    /// `previous ∪ current`. A persistence write failure does not discard
    /// the computed `new_ids`; it is reported in
    /// `MergeOutcome::persist_error` and logged, so degraded-but-correct
    /// behavior (detect but don't remember) is possible.
    ///
    /// # Errors
    /// Fails only when the existing seen-set cannot be loaded. A corrupt
    /// record must not masquerade as a first run, which would silently
    /// suppress a whole cycle of real news.
    pub fn merge(
        &self,
        key: &TargetKey,
        current_ids: &BTreeSet<String>,
    ) -> Result<MergeOutcome, StoreError> {
        let first_run = !self.store.exists(key)?;
        let previous = self.store.load(key)?;

        let new_ids: BTreeSet<String> = current_ids.difference(&previous).cloned().collect();
        let union: BTreeSet<String> = previous.union(current_ids).cloned().collect();

        let persist_error = match self.store.save(key, &union) {
            Ok(()) => None,
            Err(e) => {
                warn!(
                    target_key = %key,
                    error = %e,
                    "seen-set write failed; new ids detected this cycle will not be remembered"
                );
                Some(e.to_string())
            }
        };

        Ok(MergeOutcome {
            new_ids,
            first_run,
            persist_error,
        })
    }

    /// Deletes the seen-set for a target. Explicit operator action; the
    /// next merge becomes a first run again.
    pub fn reset(&self, key: &TargetKey) -> Result<(), StoreError> {
        self.store.reset(key)
    }
}
