//! # regwatch - change detection for regulatory and news sources
//!
//! regwatch is the snapshot-diff engine behind a fleet of web-source
//! monitors: guideline-page watchers, regulatory document trackers, and
//! cumulative link-discovery crawlers. Every monitor is a thin
//! configuration over the same core — an endpoint, an extractor, and a
//! tracking mode — so the subtle "what counts as new" semantics live in
//! exactly one place.
//!
//! ## Core Concepts
//!
//! - **Target**: one independently monitored source/category
//! - **Fingerprint**: hash + order-independent facet sets for cheap equality
//! - **Snapshot**: the last successfully observed state of one target
//! - **CumulativeTracker**: a monotonically growing seen-id set for feed discovery
//! - **ChangeReport**: the structured outcome of one check cycle
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use regwatch::{
//!     FacetRule, MemoryBackend, MonitorRunner, PatternExtractor, RunnerConfig, Target, TargetKey,
//! };
//!
//! let extractor = Arc::new(
//!     PatternExtractor::new(vec![
//!         FacetRule::new("links", r#"https?://[^\s"'<>]+\.pdf"#)?,
//!     ])
//!     .with_entity_facet("links"),
//! );
//!
//! let runner = MonitorRunner::new(fetcher, Arc::new(MemoryBackend::new()), RunnerConfig::default())?;
//! let target = Target::snapshot(
//!     TargetKey::new("ICH", "quality")?,
//!     "https://admin.ich.org/api/v1/nodes?alias=/page/quality-guidelines",
//!     extractor,
//! );
//!
//! for report in runner.check_all(&[target]) {
//!     if report.has_changes {
//!         println!("{}", report.summary);
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Data model
pub mod entity;
pub mod error;
pub mod fingerprint;
pub mod snapshot;

// Boundaries
pub mod extract;
pub mod fetch;
pub mod storage;

// Core engine
pub mod cumulative;
pub mod diff;
pub mod report;
pub mod runner;

// Re-export primary types at crate root for convenience
pub use cumulative::{CumulativeTracker, MergeOutcome};
pub use diff::{ChangeReport, CheckStatus, DiffEngine, FacetDelta};
pub use entity::{ObservedEntity, TargetKey};
pub use error::{ExtractError, FetchError, StoreError, WatchError, WatchResult};
pub use extract::{Extraction, Extractor, FacetRule, PatternExtractor};
pub use fetch::{Fetcher, RawContent};
pub use fingerprint::{FacetMap, Fingerprint};
pub use report::render_run_report;
pub use runner::{EnrichmentStream, MonitorRunner, NewEntity, RunnerConfig, Target, TargetMode};
pub use snapshot::Snapshot;
pub use storage::{FileBackend, KeyValueBackend, MemoryBackend, SeenSet, SeenSetStore, SnapshotStore};

#[cfg(feature = "http")]
pub use fetch::HttpFetcher;
