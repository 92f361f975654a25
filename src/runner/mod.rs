//! Monitor orchestration.
//!
//! `MonitorRunner` drives one check cycle per target through a strict
//! pipeline: FETCH → EXTRACT → FINGERPRINT → LOAD_PREVIOUS → DIFF →
//! (SAVE_IF_CHANGED | SAVE_BASELINE) → REPORT. Cumulative-mode targets
//! replace DIFF/SAVE with a seen-set MERGE. Failures are isolated per
//! target: one source's outage never aborts or corrupts the check for any
//! other target.

mod stream;

pub use stream::{EnrichmentStream, NewEntity};

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use chrono::Utc;
use crossbeam_channel::{bounded, unbounded, Sender, TrySendError};
use tracing::{debug, warn};

use crate::cumulative::CumulativeTracker;
use crate::diff::{ChangeReport, CheckStatus, DiffEngine, BASELINE_SUMMARY, NO_CHANGES_SUMMARY};
use crate::entity::TargetKey;
use crate::error::{WatchError, WatchResult};
use crate::extract::Extractor;
use crate::fetch::Fetcher;
use crate::fingerprint::Fingerprint;
use crate::snapshot::Snapshot;
use crate::storage::{KeyValueBackend, SeenSetStore, SnapshotStore};

/// How a target's state is tracked between checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetMode {
    /// "Did this fixed resource change": latest snapshot, replaced
    /// wholesale, diffed against the previous one.
    Snapshot,
    /// Open-ended feed discovery: a monotonically growing seen-id set;
    /// only never-seen ids are actionable.
    Cumulative,
}

/// Configuration of one monitored target. Every monitor in the system is a
/// thin instance of this: an endpoint, an extractor, and a tracking mode.
#[derive(Clone)]
pub struct Target {
    /// Unique key for the target's persisted state.
    pub key: TargetKey,

    /// URL or endpoint handed to the fetcher.
    pub endpoint: String,

    /// Human-readable description carried into reports.
    pub description: Option<String>,

    /// Snapshot-diff or cumulative tracking.
    pub mode: TargetMode,

    /// Source-specific extractor.
    pub extractor: Arc<dyn Extractor>,
}

impl Target {
    /// Creates a snapshot-diff target.
    #[must_use]
    pub fn snapshot(
        key: TargetKey,
        endpoint: impl Into<String>,
        extractor: Arc<dyn Extractor>,
    ) -> Self {
        Self {
            key,
            endpoint: endpoint.into(),
            description: None,
            mode: TargetMode::Snapshot,
            extractor,
        }
    }

    /// Creates a cumulative-discovery target.
    #[must_use]
    pub fn cumulative(
        key: TargetKey,
        endpoint: impl Into<String>,
        extractor: Arc<dyn Extractor>,
    ) -> Self {
        Self {
            key,
            endpoint: endpoint.into(),
            description: None,
            mode: TargetMode::Cumulative,
            extractor,
        }
    }

    /// Attaches a description, consuming and returning the target.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Runner configuration.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Number of targets checked concurrently. `1` (the default) runs
    /// targets sequentially with `inter_request_delay` between them.
    pub concurrency: usize,

    /// Politeness delay between consecutive fetches in sequential mode.
    pub inter_request_delay: Duration,

    /// Per-subscriber enrichment stream buffer capacity.
    pub stream_capacity: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            inter_request_delay: Duration::from_millis(500),
            stream_capacity: 1024,
        }
    }
}

impl RunnerConfig {
    /// Validates the configuration.
    pub fn validate(self) -> WatchResult<Self> {
        if self.concurrency == 0 {
            return Err(WatchError::internal("concurrency must be at least 1"));
        }
        if self.stream_capacity == 0 {
            return Err(WatchError::internal("stream_capacity must be at least 1"));
        }
        Ok(self)
    }
}

/// Orchestrates check cycles over independent targets.
///
/// The persistence backend is injected at construction; the runner holds no
/// global state. Each target's read-modify-write touches only its own keys,
/// so parallel checks need no coordination beyond the backend itself.
pub struct MonitorRunner {
    fetcher: Arc<dyn Fetcher>,
    snapshots: SnapshotStore,
    tracker: CumulativeTracker,
    diff_engine: DiffEngine,
    cfg: RunnerConfig,
    subscribers: Mutex<Vec<Sender<NewEntity>>>,
    dropped_events: AtomicU64,
}

impl MonitorRunner {
    /// Creates a runner over a fetcher and a persistence backend.
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        backend: Arc<dyn KeyValueBackend>,
        cfg: RunnerConfig,
    ) -> WatchResult<Self> {
        let cfg = cfg.validate()?;
        Ok(Self {
            fetcher,
            snapshots: SnapshotStore::new(Arc::clone(&backend)),
            tracker: CumulativeTracker::new(SeenSetStore::new(backend)),
            diff_engine: DiffEngine::default(),
            cfg,
            subscribers: Mutex::new(Vec::new()),
            dropped_events: AtomicU64::new(0),
        })
    }

    /// Replaces the default diff engine (e.g. to change the line bound).
    #[must_use]
    pub fn with_diff_engine(mut self, diff_engine: DiffEngine) -> Self {
        self.diff_engine = diff_engine;
        self
    }

    /// Subscribes to newly-actionable entities.
    pub fn subscribe(&self) -> EnrichmentStream {
        let (tx, rx) = bounded(self.cfg.stream_capacity);
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.push(tx);
        }
        EnrichmentStream::new(rx)
    }

    /// Events dropped because a subscriber's buffer was full.
    #[must_use]
    pub fn dropped_events(&self) -> u64 {
        self.dropped_events.load(Ordering::Relaxed)
    }

    /// Direct access to the snapshot store (operator tooling).
    #[must_use]
    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    /// Explicitly resets all persisted state for a target. The next check
    /// becomes a baseline/first run.
    pub fn reset(&self, key: &TargetKey) -> WatchResult<()> {
        self.snapshots.reset(key)?;
        self.tracker.reset(key)?;
        Ok(())
    }

    /// Runs one check cycle for a single target.
    ///
    /// Never returns an error: failures become `ChangeReport` error entries
    /// so multi-target aggregation can list changes and failures in one
    /// pass.
    pub fn check_target(&self, target: &Target) -> ChangeReport {
        let report = match self.try_check(target) {
            Ok(report) => report,
            Err(e) => {
                debug!(target_key = %target.key, error = %e, "check cycle failed");
                ChangeReport::error(target.key.clone(), e.to_string())
            }
        };

        if report.status != CheckStatus::Baseline && !report.added_entities.is_empty() {
            self.forward(&report);
        }
        report
    }

    /// Runs one check cycle for every target, isolating failures.
    ///
    /// Reports come back in input order, error entries included.
    pub fn check_all(&self, targets: &[Target]) -> Vec<ChangeReport> {
        if self.cfg.concurrency <= 1 || targets.len() <= 1 {
            let mut reports = Vec::with_capacity(targets.len());
            for (i, target) in targets.iter().enumerate() {
                if i > 0 && !self.cfg.inter_request_delay.is_zero() {
                    thread::sleep(self.cfg.inter_request_delay);
                }
                reports.push(self.check_target(target));
            }
            return reports;
        }

        let workers = self.cfg.concurrency.min(targets.len());
        let (job_tx, job_rx) = unbounded::<(usize, &Target)>();
        let (report_tx, report_rx) = unbounded::<(usize, ChangeReport)>();

        for pair in targets.iter().enumerate() {
            let _ = job_tx.send(pair);
        }
        drop(job_tx);

        thread::scope(|scope| {
            for _ in 0..workers {
                let job_rx = job_rx.clone();
                let report_tx = report_tx.clone();
                scope.spawn(move || {
                    while let Ok((index, target)) = job_rx.recv() {
                        let _ = report_tx.send((index, self.check_target(target)));
                    }
                });
            }
        });
        drop(report_tx);

        let mut slots: Vec<Option<ChangeReport>> = (0..targets.len()).map(|_| None).collect();
        for (index, report) in report_rx.iter() {
            slots[index] = Some(report);
        }
        slots
            .into_iter()
            .enumerate()
            .map(|(i, slot)| {
                slot.unwrap_or_else(|| {
                    ChangeReport::error(targets[i].key.clone(), "worker produced no report")
                })
            })
            .collect()
    }

    fn try_check(&self, target: &Target) -> WatchResult<ChangeReport> {
        let content = self.fetcher.fetch(&target.endpoint)?;
        let extraction = target.extractor.extract(&content)?;

        match target.mode {
            TargetMode::Snapshot => {
                let fingerprint = Fingerprint::of(&content.text, extraction.facets);
                let mut current =
                    Snapshot::new(target.key.clone(), fingerprint).with_entities(extraction.entities);
                if let Some(text) = extraction.full_text {
                    current = current.with_full_text(text);
                }

                let previous = self.snapshots.load(&target.key)?;
                let mut report = self.diff_engine.diff(previous.as_ref(), &current);

                // Baseline always saves; otherwise only a changed check
                // rewrites the snapshot.
                if report.status == CheckStatus::Baseline || report.has_changes {
                    if let Err(e) = self.snapshots.save(&current) {
                        warn!(
                            target_key = %target.key,
                            error = %e,
                            "snapshot write failed; this check's observation will not be remembered"
                        );
                        report.status = CheckStatus::Error;
                        report.error = Some(e.to_string());
                    }
                }
                Ok(report)
            }
            TargetMode::Cumulative => {
                let current_ids: BTreeSet<String> =
                    extraction.entities.iter().map(|e| e.id.clone()).collect();
                let outcome = self.tracker.merge(&target.key, &current_ids)?;

                let actionable = outcome.actionable_ids();
                let mut report = if outcome.first_run {
                    ChangeReport::quiet(
                        target.key.clone(),
                        CheckStatus::Baseline,
                        BASELINE_SUMMARY,
                    )
                } else {
                    let summary = if actionable.is_empty() {
                        NO_CHANGES_SUMMARY.to_string()
                    } else {
                        format!("{} new items", actionable.len())
                    };
                    let mut r =
                        ChangeReport::quiet(target.key.clone(), CheckStatus::Checked, &summary);
                    r.has_changes = !actionable.is_empty();
                    r.added_entities = extraction
                        .entities
                        .into_iter()
                        .filter(|e| actionable.contains(&e.id))
                        .collect();
                    r
                };
                report.current_timestamp = Some(Utc::now());

                if let Some(persist_error) = outcome.persist_error {
                    report.status = CheckStatus::Error;
                    report.error = Some(persist_error);
                }
                Ok(report)
            }
        }
    }

    fn forward(&self, report: &ChangeReport) {
        let Ok(mut subs) = self.subscribers.lock() else {
            return;
        };

        subs.retain(|tx| {
            for entity in &report.added_entities {
                match tx.try_send(NewEntity {
                    target_key: report.target_key.clone(),
                    entity: entity.clone(),
                }) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        self.dropped_events.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(TrySendError::Disconnected(_)) => return false,
                }
            }
            true
        });
    }
}
