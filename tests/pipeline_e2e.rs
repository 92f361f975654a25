//! End-to-end pipeline tests over file-backed persistence.
//!
//! These exercise the full FETCH → EXTRACT → FINGERPRINT → DIFF → SAVE
//! chain the way a scheduled job would: one runner instance per "day",
//! state carried between runs only through the snapshot directory.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use regwatch::{
    CheckStatus, ExtractError, FacetRule, FetchError, Fetcher, FileBackend, MonitorRunner,
    PatternExtractor, RawContent, RunnerConfig, Target, TargetKey,
};
use tempfile::tempdir;

/// Serves canned pages; endpoints listed in `down` fail with a timeout.
struct StubFetcher {
    pages: Mutex<HashMap<String, String>>,
    down: Mutex<Vec<String>>,
}

impl StubFetcher {
    fn new() -> Self {
        Self {
            pages: Mutex::new(HashMap::new()),
            down: Mutex::new(Vec::new()),
        }
    }

    fn set(&self, endpoint: &str, body: &str) {
        self.pages
            .lock()
            .unwrap()
            .insert(endpoint.to_string(), body.to_string());
    }

    fn take_down(&self, endpoint: &str) {
        self.down.lock().unwrap().push(endpoint.to_string());
    }
}

impl Fetcher for StubFetcher {
    fn fetch(&self, endpoint: &str) -> Result<RawContent, FetchError> {
        if self.down.lock().unwrap().iter().any(|d| d == endpoint) {
            return Err(FetchError::Timeout { duration_ms: 30000 });
        }
        self.pages
            .lock()
            .unwrap()
            .get(endpoint)
            .map(|t| RawContent::text(t.clone()))
            .ok_or(FetchError::Http { status: 404 })
    }
}

fn pdf_extractor() -> Arc<PatternExtractor> {
    Arc::new(
        PatternExtractor::new(vec![
            FacetRule::new("links", r#"https?://[^\s"'<>]+\.pdf"#).unwrap()
        ])
        .with_entity_facet("links")
        .with_full_text(),
    )
}

fn file_runner(fetcher: Arc<StubFetcher>, dir: &std::path::Path) -> MonitorRunner {
    let backend = Arc::new(FileBackend::open(dir).unwrap());
    let cfg = RunnerConfig {
        inter_request_delay: Duration::ZERO,
        ..RunnerConfig::default()
    };
    MonitorRunner::new(fetcher, backend, cfg).unwrap()
}

fn ich_target() -> Target {
    Target::snapshot(
        TargetKey::new("ICH", "quality").unwrap(),
        "https://ich.example/quality",
        pdf_extractor(),
    )
    .with_description("ICH quality guidelines")
}

#[test]
fn baseline_then_change_across_runner_restarts() {
    let dir = tempdir().unwrap();
    let fetcher = Arc::new(StubFetcher::new());
    fetcher.set(
        "https://ich.example/quality",
        "Q2 revision https://ich.example/q2.pdf",
    );

    // Day 1: baseline.
    {
        let runner = file_runner(Arc::clone(&fetcher), dir.path());
        let report = runner.check_target(&ich_target());
        assert_eq!(report.status, CheckStatus::Baseline);
        assert!(!report.has_changes);
    }

    // Day 2 (fresh runner, same directory): identical content, no-op.
    {
        let runner = file_runner(Arc::clone(&fetcher), dir.path());
        let report = runner.check_target(&ich_target());
        assert_eq!(report.status, CheckStatus::Checked);
        assert!(!report.has_changes);
    }

    // Day 3: a new PDF appears.
    fetcher.set(
        "https://ich.example/quality",
        "Q2 revision https://ich.example/q2.pdf and Q14 https://ich.example/q14.pdf",
    );
    {
        let runner = file_runner(Arc::clone(&fetcher), dir.path());
        let report = runner.check_target(&ich_target());
        assert!(report.has_changes);
        assert_eq!(report.added_entities.len(), 1);
        assert_eq!(report.added_entities[0].id, "https://ich.example/q14.pdf");
        assert!(report.summary.contains("1 new links"));
        assert!(report.facet_changes.contains_key("links"));
    }

    // Day 4: the change became the new baseline.
    {
        let runner = file_runner(Arc::clone(&fetcher), dir.path());
        let report = runner.check_target(&ich_target());
        assert!(!report.has_changes);
    }
}

#[test]
fn failed_target_does_not_block_healthy_ones() {
    let dir = tempdir().unwrap();
    let fetcher = Arc::new(StubFetcher::new());
    fetcher.set("https://pmda.example/jp18", "https://pmda.example/jp18.pdf");
    fetcher.take_down("https://ich.example/quality");

    let runner = file_runner(Arc::clone(&fetcher), dir.path());
    let targets = vec![
        ich_target(),
        Target::snapshot(
            TargetKey::new("PMDA", "JP18").unwrap(),
            "https://pmda.example/jp18",
            pdf_extractor(),
        ),
    ];

    let reports = runner.check_all(&targets);
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].status, CheckStatus::Error);
    assert!(reports[0].error.as_deref().unwrap().contains("timed out"));
    assert_eq!(reports[1].status, CheckStatus::Baseline);

    // The failed target has no persisted state; the healthy one does.
    let pmda = TargetKey::new("PMDA", "JP18").unwrap();
    let ich = TargetKey::new("ICH", "quality").unwrap();
    assert!(runner.snapshots().load(&pmda).unwrap().is_some());
    assert!(runner.snapshots().load(&ich).unwrap().is_none());

    // Once the source recovers, the target baselines normally.
    let recovered = Arc::new(StubFetcher::new());
    recovered.set("https://ich.example/quality", "https://ich.example/q2.pdf");
    let runner = file_runner(recovered, dir.path());
    let report = runner.check_target(&ich_target());
    assert_eq!(report.status, CheckStatus::Baseline);
}

#[test]
fn enrichment_stream_sees_each_entity_once() {
    let dir = tempdir().unwrap();
    let fetcher = Arc::new(StubFetcher::new());
    fetcher.set("https://hub.example/news", "https://hub.example/a.pdf");

    let runner = file_runner(Arc::clone(&fetcher), dir.path());
    let stream = runner.subscribe();
    let target = Target::cumulative(
        TargetKey::new("hub", "news").unwrap(),
        "https://hub.example/news",
        pdf_extractor(),
    );

    // First run: catalogue suppressed.
    runner.check_target(&target);
    assert!(stream.drain().is_empty());

    // New item appears, old one rotates off the page.
    fetcher.set("https://hub.example/news", "https://hub.example/b.pdf");
    runner.check_target(&target);
    let forwarded = stream.drain();
    assert_eq!(forwarded.len(), 1);
    assert_eq!(forwarded[0].entity.id, "https://hub.example/b.pdf");

    // The old item rotates back in: already seen, not forwarded again.
    fetcher.set(
        "https://hub.example/news",
        "https://hub.example/a.pdf https://hub.example/b.pdf",
    );
    runner.check_target(&target);
    assert!(stream.drain().is_empty());
    assert_eq!(runner.dropped_events(), 0);
}

#[test]
fn malformed_page_leaves_prior_snapshot_untouched() {
    struct StrictExtractor;
    impl regwatch::Extractor for StrictExtractor {
        fn extract(&self, content: &RawContent) -> Result<regwatch::Extraction, ExtractError> {
            if !content.text.contains("<table") {
                return Err(ExtractError::MalformedContent {
                    reason: "guideline table missing".to_string(),
                });
            }
            Ok(regwatch::Extraction {
                full_text: Some(content.text.clone()),
                ..Default::default()
            })
        }
    }

    let dir = tempdir().unwrap();
    let fetcher = Arc::new(StubFetcher::new());
    fetcher.set("https://e.example/v4", "<table>Annex 1</table>");

    let runner = file_runner(Arc::clone(&fetcher), dir.path());
    let key = TargetKey::new("EudraLex", "Volume4").unwrap();
    let target = Target::snapshot(key.clone(), "https://e.example/v4", Arc::new(StrictExtractor));

    runner.check_target(&target);
    let saved = runner.snapshots().load(&key).unwrap().unwrap();

    // Site ships a broken page; the cycle errors, the snapshot survives.
    fetcher.set("https://e.example/v4", "maintenance page");
    let report = runner.check_target(&target);
    assert_eq!(report.status, CheckStatus::Error);

    let still_saved = runner.snapshots().load(&key).unwrap().unwrap();
    assert_eq!(still_saved.fingerprint, saved.fingerprint);
}
