//! Plain-text run reports.
//!
//! Renders a multi-target check cycle into the human-readable report
//! format the mailer and operators consume: one section per target,
//! change summaries, the first few new links, and an overall action line.

use chrono::Utc;

use crate::diff::{ChangeReport, CheckStatus};

const RULE: &str = "============================================================";
const SUBRULE: &str = "----------------------------------------";

/// Maximum entities listed per target section.
const MAX_LISTED_ENTITIES: usize = 5;

/// Renders the aggregate result of one run over many targets.
#[must_use]
pub fn render_run_report(title: &str, reports: &[ChangeReport]) -> String {
    let mut lines = vec![
        RULE.to_string(),
        title.to_string(),
        format!("Date: {}", Utc::now().format("%Y-%m-%d %H:%M")),
        RULE.to_string(),
        String::new(),
    ];

    let mut changes_found = false;
    let mut errors_found = false;

    for report in reports {
        lines.push(format!("[{}]", report.target_key));
        lines.push(SUBRULE.to_string());

        match report.status {
            CheckStatus::Error => {
                errors_found = true;
                lines.push(format!(
                    "ERROR: {}",
                    report.error.as_deref().unwrap_or("unknown error")
                ));
            }
            CheckStatus::Baseline => {
                lines.push("First check - baseline saved".to_string());
            }
            CheckStatus::Checked if report.has_changes => {
                changes_found = true;
                lines.push(format!("CHANGES: {}", report.summary));
                for entity in report.added_entities.iter().take(MAX_LISTED_ENTITIES) {
                    lines.push(format!("  + {}", entity.id));
                }
                let extra = report.added_entities.len().saturating_sub(MAX_LISTED_ENTITIES);
                if extra > 0 {
                    lines.push(format!("  ... and {extra} more"));
                }
                for entity in report.removed_entities.iter().take(MAX_LISTED_ENTITIES) {
                    lines.push(format!("  - {}", entity.id));
                }
            }
            CheckStatus::Checked => {
                lines.push("No changes".to_string());
            }
        }
        lines.push(String::new());
    }

    lines.push(RULE.to_string());
    if changes_found {
        lines.push("ACTION REQUIRED: Review changes".to_string());
    } else if errors_found {
        lines.push("No changes detected; some targets failed".to_string());
    } else {
        lines.push("All targets unchanged".to_string());
    }

    lines.join("\n")
}
