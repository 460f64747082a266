//! Deployment reports.

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::fmt::Write;
use uuid::Uuid;

use crate::model::DeploymentResult;

const RULE_WIDTH: usize = 80;

/// Aggregated outcome of one deployment run.
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentReport {
    /// Unique id of this run.
    pub run_id: Uuid,
    /// Host and process that ran the deployment.
    pub operator: String,
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Number of results.
    pub total: usize,
    /// Number of successful results.
    pub successful: usize,
    /// Number of failed results.
    pub failed: usize,
    /// Per-item results, in deployment order.
    pub results: Vec<DeploymentResult>,
    /// Rendered report, including where it was saved.
    pub text: String,
}

impl DeploymentReport {
    /// Aggregates results and renders the report body.
    #[must_use]
    pub fn new(results: &[DeploymentResult]) -> Self {
        let successful = results.iter().filter(|r| r.success).count();
        let mut report = Self {
            run_id: Uuid::new_v4(),
            operator: operator_id(),
            generated_at: Utc::now(),
            total: results.len(),
            successful,
            failed: results.len() - successful,
            results: results.to_vec(),
            text: String::new(),
        };
        report.text = report.render();
        report
    }

    /// Returns true if every result succeeded.
    #[must_use]
    pub const fn all_succeeded(&self) -> bool {
        self.failed == 0
    }

    /// Appends a trailing line (e.g. where the report was saved).
    pub fn append_line(&mut self, line: &str) {
        self.text.push('\n');
        self.text.push_str(line);
    }

    fn render(&self) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        let mut out = String::new();

        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "  DEPLOYMENT REPORT");
        let _ = writeln!(
            out,
            "  {}",
            self.generated_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
        );
        let _ = writeln!(out, "  Run {} by {}", self.run_id, self.operator);
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out);

        let _ = writeln!(out, "Total Updates Processed: {}", self.total);
        let _ = writeln!(out, "Successful: {}", self.successful);
        let _ = writeln!(out, "Failed: {}", self.failed);
        let _ = writeln!(out);

        for (i, result) in self.results.iter().enumerate() {
            let status = if result.success { "✓ SUCCESS" } else { "✗ FAILED" };
            let _ = writeln!(
                out,
                "{}. [{status}] {}: {}",
                i + 1,
                result.kind.as_str().to_uppercase(),
                result.target_name
            );
            let _ = writeln!(out, "   Message: {}", result.message);
            if let Some(note) = result.optional_note.as_deref().filter(|n| !n.is_empty()) {
                let _ = writeln!(out, "   Note: {note}");
            }
            let _ = writeln!(out);
        }

        out.push_str(&rule);
        out
    }
}

/// `hostname-pid`, identifying who ran a deployment.
fn operator_id() -> String {
    let hostname = hostname::get().map_or_else(
        |_| String::from("unknown"),
        |h| h.to_string_lossy().to_string(),
    );
    format!("{hostname}-{}", std::process::id())
}
