//! JSON comparison reports.

use serde::Serialize;
use std::path::Path;
use tracing::info;

use crate::error::ExportError;
use crate::model::DetectedUpdates;

use super::ExportResult;
use super::csv_report::write_atomic;

/// Document written by [`export_comparison_report`].
#[derive(Debug, Serialize)]
struct ComparisonReport<'a> {
    generated_at: String,
    total: usize,
    updates: &'a DetectedUpdates,
}

/// Writes every detected update, with its full difference, as pretty JSON.
///
/// # Errors
///
/// Returns an error if the report cannot be serialized or written.
pub async fn export_comparison_report(updates: &DetectedUpdates, path: &Path) -> ExportResult<()> {
    let report = ComparisonReport {
        generated_at: chrono::Utc::now().to_rfc3339(),
        total: updates.total(),
        updates,
    };

    let content = serde_json::to_string_pretty(&report).map_err(ExportError::serialization)?;
    write_atomic(path, content.as_bytes()).await?;

    info!("Comparison report exported to {}", path.display());
    Ok(())
}
