//! Durable report artifacts.
//!
//! This module provides:
//! - The `ReportExporter` interface the workflow persists through
//! - CSV exports of detected updates and deployment results
//! - CSV exports of the installed inventory
//! - Text deployment reports
//! - JSON comparison reports

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::analysis::InventoryAudit;
use crate::error::ExportError;
use crate::model::{DeploymentResult, DetectedUpdates, ResourceKind};

mod csv_report;
mod json;

pub use csv_report::CsvReportExporter;
pub use json::export_comparison_report;

/// Result type for export operations.
pub type ExportResult<T> = std::result::Result<T, ExportError>;

/// Persists detected updates, deployment results and reports.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReportExporter: Send + Sync {
    /// Exports one file per non-empty kind into `output_dir`.
    async fn export_updates(
        &self,
        detected: &DetectedUpdates,
        output_dir: &Path,
    ) -> ExportResult<BTreeMap<ResourceKind, PathBuf>>;

    /// Exports deployment results as a table.
    async fn export_deployment_results(&self, results: &[DeploymentResult])
    -> ExportResult<PathBuf>;

    /// Saves a text deployment report.
    async fn persist_report(&self, text: &str) -> ExportResult<PathBuf>;

    /// Exports the installed resources of one audited kind into `output_dir`.
    async fn export_inventory(
        &self,
        audit: &InventoryAudit,
        output_dir: &Path,
    ) -> ExportResult<PathBuf>;
}
