//! CSV and text report files.
//!
//! Every file name carries a local `YYYYmmdd_HHMMSS` timestamp. When a file
//! with that name already exists (two runs in the same second), a `_N`
//! counter is appended. Files are written to a temporary path and renamed
//! into place.

use async_trait::async_trait;
use chrono::Local;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::analysis::{InventoryAudit, is_enabled};
use crate::error::ExportError;
use crate::model::{
    DeploymentResult, DetectedUpdate, DetectedUpdates, InstalledResource, PropertyValue,
    ResourceKind,
};

use super::{ExportResult, ReportExporter};

/// Timestamp format used in file names.
const FILE_TIMESTAMP: &str = "%Y%m%d_%H%M%S";

/// Writes CSV exports and text reports into a directory.
#[derive(Debug, Clone)]
pub struct CsvReportExporter {
    /// Directory for deployment results and reports.
    output_dir: PathBuf,
}

#[derive(Debug, Serialize)]
struct SolutionRow<'a> {
    solution_name: &'a str,
    current_version: &'a str,
    available_version: &'a str,
    publisher: &'a str,
    package_id: &'a str,
    installed_id: &'a str,
    risk: &'static str,
    template_fingerprint: &'a str,
}

#[derive(Debug, Serialize)]
struct RuleRow<'a> {
    rule_name: &'a str,
    rule_id: &'a str,
    current_severity: String,
    template_severity: String,
    tactics: String,
    template_id: &'a str,
    update_type: String,
    risk: &'static str,
    template_fingerprint: &'a str,
}

#[derive(Debug, Serialize)]
struct ConnectorRow<'a> {
    connector_name: &'a str,
    connector_id: &'a str,
    template_id: &'a str,
    update_info: String,
    risk: &'static str,
}

#[derive(Debug, Serialize)]
struct InstalledRuleRow<'a> {
    name: &'a str,
    display_name: &'a str,
    severity: String,
    enabled: bool,
    tactics: String,
    techniques: String,
    description: String,
    id: &'a str,
}

#[derive(Debug, Serialize)]
struct InstalledConnectorRow<'a> {
    name: &'a str,
    display_name: &'a str,
    connector_kind: String,
    data_types: String,
    enabled: bool,
    id: &'a str,
}

#[derive(Debug, Serialize)]
struct InstalledSolutionRow<'a> {
    name: &'a str,
    display_name: &'a str,
    version: &'a str,
    id: &'a str,
}

#[derive(Debug, Serialize)]
struct ResultRow<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    item_name: &'a str,
    success: bool,
    message: &'a str,
    note: &'a str,
    timestamp: String,
}

impl CsvReportExporter {
    /// Creates an exporter writing into `output_dir`.
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Directory reports are written to.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn timestamp() -> String {
        Local::now().format(FILE_TIMESTAMP).to_string()
    }

    /// Picks `{base}.{extension}` in `dir`, or `{base}_N.{extension}` for the
    /// first `N` not taken yet.
    async fn unique_path(dir: &Path, base: &str, extension: &str) -> PathBuf {
        let mut path = dir.join(format!("{base}.{extension}"));
        let mut counter: u32 = 1;

        while fs::try_exists(&path).await.unwrap_or(false) {
            path = dir.join(format!("{base}_{counter}.{extension}"));
            counter += 1;
        }

        path
    }

    /// Serializes rows into CSV bytes.
    fn to_csv<R: Serialize>(rows: impl IntoIterator<Item = R>) -> ExportResult<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for row in rows {
            writer.serialize(row).map_err(ExportError::serialization)?;
        }
        writer.into_inner().map_err(ExportError::serialization)
    }

    fn update_rows(kind: ResourceKind, updates: &[DetectedUpdate]) -> ExportResult<Vec<u8>> {
        match kind {
            ResourceKind::Solution => Self::to_csv(updates.iter().map(|u| SolutionRow {
                solution_name: u.name(),
                current_version: u.current_version(),
                available_version: &u.template.version,
                publisher: &u.template.publisher,
                package_id: &u.template.id,
                installed_id: &u.installed.id,
                risk: u.risk.as_str(),
                template_fingerprint: &u.template_fingerprint,
            })),
            ResourceKind::Rule => Self::to_csv(updates.iter().map(|u| RuleRow {
                rule_name: u.name(),
                rule_id: &u.installed.id,
                current_severity: side_of(u, "severity", Side::Current),
                template_severity: side_of(u, "severity", Side::Template),
                tactics: side_of(u, "tactics", Side::Template),
                template_id: &u.template.id,
                update_type: changed_list(u),
                risk: u.risk.as_str(),
                template_fingerprint: &u.template_fingerprint,
            })),
            ResourceKind::Connector => Self::to_csv(updates.iter().map(|u| ConnectorRow {
                connector_name: u.name(),
                connector_id: &u.installed.id,
                template_id: &u.template.id,
                update_info: changed_list(u),
                risk: u.risk.as_str(),
            })),
        }
    }

    fn inventory_rows(kind: ResourceKind, resources: &[InstalledResource]) -> ExportResult<Vec<u8>> {
        match kind {
            ResourceKind::Solution => Self::to_csv(resources.iter().map(|r| InstalledSolutionRow {
                name: &r.name,
                display_name: r.match_name(),
                version: r.version.as_deref().unwrap_or_default(),
                id: &r.id,
            })),
            ResourceKind::Rule => Self::to_csv(resources.iter().map(|r| InstalledRuleRow {
                name: &r.name,
                display_name: r.match_name(),
                severity: property_text(r, "severity"),
                enabled: is_enabled(r),
                tactics: property_text(r, "tactics"),
                techniques: property_text(r, "techniques"),
                description: property_text(r, "description"),
                id: &r.id,
            })),
            ResourceKind::Connector => Self::to_csv(resources.iter().map(|r| InstalledConnectorRow {
                name: &r.name,
                display_name: r.match_name(),
                connector_kind: property_text(r, "connector_kind"),
                data_types: property_text(r, "data_types"),
                enabled: is_enabled(r),
                id: &r.id,
            })),
        }
    }
}

/// Property rendered for a CSV cell, empty when absent.
fn property_text(resource: &InstalledResource, key: &str) -> String {
    resource
        .properties
        .get(key)
        .filter(|v| !v.is_null())
        .map(PropertyValue::to_string)
        .unwrap_or_default()
}

#[derive(Clone, Copy)]
enum Side {
    Current,
    Template,
}

/// Value of a changed property on one side, or empty when it did not change.
fn side_of(update: &DetectedUpdate, property: &str, side: Side) -> String {
    update
        .difference
        .change(property)
        .map(|c| match side {
            Side::Current => &c.current_value,
            Side::Template => &c.template_value,
        })
        .filter(|v| !v.is_null())
        .map(PropertyValue::to_string)
        .unwrap_or_default()
}

fn changed_list(update: &DetectedUpdate) -> String {
    update.difference.changed_properties().collect::<Vec<_>>().join("; ")
}

/// Writes `bytes` to `path` through a temporary file.
pub(super) async fn write_atomic(path: &Path, bytes: &[u8]) -> ExportResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| ExportError::io(parent, e))?;
    }

    let temp_path = path.with_extension("tmp");

    let mut file = fs::File::create(&temp_path)
        .await
        .map_err(|e| ExportError::io(&temp_path, e))?;
    file.write_all(bytes)
        .await
        .map_err(|e| ExportError::io(&temp_path, e))?;
    file.sync_all()
        .await
        .map_err(|e| ExportError::io(&temp_path, e))?;

    fs::rename(&temp_path, path)
        .await
        .map_err(|e| ExportError::io(path, e))?;

    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

#[async_trait]
impl ReportExporter for CsvReportExporter {
    async fn export_updates(
        &self,
        detected: &DetectedUpdates,
        output_dir: &Path,
    ) -> ExportResult<BTreeMap<ResourceKind, PathBuf>> {
        let timestamp = Self::timestamp();
        let mut exported = BTreeMap::new();

        for kind in ResourceKind::ALL {
            let updates = detected.for_kind(kind);
            if updates.is_empty() {
                continue;
            }

            let path = Self::unique_path(
                output_dir,
                &format!("{}_updates_{timestamp}", kind.as_str()),
                "csv",
            )
            .await;
            let bytes = Self::update_rows(kind, updates)?;
            write_atomic(&path, &bytes).await?;

            info!("Exported {} {} updates to {}", updates.len(), kind, path.display());
            exported.insert(kind, path);
        }

        if exported.is_empty() {
            warn!("No updates to export");
        }

        Ok(exported)
    }

    async fn export_deployment_results(
        &self,
        results: &[DeploymentResult],
    ) -> ExportResult<PathBuf> {
        let path = Self::unique_path(
            &self.output_dir,
            &format!("deployment_results_{}", Self::timestamp()),
            "csv",
        )
        .await;

        let bytes = Self::to_csv(results.iter().map(|r| ResultRow {
            kind: r.kind.as_str(),
            item_name: &r.target_name,
            success: r.success,
            message: &r.message,
            note: r.optional_note.as_deref().unwrap_or_default(),
            timestamp: r.timestamp.to_rfc3339(),
        }))?;
        write_atomic(&path, &bytes).await?;

        info!("Exported {} deployment results to {}", results.len(), path.display());
        Ok(path)
    }

    async fn persist_report(&self, text: &str) -> ExportResult<PathBuf> {
        let path = Self::unique_path(
            &self.output_dir,
            &format!("deployment_report_{}", Self::timestamp()),
            "txt",
        )
        .await;

        write_atomic(&path, text.as_bytes()).await?;

        info!("Deployment report saved to {}", path.display());
        Ok(path)
    }

    async fn export_inventory(
        &self,
        audit: &InventoryAudit,
        output_dir: &Path,
    ) -> ExportResult<PathBuf> {
        let path = Self::unique_path(
            output_dir,
            &format!("{}_inventory_{}", audit.kind.plural(), Self::timestamp()),
            "csv",
        )
        .await;

        if audit.is_empty() {
            warn!("No installed {} to export", audit.kind.plural());
        }

        let bytes = Self::inventory_rows(audit.kind, &audit.resources)?;
        write_atomic(&path, &bytes).await?;

        info!("Exported {} installed {} to {}", audit.total(), audit.kind.plural(), path.display());
        Ok(path)
    }
}
