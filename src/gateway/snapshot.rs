//! File-backed inventory and catalog.
//!
//! A snapshot is a JSON or YAML document with two flat lists, `installed`
//! and `templates`, each entry carrying its own `kind`. It lets audits run
//! offline and in CI against an exported copy of a workspace.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use crate::error::GatewayError;
use crate::model::{InstalledResource, ResourceKind, Template};

use super::traits::{CatalogGateway, GatewayResult, InventoryGateway};

/// Serialized snapshot document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Installed resources of every kind.
    #[serde(default)]
    pub installed: Vec<InstalledResource>,
    /// Catalog templates of every kind.
    #[serde(default)]
    pub templates: Vec<Template>,
}

/// Snapshot file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    /// JSON document.
    Json,
    /// YAML document.
    Yaml,
}

impl SnapshotFormat {
    /// Picks the format from a file extension; anything but `.json` is YAML.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

/// Inventory and catalog served from a snapshot file.
#[derive(Debug, Clone)]
pub struct SnapshotGateway {
    /// Where the snapshot was read from.
    source: PathBuf,
    /// Parsed snapshot.
    snapshot: Snapshot,
}

impl SnapshotGateway {
    /// Wraps an in-memory snapshot.
    #[must_use]
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            source: PathBuf::from("<memory>"),
            snapshot,
        }
    }

    /// Loads a snapshot file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    pub async fn load(path: impl AsRef<Path>) -> GatewayResult<Self> {
        let path = path.as_ref();
        info!("Loading snapshot from: {}", path.display());

        let content = fs::read_to_string(path)
            .await
            .map_err(|e| GatewayError::snapshot(path, format!("Failed to read snapshot: {e}")))?;

        let snapshot = Self::parse(&content, SnapshotFormat::from_path(path))
            .map_err(|message| GatewayError::snapshot(path, message))?;

        debug!(
            "Snapshot holds {} installed resources and {} templates",
            snapshot.installed.len(),
            snapshot.templates.len()
        );

        Ok(Self {
            source: path.to_path_buf(),
            snapshot,
        })
    }

    /// Parses snapshot content.
    fn parse(content: &str, format: SnapshotFormat) -> std::result::Result<Snapshot, String> {
        match format {
            SnapshotFormat::Json => {
                serde_json::from_str(content).map_err(|e| format!("Invalid JSON snapshot: {e}"))
            }
            SnapshotFormat::Yaml => {
                serde_yaml::from_str(content).map_err(|e| format!("Invalid YAML snapshot: {e}"))
            }
        }
    }

    /// Path the snapshot was loaded from.
    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }

    fn installed_of(&self, kind: ResourceKind) -> Vec<InstalledResource> {
        self.snapshot
            .installed
            .iter()
            .filter(|r| r.kind == kind)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl InventoryGateway for SnapshotGateway {
    async fn list_installed(&self, kind: ResourceKind) -> GatewayResult<Vec<InstalledResource>> {
        Ok(self.installed_of(kind))
    }
}

#[async_trait]
impl CatalogGateway for SnapshotGateway {
    async fn list_installed_solutions(&self) -> GatewayResult<Vec<InstalledResource>> {
        Ok(self.installed_of(ResourceKind::Solution))
    }

    async fn list_templates(&self, kind: ResourceKind) -> GatewayResult<Vec<Template>> {
        Ok(self
            .snapshot
            .templates
            .iter()
            .filter(|t| t.kind == kind)
            .cloned()
            .collect())
    }

    async fn get_template_content(&self, template_id: &str) -> GatewayResult<Option<Template>> {
        Ok(self
            .snapshot
            .templates
            .iter()
            .find(|t| t.id == template_id)
            .cloned())
    }
}
