//! Configuration specification types for hubdrift.
//!
//! This module defines the structs that map to the `hubdrift.yaml` file:
//! which workspace is audited, where inventory and catalog data come from,
//! where reports go and how deployment is gated.

use serde::{Deserialize, Serialize};

use crate::model::RiskLevel;

/// The root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HubDriftConfig {
    /// The audited workspace.
    pub workspace: WorkspaceConfig,
    /// Where inventory and catalog data come from.
    pub source: SourceConfig,
    /// Report output settings.
    #[serde(default)]
    pub output: OutputConfig,
    /// Deployment gating.
    #[serde(default)]
    pub deployment: DeploymentConfig,
}

/// Identity of the audited workspace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkspaceConfig {
    /// Subscription identifier.
    pub subscription_id: String,
    /// Resource group containing the workspace.
    pub resource_group: String,
    /// Workspace name.
    pub workspace_name: String,
    /// Directory (tenant) identifier.
    #[serde(default)]
    pub tenant_id: Option<String>,
}

/// Source of inventory and catalog data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceConfig {
    /// Backend type.
    pub backend: SourceBackend,
    /// Snapshot file path (for the snapshot backend).
    #[serde(default)]
    pub path: Option<String>,
    /// Service base URL (for the api backend).
    #[serde(default)]
    pub base_url: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Maximum retries for retryable request failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// Source backend types.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceBackend {
    /// JSON or YAML snapshot file.
    #[default]
    Snapshot,
    /// Content-hub HTTP service.
    Api,
}

/// Report output settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutputConfig {
    /// Directory for CSV and report files.
    #[serde(default = "default_output_dir")]
    pub dir: String,
    /// Whether deployment results are also exported as CSV.
    #[serde(default = "default_true")]
    pub export_csv: bool,
}

/// Deployment gating.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeploymentConfig {
    /// Skip the batch confirmation.
    #[serde(default)]
    pub auto_approve: bool,
    /// Report what would be deployed without applying anything.
    #[serde(default)]
    pub dry_run: bool,
    /// Updates riskier than this are never approved automatically.
    #[serde(default)]
    pub max_risk: Option<RiskLevel>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            export_csv: true,
        }
    }
}

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_true() -> bool {
    true
}

fn default_output_dir() -> String {
    String::from(".")
}

impl WorkspaceConfig {
    /// Short `subscription/resource-group/workspace` label for logs and reports.
    #[must_use]
    pub fn label(&self) -> String {
        format!(
            "{}/{}/{}",
            self.subscription_id, self.resource_group, self.workspace_name
        )
    }
}

impl SourceConfig {
    /// Creates a snapshot source.
    #[must_use]
    pub fn snapshot(path: impl Into<String>) -> Self {
        Self {
            backend: SourceBackend::Snapshot,
            path: Some(path.into()),
            base_url: None,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }

    /// Creates an api source.
    #[must_use]
    pub fn api(base_url: impl Into<String>) -> Self {
        Self {
            backend: SourceBackend::Api,
            path: None,
            base_url: Some(base_url.into()),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

impl HubDriftConfig {
    /// Returns true if deployments go to a live service.
    #[must_use]
    pub fn deploys_live(&self) -> bool {
        self.source.backend == SourceBackend::Api && !self.deployment.dry_run
    }
}
