//! Detected updates and the results of deploying them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::difference::{Difference, RiskLevel};
use super::resource::{InstalledRef, ResourceKind, TemplateRef};

/// A candidate action: an installed resource that drifted from its template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedUpdate {
    /// Resource kind.
    pub kind: ResourceKind,
    /// The installed resource.
    pub installed: InstalledRef,
    /// The template it was compared against.
    pub template: TemplateRef,
    /// What changed. Always has `has_changes == true`.
    pub difference: Difference,
    /// Risk of applying the template.
    pub risk: RiskLevel,
    /// Fingerprint of the template's comparable properties.
    pub template_fingerprint: String,
}

impl DetectedUpdate {
    /// Name shown to operators.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.installed.name
    }

    /// Installed version, or `"-"` when unknown.
    #[must_use]
    pub fn current_version(&self) -> &str {
        self.installed.version.as_deref().unwrap_or("-")
    }
}

/// Candidate updates for one detection pass, grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedUpdates {
    /// Solution updates.
    pub solutions: Vec<DetectedUpdate>,
    /// Rule updates.
    pub rules: Vec<DetectedUpdate>,
    /// Connector updates.
    pub connectors: Vec<DetectedUpdate>,
}

impl DetectedUpdates {
    /// Updates of one kind, in detection order.
    #[must_use]
    pub fn for_kind(&self, kind: ResourceKind) -> &[DetectedUpdate] {
        match kind {
            ResourceKind::Solution => &self.solutions,
            ResourceKind::Rule => &self.rules,
            ResourceKind::Connector => &self.connectors,
        }
    }

    /// Replaces the updates of one kind.
    pub fn set(&mut self, kind: ResourceKind, updates: Vec<DetectedUpdate>) {
        match kind {
            ResourceKind::Solution => self.solutions = updates,
            ResourceKind::Rule => self.rules = updates,
            ResourceKind::Connector => self.connectors = updates,
        }
    }

    /// Looks up one update by kind and index.
    #[must_use]
    pub fn get(&self, kind: ResourceKind, index: usize) -> Option<&DetectedUpdate> {
        self.for_kind(kind).get(index)
    }

    /// Total number of updates across all kinds.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.solutions.len() + self.rules.len() + self.connectors.len()
    }

    /// Returns true if nothing was detected.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// All updates in deployment order: solutions, rules, then connectors.
    pub fn iter(&self) -> impl Iterator<Item = &DetectedUpdate> {
        self.solutions
            .iter()
            .chain(self.rules.iter())
            .chain(self.connectors.iter())
    }

    /// Number of updates at each risk level, highest first.
    #[must_use]
    pub fn risk_counts(&self) -> [(RiskLevel, usize); 3] {
        let count = |level: RiskLevel| self.iter().filter(|u| u.risk == level).count();
        [
            (RiskLevel::High, count(RiskLevel::High)),
            (RiskLevel::Medium, count(RiskLevel::Medium)),
            (RiskLevel::Low, count(RiskLevel::Low)),
        ]
    }
}

/// What a deployer reports back for one change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployOutcome {
    /// Whether the change was applied.
    pub success: bool,
    /// Human-readable message.
    pub message: String,
    /// Optional follow-up note.
    #[serde(default)]
    pub note: Option<String>,
}

impl DeployOutcome {
    /// A successful outcome.
    #[must_use]
    pub fn succeeded(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            note: None,
        }
    }

    /// A failed outcome.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            note: None,
        }
    }

    /// Attaches a note.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Record of one deployed (or attempted) update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentResult {
    /// Resource kind.
    pub kind: ResourceKind,
    /// Name of the deployment target.
    pub target_name: String,
    /// Whether the change was applied.
    pub success: bool,
    /// Human-readable message.
    pub message: String,
    /// Optional follow-up note.
    pub optional_note: Option<String>,
    /// When the attempt finished.
    pub timestamp: DateTime<Utc>,
}

impl DeploymentResult {
    /// Builds a result from a deployer outcome.
    #[must_use]
    pub fn from_outcome(kind: ResourceKind, target_name: impl Into<String>, outcome: DeployOutcome) -> Self {
        Self {
            kind,
            target_name: target_name.into(),
            success: outcome.success,
            message: outcome.message,
            optional_note: outcome.note,
            timestamp: Utc::now(),
        }
    }

    /// Builds a failed result.
    #[must_use]
    pub fn failed(kind: ResourceKind, target_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::from_outcome(kind, target_name, DeployOutcome::failed(message))
    }
}

impl std::fmt::Display for DeploymentResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = if self.success { "SUCCESS" } else { "FAILED" };
        write!(f, "[{status}] {} {}: {}", self.kind, self.target_name, self.message)
    }
}
