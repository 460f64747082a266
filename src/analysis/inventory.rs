//! Inventory audit of installed resources.
//!
//! An audit lists what is installed for one kind and counts rules by
//! status and severity, independently of whether any template matches.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::model::{InstalledResource, PropertyValue, ResourceKind};

/// Severity bucket for resources that carry no severity.
pub const UNKNOWN_SEVERITY: &str = "Unknown";

/// Installed resources of one kind with status and severity counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryAudit {
    /// Audited kind.
    pub kind: ResourceKind,
    /// Installed resources, in gateway order.
    pub resources: Vec<InstalledResource>,
    /// Resources whose `enabled` property is `true`.
    pub enabled: usize,
    /// Every other resource, including those without an `enabled` property.
    pub disabled: usize,
    /// Resource count per severity label, sorted by label.
    pub by_severity: BTreeMap<String, usize>,
}

impl InventoryAudit {
    /// Builds the audit for `resources`.
    #[must_use]
    pub fn from_resources(kind: ResourceKind, resources: Vec<InstalledResource>) -> Self {
        let enabled = resources.iter().filter(|r| is_enabled(r)).count();
        let disabled = resources.len() - enabled;

        let mut by_severity = BTreeMap::new();
        for resource in &resources {
            *by_severity
                .entry(severity_of(resource).to_string())
                .or_insert(0) += 1;
        }

        Self {
            kind,
            resources,
            enabled,
            disabled,
            by_severity,
        }
    }

    /// Number of installed resources.
    #[must_use]
    pub fn total(&self) -> usize {
        self.resources.len()
    }

    /// True when nothing of this kind is installed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// True when the resource's `enabled` property is `true`.
#[must_use]
pub fn is_enabled(resource: &InstalledResource) -> bool {
    matches!(resource.properties.get("enabled"), Some(PropertyValue::Bool(true)))
}

/// Severity label, or [`UNKNOWN_SEVERITY`].
#[must_use]
pub fn severity_of(resource: &InstalledResource) -> &str {
    resource
        .properties
        .get("severity")
        .and_then(PropertyValue::as_text)
        .filter(|s| !s.is_empty())
        .unwrap_or(UNKNOWN_SEVERITY)
}
