//! Drift analysis for installed resources.
//!
//! This module contains the pure parts of update detection:
//! - Structural comparison of installed resources against templates
//! - Dotted version ordering
//! - Risk classification and review summaries
//! - Template fingerprinting for reports
//! - Inventory audits of installed resources

mod diff;
mod fingerprint;
mod inventory;
mod risk;
mod version;

pub use diff::{ResourceComparator, SetDiff};
pub use fingerprint::TemplateHasher;
pub use inventory::{InventoryAudit, UNKNOWN_SEVERITY, is_enabled, severity_of};
pub use risk::{
    ChangeAnalyzer, HIGH_RISK_PROPERTIES, MEDIUM_RISK_PROPERTIES, Severity, SeverityAnalysis,
    SeverityChange,
};
pub use version::VersionComparator;
