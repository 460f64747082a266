//! Data model shared by the comparator, the analyzer and the workflow.
//!
//! Snapshots of installed resources and catalog templates are read once per
//! run; everything derived from them (differences, detected updates,
//! deployment results) is created fresh and never mutated.

mod difference;
mod property;
mod resource;
mod update;

pub use difference::{Difference, PropertyChange, RiskLevel};
pub use property::{PropertyMap, PropertyValue};
pub use resource::{InstalledRef, InstalledResource, ResourceKind, Template, TemplateRef};
pub use update::{DeployOutcome, DeploymentResult, DetectedUpdate, DetectedUpdates};
