//! Structural differences between an installed resource and its template.

use serde::{Deserialize, Serialize};

use super::property::PropertyValue;

/// One property whose value differs between the installed resource and the template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyChange {
    /// Property name.
    pub property_name: String,
    /// Value currently installed.
    pub current_value: PropertyValue,
    /// Value published in the template.
    pub template_value: PropertyValue,
}

/// Result of comparing one installed resource against one template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Difference {
    /// True iff at least one comparable property changed.
    pub has_changes: bool,
    /// Changed properties, in comparable-key order.
    pub changes: Vec<PropertyChange>,
}

impl Difference {
    /// Builds a difference from its changes.
    #[must_use]
    pub const fn from_changes(changes: Vec<PropertyChange>) -> Self {
        Self {
            has_changes: !changes.is_empty(),
            changes,
        }
    }

    /// Returns the change for a property, if it changed.
    #[must_use]
    pub fn change(&self, property_name: &str) -> Option<&PropertyChange> {
        self.changes.iter().find(|c| c.property_name == property_name)
    }

    /// Names of the changed properties.
    pub fn changed_properties(&self) -> impl Iterator<Item = &str> {
        self.changes.iter().map(|c| c.property_name.as_str())
    }
}

/// How consequential applying a detected change would be.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Nothing changed.
    #[default]
    None,
    /// Only descriptive metadata changed.
    Low,
    /// Classification or cadence changed.
    Medium,
    /// Detection logic changed.
    High,
}

impl RiskLevel {
    /// Display string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    /// Short explanation of what drove this level.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::None => "No changes detected",
            Self::Low => "Only metadata changed",
            Self::Medium => "Classification or frequency changed",
            Self::High => "Query or detection logic changed",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!(
                "unknown risk level '{other}' (expected none, low, medium or high)"
            )),
        }
    }
}
