//! Risk classification and human-readable change summaries.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

use super::diff::ResourceComparator;
use crate::model::{Difference, PropertyChange, RiskLevel};

/// Properties whose change alters detection logic.
pub const HIGH_RISK_PROPERTIES: &[&str] = &["query", "trigger_threshold", "trigger_operator"];

/// Properties whose change alters classification or cadence.
pub const MEDIUM_RISK_PROPERTIES: &[&str] =
    &["severity", "tactics", "techniques", "query_frequency"];

const RULE_WIDTH: usize = 80;

/// Alert severity, in increasing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Informational.
    Informational,
    /// Low.
    Low,
    /// Medium.
    Medium,
    /// High.
    High,
    /// Critical.
    Critical,
}

impl std::str::FromStr for Severity {
    type Err = ();

    /// Parses the exact platform spelling; anything else is unknown.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Informational" => Ok(Self::Informational),
            "Low" => Ok(Self::Low),
            "Medium" => Ok(Self::Medium),
            "High" => Ok(Self::High),
            "Critical" => Ok(Self::Critical),
            _ => Err(()),
        }
    }
}

/// Direction of a severity change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityChange {
    /// Template severity is higher.
    Increased,
    /// Template severity is lower.
    Decreased,
    /// Same severity.
    Unchanged,
    /// One side is not a recognised severity.
    Unknown,
}

impl std::fmt::Display for SeverityChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Increased => "increased",
            Self::Decreased => "decreased",
            Self::Unchanged => "unchanged",
            Self::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// Outcome of comparing two severities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeverityAnalysis {
    /// Direction of the change.
    pub change_type: SeverityChange,
    /// Short impact label (`higher`, `lower`, `none`, `unknown`).
    pub impact: &'static str,
    /// Reviewer guidance.
    pub recommendation: &'static str,
}

/// Turns structural differences into risk levels and review text.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChangeAnalyzer;

impl ChangeAnalyzer {
    /// Classifies a difference by the names of its changed properties.
    ///
    /// Any high-tier property makes the whole difference `High`; otherwise
    /// any medium-tier property makes it `Medium`; otherwise `Low`.
    #[must_use]
    pub fn assess_risk(difference: &Difference) -> RiskLevel {
        if !difference.has_changes {
            return RiskLevel::None;
        }

        let touches = |tier: &[&str]| difference.changed_properties().any(|p| tier.contains(&p));

        if touches(HIGH_RISK_PROPERTIES) {
            RiskLevel::High
        } else if touches(MEDIUM_RISK_PROPERTIES) {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// Compares two severity labels.
    #[must_use]
    pub fn analyze_severity_change(current: &str, template: &str) -> SeverityAnalysis {
        let (Ok(current), Ok(template)) = (current.parse::<Severity>(), template.parse::<Severity>())
        else {
            return SeverityAnalysis {
                change_type: SeverityChange::Unknown,
                impact: "unknown",
                recommendation: "Unable to compare severity levels.",
            };
        };

        match template.cmp(&current) {
            std::cmp::Ordering::Greater => SeverityAnalysis {
                change_type: SeverityChange::Increased,
                impact: "higher",
                recommendation: "Review: Severity has been upgraded, indicating potentially more critical threat.",
            },
            std::cmp::Ordering::Less => SeverityAnalysis {
                change_type: SeverityChange::Decreased,
                impact: "lower",
                recommendation: "Review: Severity has been downgraded, threat assessment may have changed.",
            },
            std::cmp::Ordering::Equal => SeverityAnalysis {
                change_type: SeverityChange::Unchanged,
                impact: "none",
                recommendation: "No severity change.",
            },
        }
    }

    /// Renders a review summary for one resource.
    #[must_use]
    pub fn summarize(resource_name: &str, difference: &Difference) -> String {
        Self::render(resource_name, difference, false)
    }

    /// Like [`summarize`](Self::summarize), but appends a unified diff under
    /// every changed query.
    #[must_use]
    pub fn summarize_detailed(resource_name: &str, difference: &Difference) -> String {
        Self::render(resource_name, difference, true)
    }

    fn render(resource_name: &str, difference: &Difference, with_query_diff: bool) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        let mut out = String::new();

        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "  CHANGE SUMMARY: {resource_name}");
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out);

        let risk = Self::assess_risk(difference);
        let _ = writeln!(out, "Risk Assessment: {risk} - {}", risk.description());
        let _ = writeln!(out);

        if !difference.has_changes {
            out.push_str("No changes detected.");
            return out;
        }

        let _ = writeln!(out, "Properties Changed:");
        let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));

        for change in &difference.changes {
            let _ = writeln!(out);
            let _ = writeln!(out, "• {}", title_case(&change.property_name));
            Self::render_change(&mut out, change, with_query_diff);
        }

        let _ = writeln!(out);
        out.push_str(&rule);
        out
    }

    fn render_change(out: &mut String, change: &PropertyChange, with_query_diff: bool) {
        let current = &change.current_value;
        let template = &change.template_value;

        match change.property_name.as_str() {
            "severity" => {
                let analysis = Self::analyze_severity_change(
                    current.as_text().unwrap_or_default(),
                    template.as_text().unwrap_or_default(),
                );
                let _ = writeln!(out, "  Current:  {current}");
                let _ = writeln!(out, "  New:      {template}");
                let _ = writeln!(out, "  Impact:   {}", analysis.recommendation);
            }
            "tactics" | "techniques" => {
                let sets = ResourceComparator::diff_sets(current.as_list(), template.as_list());
                for (label, items) in [
                    ("Added", &sets.added),
                    ("Removed", &sets.removed),
                    ("Unchanged", &sets.unchanged),
                ] {
                    if !items.is_empty() {
                        let _ = writeln!(out, "  {label}: {}", items.join(", "));
                    }
                }
            }
            "query" if with_query_diff => {
                let diff = ResourceComparator::diff_text(
                    current.as_text().unwrap_or_default(),
                    template.as_text().unwrap_or_default(),
                );
                for line in diff.lines() {
                    let _ = writeln!(out, "  {line}");
                }
            }
            _ => {
                let _ = writeln!(out, "  Current: {current}");
                let _ = writeln!(out, "  New:     {template}");
            }
        }
    }
}

/// `query_frequency` -> `Query Frequency`.
fn title_case(name: &str) -> String {
    name.split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PropertyMap, PropertyValue, ResourceKind};

    fn change(name: &str) -> PropertyChange {
        PropertyChange {
            property_name: name.to_string(),
            current_value: PropertyValue::from("a"),
            template_value: PropertyValue::from("b"),
        }
    }

    fn diff_of(names: &[&str]) -> Difference {
        Difference::from_changes(names.iter().map(|n| change(n)).collect())
    }

    fn rule(severity: &str, query: &str) -> PropertyMap {
        let mut map = PropertyMap::new();
        map.insert(String::from("severity"), severity.into());
        map.insert(String::from("query"), query.into());
        map.insert(String::from("enabled"), true.into());
        map
    }

    #[test]
    fn test_risk_tiers() {
        assert_eq!(ChangeAnalyzer::assess_risk(&Difference::default()), RiskLevel::None);
        assert_eq!(ChangeAnalyzer::assess_risk(&diff_of(&["description"])), RiskLevel::Low);
        assert_eq!(ChangeAnalyzer::assess_risk(&diff_of(&["tactics"])), RiskLevel::Medium);
        assert_eq!(ChangeAnalyzer::assess_risk(&diff_of(&["trigger_operator"])), RiskLevel::High);
    }

    #[test]
    fn test_risk_is_monotone() {
        let medium = diff_of(&["display_name", "severity"]);
        assert_eq!(ChangeAnalyzer::assess_risk(&medium), RiskLevel::Medium);

        let escalated = diff_of(&["display_name", "severity", "query"]);
        assert_eq!(ChangeAnalyzer::assess_risk(&escalated), RiskLevel::High);

        let metadata_only = diff_of(&["display_name"]);
        assert_eq!(ChangeAnalyzer::assess_risk(&metadata_only), RiskLevel::Low);
    }

    #[test]
    fn test_severity_analysis() {
        let up = ChangeAnalyzer::analyze_severity_change("Medium", "High");
        assert_eq!(up.change_type, SeverityChange::Increased);
        assert_eq!(up.impact, "higher");

        let down = ChangeAnalyzer::analyze_severity_change("Critical", "Informational");
        assert_eq!(down.change_type, SeverityChange::Decreased);

        let same = ChangeAnalyzer::analyze_severity_change("Low", "Low");
        assert_eq!(same.change_type, SeverityChange::Unchanged);

        let unknown = ChangeAnalyzer::analyze_severity_change("Medium", "Severe");
        assert_eq!(unknown.change_type, SeverityChange::Unknown);
        assert_eq!(unknown.recommendation, "Unable to compare severity levels.");
    }

    #[test]
    fn test_severity_only_scenario() {
        let keys = ResourceKind::Rule.comparable_keys();
        let diff = ResourceComparator::compare(&rule("Medium", "Q1"), &rule("High", "Q1"), keys);

        assert_eq!(diff.changes.len(), 1);
        assert_eq!(diff.changes[0].property_name, "severity");
        assert_eq!(ChangeAnalyzer::assess_risk(&diff), RiskLevel::Medium);
        assert_eq!(
            ChangeAnalyzer::analyze_severity_change("Medium", "High").change_type,
            SeverityChange::Increased
        );
    }

    #[test]
    fn test_query_change_scenario() {
        let keys = ResourceKind::Rule.comparable_keys();
        let mut template = rule("High", "Q2");
        template.insert(String::from("description"), "updated".into());

        let diff = ResourceComparator::compare(&rule("Medium", "Q1"), &template, keys);

        assert_eq!(ChangeAnalyzer::assess_risk(&diff), RiskLevel::High);
    }

    #[test]
    fn test_summary_text() {
        let keys = ResourceKind::Rule.comparable_keys();
        let mut current = rule("Medium", "Q1");
        let mut template = rule("High", "Q1");
        current.insert(String::from("tactics"), (&["Execution"][..]).into());
        template.insert(String::from("tactics"), (&["Execution", "Persistence"][..]).into());

        let diff = ResourceComparator::compare(&current, &template, keys);
        let summary = ChangeAnalyzer::summarize("Brute force", &diff);

        assert!(summary.contains("  CHANGE SUMMARY: Brute force"));
        assert!(summary.contains("Risk Assessment: Medium - Classification or frequency changed"));
        assert!(summary.contains("• Severity\n  Current:  Medium\n  New:      High"));
        assert!(summary.contains("Impact:   Review: Severity has been upgraded"));
        assert!(summary.contains("• Tactics\n  Added: Persistence\n  Unchanged: Execution"));
    }

    #[test]
    fn test_summary_without_changes() {
        let summary = ChangeAnalyzer::summarize("Quiet rule", &Difference::default());
        assert!(summary.contains("Risk Assessment: None - No changes detected"));
        assert!(summary.ends_with("No changes detected."));
    }

    #[test]
    fn test_detailed_summary_includes_query_diff() {
        let keys = ResourceKind::Rule.comparable_keys();
        let diff = ResourceComparator::compare(&rule("High", "Q1"), &rule("High", "Q2"), keys);

        let plain = ChangeAnalyzer::summarize("r", &diff);
        let detailed = ChangeAnalyzer::summarize_detailed("r", &diff);

        assert!(plain.contains("  Current: Q1\n  New:     Q2"));
        assert!(detailed.contains("  --- Current Query\n  +++ Template Query"));
        assert!(detailed.contains("  -Q1\n  +Q2"));
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("query_frequency"), "Query Frequency");
        assert_eq!(title_case("severity"), "Severity");
    }
}
