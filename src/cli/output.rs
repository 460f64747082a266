//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying
//! information to the user in various formats.

use colored::Colorize;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::PathBuf;
use tabled::{Table, Tabled};

use crate::analysis::{InventoryAudit, TemplateHasher, is_enabled, severity_of};
use crate::model::{
    DeploymentResult, DetectedUpdate, DetectedUpdates, InstalledResource, PropertyValue,
    ResourceKind, RiskLevel,
};
use crate::workflow::DeploymentReport;

use super::commands::OutputFormat;

const RULE_WIDTH: usize = 80;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Solution update row for table display.
#[derive(Tabled)]
struct SolutionRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Solution Name")]
    name: String,
    #[tabled(rename = "Current Version")]
    current: String,
    #[tabled(rename = "Available Version")]
    available: String,
    #[tabled(rename = "Publisher")]
    publisher: String,
}

/// Rule update row for table display.
#[derive(Tabled)]
struct RuleRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Rule Name")]
    name: String,
    #[tabled(rename = "Current Severity")]
    current_severity: String,
    #[tabled(rename = "Template Severity")]
    template_severity: String,
    #[tabled(rename = "Update Type")]
    update_type: String,
    #[tabled(rename = "Risk")]
    risk: String,
}

/// Connector update row for table display.
#[derive(Tabled)]
struct ConnectorRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Connector Name")]
    name: String,
    #[tabled(rename = "Changed")]
    changed: String,
    #[tabled(rename = "Risk")]
    risk: String,
}

/// Installed rule row for audit display.
#[derive(Tabled)]
struct InstalledRuleRow {
    #[tabled(rename = "Display Name")]
    name: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Tactics")]
    tactics: String,
}

/// Installed connector row for audit display.
#[derive(Tabled)]
struct InstalledConnectorRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Status")]
    status: String,
}

/// Installed solution row for audit display.
#[derive(Tabled)]
struct InstalledSolutionRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Version")]
    version: String,
}

/// Deployment result row for table display.
#[derive(Tabled)]
struct ResultRow {
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Item")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Message")]
    message: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Selected format.
    #[must_use]
    pub const fn format(&self) -> OutputFormat {
        self.format
    }

    /// Formats detected updates: one table per kind, then a risk summary.
    #[must_use]
    pub fn format_detected_updates(&self, detected: &DetectedUpdates) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(detected).unwrap_or_default(),
            OutputFormat::Text => Self::format_detected_text(detected),
        }
    }

    fn format_detected_text(detected: &DetectedUpdates) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        let mut output = format!("\n{rule}\n  DETECTED UPDATES\n{rule}\n\n");

        for kind in ResourceKind::ALL {
            let updates = detected.for_kind(kind);
            let heading = Self::heading(kind);

            if updates.is_empty() {
                let _ = writeln!(output, "{heading}: No updates available\n");
                continue;
            }

            let _ = writeln!(output, "{heading} UPDATES AVAILABLE:");
            let _ = writeln!(output, "{}", "-".repeat(RULE_WIDTH));
            output.push_str(&Self::table_for(kind, updates));
            let _ = writeln!(output, "\n\nTotal {} updates: {}\n", kind, updates.len());
        }

        if detected.is_empty() {
            let _ = writeln!(output, "{} Everything is up to date.", "✓".green());
        } else {
            let counts = detected.risk_counts();
            let _ = writeln!(
                output,
                "{} update(s): {} high, {} medium, {} low risk",
                detected.total(),
                counts[0].1.to_string().red(),
                counts[1].1.to_string().yellow(),
                counts[2].1.to_string().green()
            );
        }

        output
    }

    fn heading(kind: ResourceKind) -> &'static str {
        match kind {
            ResourceKind::Solution => "📦 SOLUTIONS",
            ResourceKind::Rule => "📋 ANALYTIC RULES",
            ResourceKind::Connector => "🔌 DATA CONNECTORS",
        }
    }

    fn table_for(kind: ResourceKind, updates: &[DetectedUpdate]) -> String {
        match kind {
            ResourceKind::Solution => Table::new(updates.iter().enumerate().map(|(i, u)| SolutionRow {
                index: i,
                name: Self::truncate(u.name(), 40),
                current: u.current_version().to_string(),
                available: u.template.version.clone(),
                publisher: u.template.publisher.clone(),
            }))
            .to_string(),
            ResourceKind::Rule => Table::new(updates.iter().enumerate().map(|(i, u)| RuleRow {
                index: i,
                name: Self::truncate(u.name(), 40),
                current_severity: Self::changed_side(u, "severity", true),
                template_severity: Self::changed_side(u, "severity", false),
                update_type: Self::truncate(&Self::changed_list(u), 40),
                risk: Self::format_risk(u.risk),
            }))
            .to_string(),
            ResourceKind::Connector => Table::new(updates.iter().enumerate().map(|(i, u)| ConnectorRow {
                index: i,
                name: Self::truncate(u.name(), 40),
                changed: Self::truncate(&Self::changed_list(u), 40),
                risk: Self::format_risk(u.risk),
            }))
            .to_string(),
        }
    }

    /// Formats one update with its change summary.
    #[must_use]
    pub fn format_update_details(&self, update: &DetectedUpdate, summary: &str) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(update).unwrap_or_default(),
            OutputFormat::Text => {
                let mut output = String::new();
                let _ = writeln!(output, "\n{} {}", update.kind.as_str().to_uppercase().bold(), update.name());
                let _ = writeln!(output, "   Installed id: {}", update.installed.id);
                let _ = writeln!(output, "   Template id: {}", update.template.id);
                let _ = writeln!(
                    output,
                    "   Version: {} -> {}",
                    update.current_version(),
                    if update.template.version.is_empty() { "-" } else { update.template.version.as_str() }
                );
                let _ = writeln!(
                    output,
                    "   Fingerprint: {}\n",
                    TemplateHasher::new().short_hash(&update.template_fingerprint)
                );
                output.push_str(summary);
                output.push('\n');
                output
            }
        }
    }

    /// Formats per-item deployment results.
    #[must_use]
    pub fn format_deployment_results(&self, results: &[DeploymentResult]) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(results).unwrap_or_default(),
            OutputFormat::Text => {
                if results.is_empty() {
                    return String::from("No updates were deployed.\n");
                }
                let rows: Vec<ResultRow> = results
                    .iter()
                    .map(|r| ResultRow {
                        kind: r.kind.to_string(),
                        name: Self::truncate(&r.target_name, 40),
                        status: if r.success {
                            "✓ success".green().to_string()
                        } else {
                            "✗ failed".red().to_string()
                        },
                        message: Self::truncate(&r.message, 50),
                    })
                    .collect();
                let mut output = Table::new(rows).to_string();
                output.push('\n');
                output
            }
        }
    }

    /// Formats a deployment report.
    #[must_use]
    pub fn format_report(&self, report: &DeploymentReport) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(report).unwrap_or_default(),
            OutputFormat::Text => {
                let mut output = format!("\n{}\n", report.text);
                let status = if report.all_succeeded() {
                    format!("{} All {} update(s) deployed", "✓".green(), report.total)
                } else {
                    format!("{} {} of {} update(s) failed", "✗".red(), report.failed, report.total)
                };
                let _ = writeln!(output, "\n{status}");
                output
            }
        }
    }

    /// Formats an inventory audit: the installed table, then status and
    /// severity counts for rules.
    #[must_use]
    pub fn format_inventory(&self, audit: &InventoryAudit) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(audit).unwrap_or_default(),
            OutputFormat::Text => Self::format_inventory_text(audit),
        }
    }

    fn format_inventory_text(audit: &InventoryAudit) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        let noun = Self::noun(audit.kind);
        let mut output = format!("\n{rule}\n  {} AUDIT\n{rule}\n\n", Self::heading(audit.kind));

        if audit.is_empty() {
            let _ = writeln!(output, "No {noun} found.");
            return output;
        }

        output.push_str(&Self::inventory_table(audit.kind, &audit.resources));
        let _ = writeln!(output, "\n\nTotal {noun}: {}", audit.total());

        if audit.kind == ResourceKind::Rule {
            let _ = writeln!(output, "  - Enabled: {}", audit.enabled.to_string().green());
            let _ = writeln!(output, "  - Disabled: {}", audit.disabled.to_string().yellow());
            let _ = writeln!(output, "\nRules by severity:");
            for (severity, count) in &audit.by_severity {
                let _ = writeln!(output, "  - {severity}: {count}");
            }
        }

        output
    }

    fn inventory_table(kind: ResourceKind, resources: &[InstalledResource]) -> String {
        let status = |r: &InstalledResource| {
            String::from(if is_enabled(r) { "Enabled" } else { "Disabled" })
        };
        let property = |r: &InstalledResource, key: &str| {
            r.properties
                .get(key)
                .filter(|v| !v.is_null())
                .map_or_else(|| String::from("N/A"), PropertyValue::to_string)
        };

        match kind {
            ResourceKind::Solution => Table::new(resources.iter().map(|r| InstalledSolutionRow {
                name: Self::truncate(r.match_name(), 50),
                version: r.version.clone().unwrap_or_else(|| String::from("N/A")),
            }))
            .to_string(),
            ResourceKind::Rule => Table::new(resources.iter().map(|r| InstalledRuleRow {
                name: Self::truncate(r.match_name(), 50),
                severity: severity_of(r).to_string(),
                status: status(r),
                tactics: Self::truncate(&property(r, "tactics"), 40),
            }))
            .to_string(),
            ResourceKind::Connector => Table::new(resources.iter().map(|r| InstalledConnectorRow {
                name: Self::truncate(r.match_name(), 50),
                kind: property(r, "connector_kind"),
                status: status(r),
            }))
            .to_string(),
        }
    }

    fn noun(kind: ResourceKind) -> &'static str {
        match kind {
            ResourceKind::Solution => "solutions",
            ResourceKind::Rule => "analytic rules",
            ResourceKind::Connector => "data connectors",
        }
    }

    /// Formats the files written by an export.
    #[must_use]
    pub fn format_exported(&self, files: &BTreeMap<ResourceKind, PathBuf>) -> String {
        match self.format {
            OutputFormat::Json => {
                let map: BTreeMap<&str, String> = files
                    .iter()
                    .map(|(kind, path)| (kind.plural(), path.display().to_string()))
                    .collect();
                serde_json::to_string_pretty(&map).unwrap_or_default()
            }
            OutputFormat::Text => {
                if files.is_empty() {
                    return String::from("No files exported.\n");
                }
                let mut output = String::from("Exported:\n");
                for (kind, path) in files {
                    let _ = writeln!(output, "   {}: {}", kind.plural(), path.display());
                }
                output
            }
        }
    }

    /// Formats a risk level with color.
    fn format_risk(risk: RiskLevel) -> String {
        match risk {
            RiskLevel::High => "High".red().to_string(),
            RiskLevel::Medium => "Medium".yellow().to_string(),
            RiskLevel::Low => "Low".green().to_string(),
            RiskLevel::None => "None".dimmed().to_string(),
        }
    }

    /// Value of a changed property on one side, `N/A` when it did not change.
    fn changed_side(update: &DetectedUpdate, property: &str, current: bool) -> String {
        update
            .difference
            .change(property)
            .map(|c| if current { &c.current_value } else { &c.template_value })
            .filter(|v| !v.is_null())
            .map_or_else(|| String::from("N/A"), ToString::to_string)
    }

    fn changed_list(update: &DetectedUpdate) -> String {
        update.difference.changed_properties().collect::<Vec<_>>().join(", ")
    }

    /// Truncates a string to a maximum number of characters.
    fn truncate(s: &str, max_len: usize) -> String {
        if s.chars().count() <= max_len {
            s.to_string()
        } else {
            let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
            format!("{kept}...")
        }
    }

    /// Prints a success message.
    pub fn success(&self, message: &str) {
        self.status_line("success", &"✓".green().to_string(), message);
    }

    /// Prints an error message.
    pub fn error(&self, message: &str) {
        self.status_line("error", &"✗".red().to_string(), message);
    }

    /// Prints a warning message.
    pub fn warning(&self, message: &str) {
        self.status_line("warning", &"⚠".yellow().to_string(), message);
    }

    fn status_line(&self, status: &str, marker: &str, message: &str) {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::json!({ "status": status, "message": message });
                eprintln!("{json}");
            }
            OutputFormat::Text => eprintln!("{marker} {message}"),
        }
    }
}
