//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::model::{ResourceKind, RiskLevel};

/// Hubdrift - content hub drift detection and update deployment.
#[derive(Parser, Debug)]
#[command(name = "hubdrift")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, global = true, env = "HUBDRIFT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a starter hubdrift.yaml.
    Init {
        /// Directory to initialize (defaults to current directory).
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Force overwrite existing files.
        #[arg(short, long)]
        force: bool,
    },

    /// Validate the configuration.
    Validate {
        /// Show all warnings, not just errors.
        #[arg(short, long)]
        warnings: bool,
    },

    /// List installed resources with status and severity counts.
    Audit {
        /// Only audit this kind (solution, rule, connector).
        #[arg(short, long)]
        kind: Option<ResourceKind>,

        /// Export the inventory as CSV.
        #[arg(short, long)]
        export: bool,

        /// Output directory for the export (defaults to the configured one).
        #[arg(short, long, requires = "export")]
        dir: Option<PathBuf>,
    },

    /// Detect available updates.
    Detect {
        /// Show a per-update change summary.
        #[arg(short, long)]
        detailed: bool,

        /// Export detected updates as CSV.
        #[arg(short, long)]
        export: bool,
    },

    /// Show the changes behind one detected update.
    Show {
        /// Resource kind (solution, rule, connector).
        kind: ResourceKind,

        /// Zero-based position in the detected list.
        index: usize,
    },

    /// Deploy every detected update.
    Deploy {
        /// Skip confirmation prompt.
        #[arg(short, long)]
        yes: bool,

        /// Highest risk deployed without confirmation (low, medium, high).
        #[arg(long)]
        max_risk: Option<RiskLevel>,

        /// Do not export deployment results as CSV.
        #[arg(long)]
        no_csv: bool,
    },

    /// Approve and deploy updates one at a time.
    Review,

    /// Export detected updates without deploying.
    Export {
        /// Output directory (defaults to the configured one).
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Also write a JSON comparison report.
        #[arg(long)]
        json: bool,
    },
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
