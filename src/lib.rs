// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Test code may unwrap, and generated mocks carry no docs
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, missing_docs))]

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # hubdrift
//!
//! Drift detection and controlled update deployment for security-platform
//! content hub resources.
//!
//! ## Overview
//!
//! A workspace accumulates solutions, detection rules and data connectors
//! installed from a content hub. The hub keeps publishing newer templates.
//! hubdrift compares what is installed with what is published and lets an
//! operator deploy the differences:
//!
//! - Compare installed resources with catalog templates property by property
//! - Rate every difference by risk (query logic, classification, metadata)
//! - Review, approve and deploy updates individually or as a batch
//! - Export detected updates and deployment results as CSV, JSON and text
//!
//! ## Architecture
//!
//! 1. **Inventory**: what is installed, from a snapshot file or the hub API
//! 2. **Catalog**: what the hub publishes
//! 3. **Workflow**: detects, asks, deploys and reports
//!
//! ## Modules
//!
//! - [`config`]: Configuration parsing and validation
//! - [`model`]: Resources, templates, differences and results
//! - [`analysis`]: Comparison, version ordering and risk analysis
//! - [`gateway`]: Inventory, catalog and deployment backends
//! - [`export`]: CSV, JSON and text report files
//! - [`workflow`]: The update workflow
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```yaml
//! workspace:
//!   subscription_id: 00000000-0000-0000-0000-000000000000
//!   resource_group: rg-security
//!   workspace_name: soc-workspace
//!
//! source:
//!   backend: snapshot
//!   path: snapshot.yaml
//!
//! deployment:
//!   dry_run: true
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod gateway;
pub mod model;
pub mod workflow;

// ============================================================================
// Re-exports
// ============================================================================

pub use analysis::{ChangeAnalyzer, ResourceComparator, TemplateHasher, VersionComparator};
pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{ConfigParser, ConfigValidator, HubDriftConfig};
pub use error::{HubDriftError, Result};
pub use export::{CsvReportExporter, ReportExporter};
pub use gateway::{CatalogGateway, Deployer, DryRunDeployer, HubClient, InventoryGateway, SnapshotGateway};
pub use model::{DeploymentResult, DetectedUpdate, DetectedUpdates, Difference, ResourceKind, RiskLevel};
pub use workflow::{ApprovalPolicy, DeploymentReport, Prompt, UpdateWorkflow};
