//! Inventory, catalog and deployment collaborators.
//!
//! This module provides:
//! - The capability traits the update workflow depends on
//! - A snapshot-file gateway for offline audits
//! - An HTTP client for a content-hub service
//! - A dry-run deployer

mod client;
mod dry_run;
mod snapshot;
mod traits;

pub use client::HubClient;
pub use dry_run::DryRunDeployer;
pub use snapshot::{Snapshot, SnapshotFormat, SnapshotGateway};
pub use traits::{CatalogGateway, Deployer, GatewayResult, InventoryGateway};

#[cfg(test)]
pub use traits::{MockCatalogGateway, MockDeployer, MockInventoryGateway};
