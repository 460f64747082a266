//! Capability interfaces the update workflow consumes.
//!
//! The workflow only talks to these traits; snapshot files, the content-hub
//! HTTP service and dry-run deployment are interchangeable behind them.

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::model::{DeployOutcome, InstalledRef, InstalledResource, ResourceKind, Template};

/// Result type for gateway calls.
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Source of resources currently configured on the audited platform.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InventoryGateway: Send + Sync {
    /// Lists installed resources of one kind.
    async fn list_installed(&self, kind: ResourceKind) -> GatewayResult<Vec<InstalledResource>>;
}

/// Source of published templates (the content hub).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    /// Lists the solutions installed from the catalog.
    async fn list_installed_solutions(&self) -> GatewayResult<Vec<InstalledResource>>;

    /// Lists available templates of one kind.
    async fn list_templates(&self, kind: ResourceKind) -> GatewayResult<Vec<Template>>;

    /// Fetches the full content of one template.
    ///
    /// Returns `None` if the catalog no longer has it.
    async fn get_template_content(&self, template_id: &str) -> GatewayResult<Option<Template>>;
}

/// Applies one accepted change to the platform.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Deployer: Send + Sync {
    /// Deploys `payload` over `target`.
    ///
    /// Never fails: every failure is reported as an unsuccessful outcome.
    async fn deploy(
        &self,
        kind: ResourceKind,
        target: &InstalledRef,
        payload: &Template,
    ) -> DeployOutcome;

    /// Short name for logs and reports.
    fn name(&self) -> &'static str;
}
