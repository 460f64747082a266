//! Deployer that applies nothing.

use async_trait::async_trait;
use tracing::info;

use crate::model::{DeployOutcome, InstalledRef, ResourceKind, Template};

use super::traits::Deployer;

/// Reports what would be deployed and always succeeds.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunDeployer;

impl DryRunDeployer {
    /// Creates a new dry-run deployer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Deployer for DryRunDeployer {
    async fn deploy(
        &self,
        kind: ResourceKind,
        target: &InstalledRef,
        payload: &Template,
    ) -> DeployOutcome {
        info!("[dry-run] {} {} <- template {}", kind, target.name, payload.id);

        let message = match kind {
            ResourceKind::Solution if !payload.version.is_empty() => format!(
                "Solution update for {} would be deployed ({} -> {})",
                target.name,
                target.version.as_deref().unwrap_or("-"),
                payload.version
            ),
            ResourceKind::Solution => format!("Solution update for {} would be deployed", target.name),
            ResourceKind::Rule => format!("Rule update for {} prepared for deployment", target.name),
            ResourceKind::Connector => {
                format!("Connector update for {} prepared for deployment", target.name)
            }
        };

        DeployOutcome::succeeded(message).with_note("Dry run: no changes were applied")
    }

    fn name(&self) -> &'static str {
        "dry-run"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dry_run_always_succeeds() {
        let target = InstalledRef {
            id: String::from("sol-1"),
            name: String::from("Azure Activity"),
            version: Some(String::from("2.0.0")),
        };
        let template = Template::new(ResourceKind::Solution, "pkg-1", "Azure Activity")
            .with_version("2.0.1");

        let outcome = DryRunDeployer::new()
            .deploy(ResourceKind::Solution, &target, &template)
            .await;

        assert!(outcome.success);
        assert_eq!(
            outcome.message,
            "Solution update for Azure Activity would be deployed (2.0.0 -> 2.0.1)"
        );
        assert_eq!(outcome.note.as_deref(), Some("Dry run: no changes were applied"));
    }
}
