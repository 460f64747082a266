//! Update detection and deployment workflow.
//!
//! This module implements the orchestrator that compares installed
//! resources with catalog templates, collects operator approval and drives
//! the deployer. Every public operation returns a value: gateway, export
//! and deployment failures are logged and folded into the result instead
//! of being raised.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::analysis::{
    ChangeAnalyzer, InventoryAudit, ResourceComparator, TemplateHasher, VersionComparator,
};
use crate::cli::OutputFormatter;
use crate::error::{DeploymentError, GatewayError};
use crate::export::ReportExporter;
use crate::gateway::{CatalogGateway, Deployer, InventoryGateway};
use crate::model::{
    DeploymentResult, DetectedUpdate, DetectedUpdates, InstalledResource, ResourceKind, Template,
};

use super::prompt::{ApprovalPolicy, Prompt, StdinPrompt};
use super::report::DeploymentReport;

/// Message recorded when the catalog no longer serves a template.
pub const TEMPLATE_UNAVAILABLE: &str = "Could not retrieve template content";

/// Where the workflow is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowState {
    /// Nothing detected yet, or the operator declined deployment.
    Idle,
    /// Querying gateways.
    Detecting,
    /// Candidates are available.
    Detected,
    /// Asking the operator item by item.
    Reviewing,
    /// Applying approved updates.
    Deploying,
    /// A deployment report was produced.
    Reported,
}

impl std::fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Detecting => "detecting",
            Self::Detected => "detected",
            Self::Reviewing => "reviewing",
            Self::Deploying => "deploying",
            Self::Reported => "reported",
        };
        write!(f, "{s}")
    }
}

/// Orchestrates detection, approval, deployment and reporting.
pub struct UpdateWorkflow {
    /// Installed rules and connectors.
    inventory: Arc<dyn InventoryGateway>,
    /// Installed solutions and templates.
    catalog: Arc<dyn CatalogGateway>,
    /// Applies accepted changes.
    deployer: Arc<dyn Deployer>,
    /// Persists exports and reports.
    exporter: Arc<dyn ReportExporter>,
    /// Operator decisions.
    prompt: Box<dyn Prompt>,
    /// Automatic approval limits.
    policy: ApprovalPolicy,
    /// Template fingerprinting.
    hasher: TemplateHasher,
    /// Current state.
    state: WorkflowState,
    /// Candidates from the last detection pass.
    detected: DetectedUpdates,
}

impl std::fmt::Debug for UpdateWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateWorkflow")
            .field("deployer", &self.deployer.name())
            .field("policy", &self.policy)
            .field("state", &self.state)
            .field("detected", &self.detected.total())
            .finish_non_exhaustive()
    }
}

impl UpdateWorkflow {
    /// Creates a workflow that asks for approval on stdin.
    #[must_use]
    pub fn new(
        inventory: Arc<dyn InventoryGateway>,
        catalog: Arc<dyn CatalogGateway>,
        deployer: Arc<dyn Deployer>,
        exporter: Arc<dyn ReportExporter>,
    ) -> Self {
        Self {
            inventory,
            catalog,
            deployer,
            exporter,
            prompt: Box::new(StdinPrompt),
            policy: ApprovalPolicy::default(),
            hasher: TemplateHasher::new(),
            state: WorkflowState::Idle,
            detected: DetectedUpdates::default(),
        }
    }

    /// Replaces the approval prompt.
    #[must_use]
    pub fn with_prompt(mut self, prompt: Box<dyn Prompt>) -> Self {
        self.prompt = prompt;
        self
    }

    /// Sets the automatic approval policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: ApprovalPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> WorkflowState {
        self.state
    }

    /// Candidates from the last detection pass.
    #[must_use]
    pub const fn detected(&self) -> &DetectedUpdates {
        &self.detected
    }

    /// Detects candidate updates for every kind.
    ///
    /// A gateway failure for one kind is logged and leaves that kind empty;
    /// the other kinds are still detected.
    pub async fn detect_all_updates(&mut self) -> &DetectedUpdates {
        self.state = WorkflowState::Detecting;
        info!("Detecting updates");

        let mut detected = DetectedUpdates::default();

        for kind in ResourceKind::ALL {
            let updates = match self.detect_kind(kind).await {
                Ok(updates) => {
                    info!("Found {} {} updates", updates.len(), kind);
                    updates
                }
                Err(e) => {
                    error!("Error detecting {} updates: {e}", kind);
                    Vec::new()
                }
            };
            detected.set(kind, updates);
        }

        info!("Detected {} updates", detected.total());
        self.detected = detected;
        self.state = WorkflowState::Detected;
        &self.detected
    }

    /// Installed resources of one kind. Solutions come from the catalog.
    async fn list_installed(&self, kind: ResourceKind) -> Result<Vec<InstalledResource>, GatewayError> {
        match kind {
            ResourceKind::Solution => self.catalog.list_installed_solutions().await,
            _ => self.inventory.list_installed(kind).await,
        }
    }

    /// Audits what is installed for one kind.
    ///
    /// Does not touch detected updates or the workflow state.
    ///
    /// # Errors
    ///
    /// Returns the gateway error if the inventory cannot be listed.
    pub async fn audit_inventory(&self, kind: ResourceKind) -> Result<InventoryAudit, GatewayError> {
        let resources = self.list_installed(kind).await?;
        let audit = InventoryAudit::from_resources(kind, resources);
        info!(
            "Audited {} installed {} ({} enabled, {} disabled)",
            audit.total(),
            kind.plural(),
            audit.enabled,
            audit.disabled
        );
        Ok(audit)
    }

    /// Exports an inventory audit into `output_dir`.
    ///
    /// Returns `None` if the export fails.
    pub async fn export_inventory(&self, audit: &InventoryAudit, output_dir: &Path) -> Option<PathBuf> {
        match self.exporter.export_inventory(audit, output_dir).await {
            Ok(path) => Some(path),
            Err(e) => {
                error!("Error exporting {} inventory: {e}", audit.kind);
                None
            }
        }
    }

    /// Detects candidates for one kind.
    async fn detect_kind(&self, kind: ResourceKind) -> Result<Vec<DetectedUpdate>, GatewayError> {
        let installed = self.list_installed(kind).await?;
        let templates = self.catalog.list_templates(kind).await?;

        debug!(
            "Comparing {} installed {} against {} templates",
            installed.len(),
            kind.plural(),
            templates.len()
        );

        // Exact display-name match; the first template with a name wins.
        let mut by_name: HashMap<&str, &Template> = HashMap::with_capacity(templates.len());
        for template in &templates {
            by_name.entry(template.display_name.as_str()).or_insert(template);
        }

        let mut updates = Vec::new();

        for resource in &installed {
            let Some(template) = by_name.get(resource.match_name()) else {
                debug!("No template for {} '{}'", kind, resource.match_name());
                continue;
            };

            if kind == ResourceKind::Solution {
                let current = resource.version.as_deref().unwrap_or_default();
                if !VersionComparator::is_newer(current, &template.version) {
                    debug!(
                        "Solution '{}' is current ({} vs {})",
                        resource.match_name(),
                        current,
                        template.version
                    );
                    continue;
                }
            }

            let difference = ResourceComparator::compare(
                &resource.property_view(),
                &template.property_view(),
                kind.comparable_keys(),
            );

            if !difference.has_changes {
                continue;
            }

            let risk = ChangeAnalyzer::assess_risk(&difference);
            debug!("{} '{}' drifted ({risk} risk)", kind, resource.match_name());

            updates.push(DetectedUpdate {
                kind,
                installed: resource.to_ref(),
                template: template.to_ref(),
                difference,
                risk,
                template_fingerprint: self.hasher.hash_template(template),
            });
        }

        Ok(updates)
    }

    /// Renders the detected updates.
    #[must_use]
    pub fn display_detected_updates(&self, formatter: &OutputFormatter) -> String {
        formatter.format_detected_updates(&self.detected)
    }

    /// Exports detected updates into `output_dir`.
    ///
    /// Returns an empty map if the export fails.
    pub async fn export_updates_to_csv(&self, output_dir: &Path) -> BTreeMap<ResourceKind, PathBuf> {
        match self.exporter.export_updates(&self.detected, output_dir).await {
            Ok(files) => files,
            Err(e) => {
                error!("Error exporting updates: {e}");
                BTreeMap::new()
            }
        }
    }

    /// Looks up one detected update.
    ///
    /// Logs an error and returns `None` for an out-of-range index.
    #[must_use]
    pub fn show_update_details(&self, kind: ResourceKind, index: usize) -> Option<&DetectedUpdate> {
        let update = self.detected.get(kind, index);
        if update.is_none() {
            error!("{}", DeploymentError::InvalidIndex {
                kind: kind.to_string(),
                index,
            });
        }
        update
    }

    /// Review summary for one detected update.
    #[must_use]
    pub fn update_summary(&self, kind: ResourceKind, index: usize, detailed: bool) -> Option<String> {
        self.show_update_details(kind, index).map(|update| {
            if detailed {
                ChangeAnalyzer::summarize_detailed(update.name(), &update.difference)
            } else {
                ChangeAnalyzer::summarize(update.name(), &update.difference)
            }
        })
    }

    /// Detailed summaries, query diffs included, for every detected update
    /// in kind order.
    #[must_use]
    pub fn detailed_summaries(&self) -> Vec<(ResourceKind, usize, String)> {
        ResourceKind::ALL
            .into_iter()
            .flat_map(|kind| {
                self.detected
                    .for_kind(kind)
                    .iter()
                    .enumerate()
                    .map(move |(index, update)| {
                        let summary =
                            ChangeAnalyzer::summarize_detailed(update.name(), &update.difference);
                        (kind, index, summary)
                    })
            })
            .collect()
    }

    /// Deploys exactly one detected update.
    ///
    /// An invalid index yields a failed result.
    pub async fn approve_and_deploy_update(&mut self, kind: ResourceKind, index: usize) -> DeploymentResult {
        let Some(update) = self.detected.get(kind, index).cloned() else {
            let err = DeploymentError::InvalidIndex {
                kind: kind.to_string(),
                index,
            };
            error!("{err}");
            return DeploymentResult::failed(kind, format!("{kind} #{index}"), err.to_string());
        };

        self.state = WorkflowState::Deploying;
        warn!("Deploying update: {}", update.name());
        self.deploy_one(&update).await
    }

    /// Deploys every detected update in kind order.
    ///
    /// Without `auto_approve` a single confirmation gates the whole batch.
    /// Individual failures do not stop the remaining deployments.
    pub async fn deploy_all_updates(&mut self, auto_approve: bool) -> Vec<DeploymentResult> {
        let total = self.detected.total();

        if total == 0 {
            info!("No updates to deploy");
            return Vec::new();
        }

        info!("Preparing to deploy {total} update(s)");

        if !auto_approve {
            let question = format!("Do you want to proceed with deploying all {total} update(s)?");
            if !self.prompt.confirm(&question).is_approved() {
                info!("Deployment cancelled by user");
                self.state = WorkflowState::Idle;
                return Vec::new();
            }
        }

        self.state = WorkflowState::Deploying;

        let updates: Vec<DetectedUpdate> = self.detected.iter().cloned().collect();
        let mut results = Vec::with_capacity(total);

        for (i, update) in updates.iter().enumerate() {
            info!("[{}/{total}] Deploying {}: {}", i + 1, update.kind, update.name());

            if auto_approve && !self.policy.permits(update.risk) {
                warn!("Skipping {} '{}': {} risk exceeds limit", update.kind, update.name(), update.risk);
                results.push(DeploymentResult::failed(
                    update.kind,
                    update.name(),
                    format!(
                        "Skipped: {} risk exceeds the automatic approval limit",
                        update.risk
                    ),
                ));
                continue;
            }

            results.push(self.deploy_one(update).await);
        }

        results
    }

    /// Asks about each update in turn and deploys the approved ones.
    pub async fn review_updates(&mut self) -> Vec<DeploymentResult> {
        let updates: Vec<DetectedUpdate> = self.detected.iter().cloned().collect();
        if updates.is_empty() {
            info!("No updates to review");
            return Vec::new();
        }

        self.state = WorkflowState::Reviewing;
        let mut approved = Vec::new();

        for update in &updates {
            self.prompt
                .notify(&ChangeAnalyzer::summarize(update.name(), &update.difference));

            let question = format!("Deploy {} update for '{}'?", update.kind, update.name());
            if self.prompt.confirm(&question).is_approved() {
                approved.push(update);
            } else {
                debug!("Skipped {} '{}'", update.kind, update.name());
            }
        }

        if approved.is_empty() {
            info!("No updates approved");
            self.state = WorkflowState::Idle;
            return Vec::new();
        }

        self.state = WorkflowState::Deploying;
        let mut results = Vec::with_capacity(approved.len());
        for update in approved {
            results.push(self.deploy_one(update).await);
        }
        results
    }

    /// Fetches the template and hands it to the deployer.
    async fn deploy_one(&self, update: &DetectedUpdate) -> DeploymentResult {
        let template = match self.catalog.get_template_content(&update.template.id).await {
            Ok(Some(template)) => template,
            Ok(None) => {
                warn!(
                    "{}",
                    DeploymentError::TemplateUnavailable {
                        template_id: update.template.id.clone(),
                    }
                );
                return DeploymentResult::failed(update.kind, update.name(), TEMPLATE_UNAVAILABLE);
            }
            Err(e) => {
                error!("Error fetching template {}: {e}", update.template.id);
                return DeploymentResult::failed(update.kind, update.name(), e.to_string());
            }
        };

        let outcome = self
            .deployer
            .deploy(update.kind, &update.installed, &template)
            .await;

        if !outcome.success {
            warn!(
                "{}",
                DeploymentError::Rejected {
                    target: update.name().to_string(),
                    message: outcome.message.clone(),
                }
            );
        }

        DeploymentResult::from_outcome(update.kind, update.name(), outcome)
    }

    /// Aggregates results into a report and persists it.
    ///
    /// Persistence failures are noted in the report text.
    pub async fn generate_deployment_report(
        &mut self,
        results: &[DeploymentResult],
        export_csv: bool,
    ) -> DeploymentReport {
        let mut report = DeploymentReport::new(results);

        info!(
            "Deployment finished: {} successful, {} failed",
            report.successful, report.failed
        );

        match self.exporter.persist_report(&report.text).await {
            Ok(path) => report.append_line(&format!("\nText report saved to: {}", path.display())),
            Err(e) => {
                error!("Error saving report: {e}");
                report.append_line(&format!("\nText report could not be saved: {e}"));
            }
        }

        if export_csv && !results.is_empty() {
            match self.exporter.export_deployment_results(results).await {
                Ok(path) => report.append_line(&format!("CSV report saved to: {}", path.display())),
                Err(e) => {
                    error!("Error exporting deployment results: {e}");
                    report.append_line(&format!("CSV report could not be saved: {e}"));
                }
            }
        }

        self.state = WorkflowState::Reported;
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExportError;
    use crate::export::MockReportExporter;
    use crate::gateway::{MockCatalogGateway, MockDeployer, MockInventoryGateway};
    use crate::model::{DeployOutcome, RiskLevel};
    use crate::workflow::prompt::{Approval, AutoApprove};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts questions and answers with a fixed approval.
    struct CountingPrompt {
        answer: Approval,
        asked: Arc<AtomicUsize>,
    }

    impl Prompt for CountingPrompt {
        fn confirm(&mut self, _question: &str) -> Approval {
            self.asked.fetch_add(1, Ordering::SeqCst);
            self.answer
        }
    }

    fn counting(answer: Approval) -> (Box<dyn Prompt>, Arc<AtomicUsize>) {
        let asked = Arc::new(AtomicUsize::new(0));
        (
            Box::new(CountingPrompt {
                answer,
                asked: Arc::clone(&asked),
            }),
            asked,
        )
    }

    fn installed_rule(name: &str, severity: &str, query: &str) -> InstalledResource {
        InstalledResource::new(ResourceKind::Rule, format!("id-{name}"), name)
            .with_display_name(name)
            .with_property("severity", severity)
            .with_property("query", query)
            .with_property("enabled", true)
    }

    fn rule_template(name: &str, severity: &str, query: &str) -> Template {
        Template::new(ResourceKind::Rule, format!("tmpl-{name}"), name)
            .with_version("1.0.0")
            .with_property("severity", severity)
            .with_property("query", query)
            .with_property("enabled", true)
    }

    fn solution(name: &str, version: &str) -> InstalledResource {
        InstalledResource::new(ResourceKind::Solution, format!("sol-{name}"), name)
            .with_display_name(name)
            .with_version(version)
    }

    fn solution_template(name: &str, version: &str) -> Template {
        Template::new(ResourceKind::Solution, format!("pkg-{name}"), name).with_version(version)
    }

    fn connector(name: &str) -> InstalledResource {
        InstalledResource::new(ResourceKind::Connector, format!("conn-{name}"), name)
            .with_property("connector_kind", "Syslog")
    }

    /// Catalog and inventory serving fixed data, with template lookups by id.
    fn gateways(
        solutions: Vec<InstalledResource>,
        rules: Vec<InstalledResource>,
        connectors: Vec<InstalledResource>,
        templates: Vec<Template>,
    ) -> (MockInventoryGateway, MockCatalogGateway) {
        let mut inventory = MockInventoryGateway::new();
        inventory.expect_list_installed().returning(move |kind| {
            Ok(match kind {
                ResourceKind::Rule => rules.clone(),
                ResourceKind::Connector => connectors.clone(),
                ResourceKind::Solution => Vec::new(),
            })
        });

        let mut catalog = MockCatalogGateway::new();
        catalog
            .expect_list_installed_solutions()
            .returning(move || Ok(solutions.clone()));

        let listed = templates.clone();
        catalog
            .expect_list_templates()
            .returning(move |kind| Ok(listed.iter().filter(|t| t.kind == kind).cloned().collect()));
        catalog
            .expect_get_template_content()
            .returning(move |id| Ok(templates.iter().find(|t| t.id == id).cloned()));

        (inventory, catalog)
    }

    fn succeeding_deployer() -> MockDeployer {
        let mut deployer = MockDeployer::new();
        deployer
            .expect_deploy()
            .returning(|kind, target, _| DeployOutcome::succeeded(format!("{kind} {} updated", target.name)));
        deployer.expect_name().return_const("mock");
        deployer
    }

    fn quiet_exporter() -> MockReportExporter {
        let mut exporter = MockReportExporter::new();
        exporter
            .expect_persist_report()
            .returning(|_| Ok(PathBuf::from("deployment_report_test.txt")));
        exporter
            .expect_export_deployment_results()
            .returning(|_| Ok(PathBuf::from("deployment_results_test.csv")));
        exporter
    }

    fn workflow(
        inventory: MockInventoryGateway,
        catalog: MockCatalogGateway,
        deployer: MockDeployer,
        exporter: MockReportExporter,
        prompt: Box<dyn Prompt>,
    ) -> UpdateWorkflow {
        UpdateWorkflow::new(
            Arc::new(inventory),
            Arc::new(catalog),
            Arc::new(deployer),
            Arc::new(exporter),
        )
        .with_prompt(prompt)
    }

    /// One solution, two rules and one connector with drift.
    fn populated(prompt: Box<dyn Prompt>, deployer: MockDeployer) -> UpdateWorkflow {
        let (inventory, catalog) = gateways(
            vec![solution("Azure Activity", "2.0.0")],
            vec![
                installed_rule("Brute force", "Medium", "Q1"),
                installed_rule("Rare logon", "Low", "Q1"),
            ],
            vec![connector("Syslog").with_display_name("Syslog")],
            vec![
                solution_template("Azure Activity", "2.0.1"),
                rule_template("Brute force", "High", "Q1"),
                rule_template("Rare logon", "Low", "Q2"),
                Template::new(ResourceKind::Connector, "tmpl-syslog", "Syslog")
                    .with_property("connector_kind", "SyslogAma"),
            ],
        );
        workflow(inventory, catalog, deployer, quiet_exporter(), prompt)
    }

    #[tokio::test]
    async fn test_detects_severity_drift() {
        let (inventory, catalog) = gateways(
            vec![],
            vec![installed_rule("Brute force", "Medium", "Q1")],
            vec![],
            vec![rule_template("Brute force", "High", "Q1")],
        );
        let (prompt, _) = counting(Approval::Declined);
        let mut wf = workflow(inventory, catalog, succeeding_deployer(), quiet_exporter(), prompt);

        let detected = wf.detect_all_updates().await;

        assert_eq!(detected.rules.len(), 1);
        let update = &detected.rules[0];
        assert_eq!(update.difference.changes.len(), 1);
        assert_eq!(update.difference.changes[0].property_name, "severity");
        assert_eq!(update.risk, RiskLevel::Medium);
        assert_eq!(update.template_fingerprint.len(), 64);
        assert_eq!(wf.state(), WorkflowState::Detected);
    }

    #[tokio::test]
    async fn test_query_change_is_high_risk() {
        let (inventory, catalog) = gateways(
            vec![],
            vec![installed_rule("Brute force", "Medium", "Q1")],
            vec![],
            vec![rule_template("Brute force", "High", "Q2")],
        );
        let (prompt, _) = counting(Approval::Declined);
        let mut wf = workflow(inventory, catalog, succeeding_deployer(), quiet_exporter(), prompt);

        let detected = wf.detect_all_updates().await;
        assert_eq!(detected.rules[0].risk, RiskLevel::High);
    }

    #[tokio::test]
    async fn test_unmatched_connector_yields_nothing() {
        let (inventory, catalog) = gateways(
            vec![],
            vec![],
            vec![connector("Custom feed")],
            vec![Template::new(ResourceKind::Connector, "tmpl-syslog", "Syslog")],
        );
        let (prompt, _) = counting(Approval::Declined);
        let mut wf = workflow(inventory, catalog, succeeding_deployer(), quiet_exporter(), prompt);

        assert!(wf.detect_all_updates().await.connectors.is_empty());
    }

    #[tokio::test]
    async fn test_unchanged_and_older_solutions_skipped() {
        let (inventory, catalog) = gateways(
            vec![solution("Azure Activity", "2.0.1"), solution("Okta", "3.1.0")],
            vec![installed_rule("Brute force", "High", "Q1")],
            vec![],
            vec![
                solution_template("Azure Activity", "2.0.1"),
                solution_template("Okta", "3.0.9"),
                rule_template("Brute force", "High", "Q1"),
            ],
        );
        let (prompt, _) = counting(Approval::Declined);
        let mut wf = workflow(inventory, catalog, succeeding_deployer(), quiet_exporter(), prompt);

        assert!(wf.detect_all_updates().await.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_template_names_first_wins() {
        let (inventory, catalog) = gateways(
            vec![],
            vec![installed_rule("Brute force", "Medium", "Q1")],
            vec![],
            vec![
                rule_template("Brute force", "Medium", "Q1"),
                Template::new(ResourceKind::Rule, "tmpl-dup", "Brute force").with_property("severity", "High"),
            ],
        );
        let (prompt, _) = counting(Approval::Declined);
        let mut wf = workflow(inventory, catalog, succeeding_deployer(), quiet_exporter(), prompt);

        assert!(wf.detect_all_updates().await.rules.is_empty());
    }

    #[tokio::test]
    async fn test_gateway_failure_is_isolated_per_kind() {
        let mut inventory = MockInventoryGateway::new();
        inventory.expect_list_installed().returning(|kind| match kind {
            ResourceKind::Rule => Err(GatewayError::network("connection reset")),
            _ => Ok(vec![connector("Syslog").with_display_name("Syslog")]),
        });

        let mut catalog = MockCatalogGateway::new();
        catalog
            .expect_list_installed_solutions()
            .returning(|| Err(GatewayError::AuthenticationFailed {
                message: String::from("expired"),
            }));
        catalog.expect_list_templates().returning(|kind| {
            Ok(match kind {
                ResourceKind::Connector => vec![
                    Template::new(ResourceKind::Connector, "tmpl-syslog", "Syslog")
                        .with_property("connector_kind", "SyslogAma"),
                ],
                _ => Vec::new(),
            })
        });

        let (prompt, _) = counting(Approval::Declined);
        let mut wf = workflow(inventory, catalog, succeeding_deployer(), quiet_exporter(), prompt);

        let detected = wf.detect_all_updates().await;
        assert!(detected.solutions.is_empty());
        assert!(detected.rules.is_empty());
        assert_eq!(detected.connectors.len(), 1);
    }

    #[tokio::test]
    async fn test_zero_candidates_never_prompts() {
        let (inventory, catalog) = gateways(vec![], vec![], vec![], vec![]);
        let (prompt, asked) = counting(Approval::Approved);
        let mut wf = workflow(inventory, catalog, MockDeployer::new(), quiet_exporter(), prompt);

        wf.detect_all_updates().await;
        let results = wf.deploy_all_updates(false).await;

        assert!(results.is_empty());
        assert_eq!(asked.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_declined_batch_returns_empty() {
        let mut deployer = MockDeployer::new();
        deployer.expect_deploy().never();
        let (prompt, asked) = counting(Approval::Declined);
        let mut wf = populated(prompt, deployer);

        wf.detect_all_updates().await;
        let results = wf.deploy_all_updates(false).await;

        assert!(results.is_empty());
        assert_eq!(asked.load(Ordering::SeqCst), 1);
        assert_eq!(wf.state(), WorkflowState::Idle);
    }

    #[tokio::test]
    async fn test_accepted_batch_deploys_in_kind_order() {
        let (prompt, asked) = counting(Approval::Approved);
        let mut wf = populated(prompt, succeeding_deployer());

        let total = wf.detect_all_updates().await.total();
        let results = wf.deploy_all_updates(false).await;

        assert_eq!(total, 4);
        assert_eq!(asked.load(Ordering::SeqCst), 1);
        let order: Vec<(ResourceKind, &str)> = results
            .iter()
            .map(|r| (r.kind, r.target_name.as_str()))
            .collect();
        assert_eq!(
            order,
            [
                (ResourceKind::Solution, "Azure Activity"),
                (ResourceKind::Rule, "Brute force"),
                (ResourceKind::Rule, "Rare logon"),
                (ResourceKind::Connector, "Syslog"),
            ]
        );
        assert!(results.iter().all(|r| r.success));
        assert_eq!(wf.state(), WorkflowState::Deploying);
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_the_batch() {
        let mut deployer = MockDeployer::new();
        deployer.expect_deploy().returning(|kind, target, _| {
            if kind == ResourceKind::Rule && target.name == "Brute force" {
                DeployOutcome::failed("rule is locked")
            } else {
                DeployOutcome::succeeded("ok")
            }
        });
        deployer.expect_name().return_const("mock");

        let mut wf = populated(Box::new(AutoApprove), deployer);
        wf.detect_all_updates().await;
        let results = wf.deploy_all_updates(true).await;

        assert_eq!(results.len(), 4);
        assert_eq!(results.iter().filter(|r| !r.success).count(), 1);
        assert_eq!(results[1].message, "rule is locked");
        assert!(results[2].success);
    }

    #[tokio::test]
    async fn test_auto_approve_respects_risk_limit() {
        let (prompt, asked) = counting(Approval::Declined);
        let mut wf = populated(prompt, succeeding_deployer()).with_policy(ApprovalPolicy::up_to(RiskLevel::Medium));

        wf.detect_all_updates().await;
        let results = wf.deploy_all_updates(true).await;

        assert_eq!(asked.load(Ordering::SeqCst), 0);
        assert_eq!(results.len(), 4);
        let skipped: Vec<&str> = results
            .iter()
            .filter(|r| !r.success)
            .map(|r| r.target_name.as_str())
            .collect();
        assert_eq!(skipped, ["Rare logon"]);
    }

    #[tokio::test]
    async fn test_missing_template_content_fails_item() {
        let (inventory, _) = gateways(
            vec![],
            vec![installed_rule("Brute force", "Medium", "Q1")],
            vec![],
            vec![],
        );
        let mut catalog = MockCatalogGateway::new();
        catalog.expect_list_installed_solutions().returning(|| Ok(Vec::new()));
        catalog.expect_list_templates().returning(|kind| {
            Ok(if kind == ResourceKind::Rule {
                vec![rule_template("Brute force", "High", "Q1")]
            } else {
                Vec::new()
            })
        });
        catalog.expect_get_template_content().returning(|_| Ok(None));

        let mut deployer = MockDeployer::new();
        deployer.expect_deploy().never();

        let mut wf = workflow(inventory, catalog, deployer, quiet_exporter(), Box::new(AutoApprove));
        wf.detect_all_updates().await;
        let result = wf.approve_and_deploy_update(ResourceKind::Rule, 0).await;

        assert!(!result.success);
        assert_eq!(result.message, TEMPLATE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_invalid_index_is_failed_result() {
        let (prompt, _) = counting(Approval::Approved);
        let mut wf = populated(prompt, succeeding_deployer());
        wf.detect_all_updates().await;

        assert!(wf.show_update_details(ResourceKind::Rule, 7).is_none());
        let result = wf.approve_and_deploy_update(ResourceKind::Rule, 7).await;
        assert!(!result.success);
        assert!(result.message.contains("index 7"));
    }

    #[tokio::test]
    async fn test_review_deploys_only_approved() {
        let prompt = crate::workflow::ScriptedPrompt::new([
            Approval::Declined,
            Approval::Approved,
            Approval::Declined,
            Approval::Declined,
        ]);
        let mut wf = populated(Box::new(prompt), succeeding_deployer());
        wf.detect_all_updates().await;

        let results = wf.review_updates().await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].target_name, "Brute force");
    }

    #[tokio::test]
    async fn test_export_failure_returns_empty_map() {
        let (inventory, catalog) = gateways(vec![], vec![], vec![], vec![]);
        let mut exporter = MockReportExporter::new();
        exporter
            .expect_export_updates()
            .returning(|_, _| Err(ExportError::io("/readonly", "permission denied")));
        let (prompt, _) = counting(Approval::Declined);
        let wf = workflow(inventory, catalog, MockDeployer::new(), exporter, prompt);

        assert!(wf.export_updates_to_csv(Path::new("/readonly")).await.is_empty());
    }

    #[tokio::test]
    async fn test_report_notes_save_failure_inline() {
        let (inventory, catalog) = gateways(vec![], vec![], vec![], vec![]);
        let mut exporter = MockReportExporter::new();
        exporter
            .expect_persist_report()
            .returning(|_| Err(ExportError::io("/readonly/report.txt", "permission denied")));
        exporter.expect_export_deployment_results().never();
        let (prompt, _) = counting(Approval::Declined);
        let mut wf = workflow(inventory, catalog, MockDeployer::new(), exporter, prompt);

        let report = wf.generate_deployment_report(&[], true).await;

        assert!(report.text.contains("Text report could not be saved"));
        assert_eq!(wf.state(), WorkflowState::Reported);
    }

    #[tokio::test]
    async fn test_report_lists_saved_files() {
        let (prompt, _) = counting(Approval::Approved);
        let mut wf = populated(prompt, succeeding_deployer());
        wf.detect_all_updates().await;
        let results = wf.deploy_all_updates(false).await;

        let report = wf.generate_deployment_report(&results, true).await;

        assert_eq!(report.total, 4);
        assert!(report.text.contains("Text report saved to: deployment_report_test.txt"));
        assert!(report.text.ends_with("CSV report saved to: deployment_results_test.csv"));
    }

    #[tokio::test]
    async fn test_audit_inventory_counts_installed_rules() {
        let (inventory, catalog) = gateways(
            vec![solution("Azure Activity", "2.0.0")],
            vec![
                installed_rule("Brute force", "High", "Q1"),
                installed_rule("Rare logon", "Low", "Q1").with_property("enabled", false),
                installed_rule("Port scan", "High", "Q1"),
            ],
            vec![],
            vec![],
        );
        let (prompt, asked) = counting(Approval::Declined);
        let wf = workflow(inventory, catalog, MockDeployer::new(), quiet_exporter(), prompt);

        let rules = wf.audit_inventory(ResourceKind::Rule).await.expect("rules listed");
        assert_eq!(rules.total(), 3);
        assert_eq!((rules.enabled, rules.disabled), (2, 1));
        assert_eq!(rules.by_severity["High"], 2);
        assert_eq!(rules.by_severity["Low"], 1);

        let solutions = wf
            .audit_inventory(ResourceKind::Solution)
            .await
            .expect("solutions listed");
        assert_eq!(solutions.resources[0].match_name(), "Azure Activity");

        assert_eq!(wf.state(), WorkflowState::Idle);
        assert_eq!(asked.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_audit_inventory_propagates_gateway_failure() {
        let mut inventory = MockInventoryGateway::new();
        inventory
            .expect_list_installed()
            .returning(|_| Err(GatewayError::network("connection reset")));
        let (prompt, _) = counting(Approval::Declined);
        let wf = workflow(
            inventory,
            MockCatalogGateway::new(),
            MockDeployer::new(),
            MockReportExporter::new(),
            prompt,
        );

        let err = wf
            .audit_inventory(ResourceKind::Connector)
            .await
            .expect_err("inventory unavailable");
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_export_inventory_failure_is_none() {
        let (inventory, catalog) = gateways(vec![], vec![], vec![connector("Syslog")], vec![]);
        let mut exporter = MockReportExporter::new();
        exporter
            .expect_export_inventory()
            .returning(|_, _| Err(ExportError::io("/readonly", "permission denied")));
        let (prompt, _) = counting(Approval::Declined);
        let wf = workflow(inventory, catalog, MockDeployer::new(), exporter, prompt);

        let audit = wf
            .audit_inventory(ResourceKind::Connector)
            .await
            .expect("connectors listed");
        assert!(wf.export_inventory(&audit, Path::new("/readonly")).await.is_none());
    }

    #[tokio::test]
    async fn test_detailed_summaries_include_query_diff() {
        let (prompt, _) = counting(Approval::Declined);
        let mut wf = populated(prompt, MockDeployer::new());
        wf.detect_all_updates().await;

        let summaries = wf.detailed_summaries();

        let kinds: Vec<ResourceKind> = summaries.iter().map(|(kind, _, _)| *kind).collect();
        assert_eq!(
            kinds,
            [ResourceKind::Solution, ResourceKind::Rule, ResourceKind::Rule, ResourceKind::Connector]
        );
        let (_, index, rare_logon) = &summaries[2];
        assert_eq!(*index, 1);
        assert!(rare_logon.contains("--- Current Query"));
        assert!(rare_logon.contains("-Q1"));
        assert!(rare_logon.contains("+Q2"));
    }
}
