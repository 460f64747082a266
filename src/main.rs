//! hubdrift CLI entrypoint.
//!
//! This is the main entrypoint for the hubdrift command-line tool.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use hubdrift::cli::{Cli, Commands, OutputFormat, OutputFormatter};
use hubdrift::config::{
    ConfigParser, ConfigValidator, HubDriftConfig, SourceBackend, find_config_file,
};
use hubdrift::error::{ConfigError, DeploymentError, HubDriftError, Result};
use hubdrift::export::{CsvReportExporter, export_comparison_report};
use hubdrift::gateway::{
    CatalogGateway, Deployer, DryRunDeployer, HubClient, InventoryGateway, SnapshotGateway,
};
use hubdrift::model::{DeploymentResult, ResourceKind, RiskLevel};
use hubdrift::workflow::{ApprovalPolicy, UpdateWorkflow};

use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse_args();

    // Initialize logging
    init_logging(cli.verbose, cli.log_json);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
fn init_logging(verbose: bool, json: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    let formatter = OutputFormatter::new(cli.output);
    let config_path = cli.config.as_ref();

    match cli.command {
        Commands::Init { path, force } => cmd_init(&path, force),
        Commands::Validate { warnings } => {
            cmd_validate(config_path, warnings, &formatter).await
        }
        Commands::Audit { kind, export, dir } => {
            cmd_audit(config_path, kind, export, dir, &formatter).await
        }
        Commands::Detect { detailed, export } => {
            cmd_detect(config_path, detailed, export, &formatter).await
        }
        Commands::Show { kind, index } => cmd_show(config_path, kind, index, &formatter).await,
        Commands::Deploy {
            yes,
            max_risk,
            no_csv,
        } => cmd_deploy(config_path, yes, max_risk, no_csv, &formatter).await,
        Commands::Review => cmd_review(config_path, &formatter).await,
        Commands::Export { dir, json } => cmd_export(config_path, dir, json, &formatter).await,
    }
}

/// Initialize a new configuration.
fn cmd_init(path: &Path, force: bool) -> Result<()> {
    info!("Initializing hubdrift configuration in: {}", path.display());

    let config_path = path.join("hubdrift.yaml");
    let env_path = path.join(".env.example");
    let gitignore_path = path.join(".gitignore");

    if !force && config_path.exists() {
        eprintln!("Configuration file already exists: {}", config_path.display());
        eprintln!("Use --force to overwrite.");
        return Ok(());
    }

    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }

    std::fs::write(&config_path, include_str!("../templates/hubdrift.yaml"))?;
    eprintln!("Created: {}", config_path.display());

    std::fs::write(&env_path, include_str!("../templates/.env.example"))?;
    eprintln!("Created: {}", env_path.display());

    if gitignore_path.exists() {
        let existing = std::fs::read_to_string(&gitignore_path)?;
        let missing: Vec<&str> = [".env", "reports/"]
            .into_iter()
            .filter(|entry| !existing.lines().any(|line| line.trim() == *entry))
            .collect();
        if !missing.is_empty() {
            let mut file = std::fs::OpenOptions::new().append(true).open(&gitignore_path)?;
            writeln!(file, "\n# hubdrift")?;
            for entry in missing {
                writeln!(file, "{entry}")?;
            }
            eprintln!("Updated: {}", gitignore_path.display());
        }
    } else {
        std::fs::write(&gitignore_path, ".env\nreports/\n")?;
        eprintln!("Created: {}", gitignore_path.display());
    }

    eprintln!("\nConfiguration initialized.");
    eprintln!("Next steps:");
    eprintln!("  1. Edit hubdrift.yaml with your workspace details");
    eprintln!("  2. Point source.path at a snapshot, or configure the api backend");
    eprintln!("  3. Run 'hubdrift validate' to check your configuration");
    eprintln!("  4. Run 'hubdrift detect' to see available updates");

    Ok(())
}

/// Validate configuration.
async fn cmd_validate(
    config_path: Option<&PathBuf>,
    show_warnings: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let config_file = resolve_config_path(config_path)?;
    info!("Validating configuration: {}", config_file.display());

    let parser = parser_for(&config_file);
    parser.load_dotenv()?;
    let config = parser.load_with_env(&config_file)?;

    let result = ConfigValidator::new().check(&config);

    for error in &result.errors {
        formatter.error(&error.to_string());
    }

    if show_warnings {
        for warning in &result.warnings {
            formatter.warning(warning);
        }
    }

    if config.source.backend == SourceBackend::Api {
        match parser.validate_required_env(&config) {
            Ok(()) => check_api_token(&config, formatter).await,
            Err(e) => formatter.warning(&e.to_string()),
        }
    }

    if !result.is_valid() {
        return Err(HubDriftError::Config(ConfigError::validation_general(format!(
            "{} validation error(s)",
            result.error_count()
        ))));
    }

    formatter.success("Configuration is valid");

    if formatter.format() == OutputFormat::Text {
        eprintln!("\nConfiguration summary:");
        eprintln!("  Workspace: {}", config.workspace.label());
        eprintln!("  Source: {:?}", config.source.backend);
        eprintln!("  Output: {}", config.output.dir);
        eprintln!("  Dry run: {}", config.deployment.dry_run);
        eprintln!("  Warnings: {}", result.warning_count());
    }

    Ok(())
}

/// Audit installed resources.
async fn cmd_audit(
    config_path: Option<&PathBuf>,
    kind: Option<ResourceKind>,
    export: bool,
    dir: Option<PathBuf>,
    formatter: &OutputFormatter,
) -> Result<()> {
    let config = load_config(config_path)?;
    let workflow = build_workflow(&config, None).await?;
    let dir = dir.unwrap_or_else(|| PathBuf::from(&config.output.dir));

    let kinds = kind.map_or_else(|| ResourceKind::ALL.to_vec(), |kind| vec![kind]);
    let mut failures = 0;

    for kind in kinds {
        let audit = match workflow.audit_inventory(kind).await {
            Ok(audit) => audit,
            Err(e) => {
                formatter.error(&format!("Error during {kind} audit: {e}"));
                failures += 1;
                continue;
            }
        };

        emit(&formatter.format_inventory(&audit))?;

        if export {
            match workflow.export_inventory(&audit, &dir).await {
                Some(path) => formatter.success(&format!(
                    "Exported {} {} to: {}",
                    audit.total(),
                    kind.plural(),
                    path.display()
                )),
                None => failures += 1,
            }
        }
    }

    if failures > 0 {
        return Err(HubDriftError::internal(format!("{failures} audit step(s) failed")));
    }

    Ok(())
}

/// Detect available updates.
async fn cmd_detect(
    config_path: Option<&PathBuf>,
    detailed: bool,
    export: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let config = load_config(config_path)?;
    let mut workflow = build_workflow(&config, None).await?;

    workflow.detect_all_updates().await;
    emit(&workflow.display_detected_updates(formatter))?;

    if detailed && formatter.format() == OutputFormat::Text {
        for (kind, index, summary) in workflow.detailed_summaries() {
            emit(&format!("[{kind} #{index}]\n{summary}"))?;
        }
    }

    if export {
        let files = workflow
            .export_updates_to_csv(Path::new(&config.output.dir))
            .await;
        emit(&formatter.format_exported(&files))?;
    }

    Ok(())
}

/// Show one detected update.
async fn cmd_show(
    config_path: Option<&PathBuf>,
    kind: ResourceKind,
    index: usize,
    formatter: &OutputFormatter,
) -> Result<()> {
    let config = load_config(config_path)?;
    let mut workflow = build_workflow(&config, None).await?;

    workflow.detect_all_updates().await;

    let (Some(update), Some(summary)) = (
        workflow.show_update_details(kind, index),
        workflow.update_summary(kind, index, true),
    ) else {
        return Err(DeploymentError::InvalidIndex {
            kind: kind.to_string(),
            index,
        }
        .into());
    };

    emit(&formatter.format_update_details(update, &summary))
}

/// Deploy every detected update.
async fn cmd_deploy(
    config_path: Option<&PathBuf>,
    yes: bool,
    max_risk: Option<RiskLevel>,
    no_csv: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let config = load_config(config_path)?;
    let mut workflow = build_workflow(&config, max_risk).await?;

    workflow.detect_all_updates().await;
    emit(&workflow.display_detected_updates(formatter))?;

    let auto_approve = yes || config.deployment.auto_approve;
    let results = workflow.deploy_all_updates(auto_approve).await;

    finish(
        &mut workflow,
        &results,
        config.output.export_csv && !no_csv,
        formatter,
    )
    .await
}

/// Approve and deploy updates one at a time.
async fn cmd_review(config_path: Option<&PathBuf>, formatter: &OutputFormatter) -> Result<()> {
    let config = load_config(config_path)?;
    let mut workflow = build_workflow(&config, None).await?;

    workflow.detect_all_updates().await;
    emit(&workflow.display_detected_updates(formatter))?;

    let results = workflow.review_updates().await;

    finish(&mut workflow, &results, config.output.export_csv, formatter).await
}

/// Export detected updates without deploying.
async fn cmd_export(
    config_path: Option<&PathBuf>,
    dir: Option<PathBuf>,
    json: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let config = load_config(config_path)?;
    let mut workflow = build_workflow(&config, None).await?;

    workflow.detect_all_updates().await;

    let dir = dir.unwrap_or_else(|| PathBuf::from(&config.output.dir));
    let files = workflow.export_updates_to_csv(&dir).await;
    emit(&formatter.format_exported(&files))?;

    if json {
        let path = dir.join(format!(
            "comparison_report_{}.json",
            chrono::Local::now().format("%Y%m%d_%H%M%S")
        ));
        export_comparison_report(workflow.detected(), &path).await?;
        formatter.success(&format!("Comparison report saved to: {}", path.display()));
    }

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Reports deployment results and fails if any deployment failed.
async fn finish(
    workflow: &mut UpdateWorkflow,
    results: &[DeploymentResult],
    export_csv: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    if results.is_empty() {
        return Ok(());
    }

    if formatter.format() == OutputFormat::Text {
        emit(&formatter.format_deployment_results(results))?;
    }

    let report = workflow.generate_deployment_report(results, export_csv).await;
    emit(&formatter.format_report(&report))?;

    if report.all_succeeded() {
        Ok(())
    } else {
        Err(HubDriftError::internal(format!(
            "{} of {} deployment(s) failed",
            report.failed, report.total
        )))
    }
}

/// Checks that the content hub accepts the configured token.
///
/// Reachability problems are warnings; `validate` must work offline.
async fn check_api_token(config: &HubDriftConfig, formatter: &OutputFormatter) {
    let (Some(base_url), Ok(token)) = (
        config.source.base_url.as_deref(),
        ConfigParser::get_api_token(),
    ) else {
        return;
    };

    let client = match HubClient::with_timeout(base_url, &token, config.source.timeout_secs) {
        Ok(client) => client.with_max_retries(1),
        Err(e) => {
            formatter.error(&e.to_string());
            return;
        }
    };

    match client.validate_token().await {
        Ok(true) => formatter.success("API token accepted"),
        Ok(false) => formatter.error("API token was rejected by the content hub"),
        Err(e) => formatter.warning(&format!("Could not reach the content hub: {e}")),
    }
}

/// Writes command output to stdout.
fn emit(output: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{output}")?;
    Ok(())
}

/// Resolves the configuration file path.
fn resolve_config_path(config_path: Option<&PathBuf>) -> Result<PathBuf> {
    config_path.map_or_else(|| find_config_file("."), |path| Ok(path.clone()))
}

/// Parser resolving paths relative to the configuration file.
fn parser_for(config_file: &Path) -> ConfigParser {
    ConfigParser::new().with_base_path(config_file.parent().unwrap_or_else(|| Path::new(".")))
}

/// Loads and validates the configuration.
fn load_config(config_path: Option<&PathBuf>) -> Result<HubDriftConfig> {
    let config_file = resolve_config_path(config_path)?;
    debug!("Loading configuration from: {}", config_file.display());

    let parser = parser_for(&config_file);
    parser.load_dotenv()?;

    let config = parser.load_with_env(&config_file)?;

    let result = ConfigValidator::new().validate(&config)?;
    for warning in &result.warnings {
        warn!("{warning}");
    }
    parser.validate_required_env(&config)?;

    Ok(config)
}

/// Wires gateways, deployer and exporter from the configuration.
async fn build_workflow(
    config: &HubDriftConfig,
    max_risk: Option<RiskLevel>,
) -> Result<UpdateWorkflow> {
    let exporter = Arc::new(CsvReportExporter::new(&config.output.dir));

    let (inventory, catalog, deployer): (
        Arc<dyn InventoryGateway>,
        Arc<dyn CatalogGateway>,
        Arc<dyn Deployer>,
    ) = match config.source.backend {
        SourceBackend::Snapshot => {
            let path = config.source.path.as_deref().ok_or_else(|| {
                HubDriftError::Config(ConfigError::validation(
                    "Snapshot path is required",
                    "source.path",
                ))
            })?;
            let gateway = Arc::new(SnapshotGateway::load(path).await?);
            let inventory: Arc<dyn InventoryGateway> = gateway.clone();
            let catalog: Arc<dyn CatalogGateway> = gateway;
            let deployer: Arc<dyn Deployer> = Arc::new(DryRunDeployer::new());
            (inventory, catalog, deployer)
        }
        SourceBackend::Api => {
            let base_url = config.source.base_url.as_deref().ok_or_else(|| {
                HubDriftError::Config(ConfigError::validation(
                    "Base URL is required",
                    "source.base_url",
                ))
            })?;
            let token = ConfigParser::get_api_token()?;
            let client = Arc::new(
                HubClient::with_timeout(base_url, &token, config.source.timeout_secs)?
                    .with_max_retries(config.source.max_retries),
            );
            let deployer: Arc<dyn Deployer> = if config.deploys_live() {
                client.clone()
            } else {
                Arc::new(DryRunDeployer::new())
            };
            let inventory: Arc<dyn InventoryGateway> = client.clone();
            let catalog: Arc<dyn CatalogGateway> = client;
            (inventory, catalog, deployer)
        }
    };

    info!(
        "Auditing {} with {} deployment",
        config.workspace.label(),
        deployer.name()
    );

    let policy = ApprovalPolicy {
        max_risk: max_risk.or(config.deployment.max_risk),
    };

    Ok(UpdateWorkflow::new(inventory, catalog, deployer, exporter).with_policy(policy))
}
