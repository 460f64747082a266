//! Configuration validation.
//!
//! This module checks a loaded configuration for missing or inconsistent
//! values before any gateway is contacted.

use crate::error::{ConfigError, HubDriftError, Result};
use tracing::debug;

use super::spec::{HubDriftConfig, SourceBackend, SourceConfig, WorkspaceConfig};
use crate::model::RiskLevel;

/// Validator for hubdrift configurations.
#[derive(Debug, Default)]
pub struct ConfigValidator;

/// Validation result containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl ConfigValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a configuration, collecting every problem.
    #[must_use]
    pub fn check(&self, config: &HubDriftConfig) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_workspace(&config.workspace, &mut result);
        Self::validate_source(&config.source, &mut result);
        Self::validate_deployment(config, &mut result);

        result
    }

    /// Validates a configuration.
    ///
    /// # Errors
    ///
    /// Returns the first error if validation fails.
    pub fn validate(&self, config: &HubDriftConfig) -> Result<ValidationResult> {
        let result = self.check(config);

        if result.errors.is_empty() {
            debug!("Configuration validation passed");
            Ok(result)
        } else {
            let first_error = &result.errors[0];
            Err(HubDriftError::Config(ConfigError::validation(
                first_error.message.clone(),
                first_error.field.clone(),
            )))
        }
    }

    fn validate_workspace(workspace: &WorkspaceConfig, result: &mut ValidationResult) {
        for (field, value) in [
            ("workspace.subscription_id", &workspace.subscription_id),
            ("workspace.resource_group", &workspace.resource_group),
            ("workspace.workspace_name", &workspace.workspace_name),
        ] {
            if value.trim().is_empty() {
                result.errors.push(ValidationError {
                    field: field.to_string(),
                    message: format!("{field} cannot be empty"),
                });
            }
        }

        if workspace.tenant_id.is_none() {
            result
                .warnings
                .push(String::from("workspace.tenant_id is not set; the default tenant is assumed"));
        }
    }

    fn validate_source(source: &SourceConfig, result: &mut ValidationResult) {
        match source.backend {
            SourceBackend::Snapshot => {
                if source.path.as_ref().is_none_or(|p| p.trim().is_empty()) {
                    result.errors.push(ValidationError {
                        field: String::from("source.path"),
                        message: String::from("Snapshot path is required when using the snapshot backend"),
                    });
                }
            }
            SourceBackend::Api => match source.base_url.as_deref() {
                None | Some("") => result.errors.push(ValidationError {
                    field: String::from("source.base_url"),
                    message: String::from("Base URL is required when using the api backend"),
                }),
                Some(url) if !url.starts_with("http://") && !url.starts_with("https://") => {
                    result.errors.push(ValidationError {
                        field: String::from("source.base_url"),
                        message: format!("Base URL '{url}' must start with http:// or https://"),
                    });
                }
                Some(url) if url.starts_with("http://") => {
                    result
                        .warnings
                        .push(format!("source.base_url '{url}' is not using TLS"));
                }
                Some(_) => {}
            },
        }

        if source.timeout_secs == 0 {
            result.errors.push(ValidationError {
                field: String::from("source.timeout_secs"),
                message: String::from("Timeout must be at least 1 second"),
            });
        }
    }

    fn validate_deployment(config: &HubDriftConfig, result: &mut ValidationResult) {
        let deployment = &config.deployment;

        if deployment.max_risk == Some(RiskLevel::None) {
            result.warnings.push(String::from(
                "deployment.max_risk is 'none'; no update will be approved automatically",
            ));
        }

        if deployment.auto_approve && config.deploys_live() && deployment.max_risk.is_none() {
            result.warnings.push(String::from(
                "deployment.auto_approve is set without max_risk; every detected update will be applied",
            ));
        }
    }
}

impl ValidationResult {
    /// Returns true if validation passed (no errors).
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of errors.
    #[must_use]
    pub const fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Returns the number of warnings.
    #[must_use]
    pub const fn warning_count(&self) -> usize {
        self.warnings.len()
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}
