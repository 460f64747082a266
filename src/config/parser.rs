//! Configuration parser for loading and merging configuration files.
//!
//! This module handles loading configuration from YAML files, `.env` files
//! and environment variables, with proper precedence and error handling.

use crate::error::{ConfigError, HubDriftError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::spec::{HubDriftConfig, SourceBackend};

/// Environment variable holding the content-hub bearer token.
pub const API_TOKEN_VAR: &str = "HUBDRIFT_API_TOKEN";

/// Configuration parser for loading hubdrift configuration.
#[derive(Debug, Default)]
pub struct ConfigParser {
    /// Base path for resolving relative paths.
    base_path: Option<PathBuf>,
}

impl ConfigParser {
    /// Creates a new configuration parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the base path for resolving relative paths.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<HubDriftConfig> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(HubDriftError::Config(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            HubDriftError::Config(ConfigError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: Some(path.display().to_string()),
            })
        })?;

        let mut config = self.parse_yaml(&content, Some(path))?;
        self.resolve_paths(&mut config);
        Ok(config)
    }

    /// Parses configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<HubDriftConfig> {
        debug!("Parsing YAML configuration");

        let config: HubDriftConfig = serde_yaml::from_str(content).map_err(|e| {
            let location = source.map(|p| p.display().to_string());
            HubDriftError::Config(ConfigError::ParseError {
                message: format!("YAML parse error: {e}"),
                location,
            })
        })?;

        debug!(
            "Successfully parsed configuration for workspace: {}",
            config.workspace.workspace_name
        );
        Ok(config)
    }

    /// Loads configuration with environment variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_with_env(&self, path: impl AsRef<Path>) -> Result<HubDriftConfig> {
        let mut config = self.load_file(path)?;
        Self::apply_env_overrides(&mut config);
        Ok(config)
    }

    /// Applies process environment overrides to the configuration.
    pub fn apply_env_overrides(config: &mut HubDriftConfig) {
        Self::apply_overrides_from(config, |name| std::env::var(name).ok());
    }

    /// Applies overrides read through `lookup`.
    fn apply_overrides_from(config: &mut HubDriftConfig, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(id) = lookup("AZURE_SUBSCRIPTION_ID") {
            debug!("Overriding workspace.subscription_id from environment");
            config.workspace.subscription_id = id;
        }

        if let Some(group) = lookup("RESOURCE_GROUP_NAME") {
            debug!("Overriding workspace.resource_group from environment");
            config.workspace.resource_group = group;
        }

        if let Some(name) = lookup("WORKSPACE_NAME") {
            debug!("Overriding workspace.workspace_name from environment");
            config.workspace.workspace_name = name;
        }

        if let Some(tenant) = lookup("AZURE_TENANT_ID") {
            debug!("Overriding workspace.tenant_id from environment");
            config.workspace.tenant_id = Some(tenant);
        }

        if let Some(url) = lookup("HUBDRIFT_API_URL") {
            debug!("Overriding source.base_url from environment");
            config.source.base_url = Some(url);
        }

        if let Some(dir) = lookup("HUBDRIFT_OUTPUT_DIR") {
            debug!("Overriding output.dir from environment");
            config.output.dir = dir;
        }
    }

    /// Resolves a relative snapshot path against the base path.
    fn resolve_paths(&self, config: &mut HubDriftConfig) {
        let Some(base) = &self.base_path else {
            return;
        };

        if let Some(path) = &config.source.path
            && Path::new(path).is_relative()
        {
            config.source.path = Some(base.join(path).display().to_string());
        }
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| PathBuf::from(".env"), |p| p.join(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                HubDriftError::Config(ConfigError::ParseError {
                    message: format!("Failed to load .env file: {e}"),
                    location: Some(env_path.display().to_string()),
                })
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }

    /// Validates that the environment variables the source needs are set.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing.
    pub fn validate_required_env(&self, config: &HubDriftConfig) -> Result<()> {
        if config.source.backend == SourceBackend::Api {
            Self::get_api_token()?;
        }
        Ok(())
    }

    /// Gets the content-hub API token from environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not set.
    pub fn get_api_token() -> Result<String> {
        std::env::var(API_TOKEN_VAR).map_err(|_| {
            HubDriftError::Config(ConfigError::MissingEnvVar {
                name: String::from(API_TOKEN_VAR),
            })
        })
    }
}

/// Default configuration file names to search for.
pub const DEFAULT_CONFIG_FILES: &[&str] = &["hubdrift.yaml", "hubdrift.yml", ".hubdrift.yaml"];

/// Finds the configuration file in the current directory, its parents, or
/// the user configuration directory.
///
/// # Errors
///
/// Returns an error if no configuration file is found.
pub fn find_config_file(start_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let start = start_dir.as_ref();
    let mut current = start.to_path_buf();

    loop {
        for filename in DEFAULT_CONFIG_FILES {
            let config_path = current.join(filename);
            if config_path.exists() {
                info!("Found configuration file: {}", config_path.display());
                return Ok(config_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    if let Some(user_config) = user_config_file()
        && user_config.exists()
    {
        info!("Using user configuration file: {}", user_config.display());
        return Ok(user_config);
    }

    Err(HubDriftError::Config(ConfigError::FileNotFound {
        path: start.join(DEFAULT_CONFIG_FILES[0]),
    }))
}

/// Location of the per-user configuration file.
#[must_use]
pub fn user_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("hubdrift").join(DEFAULT_CONFIG_FILES[0]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const MINIMAL: &str = r"
workspace:
  subscription_id: sub-1
  resource_group: rg-sec
  workspace_name: soc
source:
  backend: snapshot
  path: snapshot.yaml
";

    #[test]
    fn test_parse_minimal_config() {
        let parser = ConfigParser::new();
        let config = parser.parse_yaml(MINIMAL, None).expect("minimal config parses");

        assert_eq!(config.workspace.workspace_name, "soc");
        assert_eq!(config.source.backend, SourceBackend::Snapshot);
        assert_eq!(config.source.path.as_deref(), Some("snapshot.yaml"));
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r"
workspace:
  subscription_id: 00000000-0000-0000-0000-000000000000
  resource_group: rg-sentinel
  workspace_name: soc-prod
  tenant_id: tenant-1
source:
  backend: api
  base_url: https://hub.example.internal
  timeout_secs: 10
  max_retries: 5
output:
  dir: reports
  export_csv: false
deployment:
  auto_approve: true
  dry_run: true
  max_risk: medium
";
        let parser = ConfigParser::new();
        let config = parser.parse_yaml(yaml, None).expect("full config parses");

        assert_eq!(config.source.backend, SourceBackend::Api);
        assert_eq!(config.source.max_retries, 5);
        assert_eq!(config.output.dir, "reports");
        assert!(!config.output.export_csv);
        assert_eq!(config.deployment.max_risk, Some(crate::model::RiskLevel::Medium));
    }

    #[test]
    fn test_parse_error_has_location() {
        let parser = ConfigParser::new();
        let err = parser
            .parse_yaml("workspace: [", Some(Path::new("hubdrift.yaml")))
            .expect_err("invalid yaml");

        match err {
            HubDriftError::Config(ConfigError::ParseError { location, .. }) => {
                assert_eq!(location.as_deref(), Some("hubdrift.yaml"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_env_overrides() {
        let parser = ConfigParser::new();
        let mut config = parser.parse_yaml(MINIMAL, None).expect("minimal config parses");

        let env: HashMap<&str, &str> = HashMap::from([
            ("WORKSPACE_NAME", "soc-dr"),
            ("AZURE_TENANT_ID", "tenant-9"),
            ("HUBDRIFT_OUTPUT_DIR", "/tmp/out"),
        ]);
        ConfigParser::apply_overrides_from(&mut config, |k| env.get(k).map(|v| (*v).to_string()));

        assert_eq!(config.workspace.workspace_name, "soc-dr");
        assert_eq!(config.workspace.subscription_id, "sub-1");
        assert_eq!(config.workspace.tenant_id.as_deref(), Some("tenant-9"));
        assert_eq!(config.output.dir, "/tmp/out");
    }

    #[test]
    fn test_load_file_resolves_snapshot_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("hubdrift.yaml");
        std::fs::write(&path, MINIMAL).expect("write config");

        let config = ConfigParser::new()
            .with_base_path(dir.path())
            .load_file(&path)
            .expect("config loads");

        let expected = dir.path().join("snapshot.yaml").display().to_string();
        assert_eq!(config.source.path.as_deref(), Some(expected.as_str()));
    }

    #[test]
    fn test_find_config_file_walks_parents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).expect("create dirs");
        std::fs::write(dir.path().join("hubdrift.yaml"), MINIMAL).expect("write config");

        let found = find_config_file(&nested).expect("config found");
        assert_eq!(found, dir.path().join("hubdrift.yaml"));
    }

    #[test]
    fn test_missing_file() {
        let err = ConfigParser::new()
            .load_file("/nonexistent/hubdrift.yaml")
            .expect_err("missing file");
        assert!(matches!(
            err,
            HubDriftError::Config(ConfigError::FileNotFound { .. })
        ));
    }
}
