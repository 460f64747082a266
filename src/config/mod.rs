//! Configuration module for hubdrift.
//!
//! This module handles all configuration-related functionality:
//! - Parsing and deserializing `hubdrift.yaml`
//! - `.env` loading and environment overrides
//! - Validation of configuration values

mod parser;
mod spec;
mod validator;

pub use parser::{
    API_TOKEN_VAR, ConfigParser, DEFAULT_CONFIG_FILES, find_config_file, user_config_file,
};
pub use spec::{
    DeploymentConfig, HubDriftConfig, OutputConfig, SourceBackend, SourceConfig, WorkspaceConfig,
};
pub use validator::{ConfigValidator, ValidationError, ValidationResult};
