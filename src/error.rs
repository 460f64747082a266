//! Error types for the hubdrift audit and update system.
//!
//! Errors are grouped by the collaborator that raised them: configuration,
//! the inventory/catalog gateways, the report exporter and the deployer.
//! The update workflow recovers all gateway and export errors locally, so
//! these types mostly surface from configuration loading and the gateways
//! themselves.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for hubdrift.
#[derive(Debug, Error)]
pub enum HubDriftError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Inventory or catalog gateway errors.
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Report or export persistence errors.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Deployment errors.
    #[error("Deployment error: {0}")]
    Deployment(#[from] DeploymentError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("Configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Validation failed.
    #[error("Configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },

    /// Environment variable is missing.
    #[error("Missing environment variable: {name}")]
    MissingEnvVar {
        /// Name of the missing variable.
        name: String,
    },
}

/// Failures reaching an inventory or catalog source.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Authentication was rejected by the remote service.
    #[error("Authentication failed: {message}")]
    AuthenticationFailed {
        /// Description of the auth failure.
        message: String,
    },

    /// API request failed with a non-success status.
    #[error("API request failed: {status} - {message}")]
    ApiRequestFailed {
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// Rate limited.
    #[error("API rate limited, retry after {retry_after_secs} seconds")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// Network error.
    #[error("Network error: {message}")]
    NetworkError {
        /// Description of the network error.
        message: String,
    },

    /// The service URL cannot be used as a request base.
    #[error("Invalid service URL '{url}': {message}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Why it was rejected.
        message: String,
    },

    /// The response could not be decoded.
    #[error("Invalid response: {message}")]
    InvalidResponse {
        /// Description of the response issue.
        message: String,
    },

    /// A snapshot file could not be read or decoded.
    #[error("Snapshot error at {path}: {message}")]
    Snapshot {
        /// Path of the snapshot file.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },

    /// The gateway does not serve this resource kind.
    #[error("Resource kind not supported by this gateway: {kind}")]
    UnsupportedKind {
        /// The unsupported kind.
        kind: String,
    },
}

/// Failures persisting CSV, JSON or text report artifacts.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Filesystem failure.
    #[error("Failed to write {path}: {message}")]
    Io {
        /// Target path.
        path: PathBuf,
        /// Underlying error text.
        message: String,
    },

    /// Serialization failure.
    #[error("Failed to serialize export: {message}")]
    Serialization {
        /// Description of the serialization error.
        message: String,
    },
}

/// Failure applying one change to the platform.
#[derive(Debug, Error)]
pub enum DeploymentError {
    /// The requested update does not exist.
    #[error("No {kind} update at index {index}")]
    InvalidIndex {
        /// Resource kind requested.
        kind: String,
        /// Index requested.
        index: usize,
    },

    /// The template content could not be retrieved from the catalog.
    #[error("Could not retrieve template content for {template_id}")]
    TemplateUnavailable {
        /// Catalog template id.
        template_id: String,
    },

    /// The deployer rejected the change.
    #[error("Deployment of {target} failed: {message}")]
    Rejected {
        /// Deployment target.
        target: String,
        /// Reason given.
        message: String,
    },
}

/// Result type alias for hubdrift operations.
pub type Result<T> = std::result::Result<T, HubDriftError>;

impl HubDriftError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Creates a validation error without a specific field.
    #[must_use]
    pub fn validation_general(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: None,
        }
    }
}

impl GatewayError {
    /// Creates an API request error.
    #[must_use]
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiRequestFailed {
            status,
            message: message.into(),
        }
    }

    /// Creates a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkError {
            message: message.into(),
        }
    }

    /// Creates a snapshot error.
    #[must_use]
    pub fn snapshot(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Snapshot {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns true if the request may succeed when retried.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::NetworkError { .. })
    }

    /// Returns the suggested retry delay in seconds, if applicable.
    #[must_use]
    pub const fn retry_delay_secs(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            Self::NetworkError { .. } => Some(1),
            _ => None,
        }
    }
}

impl ExportError {
    /// Creates an IO export error for the given path.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Creates a serialization error.
    #[must_use]
    pub fn serialization(err: impl std::fmt::Display) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}
