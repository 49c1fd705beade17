//! Configuration types for Warden.
//!
//! Configuration is loaded once (from a YAML file or from defaults plus
//! environment) and then handed to the components that need it. Nothing below
//! the gateway reads the environment on its own.
//!
//! ```yaml
//! approval:
//!   secret_env: WARDEN_APPROVAL_SECRET
//!   token_ttl_seconds: 600
//! authorization:
//!   admin_group: governance_admins
//! audit:
//!   storage:
//!     backend: file
//!     file_path: /var/log/warden/audit.log
//! ```

pub mod approval;
pub mod audit;
pub mod authorization;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub use approval::{ApprovalConfig, MAX_TOKEN_TTL_SECONDS};
pub use audit::{AuditConfig, StorageBackend, StorageConfig};
pub use authorization::AuthorizationConfig;

/// Complete Warden configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WardenConfig {
    /// Approval token settings.
    #[serde(default)]
    pub approval: ApprovalConfig,

    /// Admin group settings.
    #[serde(default)]
    pub authorization: AuthorizationConfig,

    /// Audit logging settings.
    #[serde(default)]
    pub audit: AuditConfig,
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl WardenConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults only; secrets and the admin group override still come from
    /// the environment when resolved.
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Reject settings the gateway cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.approval.token_ttl_seconds == 0 {
            return Err(ConfigError::Config(
                "approval.token_ttl_seconds must be greater than zero".to_string(),
            ));
        }
        if self.approval.token_ttl_seconds > MAX_TOKEN_TTL_SECONDS {
            return Err(ConfigError::Config(format!(
                "approval.token_ttl_seconds must be at most {}",
                MAX_TOKEN_TTL_SECONDS
            )));
        }
        if self.authorization.admin_group.trim().is_empty() {
            return Err(ConfigError::Config(
                "authorization.admin_group cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}
