//! Approval token configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Longest allowed token TTL (one day).
pub const MAX_TOKEN_TTL_SECONDS: u64 = 86_400;

/// Configuration for signing and validating approval tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalConfig {
    /// Environment variable containing the signing secret.
    #[serde(default = "default_secret_env")]
    pub secret_env: String,

    /// Path to a file containing the signing secret.
    #[serde(default)]
    pub secret_file: Option<PathBuf>,

    /// How long an approval token stays redeemable, in seconds.
    #[serde(default = "default_token_ttl_seconds")]
    pub token_ttl_seconds: u64,
}

impl Default for ApprovalConfig {
    fn default() -> Self {
        Self {
            secret_env: default_secret_env(),
            secret_file: None,
            token_ttl_seconds: default_token_ttl_seconds(),
        }
    }
}

impl ApprovalConfig {
    /// Resolve the signing secret from environment or file.
    ///
    /// Returns `Ok(None)` when neither source is set; callers then fall back
    /// to the development placeholder.
    pub fn resolve_secret(&self) -> Result<Option<String>, std::io::Error> {
        if let Ok(secret) = std::env::var(&self.secret_env) {
            if !secret.is_empty() {
                return Ok(Some(secret));
            }
        }

        if let Some(path) = &self.secret_file {
            if path.exists() {
                let secret = std::fs::read_to_string(path)?;
                let secret = secret.trim();
                if !secret.is_empty() {
                    return Ok(Some(secret.to_string()));
                }
            }
        }

        Ok(None)
    }
}

fn default_secret_env() -> String {
    "WARDEN_APPROVAL_SECRET".to_string()
}

fn default_token_ttl_seconds() -> u64 {
    600
}
