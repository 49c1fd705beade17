//! `warden config check` - load configuration and report what it resolves to.

use super::load_config;
use std::path::Path;
use warden_core::WardenConfig;

/// Where the signing secret comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretSource {
    Environment(String),
    File(String),
    Placeholder,
}

/// Resolved view of a configuration.
#[derive(Debug, Clone)]
pub struct ConfigReport {
    pub admin_group: String,
    pub token_ttl_seconds: u64,
    pub secret_source: SecretSource,
    pub audit: String,
}

impl ConfigReport {
    pub fn from_config(config: &WardenConfig) -> anyhow::Result<Self> {
        config.validate()?;

        let approval = &config.approval;
        let from_env = std::env::var(&approval.secret_env).is_ok_and(|v| !v.is_empty());
        let secret_source = if from_env {
            SecretSource::Environment(approval.secret_env.clone())
        } else if approval.resolve_secret()?.is_some() {
            let file = approval
                .secret_file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            SecretSource::File(file)
        } else {
            SecretSource::Placeholder
        };

        let audit = if config.audit.enabled {
            match &config.audit.storage.file_path {
                Some(path) => format!("{:?} ({})", config.audit.storage.backend, path),
                None => format!("{:?}", config.audit.storage.backend),
            }
        } else {
            "disabled".to_string()
        };

        Ok(Self {
            admin_group: config.authorization.resolve_admin_group(),
            token_ttl_seconds: approval.token_ttl_seconds,
            secret_source,
            audit,
        })
    }
}

pub fn check(config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let report = ConfigReport::from_config(&config)?;

    println!("✔ Configuration is valid");
    println!("  Admin group:  {}", report.admin_group);
    println!("  Token TTL:    {}s", report.token_ttl_seconds);
    match &report.secret_source {
        SecretSource::Environment(var) => println!("  Secret:       ${}", var),
        SecretSource::File(path) => println!("  Secret:       {}", path),
        SecretSource::Placeholder => {
            println!("  Secret:       insecure development placeholder");
            println!();
            println!("⚠️  Set a real secret before handling real data (warden keys generate).");
        }
    }
    println!("  Audit:        {}", report.audit);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_report_placeholder_and_defaults() {
        let mut config = WardenConfig::default();
        config.approval.secret_env = "WARDEN_TEST_CLI_UNSET_SECRET".to_string();
        config.authorization.admin_group_env = "WARDEN_TEST_CLI_UNSET_GROUP".to_string();

        let report = ConfigReport::from_config(&config).unwrap();
        assert_eq!(report.admin_group, "admins");
        assert_eq!(report.token_ttl_seconds, 600);
        assert_eq!(report.secret_source, SecretSource::Placeholder);
    }

    #[test]
    fn test_report_secret_file() {
        let dir = tempdir().unwrap();
        let secret_path = dir.path().join("approval.secret");
        fs::write(&secret_path, "deadbeef\n").unwrap();

        let mut config = WardenConfig::default();
        config.approval.secret_env = "WARDEN_TEST_CLI_UNSET_SECRET".to_string();
        config.approval.secret_file = Some(secret_path.clone());

        let report = ConfigReport::from_config(&config).unwrap();
        assert_eq!(
            report.secret_source,
            SecretSource::File(secret_path.display().to_string())
        );
    }

    #[test]
    fn test_invalid_config_fails_check() {
        let mut config = WardenConfig::default();
        config.approval.token_ttl_seconds = 0;
        assert!(ConfigReport::from_config(&config).is_err());
    }
}
