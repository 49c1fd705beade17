//! CLI command implementations for Warden.

pub mod config;
pub mod keys;
pub mod preview;
pub mod token;

use anyhow::Context;
use std::fs;
use std::path::Path;
use warden_core::{ChangeRequest, WardenConfig};

/// Load configuration from `path`, or defaults plus environment.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<WardenConfig> {
    match path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "Loading configuration");
            WardenConfig::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))
        }
        None => Ok(WardenConfig::from_env()),
    }
}

/// Load a change request from a YAML or JSON file.
pub fn load_request(path: &Path) -> anyhow::Result<ChangeRequest> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read change request {}", path.display()))?;
    // JSON is valid YAML
    serde_yaml::from_str(&content)
        .with_context(|| format!("Invalid change request in {}", path.display()))
}

/// Accept a token either inline or as a path to a file holding it.
pub fn read_token(token: String) -> anyhow::Result<String> {
    if Path::new(&token).exists() {
        Ok(fs::read_to_string(&token)?.trim().to_string())
    } else {
        Ok(token.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use warden_core::Action;

    #[test]
    fn test_load_request_yaml_and_json() {
        let dir = tempdir().unwrap();

        let yaml = dir.path().join("request.yaml");
        fs::write(
            &yaml,
            r#"
action: DELETE
target_name: mask_ssn_finance
scope_type: SCHEMA
scope_path: prod.finance
"#,
        )
        .unwrap();
        assert_eq!(load_request(&yaml).unwrap().action(), Action::Delete);

        let json = dir.path().join("request.json");
        fs::write(
            &json,
            r#"{"action":"UPDATE","target_name":"p","scope_type":"CATALOG","scope_path":"prod","parameters":{"comment":"x"}}"#,
        )
        .unwrap();
        let request = load_request(&json).unwrap();
        assert_eq!(request.action(), Action::Update);
        assert_eq!(request.param("comment").unwrap(), "x");
    }

    #[test]
    fn test_read_token_inline_or_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("token");
        fs::write(&path, "abc:def\n").unwrap();

        assert_eq!(read_token(path.display().to_string()).unwrap(), "abc:def");
        assert_eq!(read_token("abc:def".to_string()).unwrap(), "abc:def");
    }
}
