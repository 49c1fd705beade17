//! Authorization gate configuration.

use serde::{Deserialize, Serialize};

/// Which group may perform mutations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationConfig {
    /// Group whose members may mutate policies.
    ///
    /// The default is only suitable for development; deployments set their own.
    #[serde(default = "default_admin_group")]
    pub admin_group: String,

    /// Environment variable that overrides `admin_group` when set.
    #[serde(default = "default_admin_group_env")]
    pub admin_group_env: String,
}

impl Default for AuthorizationConfig {
    fn default() -> Self {
        Self {
            admin_group: default_admin_group(),
            admin_group_env: default_admin_group_env(),
        }
    }
}

impl AuthorizationConfig {
    /// The effective admin group: the environment override if set, otherwise
    /// the configured value.
    pub fn resolve_admin_group(&self) -> String {
        match std::env::var(&self.admin_group_env) {
            Ok(group) if !group.trim().is_empty() => group.trim().to_string(),
            _ => self.admin_group.clone(),
        }
    }
}

fn default_admin_group() -> String {
    "admins".to_string()
}

fn default_admin_group_env() -> String {
    "WARDEN_ADMIN_GROUP".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_group() {
        let config = AuthorizationConfig {
            admin_group_env: "WARDEN_TEST_GROUP_UNSET".into(),
            ..Default::default()
        };
        assert_eq!(config.resolve_admin_group(), "admins");
    }

    #[test]
    fn test_env_override() {
        // SAFETY: test-only env var with a unique name
        unsafe {
            std::env::set_var("WARDEN_TEST_GROUP_OVERRIDE", "governance_admins");
        }

        let config = AuthorizationConfig {
            admin_group_env: "WARDEN_TEST_GROUP_OVERRIDE".into(),
            ..Default::default()
        };
        assert_eq!(config.resolve_admin_group(), "governance_admins");

        // SAFETY: cleanup in test
        unsafe {
            std::env::remove_var("WARDEN_TEST_GROUP_OVERRIDE");
        }
    }
}
