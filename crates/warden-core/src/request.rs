//! Proposed mutations.
//!
//! A [`ChangeRequest`] captures everything an approval token binds: the action,
//! the target policy, its scope, and the action-specific parameters. It cannot
//! be modified once built; re-previewing the same request produces a fresh
//! token with a new timestamp.

use crate::error::ModelError;
use crate::policy::PolicyType;
use crate::scope::{validate_identifier, Scope, SecurableType};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Well-known parameter names.
pub mod params {
    pub const POLICY_TYPE: &str = "policy_type";
    pub const FUNCTION_NAME: &str = "function_name";
    pub const TO_PRINCIPALS: &str = "to_principals";
    pub const EXCEPT_PRINCIPALS: &str = "except_principals";
    pub const MATCH_COLUMNS: &str = "match_columns";
    pub const WHEN_CONDITION: &str = "when_condition";
    pub const FOR_SECURABLE_TYPE: &str = "for_securable_type";
    pub const COMMENT: &str = "comment";
}

/// Token fields that callers may not supply as parameters.
pub const RESERVED_PARAMETERS: [&str; 5] =
    ["action", "target_name", "scope_type", "scope_path", "timestamp"];

/// Kind of mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Create,
    Update,
    Delete,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CREATE" => Ok(Self::Create),
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            _ => Err(ModelError::UnknownVariant {
                kind: "action",
                value: s.to_string(),
            }),
        }
    }
}

/// A proposed mutation against a policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ChangeRequestRepr")]
pub struct ChangeRequest {
    action: Action,
    target_name: String,
    #[serde(flatten)]
    scope: Scope,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    parameters: BTreeMap<String, Value>,
}

#[derive(Deserialize)]
struct ChangeRequestRepr {
    action: Action,
    target_name: String,
    #[serde(flatten)]
    scope: Scope,
    #[serde(default)]
    parameters: BTreeMap<String, Value>,
}

impl TryFrom<ChangeRequestRepr> for ChangeRequest {
    type Error = ModelError;

    fn try_from(repr: ChangeRequestRepr) -> Result<Self, Self::Error> {
        ChangeRequest::new(repr.action, repr.target_name, repr.scope, repr.parameters)
    }
}

impl ChangeRequest {
    /// Build a request from its parts, validating the name and parameter keys.
    pub fn new(
        action: Action,
        target_name: impl Into<String>,
        scope: Scope,
        parameters: BTreeMap<String, Value>,
    ) -> Result<Self, ModelError> {
        let target_name = target_name.into();
        validate_identifier("target_name", &target_name)?;

        if let Some(reserved) = parameters
            .keys()
            .find(|k| RESERVED_PARAMETERS.contains(&k.as_str()))
        {
            return Err(ModelError::ReservedParameter(reserved.clone()));
        }

        Ok(Self {
            action,
            target_name,
            scope,
            parameters,
        })
    }

    /// Start building a request.
    pub fn builder(action: Action, target_name: impl Into<String>, scope: Scope) -> ChangeRequestBuilder {
        ChangeRequestBuilder {
            action,
            target_name: target_name.into(),
            scope,
            parameters: BTreeMap::new(),
        }
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn parameters(&self) -> &BTreeMap<String, Value> {
        &self.parameters
    }

    /// Look up a parameter, treating JSON null as absent.
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.parameters.get(key).filter(|v| !v.is_null())
    }

    /// The complete mapping an approval token is bound to:
    /// the parameters plus action, target and scope.
    pub fn token_params(&self) -> BTreeMap<String, Value> {
        let mut bound = self.parameters.clone();
        bound.insert("action".into(), Value::String(self.action.to_string()));
        bound.insert("target_name".into(), Value::String(self.target_name.clone()));
        bound.insert(
            "scope_type".into(),
            Value::String(self.scope.scope_type.to_string()),
        );
        bound.insert("scope_path".into(), Value::String(self.scope.scope_path.clone()));
        bound
    }
}

/// Builder for [`ChangeRequest`].
#[derive(Debug, Clone)]
pub struct ChangeRequestBuilder {
    action: Action,
    target_name: String,
    scope: Scope,
    parameters: BTreeMap<String, Value>,
}

impl ChangeRequestBuilder {
    /// Set an arbitrary parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn policy_type(self, policy_type: PolicyType) -> Self {
        self.param(params::POLICY_TYPE, policy_type.as_str())
    }

    pub fn function_name(self, function: impl Into<String>) -> Self {
        self.param(params::FUNCTION_NAME, function.into())
    }

    pub fn to_principals<I, S>(self, principals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.param(params::TO_PRINCIPALS, string_list(principals))
    }

    pub fn except_principals<I, S>(self, principals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.param(params::EXCEPT_PRINCIPALS, string_list(principals))
    }

    pub fn match_columns(self, selector: impl Into<String>) -> Self {
        self.param(params::MATCH_COLUMNS, selector.into())
    }

    pub fn when_condition(self, condition: impl Into<String>) -> Self {
        self.param(params::WHEN_CONDITION, condition.into())
    }

    pub fn for_securable_type(self, securable: SecurableType) -> Self {
        self.param(params::FOR_SECURABLE_TYPE, securable.as_str())
    }

    pub fn comment(self, comment: impl Into<String>) -> Self {
        self.param(params::COMMENT, comment.into())
    }

    pub fn build(self) -> Result<ChangeRequest, ModelError> {
        ChangeRequest::new(self.action, self.target_name, self.scope, self.parameters)
    }
}

fn string_list<I, S>(items: I) -> Value
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Value::Array(items.into_iter().map(|s| Value::String(s.into())).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scope() -> Scope {
        Scope::schema("prod.finance").unwrap()
    }

    #[test]
    fn test_token_params_include_identity_fields() {
        let request = ChangeRequest::builder(Action::Create, "mask_ssn_finance", scope())
            .to_principals(["analysts"])
            .comment("mask ssn")
            .build()
            .unwrap();

        let bound = request.token_params();
        assert_eq!(bound["action"], json!("CREATE"));
        assert_eq!(bound["target_name"], json!("mask_ssn_finance"));
        assert_eq!(bound["scope_type"], json!("SCHEMA"));
        assert_eq!(bound["scope_path"], json!("prod.finance"));
        assert_eq!(bound["to_principals"], json!(["analysts"]));
        assert_eq!(bound["comment"], json!("mask ssn"));
    }

    #[test]
    fn test_reserved_parameters_rejected() {
        for key in RESERVED_PARAMETERS {
            let result = ChangeRequest::builder(Action::Delete, "p", scope())
                .param(key, "x")
                .build();
            assert_eq!(result.unwrap_err(), ModelError::ReservedParameter(key.to_string()));
        }
    }

    #[test]
    fn test_invalid_target_name() {
        let result = ChangeRequest::builder(Action::Delete, "drop table;", scope()).build();
        assert!(matches!(result, Err(ModelError::InvalidIdentifier { .. })));
    }

    #[test]
    fn test_param_treats_null_as_absent() {
        let request = ChangeRequest::builder(Action::Update, "p", scope())
            .param("comment", Value::Null)
            .build()
            .unwrap();
        assert!(request.param("comment").is_none());
        assert!(request.parameters().contains_key("comment"));
    }

    #[test]
    fn test_deserialize_from_yaml() {
        let yaml = r#"
action: CREATE
target_name: mask_ssn_finance
scope_type: SCHEMA
scope_path: prod.finance
parameters:
  policy_type: COLUMN_MASK
  to_principals: [analysts]
"#;
        let request: ChangeRequest = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(request.action(), Action::Create);
        assert_eq!(request.scope(), &scope());
        assert_eq!(request.param("to_principals"), Some(&json!(["analysts"])));
    }

    #[test]
    fn test_deserialize_rejects_reserved_key() {
        let yaml = r#"
action: DELETE
target_name: p
scope_type: SCHEMA
scope_path: prod.finance
parameters:
  timestamp: 5
"#;
        assert!(serde_yaml::from_str::<ChangeRequest>(yaml).is_err());
    }
}
