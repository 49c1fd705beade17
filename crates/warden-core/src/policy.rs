//! Policies as the external policy store understands them.

use crate::error::ModelError;
use crate::scope::{Scope, SecurableType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of access-control policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyType {
    /// Transforms column values for principals not in the exception list.
    ColumnMask,
    /// Hides rows from principals not in the exception list.
    RowFilter,
}

impl PolicyType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ColumnMask => "COLUMN_MASK",
            Self::RowFilter => "ROW_FILTER",
        }
    }
}

impl fmt::Display for PolicyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace(' ', "_").as_str() {
            "COLUMN_MASK" => Ok(Self::ColumnMask),
            "ROW_FILTER" => Ok(Self::RowFilter),
            _ => Err(ModelError::UnknownVariant {
                kind: "policy type",
                value: s.to_string(),
            }),
        }
    }
}

/// Everything needed to create a policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyInfo {
    pub name: String,
    pub scope: Scope,
    pub policy_type: PolicyType,
    /// Fully qualified masking or filtering function.
    pub function_name: String,
    pub to_principals: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub except_principals: Vec<String>,
    /// Securables inside the scope the policy applies to (usually tables).
    pub for_securable_type: SecurableType,
    /// Tag selector picking the columns the policy binds to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_columns: Option<String>,
    /// Optional predicate restricting which tables the policy applies to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when_condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// A stored policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub id: String,
    #[serde(flatten)]
    pub info: PolicyInfo,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Policy {
    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn scope(&self) -> &Scope {
        &self.info.scope
    }
}

/// Partial policy fields for an update. Only `Some` fields are replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_principals: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub except_principals: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl PolicyUpdate {
    /// Names of the fields this update replaces.
    pub fn field_mask(&self) -> Vec<String> {
        let mut mask = Vec::new();
        if self.to_principals.is_some() {
            mask.push("to_principals".to_string());
        }
        if self.except_principals.is_some() {
            mask.push("except_principals".to_string());
        }
        if self.comment.is_some() {
            mask.push("comment".to_string());
        }
        mask
    }

    pub fn is_empty(&self) -> bool {
        self.field_mask().is_empty()
    }
}
