//! Shape validation: turn a [`ChangeRequest`] into a typed [`MutationPlan`].
//!
//! Only checks that the parameters required for the action are present and
//! well typed. Whether the referenced function or principals exist is for the
//! policy store to decide.

use serde_json::Value;
use thiserror::Error;
use warden_core::{
    params, Action, ChangeRequest, PolicyInfo, PolicyType, PolicyUpdate, Scope, SecurableType,
};

/// Why a change request is not well formed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("{action} requires parameter '{param}'")]
    MissingParameter { action: Action, param: &'static str },

    #[error("parameter '{param}' is not accepted for {action}")]
    UnexpectedParameter { action: Action, param: String },

    #[error("parameter '{param}' is invalid: {reason}")]
    InvalidParameter { param: &'static str, reason: String },

    #[error("UPDATE must change at least one of to_principals, except_principals, comment")]
    EmptyUpdate,
}

const CREATE_PARAMS: &[&str] = &[
    params::POLICY_TYPE,
    params::FUNCTION_NAME,
    params::TO_PRINCIPALS,
    params::EXCEPT_PRINCIPALS,
    params::MATCH_COLUMNS,
    params::WHEN_CONDITION,
    params::FOR_SECURABLE_TYPE,
    params::COMMENT,
];

const UPDATE_PARAMS: &[&str] = &[
    params::TO_PRINCIPALS,
    params::EXCEPT_PRINCIPALS,
    params::COMMENT,
];

const DELETE_PARAMS: &[&str] = &[];

/// A validated mutation, ready to be forwarded to the policy store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationPlan {
    Create(PolicyInfo),
    Update {
        name: String,
        scope: Scope,
        update: PolicyUpdate,
    },
    Delete {
        name: String,
        scope: Scope,
    },
}

impl MutationPlan {
    /// Validate the shape of `request` for its action.
    pub fn from_request(request: &ChangeRequest) -> Result<Self, ShapeError> {
        let action = request.action();
        let allowed = match action {
            Action::Create => CREATE_PARAMS,
            Action::Update => UPDATE_PARAMS,
            Action::Delete => DELETE_PARAMS,
        };
        if let Some(param) = request
            .parameters()
            .iter()
            .find(|(k, v)| !v.is_null() && !allowed.contains(&k.as_str()))
            .map(|(k, _)| k.clone())
        {
            return Err(ShapeError::UnexpectedParameter { action, param });
        }

        let reader = Params { request, action };
        let name = request.target_name().to_string();
        let scope = request.scope().clone();

        match action {
            Action::Create => {
                let policy_type = reader
                    .required_str(params::POLICY_TYPE)?
                    .parse::<PolicyType>()
                    .map_err(|e| invalid(params::POLICY_TYPE, e))?;
                let for_securable_type = match reader.optional_str(params::FOR_SECURABLE_TYPE)? {
                    Some(s) => s
                        .parse::<SecurableType>()
                        .map_err(|e| invalid(params::FOR_SECURABLE_TYPE, e))?,
                    None => SecurableType::Table,
                };
                let match_columns = reader.optional_str(params::MATCH_COLUMNS)?;
                if policy_type == PolicyType::ColumnMask && match_columns.is_none() {
                    return Err(ShapeError::MissingParameter {
                        action,
                        param: params::MATCH_COLUMNS,
                    });
                }

                let to_principals = reader.required_list(params::TO_PRINCIPALS)?;
                if to_principals.is_empty() {
                    return Err(invalid(params::TO_PRINCIPALS, "must name at least one principal"));
                }

                Ok(Self::Create(PolicyInfo {
                    name,
                    scope,
                    policy_type,
                    function_name: reader.required_str(params::FUNCTION_NAME)?,
                    to_principals,
                    except_principals: reader
                        .optional_list(params::EXCEPT_PRINCIPALS)?
                        .unwrap_or_default(),
                    for_securable_type,
                    match_columns,
                    when_condition: reader.optional_str(params::WHEN_CONDITION)?,
                    comment: reader.optional_str(params::COMMENT)?,
                }))
            }
            Action::Update => {
                let update = PolicyUpdate {
                    to_principals: reader.optional_list(params::TO_PRINCIPALS)?,
                    except_principals: reader.optional_list(params::EXCEPT_PRINCIPALS)?,
                    comment: reader.optional_str(params::COMMENT)?,
                };
                if update.is_empty() {
                    return Err(ShapeError::EmptyUpdate);
                }
                if update.to_principals.as_ref().is_some_and(Vec::is_empty) {
                    return Err(invalid(params::TO_PRINCIPALS, "must name at least one principal"));
                }
                Ok(Self::Update {
                    name,
                    scope,
                    update,
                })
            }
            Action::Delete => Ok(Self::Delete { name, scope }),
        }
    }

    pub fn action(&self) -> Action {
        match self {
            Self::Create(_) => Action::Create,
            Self::Update { .. } => Action::Update,
            Self::Delete { .. } => Action::Delete,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Create(info) => &info.name,
            Self::Update { name, .. } | Self::Delete { name, .. } => name,
        }
    }

    pub fn scope(&self) -> &Scope {
        match self {
            Self::Create(info) => &info.scope,
            Self::Update { scope, .. } | Self::Delete { scope, .. } => scope,
        }
    }
}

fn invalid(param: &'static str, reason: impl ToString) -> ShapeError {
    ShapeError::InvalidParameter {
        param,
        reason: reason.to_string(),
    }
}

struct Params<'a> {
    request: &'a ChangeRequest,
    action: Action,
}

impl Params<'_> {
    fn optional_str(&self, param: &'static str) -> Result<Option<String>, ShapeError> {
        match self.request.param(param) {
            None => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Err(invalid(param, "must not be blank")),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(invalid(param, format!("expected a string, got {}", other))),
        }
    }

    fn required_str(&self, param: &'static str) -> Result<String, ShapeError> {
        self.optional_str(param)?.ok_or(ShapeError::MissingParameter {
            action: self.action,
            param,
        })
    }

    fn optional_list(&self, param: &'static str) -> Result<Option<Vec<String>>, ShapeError> {
        match self.request.param(param) {
            None => Ok(None),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) if !s.trim().is_empty() => Ok(s.clone()),
                    _ => Err(invalid(param, "expected a list of non-empty strings")),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            Some(other) => Err(invalid(param, format!("expected a list, got {}", other))),
        }
    }

    fn required_list(&self, param: &'static str) -> Result<Vec<String>, ShapeError> {
        self.optional_list(param)?.ok_or(ShapeError::MissingParameter {
            action: self.action,
            param,
        })
    }
}
