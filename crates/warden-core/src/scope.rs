//! Securable scopes that policies attach to.

use crate::error::ModelError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is a valid regex")
});

/// Check that `value` is a plain identifier (letters, digits, underscores).
pub fn validate_identifier(field: &str, value: &str) -> Result<(), ModelError> {
    if IDENTIFIER.is_match(value) {
        Ok(())
    } else {
        Err(ModelError::InvalidIdentifier {
            field: field.to_string(),
            value: value.to_string(),
        })
    }
}

/// Kind of securable a policy can be scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SecurableType {
    Catalog,
    Schema,
    Table,
}

impl SecurableType {
    /// Number of dotted segments in a full name of this type.
    pub fn depth(self) -> usize {
        match self {
            Self::Catalog => 1,
            Self::Schema => 2,
            Self::Table => 3,
        }
    }

    fn from_depth(depth: usize) -> Option<Self> {
        match depth {
            1 => Some(Self::Catalog),
            2 => Some(Self::Schema),
            3 => Some(Self::Table),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Catalog => "CATALOG",
            Self::Schema => "SCHEMA",
            Self::Table => "TABLE",
        }
    }
}

impl fmt::Display for SecurableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SecurableType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CATALOG" => Ok(Self::Catalog),
            "SCHEMA" => Ok(Self::Schema),
            "TABLE" => Ok(Self::Table),
            _ => Err(ModelError::UnknownVariant {
                kind: "securable type",
                value: s.to_string(),
            }),
        }
    }
}

/// The hierarchical location a change applies to, e.g. `SCHEMA prod.finance`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ScopeRepr")]
pub struct Scope {
    pub scope_type: SecurableType,
    pub scope_path: String,
}

#[derive(Deserialize)]
struct ScopeRepr {
    scope_type: SecurableType,
    scope_path: String,
}

impl TryFrom<ScopeRepr> for Scope {
    type Error = ModelError;

    fn try_from(repr: ScopeRepr) -> Result<Self, Self::Error> {
        Scope::new(repr.scope_type, repr.scope_path)
    }
}

impl Scope {
    /// Build a scope, checking that the path matches the securable type.
    pub fn new(scope_type: SecurableType, scope_path: impl Into<String>) -> Result<Self, ModelError> {
        let scope_path = scope_path.into();
        let segments: Vec<&str> = scope_path.split('.').collect();

        if segments.len() != scope_type.depth() {
            return Err(ModelError::InvalidScopePath {
                scope_type: scope_type.to_string(),
                path: scope_path,
                expected: scope_type.depth(),
            });
        }
        for segment in &segments {
            validate_identifier("scope_path", segment)?;
        }

        Ok(Self {
            scope_type,
            scope_path,
        })
    }

    pub fn catalog(name: impl Into<String>) -> Result<Self, ModelError> {
        Self::new(SecurableType::Catalog, name)
    }

    pub fn schema(path: impl Into<String>) -> Result<Self, ModelError> {
        Self::new(SecurableType::Schema, path)
    }

    pub fn table(path: impl Into<String>) -> Result<Self, ModelError> {
        Self::new(SecurableType::Table, path)
    }

    /// Enclosing scopes, nearest first. A table in `a.b.c` yields `SCHEMA a.b`
    /// then `CATALOG a`.
    pub fn ancestors(&self) -> Vec<Scope> {
        let segments: Vec<&str> = self.scope_path.split('.').collect();
        (1..segments.len())
            .rev()
            .filter_map(|depth| {
                SecurableType::from_depth(depth).map(|scope_type| Scope {
                    scope_type,
                    scope_path: segments[..depth].join("."),
                })
            })
            .collect()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.scope_type, self.scope_path)
    }
}
