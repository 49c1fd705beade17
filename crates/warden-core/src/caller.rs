//! Caller identity as resolved from the identity collaborator.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The identity behind a call together with its group memberships.
///
/// Memberships are resolved fresh for every mutating call and never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub identity: String,
    #[serde(default)]
    pub groups: BTreeSet<String>,
}

impl Caller {
    pub fn new<I, S>(identity: impl Into<String>, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            identity: identity.into(),
            groups: groups.into_iter().map(Into::into).collect(),
        }
    }

    /// Exact, case-sensitive group membership check.
    pub fn is_member_of(&self, group: &str) -> bool {
        self.groups.contains(group)
    }
}
