//! Role tiers
//!
//! The platform knows five roles. The server reports a user's role either
//! as a plain string (`"champion"`) or as an object carrying one of several
//! name fields (`{"role_name": "CHAMPION"}`, `{"name": ...}`, `{"role": ...}`).
//! [`normalize_role`] folds every shape into a [`Role`] once, when a user
//! record is decoded.

use crate::error::AccessError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Object fields checked for a role name, in priority order
const ROLE_NAME_FIELDS: [&str; 3] = ["role_name", "name", "role"];

/// Role tier used for every visibility and edit-permission check
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Regular contributor
    Consultant,
    /// Knowledge champion, validates submissions
    Champion,
    /// Executive reader
    Executive,
    /// Platform administrator
    Admin,
    /// Governance officer
    Governance,
}

impl Role {
    /// Every role tier, in declaration order
    pub const ALL: [Role; 5] = [
        Role::Consultant,
        Role::Champion,
        Role::Executive,
        Role::Admin,
        Role::Governance,
    ];

    /// Roles allowed to edit locked documents and manage document add-ons
    pub const GOVERNANCE_TIER: [Role; 3] = [Role::Champion, Role::Governance, Role::Admin];

    /// Canonical upper-case name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Consultant => "CONSULTANT",
            Role::Champion => "CHAMPION",
            Role::Executive => "EXECUTIVE",
            Role::Admin => "ADMIN",
            Role::Governance => "GOVERNANCE",
        }
    }

    /// Check if this role belongs to the governance tier
    #[inline]
    #[must_use]
    pub fn is_governance_tier(self) -> bool {
        Self::GOVERNANCE_TIER.contains(&self)
    }

    /// Parse a role name case-insensitively, `None` for anything unknown
    #[must_use]
    pub fn parse_loose(name: &str) -> Option<Role> {
        let upper = name.to_uppercase();
        Self::ALL.into_iter().find(|role| role.as_str() == upper)
    }
}

impl FromStr for Role {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::parse_loose(s).ok_or_else(|| AccessError::UnknownRole(s.to_string()))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalize a wire role value into a [`Role`].
///
/// Strings are matched case-insensitively. Objects are probed for
/// `role_name`, then `name`, then `role`; the first non-empty field wins
/// even when its value is not a known role. Anything else is `None`.
#[must_use]
pub fn normalize_role(value: &Value) -> Option<Role> {
    match value {
        Value::String(name) => Role::parse_loose(name),
        Value::Object(fields) => ROLE_NAME_FIELDS
            .iter()
            .filter_map(|field| fields.get(*field))
            .find(|candidate| is_present(candidate))
            .and_then(role_name_of)
            .and_then(|name| Role::parse_loose(&name)),
        _ => None,
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn role_name_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
