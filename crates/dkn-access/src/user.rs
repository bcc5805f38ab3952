//! User identity as seen by the client
//!
//! Users arrive from `/api/me`, `/api/login` and the persisted session. All
//! three paths decode through [`WireUser`], so the role is normalized exactly
//! once and downstream code only ever sees `Option<Role>`.

use crate::role::{normalize_role, Role};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Server-assigned identifier.
///
/// The API is inconsistent about numeric vs string ids, so both are kept
/// in their wire form and compared by their textual value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    /// Numeric id
    Number(i64),
    /// String id
    Text(String),
}

impl EntityId {
    /// Textual form used for comparisons and URLs
    #[must_use]
    pub fn as_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Number(n) => write!(f, "{n}"),
            EntityId::Text(s) => f.write_str(s),
        }
    }
}

impl PartialEq for EntityId {
    fn eq(&self, other: &Self) -> bool {
        self.as_text() == other.as_text()
    }
}

impl Eq for EntityId {}

impl Hash for EntityId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_text().hash(state);
    }
}

impl From<i64> for EntityId {
    fn from(value: i64) -> Self {
        EntityId::Number(value)
    }
}

impl From<i32> for EntityId {
    fn from(value: i32) -> Self {
        EntityId::Number(i64::from(value))
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        EntityId::Text(value.to_string())
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        EntityId::Text(value)
    }
}

/// Authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireUser")]
pub struct User {
    /// Server id
    pub id: Option<EntityId>,
    /// Display name
    pub name: Option<String>,
    /// Login email
    pub email: Option<String>,
    /// Normalized role, `None` when absent or unrecognized
    pub role: Option<Role>,
}

impl User {
    /// Create user with id and display name
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<EntityId>, name: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            name: Some(name.into()),
            email: None,
            role: None,
        }
    }

    /// With role
    #[inline]
    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// With email
    #[inline]
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Display name, `"User"` when the server sent none
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().filter(|n| !n.is_empty()).unwrap_or("User")
    }

    /// Role label for the user chip
    #[must_use]
    pub fn role_label(&self) -> &'static str {
        self.role.map_or("User", |role| role.as_str())
    }

    /// Up to two upper-case initials from the display name, `"U"` if none
    #[must_use]
    pub fn initials(&self) -> String {
        let initials: String = self
            .name
            .as_deref()
            .unwrap_or_default()
            .split_whitespace()
            .take(2)
            .filter_map(|part| part.chars().next())
            .collect::<String>()
            .to_uppercase();

        if initials.is_empty() {
            "U".to_string()
        } else {
            initials
        }
    }

    /// Check if this user is the given record owner
    #[must_use]
    pub fn owns(&self, creator: Option<&EntityId>) -> bool {
        matches!((self.id.as_ref(), creator), (Some(me), Some(owner)) if me == owner)
    }
}

/// Wire shape of a user record, before role normalization
#[derive(Debug, Deserialize)]
struct WireUser {
    #[serde(default)]
    id: Option<EntityId>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    role: Value,
}

impl From<WireUser> for User {
    fn from(wire: WireUser) -> Self {
        Self {
            id: wire.id,
            name: wire.name,
            email: wire.email,
            role: normalize_role(&wire.role),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn decodes_object_role() {
        let user: User = serde_json::from_value(json!({
            "id": 12,
            "name": "Grace Hopper",
            "role": {"id": 2, "role_name": "champion"}
        }))
        .unwrap();

        assert_eq!(user.role, Some(Role::Champion));
        assert_eq!(user.id, Some(EntityId::Number(12)));
    }

    #[test]
    fn decodes_missing_role_as_none() {
        let user: User = serde_json::from_value(json!({"id": "u-1", "name": "X"})).unwrap();
        assert_eq!(user.role, None);
        assert_eq!(user.role_label(), "User");
    }

    #[test]
    fn persisted_form_round_trips() {
        let user = User::new(3, "Alan Turing").with_role(Role::Governance);
        let stored = serde_json::to_string(&user).unwrap();
        let restored: User = serde_json::from_str(&stored).unwrap();
        assert_eq!(restored, user);
    }

    #[test]
    fn entity_ids_compare_textually() {
        assert_eq!(EntityId::Number(5), EntityId::from("5"));
        assert_ne!(EntityId::Number(5), EntityId::from("05"));
    }

    #[test]
    fn initials_take_first_two_words() {
        assert_eq!(User::new(1, "ada king lovelace").initials(), "AK");
        assert_eq!(User::new(1, "   ").initials(), "U");
    }

    #[test]
    fn ownership_requires_both_ids() {
        let user = User::new(9, "Owner");
        assert!(user.owns(Some(&EntityId::from("9"))));
        assert!(!user.owns(None));

        let anonymous = User {
            id: None,
            ..User::new(9, "Nobody")
        };
        assert!(!anonymous.owns(Some(&EntityId::Number(9))));
    }
}
