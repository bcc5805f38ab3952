//! Role predicate
//!
//! `has_role(required, user)` is true iff the user exists, carries a
//! recognized role, and that role is one of `required`. Absent data always
//! degrades to `false`; the predicate never errors.

use crate::role::Role;
use crate::user::User;

/// Source of the current user, e.g. a session store
pub trait CurrentUser {
    /// The signed-in user, if any
    fn current_user(&self) -> Option<User>;
}

/// Check a user against a set of acceptable roles
#[must_use]
pub fn has_role(required: &[Role], user: Option<&User>) -> bool {
    user.and_then(|u| u.role)
        .is_some_and(|role| required.contains(&role))
}

/// Check a user against role names, normalized case-insensitively.
///
/// Unknown names never match.
#[must_use]
pub fn has_role_named<S: AsRef<str>>(required: &[S], user: Option<&User>) -> bool {
    let roles: Vec<Role> = required
        .iter()
        .filter_map(|name| Role::parse_loose(name.as_ref()))
        .collect();
    has_role(&roles, user)
}

/// Check the current user of `source` against a set of acceptable roles
#[must_use]
pub fn has_role_in<S: CurrentUser + ?Sized>(required: &[Role], source: &S) -> bool {
    has_role(required, source.current_user().as_ref())
}

impl User {
    /// Check this user against a set of acceptable roles
    #[inline]
    #[must_use]
    pub fn has_role(&self, required: &[Role]) -> bool {
        has_role(required, Some(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    struct Fixed(Option<User>);

    impl CurrentUser for Fixed {
        fn current_user(&self) -> Option<User> {
            self.0.clone()
        }
    }

    fn user_with_role(role: serde_json::Value) -> User {
        serde_json::from_value(json!({"id": 1, "name": "T", "role": role})).unwrap()
    }

    #[test]
    fn object_role_matches() {
        let user = user_with_role(json!({"role_name": "champion"}));
        assert!(has_role(&[Role::Champion], Some(&user)));
    }

    #[test]
    fn string_role_mismatch() {
        let user = user_with_role(json!("consultant"));
        assert!(!has_role(&[Role::Admin], Some(&user)));
    }

    #[test]
    fn absent_user_or_role_is_false() {
        assert!(!has_role(&Role::ALL, None));
        let roleless = user_with_role(serde_json::Value::Null);
        assert!(!has_role(&Role::ALL, Some(&roleless)));
    }

    #[test]
    fn empty_requirement_is_false() {
        let user = user_with_role(json!("ADMIN"));
        assert!(!has_role(&[], Some(&user)));
    }

    #[test]
    fn named_roles_are_normalized() {
        let user = user_with_role(json!("Governance"));
        assert!(has_role_named(&["governance"], Some(&user)));
        assert!(!has_role_named(&["auditor"], Some(&user)));
    }

    #[test]
    fn current_user_source() {
        let signed_in = Fixed(Some(User::new(1, "A").with_role(Role::Admin)));
        assert!(has_role_in(&[Role::Admin], &signed_in));
        assert!(!has_role_in(&[Role::Admin], &Fixed(None)));
    }

    fn any_role() -> impl Strategy<Value = Role> {
        prop::sample::select(Role::ALL.to_vec())
    }

    fn mixed_case(name: &str, mask: u8) -> String {
        name.chars()
            .enumerate()
            .map(|(i, c)| {
                if mask & (1 << (i % 8)) == 0 {
                    c.to_ascii_lowercase()
                } else {
                    c
                }
            })
            .collect()
    }

    proptest! {
        #[test]
        fn predicate_matches_membership(
            role in any_role(),
            required in prop::collection::vec(any_role(), 0..5),
            mask in any::<u8>(),
            as_object in any::<bool>(),
        ) {
            let spelled = mixed_case(role.as_str(), mask);
            let wire = if as_object {
                json!({"role_name": spelled})
            } else {
                json!(spelled)
            };
            let user = user_with_role(wire);

            prop_assert_eq!(has_role(&required, Some(&user)), required.contains(&role));
        }
    }
}
