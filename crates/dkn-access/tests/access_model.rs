//! End-to-end checks of the access model as the client shell uses it

use dkn_access::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::json;

fn decode(value: serde_json::Value) -> User {
    serde_json::from_value(value).unwrap()
}

#[test]
fn login_response_user_drives_navigation() {
    let user = decode(json!({
        "id": 4,
        "name": "Priya Raman",
        "email": "priya@example.com",
        "role": {"id": 3, "role_name": "governance"}
    }));

    let nav = Navigation::for_user(Some(&user));
    let labels: Vec<&str> = nav.sections().iter().map(|s| s.label).collect();
    assert_eq!(
        labels,
        vec!["Knowledge", "Contribute", "Review", "Engagement"]
    );
    assert!(nav.contains(NavKey::Audit));
}

#[test]
fn consultant_has_no_audit_logs_item() {
    let user = decode(json!({"id": 1, "name": "C", "role": "consultant"}));
    let nav = Navigation::for_user(Some(&user));
    assert!(nav.items().all(|item| item.label != "Audit logs"));
}

#[test]
fn role_field_precedence_in_objects() {
    let user = decode(json!({"id": 1, "role": {"role_name": "", "name": "admin", "role": "champion"}}));
    assert_eq!(user.role, Some(Role::Admin));
}

#[test]
fn full_session_through_the_gate() {
    let mut gate = RouteGate::new();
    let cached = decode(json!({"id": 9, "name": "Ola", "role": "CHAMPION"}));

    assert_eq!(
        gate.begin_hydration(true, Some(cached.clone())).unwrap(),
        HydrationStep::VerifyIdentity
    );
    assert_eq!(
        gate.resolve(&Location::parse("/dashboard/validation")),
        RouteOutcome::Loading
    );

    gate.finish_hydration(Some(cached)).unwrap();
    assert_eq!(
        gate.resolve(&Location::parse("/dashboard/validation")),
        RouteOutcome::Render(View::Dashboard(NavKey::Validation))
    );
    assert_eq!(
        gate.resolve(&Location::parse("/dashboard/audit")),
        RouteOutcome::Redirect {
            to: "/dashboard/knowledge".to_string(),
            from: None,
        }
    );

    gate.logout();
    assert_eq!(
        gate.resolve(&Location::parse("/documents/31")),
        RouteOutcome::Redirect {
            to: "/login".to_string(),
            from: Some("/documents/31".to_string()),
        }
    );

    let again = User::new(9, "Ola").with_role(Role::Champion);
    assert_eq!(gate.login(again).unwrap(), "/documents/31");
}

#[test]
fn owner_edit_gate_over_the_lifecycle() {
    let owner = User::new(42, "Owner").with_role(Role::Consultant);
    let governance = User::new(1, "Gov").with_role(Role::Governance);
    let creator = EntityId::from("42");

    let draft = DocumentAccess::evaluate(Some(&owner), Some(&creator), Some(&DocumentStatus::Draft));
    assert!(draft.can_edit);

    let validated = DocumentStatus::parse("VALIDATED");
    assert!(!DocumentAccess::evaluate(Some(&owner), Some(&creator), Some(&validated)).can_edit);
    assert!(DocumentAccess::evaluate(Some(&governance), Some(&creator), Some(&validated)).can_edit);
}
