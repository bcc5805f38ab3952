//! Sign-in, registration and sign-out
//!
//! Both sign-in paths end the same way: the token and user are stored
//! together, the gate is told, and the caller gets the destination (the
//! captured post-login target, else the dashboard).

use crate::client::ApiClient;
use crate::endpoints::{Credentials, RegisterPayload};
use crate::error::ApiError;
use crate::forms::{FieldErrors, Notice, Rejection};
use crate::records::RoleRecord;
use dkn_access::gate::LOGIN_PATH;
use dkn_access::{EntityId, Role, RouteGate, User};
use tracing::{info, warn};

/// Shown when sign-in or registration fails without any message
pub const AUTH_FALLBACK: &str = "Unable to authenticate. Check your details and try again.";

/// Shown when the role list could not be fetched
pub const ROLES_FALLBACK_NOTICE: &str = "Unable to load roles from the API, using defaults.";

/// Roles offered when the server list is unavailable
pub const DEFAULT_ROLES: [Role; 4] = [
    Role::Consultant,
    Role::Champion,
    Role::Executive,
    Role::Governance,
];

/// One role a new account may pick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleOption {
    /// Server id, `None` for the built-in defaults
    pub id: Option<EntityId>,
    /// Role name as sent to the server
    pub role_name: String,
}

/// Roles offered on the registration form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleChoices {
    /// Options in display order; the first is preselected
    pub options: Vec<RoleOption>,
    /// Set when the defaults replaced an unusable server answer
    pub notice: Option<Notice>,
    from_api: bool,
}

impl RoleChoices {
    /// Built-in role list
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            options: DEFAULT_ROLES
                .iter()
                .map(|role| RoleOption {
                    id: None,
                    role_name: role.as_str().to_string(),
                })
                .collect(),
            notice: None,
            from_api: false,
        }
    }

    fn fallback() -> Self {
        Self {
            notice: Some(Notice::error(ROLES_FALLBACK_NOTICE)),
            ..Self::defaults()
        }
    }

    /// Build from server records. ADMIN is never offered; an empty result
    /// falls back to the defaults.
    #[must_use]
    pub fn from_records(records: Vec<RoleRecord>) -> Self {
        let options: Vec<RoleOption> = records
            .into_iter()
            .filter_map(|record| {
                let role_name = record.role_name.filter(|name| !name.is_empty())?;
                (!role_name.eq_ignore_ascii_case("ADMIN")).then_some(RoleOption {
                    id: record.id,
                    role_name,
                })
            })
            .collect();

        if options.is_empty() {
            return Self::defaults();
        }
        Self {
            options,
            notice: None,
            from_api: true,
        }
    }

    /// Check if the options came from the server
    #[inline]
    #[must_use]
    pub fn from_api(&self) -> bool {
        self.from_api
    }

    /// Preselected option
    #[must_use]
    pub fn selected(&self) -> Option<&RoleOption> {
        self.options.first()
    }

    /// Option by name, case-insensitive
    #[must_use]
    pub fn find(&self, role_name: &str) -> Option<&RoleOption> {
        self.options
            .iter()
            .find(|opt| opt.role_name.eq_ignore_ascii_case(role_name))
    }
}

/// Result of a successful sign-in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedIn {
    /// Signed-in user
    pub user: User,
    /// Where to go next
    pub destination: String,
}

/// Registration form
#[derive(Debug, Clone, Default)]
pub struct Registration {
    /// Display name
    pub name: String,
    /// Login email
    pub email: String,
    /// Password
    pub password: String,
    /// Requested role name; the preselected option when `None`
    pub role: Option<String>,
}

/// Message for a failed sign-in or registration
#[must_use]
pub fn auth_message(err: &ApiError) -> String {
    if let Some(message) = err.server_message() {
        return message.to_string();
    }
    let text = err.to_string();
    if text.is_empty() {
        AUTH_FALLBACK.to_string()
    } else {
        text
    }
}

/// Load the roles offered to a new account.
///
/// Without a stored token the defaults are used and nothing is sent. Any
/// failure or non-list answer also yields the defaults, with a notice.
pub async fn registration_roles(client: &ApiClient) -> RoleChoices {
    let Some(token) = client.session().token() else {
        return RoleChoices::defaults();
    };

    match client.role_records(&token).await {
        Ok(Some(records)) => RoleChoices::from_records(records),
        Ok(None) => RoleChoices::fallback(),
        Err(err) => {
            warn!(error = %err, "role list unavailable");
            RoleChoices::fallback()
        }
    }
}

/// Sign in with email and password
///
/// # Errors
/// - `Rejection` with the auth message when the server refuses, or when
///   the session cannot be stored
pub async fn login(
    client: &ApiClient,
    gate: &mut RouteGate,
    credentials: &Credentials,
) -> Result<SignedIn, Rejection> {
    let auth = client
        .login(credentials)
        .await
        .map_err(|err| Rejection::message(auth_message(&err)))?;

    client
        .session()
        .set(&auth.token, &auth.user)
        .map_err(|err| Rejection::message(err.to_string()))?;
    let destination = gate
        .login(auth.user.clone())
        .map_err(|err| Rejection::message(err.to_string()))?;

    info!(user = auth.user.display_name(), %destination, "signed in");
    Ok(SignedIn {
        user: auth.user,
        destination,
    })
}

/// Create an account, then sign in with the same credentials
///
/// # Errors
/// - `Rejection` when the role is not offered, or registration or the
///   follow-up sign-in fails
pub async fn register(
    client: &ApiClient,
    gate: &mut RouteGate,
    choices: &RoleChoices,
    registration: &Registration,
) -> Result<SignedIn, Rejection> {
    let option = match &registration.role {
        Some(name) => choices.find(name),
        None => choices.selected(),
    };
    let Some(option) = option else {
        let offered: Vec<&str> = choices.options.iter().map(|o| o.role_name.as_str()).collect();
        return Err(Rejection {
            notice: Notice::error(AUTH_FALLBACK),
            fields: FieldErrors::new().with("role", format!("Choose one of: {}", offered.join(", "))),
        });
    };

    let payload = RegisterPayload {
        name: registration.name.clone(),
        email: registration.email.clone(),
        password: registration.password.clone(),
        role: option.role_name.clone(),
        role_id: if choices.from_api() { option.id.clone() } else { None },
    };
    client
        .register(&payload)
        .await
        .map_err(|err| Rejection::message(auth_message(&err)))?;
    info!(email = %payload.email, role = %payload.role, "account registered");

    login(
        client,
        gate,
        &Credentials::new(registration.email.clone(), registration.password.clone()),
    )
    .await
}

/// Sign out and return the login path
pub fn logout(client: &ApiClient, gate: &mut RouteGate) -> &'static str {
    if let Err(err) = client.session().clear() {
        warn!(error = %err, "failed to clear session");
    }
    gate.logout();
    info!("signed out");
    LOGIN_PATH
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MemorySessionStore, SessionStore};
    use crate::transport::{HttpResponse, MockTransport};
    use dkn_access::{GateState, HydrationStep, Location, RouteOutcome};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    fn client(transport: MockTransport, store: Arc<MemorySessionStore>) -> ApiClient {
        ApiClient::new("https://dkn.example", Arc::new(transport), store)
    }

    fn resolved_gate() -> RouteGate {
        let mut gate = RouteGate::new();
        assert_eq!(gate.begin_hydration(false, None), Ok(HydrationStep::Resolved));
        gate
    }

    fn names(choices: &RoleChoices) -> Vec<&str> {
        choices.options.iter().map(|o| o.role_name.as_str()).collect()
    }

    #[tokio::test]
    async fn roles_without_token_use_defaults_silently() {
        let mut transport = MockTransport::new();
        transport.expect_send().never();
        let choices = registration_roles(&client(transport, Arc::new(MemorySessionStore::new()))).await;

        assert_eq!(names(&choices), ["CONSULTANT", "CHAMPION", "EXECUTIVE", "GOVERNANCE"]);
        assert_eq!(choices.notice, None);
        assert!(!choices.from_api());
    }

    #[tokio::test]
    async fn roles_from_api_drop_admin() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(1).returning(|req| {
            assert_eq!(req.header("authorization"), Some("Bearer tok"));
            Ok(HttpResponse::json(
                200,
                &json!([
                    {"id": 1, "role_name": "admin"},
                    {"id": 2, "role_name": "CHAMPION"},
                    {"id": 3, "role_name": "EXECUTIVE"}
                ]),
            ))
        });
        let store = Arc::new(MemorySessionStore::with_session("tok", User::new(1, "Ada")));
        let choices = registration_roles(&client(transport, store)).await;

        assert_eq!(names(&choices), ["CHAMPION", "EXECUTIVE"]);
        assert_eq!(choices.selected().and_then(|o| o.id.clone()), Some(EntityId::Number(2)));
    }

    #[tokio::test]
    async fn unusable_role_list_falls_back_with_notice() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_| Ok(HttpResponse::json(200, &json!({"roles": []}))));
        let store = Arc::new(MemorySessionStore::with_session("tok", User::new(1, "Ada")));
        let choices = registration_roles(&client(transport, store)).await;

        assert_eq!(choices.options.len(), 4);
        assert_eq!(
            choices.notice.map(|n| n.text),
            Some(ROLES_FALLBACK_NOTICE.to_string())
        );
    }

    #[test]
    fn empty_filtered_list_uses_defaults() {
        let choices = RoleChoices::from_records(vec![RoleRecord {
            id: Some(EntityId::Number(9)),
            role_name: Some("Admin".to_string()),
        }]);
        assert!(!choices.from_api());
        assert_eq!(choices.options.len(), 4);
    }

    #[tokio::test]
    async fn login_stores_session_and_returns_captured_target() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(1).returning(|_| {
            Ok(HttpResponse::json(
                200,
                &json!({"token": "new", "user": {"id": 4, "name": "Lin", "role": "CHAMPION"}}),
            ))
        });
        let store = Arc::new(MemorySessionStore::new());
        let client = client(transport, Arc::clone(&store));

        let mut gate = resolved_gate();
        let outcome = gate.resolve(&Location::parse("/documents/9"));
        assert!(matches!(outcome, RouteOutcome::Redirect { .. }));

        let signed_in = login(&client, &mut gate, &Credentials::new("lin@x", "pw"))
            .await
            .unwrap();
        assert_eq!(signed_in.destination, "/documents/9");
        assert_eq!(store.token().as_deref(), Some("new"));
        assert!(matches!(gate.state(), GateState::Authenticated(_)));
    }

    #[tokio::test]
    async fn login_failure_messages() {
        let mut transport = MockTransport::new();
        let mut replies = vec![
            HttpResponse::json(401, &json!({"message": "Invalid credentials"})),
            HttpResponse::new(500, ""),
        ]
        .into_iter();
        transport
            .expect_send()
            .times(2)
            .returning(move |_| Ok(replies.next().unwrap()));
        let store = Arc::new(MemorySessionStore::new());
        let client = client(transport, Arc::clone(&store));
        let mut gate = resolved_gate();

        let first = login(&client, &mut gate, &Credentials::new("a", "b")).await.unwrap_err();
        assert_eq!(first.notice.text, "Invalid credentials");

        let second = login(&client, &mut gate, &Credentials::new("a", "b")).await.unwrap_err();
        assert_eq!(second.notice.text, "API error: 500");
        assert_eq!(store.token(), None);
    }

    #[tokio::test]
    async fn register_then_login() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req| req.url.ends_with("/api/register"))
            .times(1)
            .returning(|req| {
                assert_eq!(
                    req.body,
                    Some(json!({
                        "name": "Lin",
                        "email": "lin@x",
                        "password": "pw",
                        "role": "CHAMPION",
                        "role_id": null
                    }))
                );
                Ok(HttpResponse::json(201, &json!({"id": 4})))
            });
        transport
            .expect_send()
            .withf(|req| req.url.ends_with("/api/login"))
            .times(1)
            .returning(|_| {
                Ok(HttpResponse::json(
                    200,
                    &json!({"token": "t", "user": {"id": 4, "name": "Lin"}}),
                ))
            });
        let store = Arc::new(MemorySessionStore::new());
        let client = client(transport, Arc::clone(&store));
        let mut gate = resolved_gate();

        let registration = Registration {
            name: "Lin".to_string(),
            email: "lin@x".to_string(),
            password: "pw".to_string(),
            role: Some("champion".to_string()),
        };
        let signed_in = register(&client, &mut gate, &RoleChoices::defaults(), &registration)
            .await
            .unwrap();
        assert_eq!(signed_in.destination, "/dashboard");
        assert_eq!(store.token().as_deref(), Some("t"));
    }

    #[tokio::test]
    async fn unknown_role_is_rejected_locally() {
        let mut transport = MockTransport::new();
        transport.expect_send().never();
        let client = client(transport, Arc::new(MemorySessionStore::new()));
        let registration = Registration {
            role: Some("ADMIN".to_string()),
            ..Registration::default()
        };
        let rejection = register(&client, &mut resolved_gate(), &RoleChoices::defaults(), &registration)
            .await
            .unwrap_err();
        assert!(rejection.fields.get("role").is_some());
    }

    #[test]
    fn logout_clears_everything() {
        let mut transport = MockTransport::new();
        transport.expect_send().never();
        let store = Arc::new(MemorySessionStore::with_session("tok", User::new(1, "Ada")));
        let client = client(transport, Arc::clone(&store));
        let mut gate = RouteGate::new();

        assert_eq!(logout(&client, &mut gate), "/login");
        assert_eq!(gate.state(), &GateState::Unauthenticated);
        assert_eq!(store.token(), None);
    }
}
