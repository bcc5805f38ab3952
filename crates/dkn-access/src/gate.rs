//! Route gate
//!
//! ```text
//!              no token
//!  Hydrating ───────────────────────► Unauthenticated ◄──┐
//!      │                                    │  ▲         │
//!      │ token ─► identity check            │  │ logout  │ identity
//!      │            ok ──► Authenticated ◄──┘  │         │ check failed
//!      │                        │   login      │         │
//!      └────────────────────────┴──────────────┘─────────┘
//! ```
//!
//! Hydration resolves exactly once per gate. While hydrating, protected
//! routes render a loading placeholder rather than redirecting, so a valid
//! token never flashes the login screen. Unauthenticated visits to a
//! protected route are redirected to `/login` with the requested target
//! captured; a later [`RouteGate::login`] returns to it.

use crate::error::AccessError;
use crate::navigation::{NavKey, Navigation};
use crate::user::User;
use tracing::debug;

/// Login screen path
pub const LOGIN_PATH: &str = "/login";

/// Dashboard landing path
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Where a document view returns to when no origin was recorded
pub const DOCUMENT_FALLBACK_PATH: &str = "/dashboard/knowledge";

/// Authentication state of the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    /// Token check not resolved yet
    Hydrating,
    /// No valid session
    Unauthenticated,
    /// Signed in
    Authenticated(User),
}

impl GateState {
    /// Short state name for logs
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            GateState::Hydrating => "hydrating",
            GateState::Unauthenticated => "unauthenticated",
            GateState::Authenticated(_) => "authenticated",
        }
    }
}

/// What the hydration driver must do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydrationStep {
    /// Gate resolved without a network call
    Resolved,
    /// A token is stored; verify it against the identity endpoint
    VerifyIdentity,
}

/// A navigation target: path, optional query and the page it came from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    /// Path, always starting with `/`
    pub path: String,
    /// Query string without the leading `?`
    pub query: Option<String>,
    /// Page that navigated here
    pub from: Option<String>,
}

impl Location {
    /// Parse `path?query#fragment`; the fragment is discarded
    #[must_use]
    pub fn parse(target: &str) -> Self {
        let without_fragment = target.split('#').next().unwrap_or_default();
        let (path, query) = match without_fragment.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string()).filter(|q| !q.is_empty())),
            None => (without_fragment, None),
        };

        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };

        Self {
            path,
            query,
            from: None,
        }
    }

    /// With originating page
    #[must_use]
    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    /// Path plus query, as captured for post-login return
    #[must_use]
    pub fn target(&self) -> String {
        match &self.query {
            Some(query) => format!("{}?{}", self.path, query),
            None => self.path.clone(),
        }
    }
}

/// Routes known to the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/login`
    Login,
    /// `/dashboard/:view?`
    Dashboard {
        /// Requested view segment
        view: Option<String>,
    },
    /// `/documents/:id`
    Document {
        /// Document id segment
        id: String,
    },
    /// `/`
    Root,
    /// Anything else
    Unknown,
}

impl Route {
    /// Match a path against the route table
    #[must_use]
    pub fn parse(path: &str) -> Self {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [] => Route::Root,
            ["login"] => Route::Login,
            ["dashboard"] => Route::Dashboard { view: None },
            ["dashboard", view] => Route::Dashboard {
                view: Some((*view).to_string()),
            },
            ["documents", id] => Route::Document {
                id: (*id).to_string(),
            },
            _ => Route::Unknown,
        }
    }

    /// Check if the route requires a signed-in user
    #[inline]
    #[must_use]
    pub fn is_protected(&self) -> bool {
        matches!(self, Route::Dashboard { .. } | Route::Document { .. })
    }
}

/// Screen to render
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// Login/registration form
    Login,
    /// Dashboard with the active view
    Dashboard(NavKey),
    /// Document detail
    Document {
        /// Document id
        id: String,
        /// Where closing the document returns to
        back_to: String,
    },
}

/// Result of resolving a location through the gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Placeholder while hydrating
    Loading,
    /// Render a screen
    Render(View),
    /// Replace the current location
    Redirect {
        /// New location
        to: String,
        /// Captured destination for post-login return
        from: Option<String>,
    },
}

impl RouteOutcome {
    fn redirect(to: impl Into<String>) -> Self {
        RouteOutcome::Redirect {
            to: to.into(),
            from: None,
        }
    }
}

/// Client-side route gate
#[derive(Debug, Clone)]
pub struct RouteGate {
    state: GateState,
    hydration_started: bool,
    cached_user: Option<User>,
    return_to: Option<String>,
}

impl Default for RouteGate {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteGate {
    /// Create gate in the hydrating state
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: GateState::Hydrating,
            hydration_started: false,
            cached_user: None,
            return_to: None,
        }
    }

    /// Current state
    #[inline]
    #[must_use]
    pub fn state(&self) -> &GateState {
        &self.state
    }

    /// Check if hydration is still pending
    #[inline]
    #[must_use]
    pub fn is_hydrating(&self) -> bool {
        matches!(self.state, GateState::Hydrating)
    }

    /// Signed-in user, or the optimistic cached user while hydrating
    #[must_use]
    pub fn current_user(&self) -> Option<&User> {
        match &self.state {
            GateState::Authenticated(user) => Some(user),
            GateState::Hydrating => self.cached_user.as_ref(),
            GateState::Unauthenticated => None,
        }
    }

    /// Destination captured by the last redirect to login
    #[inline]
    #[must_use]
    pub fn pending_return(&self) -> Option<&str> {
        self.return_to.as_deref()
    }

    /// Start hydration from what the session store holds.
    ///
    /// Without a token the gate resolves to unauthenticated immediately and
    /// the identity endpoint must not be called.
    ///
    /// # Errors
    /// - `AccessError::AlreadyResolved` if hydration already started
    pub fn begin_hydration(
        &mut self,
        token_present: bool,
        cached_user: Option<User>,
    ) -> Result<HydrationStep, AccessError> {
        if self.hydration_started || !self.is_hydrating() {
            return Err(AccessError::AlreadyResolved);
        }
        self.hydration_started = true;

        if !token_present {
            debug!("no stored token, gate unauthenticated");
            self.state = GateState::Unauthenticated;
            return Ok(HydrationStep::Resolved);
        }

        self.cached_user = cached_user;
        Ok(HydrationStep::VerifyIdentity)
    }

    /// Resolve hydration with the identity check result
    ///
    /// # Errors
    /// - `AccessError::AlreadyResolved` if the gate left the hydrating state
    pub fn finish_hydration(&mut self, identity: Option<User>) -> Result<(), AccessError> {
        if !self.is_hydrating() {
            return Err(AccessError::AlreadyResolved);
        }
        self.hydration_started = true;
        self.cached_user = None;
        self.state = match identity {
            Some(user) => GateState::Authenticated(user),
            None => GateState::Unauthenticated,
        };
        debug!(state = self.state.name(), "hydration resolved");
        Ok(())
    }

    /// Record a successful login and return where to go next
    ///
    /// # Errors
    /// - `AccessError::StillHydrating` before hydration resolved
    pub fn login(&mut self, user: User) -> Result<String, AccessError> {
        if self.is_hydrating() {
            return Err(AccessError::StillHydrating);
        }
        self.state = GateState::Authenticated(user);
        Ok(self
            .return_to
            .take()
            .unwrap_or_else(|| DASHBOARD_PATH.to_string()))
    }

    /// Sign out; also resolves a pending hydration
    pub fn logout(&mut self) {
        self.hydration_started = true;
        self.cached_user = None;
        self.state = GateState::Unauthenticated;
    }

    /// Resolve a location to a screen, a redirect, or the loading placeholder
    pub fn resolve(&mut self, location: &Location) -> RouteOutcome {
        let route = Route::parse(&location.path);

        if self.is_hydrating() {
            // Login waits only while a cached user may still be confirmed
            if route == Route::Login && self.cached_user.is_none() {
                return RouteOutcome::Render(View::Login);
            }
            return RouteOutcome::Loading;
        }

        let user = match &self.state {
            GateState::Authenticated(user) => Some(user.clone()),
            _ => None,
        };

        match (route, user) {
            (Route::Login, Some(_)) => RouteOutcome::redirect(DASHBOARD_PATH),
            (Route::Login, None) => RouteOutcome::Render(View::Login),
            (Route::Root | Route::Unknown, Some(_)) => RouteOutcome::redirect(DASHBOARD_PATH),
            (Route::Root | Route::Unknown, None) => RouteOutcome::redirect(LOGIN_PATH),
            (route, None) => {
                debug_assert!(route.is_protected());
                let target = location.target();
                self.return_to = safe_destination(&target);
                RouteOutcome::Redirect {
                    to: LOGIN_PATH.to_string(),
                    from: Some(target),
                }
            }
            (Route::Dashboard { view }, Some(user)) => {
                let selection = Navigation::for_user(Some(&user)).select(view.as_deref());
                match selection.redirect {
                    Some(corrected) => RouteOutcome::redirect(corrected),
                    None => RouteOutcome::Render(View::Dashboard(selection.active)),
                }
            }
            (Route::Document { id }, Some(_)) => RouteOutcome::Render(View::Document {
                id,
                back_to: location
                    .from
                    .clone()
                    .unwrap_or_else(|| DOCUMENT_FALLBACK_PATH.to_string()),
            }),
        }
    }
}

/// Keep only in-app destinations that are worth returning to
fn safe_destination(target: &str) -> Option<String> {
    let in_app = target.starts_with('/') && !target.starts_with("//");
    let is_login = Route::parse(target.split('?').next().unwrap_or_default()) == Route::Login;
    (in_app && !is_login).then(|| target.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::Role;
    use pretty_assertions::assert_eq;

    fn consultant() -> User {
        User::new(1, "Casey").with_role(Role::Consultant)
    }

    fn resolved(identity: Option<User>) -> RouteGate {
        let mut gate = RouteGate::new();
        let step = gate.begin_hydration(true, None).unwrap();
        assert_eq!(step, HydrationStep::VerifyIdentity);
        gate.finish_hydration(identity).unwrap();
        gate
    }

    #[test]
    fn no_token_resolves_without_identity_check() {
        let mut gate = RouteGate::new();
        let step = gate.begin_hydration(false, Some(consultant())).unwrap();
        assert_eq!(step, HydrationStep::Resolved);
        assert_eq!(gate.state(), &GateState::Unauthenticated);
        assert!(gate.current_user().is_none());
    }

    #[test]
    fn login_page_renders_while_hydrating_without_cached_user() {
        let mut gate = RouteGate::new();
        assert_eq!(
            gate.resolve(&Location::parse("/login")),
            RouteOutcome::Render(View::Login)
        );

        gate.begin_hydration(true, None).unwrap();
        assert_eq!(
            gate.resolve(&Location::parse("/login")),
            RouteOutcome::Render(View::Login)
        );
        assert_eq!(
            gate.resolve(&Location::parse("/dashboard")),
            RouteOutcome::Loading
        );
        assert!(gate.is_hydrating());
    }

    #[test]
    fn login_page_waits_for_cached_user_check() {
        let mut gate = RouteGate::new();
        gate.begin_hydration(true, Some(consultant())).unwrap();
        assert_eq!(gate.resolve(&Location::parse("/login")), RouteOutcome::Loading);
    }

    #[test]
    fn hydrating_renders_loading_not_redirect() {
        let mut gate = RouteGate::new();
        gate.begin_hydration(true, Some(consultant())).unwrap();

        let outcome = gate.resolve(&Location::parse("/dashboard/projects"));
        assert_eq!(outcome, RouteOutcome::Loading);
        assert_eq!(gate.current_user(), Some(&consultant()));
    }

    #[test]
    fn hydration_resolves_once() {
        let mut gate = resolved(Some(consultant()));
        assert_eq!(gate.finish_hydration(None), Err(AccessError::AlreadyResolved));
        assert_eq!(
            gate.begin_hydration(true, None),
            Err(AccessError::AlreadyResolved)
        );
    }

    #[test]
    fn failed_identity_check_ends_unauthenticated() {
        let gate = resolved(None);
        assert_eq!(gate.state(), &GateState::Unauthenticated);
    }

    #[test]
    fn unauthenticated_protected_route_captures_target() {
        let mut gate = resolved(None);
        let outcome = gate.resolve(&Location::parse("/dashboard/projects?active_only=false"));
        assert_eq!(
            outcome,
            RouteOutcome::Redirect {
                to: "/login".to_string(),
                from: Some("/dashboard/projects?active_only=false".to_string()),
            }
        );

        let destination = gate.login(consultant()).unwrap();
        assert_eq!(destination, "/dashboard/projects?active_only=false");
        assert_eq!(gate.pending_return(), None);
    }

    #[test]
    fn login_without_capture_goes_to_dashboard() {
        let mut gate = resolved(None);
        assert_eq!(gate.login(consultant()).unwrap(), "/dashboard");
    }

    #[test]
    fn login_rejected_while_hydrating() {
        let mut gate = RouteGate::new();
        assert_eq!(gate.login(consultant()), Err(AccessError::StillHydrating));
    }

    #[test]
    fn authenticated_dashboard_renders_view() {
        let mut gate = resolved(Some(consultant()));
        assert_eq!(
            gate.resolve(&Location::parse("/dashboard/myDocs")),
            RouteOutcome::Render(View::Dashboard(NavKey::MyDocs))
        );
        assert_eq!(
            gate.resolve(&Location::parse("/dashboard")),
            RouteOutcome::Render(View::Dashboard(NavKey::Knowledge))
        );
    }

    #[test]
    fn hidden_view_redirects_to_corrected_url() {
        let mut gate = resolved(Some(consultant()));
        assert_eq!(
            gate.resolve(&Location::parse("/dashboard/admin")),
            RouteOutcome::Redirect {
                to: "/dashboard/knowledge".to_string(),
                from: None
            }
        );
    }

    #[test]
    fn login_and_fallback_routes() {
        let mut signed_in = resolved(Some(consultant()));
        assert_eq!(
            signed_in.resolve(&Location::parse("/login")),
            RouteOutcome::redirect("/dashboard")
        );
        assert_eq!(
            signed_in.resolve(&Location::parse("/nowhere")),
            RouteOutcome::redirect("/dashboard")
        );

        let mut signed_out = resolved(None);
        assert_eq!(
            signed_out.resolve(&Location::parse("/")),
            RouteOutcome::redirect("/login")
        );
        assert_eq!(
            signed_out.resolve(&Location::parse("/login")),
            RouteOutcome::Render(View::Login)
        );
    }

    #[test]
    fn document_route_returns_to_origin() {
        let mut gate = resolved(Some(consultant()));
        let from_queue = Location::parse("/documents/17").with_from("/dashboard/validation");
        assert_eq!(
            gate.resolve(&from_queue),
            RouteOutcome::Render(View::Document {
                id: "17".to_string(),
                back_to: "/dashboard/validation".to_string(),
            })
        );
        assert_eq!(
            gate.resolve(&Location::parse("documents/17")),
            RouteOutcome::Render(View::Document {
                id: "17".to_string(),
                back_to: "/dashboard/knowledge".to_string(),
            })
        );
    }

    #[test]
    fn logout_resolves_pending_hydration() {
        let mut gate = RouteGate::new();
        gate.begin_hydration(true, Some(consultant())).unwrap();
        gate.logout();
        assert_eq!(gate.state(), &GateState::Unauthenticated);
        assert_eq!(gate.finish_hydration(Some(consultant())), Err(AccessError::AlreadyResolved));
    }

    #[test]
    fn location_parsing() {
        let location = Location::parse("/dashboard/audit?page=2#top");
        assert_eq!(location.path, "/dashboard/audit");
        assert_eq!(location.query.as_deref(), Some("page=2"));
        assert_eq!(location.target(), "/dashboard/audit?page=2");
        assert_eq!(Location::parse("/x?").query, None);
    }

    #[test]
    fn unsafe_destinations_are_not_remembered() {
        assert_eq!(safe_destination("//evil.example/x"), None);
        assert_eq!(safe_destination("/login?next=1"), None);
        assert_eq!(safe_destination("/documents/3").as_deref(), Some("/documents/3"));
    }
}
