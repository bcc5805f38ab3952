//! Session hydration
//!
//! Resolves a fresh [`RouteGate`] against the stored session. A stored token
//! is verified against `/api/me` exactly once; without a token the identity
//! endpoint is never called.
//!
//! After hydration the store stays the source of truth: when the
//! unauthorized handler clears it on a 401, [`sync_gate`] carries that
//! forced logout into the gate.

use crate::client::ApiClient;
use dkn_access::{AccessError, HydrationStep, RouteGate};
use tracing::{debug, warn};

/// Drive `gate` out of the hydrating state.
///
/// On success the fresh user replaces the cached one. On failure (any
/// error, not only 401) the session is cleared and the gate resolves
/// unauthenticated.
///
/// # Errors
/// - `AccessError::AlreadyResolved` if the gate was hydrated before
pub async fn hydrate(client: &ApiClient, gate: &mut RouteGate) -> Result<(), AccessError> {
    let session = client.session();
    let token = session.token();

    let step = gate.begin_hydration(token.is_some(), session.user())?;
    if step == HydrationStep::Resolved {
        if let Err(err) = session.clear() {
            warn!(error = %err, "failed to clear stale session");
        }
        return Ok(());
    }

    match client.me().await {
        Ok(user) => {
            if let Err(err) = session.set_user(&user) {
                warn!(error = %err, "failed to cache refreshed user");
            }
            debug!(user = user.display_name(), "session verified");
            gate.finish_hydration(Some(user))
        }
        Err(err) => {
            warn!(error = %err, "session check failed, signing out");
            if let Err(err) = session.clear() {
                warn!(error = %err, "failed to clear session");
            }
            gate.finish_hydration(None)
        }
    }
}

/// Sign the gate out if its user no longer has a stored session.
///
/// Returns `true` when the gate was signed out by this call.
pub fn sync_gate(client: &ApiClient, gate: &mut RouteGate) -> bool {
    if gate.is_hydrating() || gate.current_user().is_none() {
        return false;
    }
    if client.session().token().is_some() {
        return false;
    }
    warn!("stored session is gone, signing out");
    gate.logout();
    true
}
