//! DKN Access - role-aware view model for the knowledge platform client
//!
//! Everything the client decides locally before (or instead of) asking the
//! server lives here:
//! - Role tiers and the role predicate
//! - The role-filtered navigation tree
//! - The route gate (hydrating / unauthenticated / authenticated)
//! - The advisory document edit gate
//!
//! Nothing in this crate performs I/O. The `dkn-client` crate feeds it users
//! decoded from the REST API and drives the gate through hydration.
//!
//! # Example
//!
//! ```rust
//! use dkn_access::{has_role, Navigation, NavKey, Role, User};
//!
//! let user = User::new("7", "Ada Lovelace").with_role(Role::Consultant);
//!
//! assert!(!has_role(&[Role::Governance], Some(&user)));
//!
//! let nav = Navigation::for_user(Some(&user));
//! assert!(nav.contains(NavKey::Knowledge));
//! assert!(!nav.contains(NavKey::Audit));
//! ```

#![warn(unreachable_pub)]

pub mod document;
pub mod error;
pub mod gate;
pub mod navigation;
pub mod predicate;
pub mod role;
pub mod user;

pub use document::{
    format_status, Confidentiality, DocumentAccess, DocumentStatus, StatusOption, STATUS_OPTIONS,
};
pub use error::AccessError;
pub use gate::{GateState, HydrationStep, Location, Route, RouteGate, RouteOutcome, View};
pub use navigation::{NavItem, NavKey, NavSection, Navigation, Section, Selection, Visibility};
pub use predicate::{has_role, has_role_in, has_role_named, CurrentUser};
pub use role::{normalize_role, Role};
pub use user::{EntityId, User};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the access model
    pub use crate::{
        has_role, AccessError, DocumentAccess, DocumentStatus, EntityId, GateState,
        HydrationStep, Location, NavKey, Navigation, Role, RouteGate, RouteOutcome, User, View,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
