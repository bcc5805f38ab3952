//! DKN Client - REST client for the knowledge platform
//!
//! Everything that talks to the server:
//! - Layered configuration and the persisted session
//! - The HTTP client with bearer auth and uniform error shapes
//! - Typed endpoints and lenient record decoding
//! - Hydration, sign-in and the user actions with their status lines
//! - The concurrent dashboard loader
//!
//! Access decisions (roles, navigation, the route gate) live in
//! `dkn-access`; this crate feeds them.
//!
//! # Example
//!
//! ```rust,no_run
//! use dkn_client::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigLoader::new().load()?;
//! let session = Arc::new(FileSessionStore::open(config.session_dir()));
//! let client = ApiClient::from_config(&config, session)?.logout_on_unauthorized();
//!
//! let mut gate = RouteGate::new();
//! hydrate(&client, &mut gate).await?;
//!
//! let mut dashboard = DashboardLoader::new(client.clone());
//! dashboard.start();
//! let data = dashboard.finish().await;
//! println!("{} documents", data.documents.ready().map_or(0, Vec::len));
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod auth;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod detail;
pub mod endpoints;
pub mod error;
pub mod forms;
pub mod hydrate;
pub mod records;
pub mod session;
pub mod transport;
pub mod workflows;

pub use auth::{
    login, logout, register, registration_roles, Registration, RoleChoices, RoleOption, SignedIn,
};
pub use client::{build_url, ApiClient, RequestOptions, UnauthorizedHandler};
pub use config::{ClientConfig, ConfigLoader};
pub use dashboard::{DashboardData, DashboardLoader, Loadable, Resource};
pub use detail::DocumentDetail;
pub use endpoints::{Credentials, RegisterPayload};
pub use error::{ApiError, ConfigError, SessionError, TransportError, TransportErrorKind, ValidationError};
pub use forms::{
    AiJobForm, ExpertiseForm, FieldErrors, Notice, PolicyRuleForm, Rejection, Tone, UpdateForm,
    UploadForm,
};
pub use hydrate::{hydrate, sync_gate};
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionStore};
pub use transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport};
pub use workflows::ValidationQueue;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the client
    pub use crate::{
        hydrate, sync_gate, ApiClient, ApiError, ClientConfig, ConfigLoader, Credentials,
        DashboardLoader, DocumentDetail, FileSessionStore, MemorySessionStore, Notice, Rejection,
        SessionStore,
    };
    pub use dkn_access::prelude::*;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
