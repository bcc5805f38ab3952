//! Testing utilities for the DKN workspace
//!
//! Shared fixtures and a scripted transport that answers by method and
//! path and records every request it sees.

#![allow(missing_docs)]

use async_trait::async_trait;
use dkn_access::{Role, User};
use dkn_client::{
    ApiClient, HttpRequest, HttpResponse, MemorySessionStore, Method, Transport, TransportError,
    TransportErrorKind,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

pub const TEST_ORIGIN: &str = "https://dkn.test";

#[derive(Debug, Clone)]
enum Reply {
    Response(HttpResponse),
    Failure(TransportError),
}

/// Transport answering from a script keyed by method and path.
///
/// Replies for a route are consumed in order; the last one repeats.
/// Unscripted routes answer 404.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<Reply>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, method: Method, path: &str, reply: Reply) {
        self.routes
            .lock()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
    }

    /// Script a JSON reply
    pub fn on(self, method: Method, path: &str, status: u16, body: Value) -> Self {
        self.push(method, path, Reply::Response(HttpResponse::json(status, &body)));
        self
    }

    /// Script a raw-text reply
    pub fn on_text(self, method: Method, path: &str, status: u16, body: &str) -> Self {
        self.push(method, path, Reply::Response(HttpResponse::new(status, body)));
        self
    }

    /// Script a transport failure
    pub fn fail(self, method: Method, path: &str, kind: TransportErrorKind) -> Self {
        self.push(
            method,
            path,
            Reply::Failure(TransportError::new(kind, "scripted failure")),
        );
        self
    }

    /// Every request seen so far
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    /// Requests seen for a method and path
    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|req| req.method == method && path_of(&req.url) == path)
            .count()
    }

    /// Last request seen for a method and path
    pub fn last(&self, method: Method, path: &str) -> Option<HttpRequest> {
        self.requests
            .lock()
            .iter()
            .rev()
            .find(|req| req.method == method && path_of(&req.url) == path)
            .cloned()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let key = (request.method, path_of(&request.url).to_string());
        self.requests.lock().push(request);

        let reply = {
            let mut routes = self.routes.lock();
            match routes.get_mut(&key) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        match reply {
            Some(Reply::Response(response)) => Ok(response),
            Some(Reply::Failure(err)) => Err(err),
            None => Ok(HttpResponse::json(404, &json!({"message": "Not found"}))),
        }
    }
}

/// Path and query of an absolute URL
pub fn path_of(url: &str) -> &str {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    rest.find('/').map_or("/", |idx| &rest[idx..])
}

/// Client over a scripted transport with an empty session
pub fn scripted_client(transport: ScriptedTransport) -> (ApiClient, Arc<ScriptedTransport>, Arc<MemorySessionStore>) {
    scripted_client_with(transport, MemorySessionStore::new())
}

/// Client over a scripted transport with a given session
pub fn scripted_client_with(
    transport: ScriptedTransport,
    store: MemorySessionStore,
) -> (ApiClient, Arc<ScriptedTransport>, Arc<MemorySessionStore>) {
    let transport = Arc::new(transport);
    let store = Arc::new(store);
    let client = ApiClient::new(TEST_ORIGIN, transport.clone(), store.clone());
    (client, transport, store)
}

/// Signed-in session for a user
pub fn session_for(user: User) -> MemorySessionStore {
    MemorySessionStore::with_session("test-token", user)
}

pub fn user(id: i64, role: Role) -> User {
    User::new(id, format!("{} {id}", role.as_str().to_lowercase())).with_role(role)
}

pub fn consultant() -> User {
    user(10, Role::Consultant)
}

pub fn champion() -> User {
    user(20, Role::Champion)
}

pub fn executive() -> User {
    user(30, Role::Executive)
}

pub fn governance() -> User {
    user(40, Role::Governance)
}

pub fn admin() -> User {
    user(50, Role::Admin)
}

/// Wire form of a user, with the role as an object
pub fn user_json(user: &User) -> Value {
    json!({
        "id": user.id,
        "name": user.name,
        "email": user.email,
        "role": user.role.map(|r| json!({"role_name": r.as_str()})),
    })
}

/// Wire form of a document
pub fn document_json(id: i64, title: &str, status: &str, creator_id: i64) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": null,
        "status": status,
        "confidentiality": "INTERNAL",
        "creator": {"id": creator_id, "name": "Creator"},
        "tags": [{"id": 1, "tag_name": "finance"}],
        "created_at": "2024-05-01T09:30:00Z",
    })
}
