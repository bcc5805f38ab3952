//! Dashboard bootstrap
//!
//! The dashboard fans out ten independent loads. Each one settles on its
//! own: a failed resource is marked failed and the rest still render.
//! Reloading a resource bumps its generation, so a slower earlier response
//! can never overwrite a newer one. Dropping the loader aborts whatever is
//! still in flight.

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::records::{
    Constraint, Document, ExpertiseProfile, Gamification, LeaderboardEntry, Office, Project, Tag,
    Workspace,
};
use std::fmt;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// State of one dashboard resource
#[derive(Debug, Clone, PartialEq)]
pub enum Loadable<T> {
    /// Request in flight
    Loading,
    /// Loaded
    Ready(T),
    /// Request failed
    Failed(String),
}

impl<T> Default for Loadable<T> {
    fn default() -> Self {
        Loadable::Loading
    }
}

impl<T> Loadable<T> {
    /// Loaded value
    #[inline]
    #[must_use]
    pub fn ready(&self) -> Option<&T> {
        match self {
            Loadable::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// Check if still loading
    #[inline]
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Loadable::Loading)
    }

    /// Failure message
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Loadable::Failed(message) => Some(message),
            _ => None,
        }
    }

    fn settle(result: Result<T, ApiError>) -> Self {
        match result {
            Ok(value) => Loadable::Ready(value),
            Err(err) => Loadable::Failed(err.to_string()),
        }
    }
}

const RESOURCE_COUNT: usize = 10;

/// Resources loaded by the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// Validated knowledge
    Documents,
    /// The user's own submissions
    MyDocuments,
    /// Projects
    Projects,
    /// Workspaces
    Workspaces,
    /// Tags
    Tags,
    /// Offices
    Offices,
    /// Regulatory constraints
    Constraints,
    /// Leaderboard
    Leaderboard,
    /// Points and badges
    Gamification,
    /// Expertise profile
    Expertise,
}

impl Resource {
    /// Every resource, in load order
    pub const ALL: [Resource; RESOURCE_COUNT] = [
        Resource::Documents,
        Resource::MyDocuments,
        Resource::Projects,
        Resource::Workspaces,
        Resource::Tags,
        Resource::Offices,
        Resource::Constraints,
        Resource::Leaderboard,
        Resource::Gamification,
        Resource::Expertise,
    ];

    /// Human-readable name
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Resource::Documents => "documents",
            Resource::MyDocuments => "my documents",
            Resource::Projects => "projects",
            Resource::Workspaces => "workspaces",
            Resource::Tags => "tags",
            Resource::Offices => "offices",
            Resource::Constraints => "regulatory constraints",
            Resource::Leaderboard => "leaderboard",
            Resource::Gamification => "gamification",
            Resource::Expertise => "expertise profile",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Everything the dashboard shows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardData {
    /// Validated knowledge
    pub documents: Loadable<Vec<Document>>,
    /// The user's own submissions
    pub my_documents: Loadable<Vec<Document>>,
    /// Projects
    pub projects: Loadable<Vec<Project>>,
    /// Workspaces
    pub workspaces: Loadable<Vec<Workspace>>,
    /// Tags
    pub tags: Loadable<Vec<Tag>>,
    /// Offices
    pub offices: Loadable<Vec<Office>>,
    /// Regulatory constraints
    pub constraints: Loadable<Vec<Constraint>>,
    /// Leaderboard
    pub leaderboard: Loadable<Vec<LeaderboardEntry>>,
    /// Points and badges; `None` when the server has none
    pub gamification: Loadable<Option<Gamification>>,
    /// Expertise profile; `None` when the server has none
    pub expertise: Loadable<Option<ExpertiseProfile>>,
}

impl DashboardData {
    fn mark_loading(&mut self, resource: Resource) {
        match resource {
            Resource::Documents => self.documents = Loadable::Loading,
            Resource::MyDocuments => self.my_documents = Loadable::Loading,
            Resource::Projects => self.projects = Loadable::Loading,
            Resource::Workspaces => self.workspaces = Loadable::Loading,
            Resource::Tags => self.tags = Loadable::Loading,
            Resource::Offices => self.offices = Loadable::Loading,
            Resource::Constraints => self.constraints = Loadable::Loading,
            Resource::Leaderboard => self.leaderboard = Loadable::Loading,
            Resource::Gamification => self.gamification = Loadable::Loading,
            Resource::Expertise => self.expertise = Loadable::Loading,
        }
    }

    fn apply(&mut self, loaded: Loaded) {
        match loaded {
            Loaded::Documents(r) => self.documents = Loadable::settle(r),
            Loaded::MyDocuments(r) => self.my_documents = Loadable::settle(r),
            Loaded::Projects(r) => self.projects = Loadable::settle(r),
            Loaded::Workspaces(r) => self.workspaces = Loadable::settle(r),
            Loaded::Tags(r) => self.tags = Loadable::settle(r),
            Loaded::Offices(r) => self.offices = Loadable::settle(r),
            Loaded::Constraints(r) => self.constraints = Loadable::settle(r),
            Loaded::Leaderboard(r) => self.leaderboard = Loadable::settle(r),
            Loaded::Gamification(r) => self.gamification = Loadable::settle(r),
            Loaded::Expertise(r) => self.expertise = Loadable::settle(r),
        }
    }

    /// Resources that failed, with their messages
    #[must_use]
    pub fn failures(&self) -> Vec<(Resource, &str)> {
        let errors = [
            self.documents.error(),
            self.my_documents.error(),
            self.projects.error(),
            self.workspaces.error(),
            self.tags.error(),
            self.offices.error(),
            self.constraints.error(),
            self.leaderboard.error(),
            self.gamification.error(),
            self.expertise.error(),
        ];
        Resource::ALL
            .into_iter()
            .zip(errors)
            .filter_map(|(resource, error)| error.map(|e| (resource, e)))
            .collect()
    }
}

enum Loaded {
    Documents(Result<Vec<Document>, ApiError>),
    MyDocuments(Result<Vec<Document>, ApiError>),
    Projects(Result<Vec<Project>, ApiError>),
    Workspaces(Result<Vec<Workspace>, ApiError>),
    Tags(Result<Vec<Tag>, ApiError>),
    Offices(Result<Vec<Office>, ApiError>),
    Constraints(Result<Vec<Constraint>, ApiError>),
    Leaderboard(Result<Vec<LeaderboardEntry>, ApiError>),
    Gamification(Result<Option<Gamification>, ApiError>),
    Expertise(Result<Option<ExpertiseProfile>, ApiError>),
}

impl Loaded {
    fn failure(&self) -> Option<&ApiError> {
        match self {
            Loaded::Documents(r) | Loaded::MyDocuments(r) => r.as_ref().err(),
            Loaded::Projects(r) => r.as_ref().err(),
            Loaded::Workspaces(r) => r.as_ref().err(),
            Loaded::Tags(r) => r.as_ref().err(),
            Loaded::Offices(r) => r.as_ref().err(),
            Loaded::Constraints(r) => r.as_ref().err(),
            Loaded::Leaderboard(r) => r.as_ref().err(),
            Loaded::Gamification(r) => r.as_ref().err(),
            Loaded::Expertise(r) => r.as_ref().err(),
        }
    }
}

async fn fetch(client: &ApiClient, resource: Resource, active_only: bool) -> Loaded {
    match resource {
        Resource::Documents => Loaded::Documents(client.documents().await),
        Resource::MyDocuments => Loaded::MyDocuments(client.my_documents().await),
        Resource::Projects => Loaded::Projects(client.projects(active_only).await),
        Resource::Workspaces => Loaded::Workspaces(client.workspaces().await),
        Resource::Tags => Loaded::Tags(client.tags().await),
        Resource::Offices => Loaded::Offices(client.offices().await),
        Resource::Constraints => Loaded::Constraints(client.constraints().await),
        Resource::Leaderboard => Loaded::Leaderboard(client.leaderboard().await),
        Resource::Gamification => Loaded::Gamification(client.gamification().await),
        Resource::Expertise => Loaded::Expertise(client.expertise_profile().await),
    }
}

/// Concurrent dashboard loader
#[derive(Debug)]
pub struct DashboardLoader {
    client: ApiClient,
    active_only: bool,
    generations: [u64; RESOURCE_COUNT],
    tasks: JoinSet<(Resource, u64, Loaded)>,
    data: DashboardData,
}

impl DashboardLoader {
    /// Create loader; nothing is requested until [`DashboardLoader::start`]
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            active_only: true,
            generations: [0; RESOURCE_COUNT],
            tasks: JoinSet::new(),
            data: DashboardData::default(),
        }
    }

    /// Include inactive projects
    #[must_use]
    pub fn with_inactive_projects(mut self) -> Self {
        self.active_only = false;
        self
    }

    /// Request every resource. Must be called within a tokio runtime.
    pub fn start(&mut self) {
        for resource in Resource::ALL {
            self.reload(resource);
        }
    }

    /// Request one resource again, superseding any response in flight
    pub fn reload(&mut self, resource: Resource) {
        let slot = &mut self.generations[resource.index()];
        *slot += 1;
        let generation = *slot;

        self.data.mark_loading(resource);
        let client = self.client.clone();
        let active_only = self.active_only;
        self.tasks.spawn(async move {
            let loaded = fetch(&client, resource, active_only).await;
            (resource, generation, loaded)
        });
    }

    /// Wait for the next response and apply it.
    ///
    /// Returns the resource that settled, or `None` when nothing is left.
    /// Superseded responses are dropped silently.
    pub async fn next(&mut self) -> Option<Resource> {
        while let Some(joined) = self.tasks.join_next().await {
            let (resource, generation, loaded) = match joined {
                Ok(settled) => settled,
                Err(err) => {
                    warn!(error = %err, "dashboard load task ended abnormally");
                    continue;
                }
            };

            if generation != self.generations[resource.index()] {
                debug!(%resource, generation, "dropping superseded response");
                continue;
            }
            if let Some(err) = loaded.failure() {
                warn!(%resource, error = %err, "dashboard load failed");
            }
            self.data.apply(loaded);
            return Some(resource);
        }
        None
    }

    /// Wait for everything in flight
    pub async fn finish(&mut self) -> &DashboardData {
        while self.next().await.is_some() {}
        &self.data
    }

    /// Current data
    #[inline]
    #[must_use]
    pub fn data(&self) -> &DashboardData {
        &self.data
    }

    /// Requests still in flight, superseded ones included
    #[inline]
    #[must_use]
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Abort everything in flight
    pub fn cancel(&mut self) {
        self.tasks.abort_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemorySessionStore;
    use crate::error::TransportError;
    use crate::transport::{HttpRequest, HttpResponse, MockTransport, Transport};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn client(transport: MockTransport) -> ApiClient {
        ApiClient::new(
            "https://dkn.example",
            Arc::new(transport),
            Arc::new(MemorySessionStore::new()),
        )
    }

    #[tokio::test]
    async fn partial_failure_keeps_the_rest() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(10).returning(|req| {
            let url = req.url.as_str();
            let reply = if url.ends_with("/api/tags") {
                HttpResponse::json(500, &json!({"message": "tags down"}))
            } else if url.contains("/api/projects") {
                assert!(url.ends_with("?active_only=true"));
                HttpResponse::json(200, &json!([{"id": 1, "name": "Alpha"}]))
            } else if url.ends_with("/api/gamification") {
                HttpResponse::json(200, &json!({"points": 40}))
            } else if url.ends_with("/api/expertise-profile") {
                HttpResponse::json(200, &serde_json::Value::Null)
            } else {
                HttpResponse::json(200, &json!([]))
            };
            Ok(reply)
        });

        let mut loader = DashboardLoader::new(client(transport));
        loader.start();
        assert_eq!(loader.pending(), 10);
        assert!(loader.data().documents.is_loading());

        let data = loader.finish().await;
        assert_eq!(data.tags.error(), Some("tags down"));
        assert_eq!(data.projects.ready().map(Vec::len), Some(1));
        assert_eq!(
            data.gamification.ready().and_then(|g| g.as_ref()).and_then(|g| g.points),
            Some(40.0)
        );
        assert_eq!(data.expertise.ready(), Some(&None));
        assert_eq!(data.failures(), vec![(Resource::Tags, "tags down")]);
    }

    #[tokio::test]
    async fn reload_supersedes_earlier_response() {
        let mut transport = MockTransport::new();
        let mut calls = 0;
        transport.expect_send().times(2).returning(move |_| {
            calls += 1;
            Ok(HttpResponse::json(200, &json!([{"id": calls, "title": "doc"}])))
        });

        let mut loader = DashboardLoader::new(client(transport));
        loader.reload(Resource::Documents);
        loader.reload(Resource::Documents);
        assert_eq!(loader.pending(), 2);

        assert_eq!(loader.next().await, Some(Resource::Documents));
        assert_eq!(loader.next().await, None);
        assert_eq!(loader.pending(), 0);
        assert_eq!(loader.data().documents.ready().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn cancel_drops_in_flight_loads() {
        let sent = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&sent);
        let mut transport = MockTransport::new();
        transport.expect_send().returning(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(HttpResponse::json(200, &json!([])))
        });

        let mut loader = DashboardLoader::new(client(transport));
        loader.start();
        loader.cancel();
        assert_eq!(loader.next().await, None);

        assert_eq!(loader.pending(), 0);
        assert_eq!(loader.data(), &DashboardData::default());
        assert!(loader.data().documents.is_loading());
        assert!(loader.data().failures().is_empty());
        assert_eq!(sent.load(Ordering::SeqCst), 0);
    }

    /// Holds every request at a yield point before it counts as sent
    #[derive(Default)]
    struct YieldingTransport {
        started: AtomicUsize,
        sent: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl Transport for YieldingTransport {
        async fn send(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.started.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.sent.fetch_add(1, Ordering::SeqCst);
            Ok(HttpResponse::json(200, &json!([])))
        }
    }

    #[tokio::test]
    async fn dropped_loader_applies_nothing() {
        let transport = Arc::new(YieldingTransport::default());
        let client = ApiClient::new(
            "https://dkn.example",
            Arc::clone(&transport) as Arc<dyn Transport>,
            Arc::new(MemorySessionStore::new()),
        );

        let mut loader = DashboardLoader::new(client);
        loader.start();
        tokio::task::yield_now().await;
        assert!(transport.started.load(Ordering::SeqCst) > 0);

        drop(loader);
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(transport.sent.load(Ordering::SeqCst), 0);
    }
}
