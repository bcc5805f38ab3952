//! Typed platform endpoints
//!
//! One method per REST route. List endpoints decode a non-array body as an
//! empty list; single-record endpoints fail with `ApiError::Decode` when the
//! body does not fit.

use crate::client::{ApiClient, RequestOptions};
use crate::error::ApiError;
use crate::forms::{
    AiJobPayload, ExpertisePayload, PolicyRulePayload, TagPayload, UpdatePayload, UploadPayload,
};
use crate::records::{
    decode_list, AiJob, AuditLog, AuthResponse, Constraint, DirectoryUser, Document,
    ExpertiseProfile, Gamification, LeaderboardEntry, Office, PolicyRule, Project,
    Recommendation, RoleRecord, Tag, Workspace,
};
use crate::transport::Method;
use dkn_access::{EntityId, User};
use serde::Serialize;
use serde_json::Value;

/// `POST /api/login` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    /// Email
    pub email: String,
    /// Password
    pub password: String,
}

impl Credentials {
    /// Create credentials
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// `POST /api/register` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterPayload {
    /// Display name
    pub name: String,
    /// Email
    pub email: String,
    /// Password
    pub password: String,
    /// Requested role name
    pub role: String,
    /// Role record id, when the role list came from the server
    pub role_id: Option<EntityId>,
}

/// Characters that would end or escape a path segment
const RESERVED_IN_SEGMENT: [char; 4] = ['/', '?', '#', '%'];

fn document_path(id: &EntityId) -> Result<String, ApiError> {
    let segment = id.as_text();
    let dot_only = segment.chars().all(|c| c == '.');
    if segment.is_empty() || dot_only || segment.contains(RESERVED_IN_SEGMENT) {
        return Err(ApiError::InvalidId(segment));
    }
    Ok(format!("/api/documents/{segment}"))
}

impl ApiClient {
    /// `GET /api/me`
    ///
    /// # Errors
    /// - `ApiError` on failure
    pub async fn me(&self) -> Result<User, ApiError> {
        self.get("/api/me").await
    }

    /// `POST /api/login`
    ///
    /// # Errors
    /// - `ApiError` on failure
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        let value = self.send(Method::Post, "/api/login", credentials).await?;
        serde_json::from_value(value).map_err(|err| ApiError::Decode(err.to_string()))
    }

    /// `POST /api/register`
    ///
    /// # Errors
    /// - `ApiError` on failure
    pub async fn register(&self, payload: &RegisterPayload) -> Result<Value, ApiError> {
        self.send(Method::Post, "/api/register", payload).await
    }

    /// `GET /api/roles` with an explicit token
    ///
    /// # Errors
    /// - `ApiError` on failure
    pub async fn roles(&self, token: &str) -> Result<Value, ApiError> {
        let options = RequestOptions::default().with_bearer(token);
        self.request(Method::Get, "/api/roles", None, &options)
            .await
    }

    /// `GET /api/roles` decoded; `None` when the body is not a list
    ///
    /// # Errors
    /// - `ApiError` on failure
    pub async fn role_records(&self, token: &str) -> Result<Option<Vec<RoleRecord>>, ApiError> {
        let value = self.roles(token).await?;
        Ok(value.is_array().then(|| decode_list(value)))
    }

    /// `GET /api/documents`, validated knowledge
    ///
    /// # Errors
    /// - `ApiError` on failure
    pub async fn documents(&self) -> Result<Vec<Document>, ApiError> {
        self.get_list("/api/documents").await
    }

    /// `GET /api/documents/mine`
    ///
    /// # Errors
    /// - `ApiError` on failure
    pub async fn my_documents(&self) -> Result<Vec<Document>, ApiError> {
        self.get_list("/api/documents/mine").await
    }

    /// `GET /api/documents/pending`, the validation queue
    ///
    /// # Errors
    /// - `ApiError` on failure
    pub async fn pending_documents(&self) -> Result<Vec<Document>, ApiError> {
        self.get_list("/api/documents/pending").await
    }

    /// `POST /api/documents`
    ///
    /// # Errors
    /// - `ApiError` on failure
    pub async fn create_document(&self, payload: &UploadPayload) -> Result<Value, ApiError> {
        self.send(Method::Post, "/api/documents", payload).await
    }

    /// `GET /api/documents/:id`
    ///
    /// # Errors
    /// - `ApiError` on failure
    pub async fn document(&self, id: &EntityId) -> Result<Document, ApiError> {
        self.get(&document_path(id)?).await
    }

    /// `PUT /api/documents/:id`
    ///
    /// # Errors
    /// - `ApiError` on failure
    pub async fn update_document(
        &self,
        id: &EntityId,
        payload: &UpdatePayload,
    ) -> Result<Value, ApiError> {
        self.send(Method::Put, &document_path(id)?, payload).await
    }

    /// `DELETE /api/documents/:id`
    ///
    /// # Errors
    /// - `ApiError` on failure
    pub async fn delete_document(&self, id: &EntityId) -> Result<Value, ApiError> {
        self.call(Method::Delete, &document_path(id)?).await
    }

    /// `PUT /api/documents/:id/validate`
    ///
    /// # Errors
    /// - `ApiError` on failure
    pub async fn validate_document(&self, id: &EntityId) -> Result<Value, ApiError> {
        self.call(Method::Put, &format!("{}/validate", document_path(id)?))
            .await
    }

    /// `GET /api/documents/:id/policy-rules`
    ///
    /// # Errors
    /// - `ApiError` on failure
    pub async fn policy_rules(&self, id: &EntityId) -> Result<Vec<PolicyRule>, ApiError> {
        self.get_list(&format!("{}/policy-rules", document_path(id)?))
            .await
    }

    /// `POST /api/documents/:id/policy-rules`
    ///
    /// # Errors
    /// - `ApiError` on failure
    pub async fn add_policy_rule(
        &self,
        id: &EntityId,
        payload: &PolicyRulePayload,
    ) -> Result<Value, ApiError> {
        self.send(
            Method::Post,
            &format!("{}/policy-rules", document_path(id)?),
            payload,
        )
        .await
    }

    /// `GET /api/documents/:id/ai-jobs`
    ///
    /// # Errors
    /// - `ApiError` on failure
    pub async fn ai_jobs(&self, id: &EntityId) -> Result<Vec<AiJob>, ApiError> {
        self.get_list(&format!("{}/ai-jobs", document_path(id)?))
            .await
    }

    /// `POST /api/documents/:id/ai-jobs`
    ///
    /// # Errors
    /// - `ApiError` on failure
    pub async fn add_ai_job(&self, id: &EntityId, payload: &AiJobPayload) -> Result<Value, ApiError> {
        self.send(Method::Post, &format!("{}/ai-jobs", document_path(id)?), payload)
            .await
    }

    /// `GET /api/projects?active_only=`
    ///
    /// # Errors
    /// - `ApiError` on failure
    pub async fn projects(&self, active_only: bool) -> Result<Vec<Project>, ApiError> {
        self.get_list(&format!("/api/projects?active_only={active_only}"))
            .await
    }

    /// `GET /api/workspaces`
    ///
    /// # Errors
    /// - `ApiError` on failure
    pub async fn workspaces(&self) -> Result<Vec<Workspace>, ApiError> {
        self.get_list("/api/workspaces").await
    }

    /// `GET /api/tags`
    ///
    /// # Errors
    /// - `ApiError` on failure
    pub async fn tags(&self) -> Result<Vec<Tag>, ApiError> {
        self.get_list("/api/tags").await
    }

    /// `POST /api/tags`
    ///
    /// # Errors
    /// - `ApiError` on failure
    pub async fn create_tag(&self, payload: &TagPayload) -> Result<Value, ApiError> {
        self.send(Method::Post, "/api/tags", payload).await
    }

    /// `GET /api/offices`
    ///
    /// # Errors
    /// - `ApiError` on failure
    pub async fn offices(&self) -> Result<Vec<Office>, ApiError> {
        self.get_list("/api/offices").await
    }

    /// `GET /api/regulatory-constraints`
    ///
    /// # Errors
    /// - `ApiError` on failure
    pub async fn constraints(&self) -> Result<Vec<Constraint>, ApiError> {
        self.get_list("/api/regulatory-constraints").await
    }

    /// `GET /api/leaderboard`
    ///
    /// # Errors
    /// - `ApiError` on failure
    pub async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, ApiError> {
        self.get_list("/api/leaderboard").await
    }

    /// `GET /api/gamification`; a `null` body is an empty score
    ///
    /// # Errors
    /// - `ApiError` on failure
    pub async fn gamification(&self) -> Result<Option<Gamification>, ApiError> {
        self.get("/api/gamification").await
    }

    /// `GET /api/expertise-profile`; `None` when the user has no profile yet
    ///
    /// # Errors
    /// - `ApiError` on failure
    pub async fn expertise_profile(&self) -> Result<Option<ExpertiseProfile>, ApiError> {
        self.get("/api/expertise-profile").await
    }

    /// `PUT /api/expertise-profile`
    ///
    /// # Errors
    /// - `ApiError` on failure
    pub async fn update_expertise(&self, payload: &ExpertisePayload) -> Result<Value, ApiError> {
        self.send(Method::Put, "/api/expertise-profile", payload)
            .await
    }

    /// `GET /api/recommendations`
    ///
    /// # Errors
    /// - `ApiError` on failure
    pub async fn recommendations(&self) -> Result<Vec<Recommendation>, ApiError> {
        self.get_list("/api/recommendations").await
    }

    /// `GET /api/audit-logs`
    ///
    /// # Errors
    /// - `ApiError` on failure
    pub async fn audit_logs(&self) -> Result<Vec<AuditLog>, ApiError> {
        self.get_list("/api/audit-logs").await
    }

    /// `GET /api/admin/users`
    ///
    /// # Errors
    /// - `ApiError` on failure
    pub async fn admin_users(&self) -> Result<Vec<DirectoryUser>, ApiError> {
        self.get_list("/api/admin/users").await
    }
}
