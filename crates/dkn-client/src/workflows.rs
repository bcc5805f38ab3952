//! User actions with their status lines
//!
//! Each action validates locally, calls one endpoint, and turns the outcome
//! into a [`Notice`] (success) or a [`Rejection`] (failure). Server
//! messages win over local fallbacks. Nothing is retried.

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::forms::{
    AiJobForm, ExpertiseForm, Notice, PolicyRuleForm, Rejection, TagPayload, UpdateForm,
    UploadForm,
};
use crate::records::{AuditLog, DirectoryUser, Document, Recommendation};
use dkn_access::{DocumentAccess, EntityId};
use tracing::info;

/// Status lines shown by the document and profile actions
pub mod messages {
    /// Upload succeeded
    pub const UPLOADED: &str = "Document uploaded for validation.";
    /// Upload failed without a server message
    pub const UPLOAD_FAILED: &str = "Error uploading document. Please try again.";
    /// Update succeeded
    pub const UPDATED: &str = "Document updated successfully.";
    /// Update refused with 403
    pub const UPDATE_FORBIDDEN: &str = "You do not have permission to update this document.";
    /// Update failed otherwise
    pub const UPDATE_FAILED: &str = "Unable to update document. Please review and try again.";
    /// Delete succeeded
    pub const DELETED: &str = "Document deleted.";
    /// Delete refused with 403
    pub const DELETE_FORBIDDEN: &str = "You do not have permission to delete this document.";
    /// Delete failed otherwise
    pub const DELETE_FAILED: &str = "Unable to delete document right now.";
    /// Validation succeeded
    pub const VALIDATED: &str = "Document validated successfully.";
    /// Validation failed
    pub const VALIDATE_FAILED: &str = "Unable to validate document right now.";
    /// Queue load failed
    pub const PENDING_FAILED: &str = "Unable to load pending documents.";
    /// Policy rule added
    pub const RULE_ADDED: &str = "Policy rule added.";
    /// Policy rule failed
    pub const RULE_FAILED: &str = "Unable to add policy rule.";
    /// AI job added
    pub const JOB_ADDED: &str = "AI job added.";
    /// AI job failed
    pub const JOB_FAILED: &str = "Unable to add AI job.";
    /// Tag created
    pub const TAG_CREATED: &str = "Tag created.";
    /// Tag failed
    pub const TAG_FAILED: &str = "Unable to create tag.";
    /// Profile saved
    pub const PROFILE_UPDATED: &str = "Profile updated.";
    /// Profile failed
    pub const PROFILE_FAILED: &str = "Unable to update expertise.";
    /// Admin directory failed
    pub const USERS_FAILED: &str = "Unable to load users right now.";
    /// Audit log failed
    pub const AUDIT_FAILED: &str = "Unable to load audit logs right now.";
    /// Recommendations failed
    pub const RECOMMENDATIONS_FAILED: &str = "Unable to load recommendations right now.";
}

fn rejected(err: &ApiError, fallback: &str) -> Rejection {
    Rejection::message(err.user_message(fallback))
}

/// Submit a new document for validation
///
/// # Errors
/// - `Rejection` with field errors when the form is invalid (no request sent)
/// - `Rejection` with the server message or fallback when the call fails
pub async fn upload_document(client: &ApiClient, form: &UploadForm) -> Result<Notice, Rejection> {
    let payload = form.validate()?;
    client
        .create_document(&payload)
        .await
        .map_err(|err| rejected(&err, messages::UPLOAD_FAILED))?;
    info!(title = %payload.title, "document uploaded");
    Ok(Notice::success(messages::UPLOADED))
}

/// Save edits to a document.
///
/// The edit gate is checked first; a disabled form never reaches the
/// server. A 422 response fills the field errors.
///
/// # Errors
/// - `Rejection` when the gate denies, validation fails, or the call fails
pub async fn update_document(
    client: &ApiClient,
    access: &DocumentAccess,
    id: &EntityId,
    form: &UpdateForm,
) -> Result<Notice, Rejection> {
    access
        .check_edit()
        .map_err(|err| Rejection::message(err.to_string()))?;
    if let Some(status) = &form.status {
        access
            .check_status_target(status)
            .map_err(|err| Rejection::message(err.to_string()))?;
    }

    let payload = form.validate()?;
    client
        .update_document(id, &payload)
        .await
        .map_err(|err| Rejection {
            notice: Notice::error(
                err.user_message_or_forbidden(messages::UPDATE_FORBIDDEN, messages::UPDATE_FAILED),
            ),
            fields: err.field_errors(),
        })?;
    Ok(Notice::success(messages::UPDATED))
}

/// Delete a document
///
/// # Errors
/// - `Rejection` with the server message or fallback
pub async fn delete_document(client: &ApiClient, id: &EntityId) -> Result<Notice, Rejection> {
    client.delete_document(id).await.map_err(|err| {
        Rejection::message(
            err.user_message_or_forbidden(messages::DELETE_FORBIDDEN, messages::DELETE_FAILED),
        )
    })?;
    info!(%id, "document deleted");
    Ok(Notice::success(messages::DELETED))
}

/// Attach a policy rule
///
/// # Errors
/// - `Rejection` when the rule type is blank or the call fails
pub async fn add_policy_rule(
    client: &ApiClient,
    id: &EntityId,
    form: &PolicyRuleForm,
) -> Result<Notice, Rejection> {
    let payload = form.validate()?;
    client
        .add_policy_rule(id, &payload)
        .await
        .map_err(|err| rejected(&err, messages::RULE_FAILED))?;
    Ok(Notice::success(messages::RULE_ADDED))
}

/// Queue an AI job
///
/// # Errors
/// - `Rejection` when the job type is blank or the call fails
pub async fn add_ai_job(
    client: &ApiClient,
    id: &EntityId,
    form: &AiJobForm,
) -> Result<Notice, Rejection> {
    let payload = form.validate()?;
    client
        .add_ai_job(id, &payload)
        .await
        .map_err(|err| rejected(&err, messages::JOB_FAILED))?;
    Ok(Notice::success(messages::JOB_ADDED))
}

/// Create a tag. Blank input sends nothing and yields `Ok(None)`.
///
/// Every non-blank submission sends one request, even if identical to the
/// previous one.
///
/// # Errors
/// - `Rejection` with the server message or fallback
pub async fn create_tag(client: &ApiClient, input: &str) -> Result<Option<Notice>, Rejection> {
    let Some(payload) = TagPayload::from_input(input) else {
        return Ok(None);
    };
    client
        .create_tag(&payload)
        .await
        .map_err(|err| rejected(&err, messages::TAG_FAILED))?;
    Ok(Some(Notice::success(messages::TAG_CREATED)))
}

/// Save the expertise profile
///
/// # Errors
/// - `Rejection` with the server message or fallback
pub async fn save_expertise(client: &ApiClient, form: &ExpertiseForm) -> Result<Notice, Rejection> {
    client
        .update_expertise(&form.payload())
        .await
        .map_err(|err| rejected(&err, messages::PROFILE_FAILED))?;
    Ok(Notice::success(messages::PROFILE_UPDATED))
}

/// Pending documents for champions and governance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationQueue {
    items: Vec<Document>,
}

impl ValidationQueue {
    /// Fetch the queue
    ///
    /// # Errors
    /// - `Rejection` with a fixed message; server detail is not shown
    pub async fn load(client: &ApiClient) -> Result<Self, Rejection> {
        let items = client
            .pending_documents()
            .await
            .map_err(|_| Rejection::message(messages::PENDING_FAILED))?;
        Ok(Self { items })
    }

    /// Queue contents
    #[inline]
    #[must_use]
    pub fn items(&self) -> &[Document] {
        &self.items
    }

    /// Check if the queue is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Validate one document and drop it from the local queue.
    ///
    /// Callers refresh their document lists after success.
    ///
    /// # Errors
    /// - `Rejection` with a fixed message; the queue is unchanged
    pub async fn validate(&mut self, client: &ApiClient, id: &EntityId) -> Result<Notice, Rejection> {
        client
            .validate_document(id)
            .await
            .map_err(|_| Rejection::message(messages::VALIDATE_FAILED))?;
        self.items.retain(|doc| doc.id.as_ref() != Some(id));
        info!(%id, "document validated");
        Ok(Notice::success(messages::VALIDATED))
    }
}

/// Admin user directory
///
/// # Errors
/// - `Rejection` with a fixed message
pub async fn load_directory(client: &ApiClient) -> Result<Vec<DirectoryUser>, Rejection> {
    client
        .admin_users()
        .await
        .map_err(|_| Rejection::message(messages::USERS_FAILED))
}

/// Governance audit log
///
/// # Errors
/// - `Rejection` with a fixed message
pub async fn load_audit_logs(client: &ApiClient) -> Result<Vec<AuditLog>, Rejection> {
    client
        .audit_logs()
        .await
        .map_err(|_| Rejection::message(messages::AUDIT_FAILED))
}

/// Recommendations for the current user
///
/// # Errors
/// - `Rejection` with a fixed message
pub async fn load_recommendations(client: &ApiClient) -> Result<Vec<Recommendation>, Rejection> {
    client
        .recommendations()
        .await
        .map_err(|_| Rejection::message(messages::RECOMMENDATIONS_FAILED))
}
