//! Document detail screen data

use crate::client::ApiClient;
use crate::forms::Rejection;
use crate::records::{AiJob, Document, PolicyRule};
use dkn_access::{DocumentAccess, EntityId, User};
use tracing::warn;

/// Shown on 403 without a server message
pub const DETAIL_FORBIDDEN: &str = "You do not have access to this document.";

/// Shown on any other failure without a server message
pub const DETAIL_FAILED: &str = "Unable to load document details.";

/// A document with its policy rules and AI jobs
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentDetail {
    /// The document
    pub document: Document,
    /// Attached policy rules
    pub policy_rules: Vec<PolicyRule>,
    /// Queued AI jobs
    pub ai_jobs: Vec<AiJob>,
}

impl DocumentDetail {
    /// Fetch the document and its add-ons together; all three must succeed
    ///
    /// # Errors
    /// - `Rejection` with the server message, else the 403 or generic text
    pub async fn load(client: &ApiClient, id: &EntityId) -> Result<Self, Rejection> {
        let (document, policy_rules, ai_jobs) = futures::try_join!(
            client.document(id),
            client.policy_rules(id),
            client.ai_jobs(id),
        )
        .map_err(|err| {
            warn!(%id, error = %err, "document detail failed");
            Rejection::message(err.user_message_or_forbidden(DETAIL_FORBIDDEN, DETAIL_FAILED))
        })?;

        Ok(Self {
            document,
            policy_rules,
            ai_jobs,
        })
    }

    /// Edit gate for `user`
    #[must_use]
    pub fn access(&self, user: Option<&User>) -> DocumentAccess {
        DocumentAccess::evaluate(
            user,
            self.document.creator_id(),
            self.document.status.as_ref(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemorySessionStore;
    use crate::transport::{HttpResponse, MockTransport};
    use dkn_access::Role;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    fn client(transport: MockTransport) -> ApiClient {
        ApiClient::new(
            "https://dkn.example",
            Arc::new(transport),
            Arc::new(MemorySessionStore::new()),
        )
    }

    #[tokio::test]
    async fn loads_all_three() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(3).returning(|req| {
            let body = if req.url.ends_with("/policy-rules") {
                json!([{"id": 1, "rule_type": "RETENTION"}])
            } else if req.url.ends_with("/ai-jobs") {
                json!({"unexpected": true})
            } else {
                json!({"id": 7, "title": "Q3", "status": "DRAFT", "creator": {"id": 5}})
            };
            Ok(HttpResponse::json(200, &body))
        });

        let detail = DocumentDetail::load(&client(transport), &EntityId::Number(7))
            .await
            .unwrap();
        assert_eq!(detail.document.display_title(), "Q3");
        assert_eq!(detail.policy_rules.len(), 1);
        assert!(detail.ai_jobs.is_empty());

        let owner = User::new(5, "Owner").with_role(Role::Consultant);
        assert!(detail.access(Some(&owner)).can_edit);
    }

    #[tokio::test]
    async fn any_failure_fails_the_screen() {
        let mut transport = MockTransport::new();
        transport.expect_send().returning(|req| {
            if req.url.ends_with("/ai-jobs") {
                Ok(HttpResponse::json(403, &json!({})))
            } else if req.url.ends_with("/policy-rules") {
                Ok(HttpResponse::json(200, &json!([])))
            } else {
                Ok(HttpResponse::json(200, &json!({"id": 7})))
            }
        });

        let rejection = DocumentDetail::load(&client(transport), &EntityId::Number(7))
            .await
            .unwrap_err();
        assert_eq!(rejection.notice.text, DETAIL_FORBIDDEN);
    }
}
