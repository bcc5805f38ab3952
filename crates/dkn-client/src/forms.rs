//! Form state, local validation and request payloads
//!
//! Each form validates before any request is sent. A failed validation
//! yields a [`ValidationError`] with a form-level summary and per-field
//! messages; a valid form yields the exact JSON payload the endpoint takes.
//! Optional text fields travel as `null` when empty.

use crate::error::ValidationError;
use crate::records::{Document, ExpertiseProfile};
use dkn_access::{Confidentiality, DocumentStatus, EntityId};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// Per-field error text, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors(IndexMap<String, String>);

impl FieldErrors {
    /// Create empty error set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the message for a field
    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    /// With a field message
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.insert(field, message);
        self
    }

    /// Message for a field
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Check if no field has an error
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of fields with errors
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Fields and messages in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Read a server `errors` object; array values are joined with a space
    #[must_use]
    pub fn from_server(errors: Option<&Value>) -> Self {
        let Some(Value::Object(fields)) = errors else {
            return Self::default();
        };

        let mut out = Self::default();
        for (field, value) in fields {
            let message = match value {
                Value::String(text) => text.clone(),
                Value::Array(items) => items
                    .iter()
                    .map(|item| match item {
                        Value::String(text) => text.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(" "),
                Value::Null => continue,
                other => other.to_string(),
            };
            out.insert(field.clone(), message);
        }
        out
    }
}

/// Status line tone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tone {
    /// Informational
    #[default]
    Neutral,
    /// Action succeeded
    Success,
    /// Action failed
    Error,
}

/// Transient status line shown after an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Tone
    pub tone: Tone,
    /// Text
    pub text: String,
}

impl Notice {
    /// Success notice
    #[must_use]
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            tone: Tone::Success,
            text: text.into(),
        }
    }

    /// Error notice
    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            tone: Tone::Error,
            text: text.into(),
        }
    }

    /// Neutral notice
    #[must_use]
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            tone: Tone::Neutral,
            text: text.into(),
        }
    }
}

/// A rejected action: status line plus field errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Status line
    pub notice: Notice,
    /// Field errors, empty unless validation failed
    pub fields: FieldErrors,
}

impl Rejection {
    /// Rejection with only a status line
    #[must_use]
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            notice: Notice::error(text),
            fields: FieldErrors::default(),
        }
    }
}

impl From<ValidationError> for Rejection {
    fn from(err: ValidationError) -> Self {
        Self {
            notice: Notice::error(err.summary),
            fields: err.fields,
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.notice.text)?;
        for (field, message) in self.fields.iter() {
            write!(f, "\n  {field}: {message}")?;
        }
        Ok(())
    }
}

fn non_empty(text: &str) -> Option<String> {
    (!text.is_empty()).then(|| text.to_string())
}

fn toggle(ids: &mut Vec<EntityId>, id: EntityId) {
    if let Some(pos) = ids.iter().position(|existing| *existing == id) {
        ids.remove(pos);
    } else {
        ids.push(id);
    }
}

/// New document submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadForm {
    /// Title, required
    pub title: String,
    /// Free-text description
    pub description: String,
    /// Confidentiality, required
    pub confidentiality: Option<Confidentiality>,
    /// Linked project
    pub project_id: Option<EntityId>,
    /// Linked workspace
    pub workspace_id: Option<EntityId>,
    /// Selected tags
    pub tag_ids: Vec<EntityId>,
}

impl Default for UploadForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            confidentiality: Some(Confidentiality::default()),
            project_id: None,
            workspace_id: None,
            tag_ids: Vec::new(),
        }
    }
}

/// `POST /api/documents` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadPayload {
    /// Title as entered
    pub title: String,
    /// Description or null
    pub description: Option<String>,
    /// Confidentiality level
    pub confidentiality: Confidentiality,
    /// Project or null
    pub project_id: Option<EntityId>,
    /// Workspace or null
    pub workspace_id: Option<EntityId>,
    /// Tags
    pub tag_ids: Vec<EntityId>,
}

impl UploadForm {
    /// Form with a title
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Select or deselect a tag
    pub fn toggle_tag(&mut self, id: impl Into<EntityId>) {
        toggle(&mut self.tag_ids, id.into());
    }

    /// Validate and build the request body
    ///
    /// # Errors
    /// - `ValidationError` naming `title` and/or `confidentiality`
    pub fn validate(&self) -> Result<UploadPayload, ValidationError> {
        let mut fields = FieldErrors::new();
        if self.title.trim().is_empty() {
            fields.insert("title", "Title is required before upload.");
        }
        if self.confidentiality.is_none() {
            fields.insert("confidentiality", "Select a confidentiality level.");
        }

        match self.confidentiality {
            Some(confidentiality) if fields.is_empty() => Ok(UploadPayload {
                title: self.title.clone(),
                description: non_empty(&self.description),
                confidentiality,
                project_id: self.project_id.clone(),
                workspace_id: self.workspace_id.clone(),
                tag_ids: self.tag_ids.clone(),
            }),
            _ => Err(ValidationError::new(
                "Please fix the highlighted fields before submitting.",
                fields,
            )),
        }
    }
}

/// Edit form for an existing document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateForm {
    /// Title, required
    pub title: String,
    /// Description
    pub description: String,
    /// Confidentiality, required
    pub confidentiality: Option<Confidentiality>,
    /// Linked project
    pub project_id: Option<EntityId>,
    /// Linked workspace
    pub workspace_id: Option<EntityId>,
    /// Selected tags
    pub tag_ids: Vec<EntityId>,
    /// Target status, sent only when chosen
    pub status: Option<DocumentStatus>,
}

/// `PUT /api/documents/:id` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdatePayload {
    /// Trimmed title
    pub title: String,
    /// Trimmed description or null
    pub description: Option<String>,
    /// Confidentiality level
    pub confidentiality: Confidentiality,
    /// Project or null
    pub project_id: Option<EntityId>,
    /// Workspace or null
    pub workspace_id: Option<EntityId>,
    /// Tags
    pub tag_ids: Vec<EntityId>,
    /// New status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DocumentStatus>,
}

impl UpdateForm {
    /// Prefill from the current document; status starts unchosen
    #[must_use]
    pub fn from_document(document: &Document) -> Self {
        Self {
            title: document.title.clone().unwrap_or_default(),
            description: document.description.clone().unwrap_or_default(),
            confidentiality: Some(
                document
                    .confidentiality
                    .as_deref()
                    .and_then(Confidentiality::parse)
                    .unwrap_or_default(),
            ),
            project_id: document.project.as_ref().and_then(|p| p.id.clone()),
            workspace_id: document.workspace.as_ref().and_then(|w| w.id.clone()),
            tag_ids: document.tags.iter().filter_map(|t| t.id.clone()).collect(),
            status: None,
        }
    }

    /// Select or deselect a tag
    pub fn toggle_tag(&mut self, id: impl Into<EntityId>) {
        toggle(&mut self.tag_ids, id.into());
    }

    /// Validate and build the request body
    ///
    /// # Errors
    /// - `ValidationError` for the first missing required field
    pub fn validate(&self) -> Result<UpdatePayload, ValidationError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::new(
                "Please add a title before saving.",
                FieldErrors::new().with("title", "Title is required."),
            ));
        }

        let Some(confidentiality) = self.confidentiality else {
            return Err(ValidationError::new(
                "Select a confidentiality level before saving.",
                FieldErrors::new().with("confidentiality", "Confidentiality is required."),
            ));
        };

        Ok(UpdatePayload {
            title: title.to_string(),
            description: non_empty(self.description.trim()),
            confidentiality,
            project_id: self.project_id.clone(),
            workspace_id: self.workspace_id.clone(),
            tag_ids: self.tag_ids.clone(),
            status: self.status.clone(),
        })
    }
}

/// Policy rule add-on
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyRuleForm {
    /// Rule type, required
    pub rule_type: String,
    /// Description
    pub description: String,
}

/// `POST /api/documents/:id/policy-rules` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyRulePayload {
    /// Rule type
    pub rule_type: String,
    /// Description or null
    pub description: Option<String>,
}

impl PolicyRuleForm {
    /// Validate and build the request body
    ///
    /// # Errors
    /// - `ValidationError` when the rule type is blank
    pub fn validate(&self) -> Result<PolicyRulePayload, ValidationError> {
        if self.rule_type.trim().is_empty() {
            return Err(ValidationError::new(
                "Choose a rule type before adding a policy rule.",
                FieldErrors::new().with("rule_type", "Rule type is required."),
            ));
        }
        Ok(PolicyRulePayload {
            rule_type: self.rule_type.clone(),
            description: non_empty(&self.description),
        })
    }
}

/// AI job add-on
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AiJobForm {
    /// Job type, required
    pub job_type: String,
    /// Initial status
    pub status: String,
}

/// `POST /api/documents/:id/ai-jobs` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AiJobPayload {
    /// Job type
    pub job_type: String,
    /// Status or null
    pub status: Option<String>,
}

impl AiJobForm {
    /// Validate and build the request body
    ///
    /// # Errors
    /// - `ValidationError` when the job type is blank
    pub fn validate(&self) -> Result<AiJobPayload, ValidationError> {
        if self.job_type.trim().is_empty() {
            return Err(ValidationError::new(
                "Choose a job type before adding an AI job.",
                FieldErrors::new().with("job_type", "Job type is required."),
            ));
        }
        Ok(AiJobPayload {
            job_type: self.job_type.clone(),
            status: non_empty(&self.status),
        })
    }
}

/// `POST /api/tags` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagPayload {
    /// Trimmed tag name
    pub tag_name: String,
}

impl TagPayload {
    /// Build from raw input; blank input means no request at all
    #[must_use]
    pub fn from_input(input: &str) -> Option<Self> {
        let tag_name = input.trim();
        (!tag_name.is_empty()).then(|| Self {
            tag_name: tag_name.to_string(),
        })
    }
}

/// Expertise profile editor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpertiseForm {
    /// Skills
    pub skills: String,
    /// Experience level, e.g. `Senior`
    pub experience_level: String,
}

/// `PUT /api/expertise-profile` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpertisePayload {
    /// Skills or null
    pub skills: Option<String>,
    /// Experience level or null
    pub experience_level: Option<String>,
}

impl ExpertiseForm {
    /// Prefill from a stored profile
    #[must_use]
    pub fn from_profile(profile: Option<&ExpertiseProfile>) -> Self {
        Self {
            skills: profile.and_then(|p| p.skills.clone()).unwrap_or_default(),
            experience_level: profile
                .and_then(|p| p.experience_level.clone())
                .unwrap_or_default(),
        }
    }

    /// Build the request body; nothing is required
    #[must_use]
    pub fn payload(&self) -> ExpertisePayload {
        ExpertisePayload {
            skills: non_empty(&self.skills),
            experience_level: non_empty(&self.experience_level),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn upload_requires_title_and_confidentiality() {
        let form = UploadForm {
            title: "   ".to_string(),
            confidentiality: None,
            ..UploadForm::default()
        };
        let err = form.validate().unwrap_err();
        assert_eq!(err.summary, "Please fix the highlighted fields before submitting.");
        assert_eq!(err.fields.get("title"), Some("Title is required before upload."));
        assert_eq!(
            err.fields.get("confidentiality"),
            Some("Select a confidentiality level.")
        );
    }

    #[test]
    fn upload_payload_nulls_empty_optionals() {
        let mut form = UploadForm::titled("Onboarding guide");
        form.toggle_tag(3);
        form.toggle_tag(5);
        form.toggle_tag(3);

        let payload = serde_json::to_value(form.validate().unwrap()).unwrap();
        assert_eq!(
            payload,
            json!({
                "title": "Onboarding guide",
                "description": null,
                "confidentiality": "INTERNAL",
                "project_id": null,
                "workspace_id": null,
                "tag_ids": [5],
            })
        );
    }

    #[test]
    fn update_trims_and_omits_unchosen_status() {
        let form = UpdateForm {
            title: "  Pricing playbook ".to_string(),
            description: "  ".to_string(),
            confidentiality: Some(Confidentiality::Restricted),
            ..UpdateForm::default()
        };
        let payload = serde_json::to_value(form.validate().unwrap()).unwrap();
        assert_eq!(payload["title"], "Pricing playbook");
        assert_eq!(payload["description"], Value::Null);
        assert!(payload.get("status").is_none());

        let with_status = UpdateForm {
            status: Some(DocumentStatus::Archived),
            ..form
        };
        let payload = serde_json::to_value(with_status.validate().unwrap()).unwrap();
        assert_eq!(payload["status"], "ARCHIVED");
    }

    #[test]
    fn update_reports_first_missing_field() {
        let err = UpdateForm::default().validate().unwrap_err();
        assert_eq!(err.fields.get("title"), Some("Title is required."));
        assert_eq!(err.fields.len(), 1);

        let err = UpdateForm {
            title: "T".to_string(),
            confidentiality: None,
            ..UpdateForm::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(
            err.fields.get("confidentiality"),
            Some("Confidentiality is required.")
        );
    }

    #[test]
    fn update_prefills_from_document() {
        let document: Document = serde_json::from_value(json!({
            "id": 8,
            "title": "Deck",
            "confidentiality": "public",
            "project": {"id": 2, "name": "Apollo"},
            "tags": [{"id": 1, "name": "a"}, {"id": 4}]
        }))
        .unwrap();

        let form = UpdateForm::from_document(&document);
        assert_eq!(form.confidentiality, Some(Confidentiality::Public));
        assert_eq!(form.project_id, Some(EntityId::Number(2)));
        assert_eq!(form.tag_ids, vec![EntityId::Number(1), EntityId::Number(4)]);
        assert_eq!(form.status, None);
    }

    #[test]
    fn add_on_forms_require_type() {
        assert!(PolicyRuleForm::default().validate().is_err());
        let rule = PolicyRuleForm {
            rule_type: "RETENTION".to_string(),
            description: String::new(),
        };
        assert_eq!(rule.validate().unwrap().description, None);

        assert!(AiJobForm::default().validate().is_err());
        let job = AiJobForm {
            job_type: "SUMMARIZE".to_string(),
            status: "QUEUED".to_string(),
        };
        assert_eq!(job.validate().unwrap().status.as_deref(), Some("QUEUED"));
    }

    #[test]
    fn blank_tag_is_no_request() {
        assert_eq!(TagPayload::from_input("   "), None);
        assert_eq!(
            TagPayload::from_input(" finance ").map(|t| t.tag_name),
            Some("finance".to_string())
        );
    }

    #[test]
    fn server_field_errors_join_arrays() {
        let errors = FieldErrors::from_server(Some(&json!({
            "title": ["must be unique", "too long"],
            "confidentiality": "invalid",
            "ignored": null
        })));
        assert_eq!(errors.get("title"), Some("must be unique too long"));
        assert_eq!(errors.get("confidentiality"), Some("invalid"));
        assert_eq!(errors.len(), 2);
        assert!(FieldErrors::from_server(Some(&json!(["x"]))).is_empty());
    }

    #[test]
    fn expertise_payload_nulls_blanks() {
        let form = ExpertiseForm {
            skills: "Rust, pricing".to_string(),
            experience_level: String::new(),
        };
        assert_eq!(
            serde_json::to_value(form.payload()).unwrap(),
            json!({"skills": "Rust, pricing", "experience_level": null})
        );
    }
}
