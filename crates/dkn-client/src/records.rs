//! Server-owned records
//!
//! The client holds no invariants over these; they are decoded leniently so
//! a missing or oddly typed field never hides a whole list. Every field is
//! optional and nested lists that are not arrays decode as empty.

use chrono::{DateTime, Local, NaiveDateTime};
use dkn_access::{DocumentStatus, EntityId, User};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

/// Decode a JSON array into records, skipping items that do not fit.
///
/// A non-array value decodes as an empty list.
#[must_use]
pub fn decode_list<T: DeserializeOwned>(value: Value) -> Vec<T> {
    let Value::Array(items) = value else {
        return Vec::new();
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(error = %err, record = std::any::type_name::<T>(), "skipping undecodable record");
                None
            }
        })
        .collect()
}

fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(decode_list(Value::deserialize(deserializer)?))
}

/// Render a scalar JSON value as display text
#[must_use]
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Format a server timestamp in local time; unparseable input is returned as-is
#[must_use]
pub fn format_timestamp(raw: &str) -> String {
    const DISPLAY: &str = "%Y-%m-%d %H:%M";

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.with_timezone(&Local).format(DISPLAY).to_string();
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|pattern| NaiveDateTime::parse_from_str(raw, pattern).ok())
        .map_or_else(|| raw.to_string(), |naive| naive.format(DISPLAY).to_string())
}

/// Embedded `{id, name}` reference (project, workspace, creator, office)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamedRef {
    /// Id
    pub id: Option<EntityId>,
    /// Name
    pub name: Option<String>,
}

/// Tag
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tag {
    /// Id
    pub id: Option<EntityId>,
    /// Name
    pub name: Option<String>,
    /// Alternate label
    pub label: Option<String>,
    /// Name as sent on creation
    pub tag_name: Option<String>,
}

impl Tag {
    /// Display name with `Tag <id>` fallback
    #[must_use]
    pub fn display_name(&self) -> String {
        [&self.name, &self.label, &self.tag_name]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
            .cloned()
            .unwrap_or_else(|| format!("Tag {}", id_text(self.id.as_ref())))
    }
}

fn id_text(id: Option<&EntityId>) -> String {
    id.map_or_else(|| "?".to_string(), EntityId::as_text)
}

/// Knowledge document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    /// Id
    pub id: Option<EntityId>,
    /// Title
    pub title: Option<String>,
    /// Description
    pub description: Option<String>,
    /// Lifecycle status
    pub status: Option<DocumentStatus>,
    /// Confidentiality as sent by the server
    pub confidentiality: Option<String>,
    /// Linked project
    pub project: Option<NamedRef>,
    /// Linked workspace
    pub workspace: Option<NamedRef>,
    /// Creator
    pub creator: Option<NamedRef>,
    /// Tags
    #[serde(deserialize_with = "lenient_list")]
    pub tags: Vec<Tag>,
    /// Creation time
    pub created_at: Option<String>,
    /// Last update time
    pub updated_at: Option<String>,
}

impl Document {
    /// Title, `Document` when missing
    #[must_use]
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or("Document")
    }

    /// Creator id, used by the edit gate
    #[must_use]
    pub fn creator_id(&self) -> Option<&EntityId> {
        self.creator.as_ref().and_then(|c| c.id.as_ref())
    }

    /// Comma-joined tag names
    #[must_use]
    pub fn tag_names(&self) -> String {
        self.tags
            .iter()
            .map(Tag::display_name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Governance policy rule attached to a document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyRule {
    /// Id
    pub id: Option<EntityId>,
    /// Rule type, e.g. `RETENTION`
    pub rule_type: Option<String>,
    /// Title
    pub title: Option<String>,
    /// Name
    pub name: Option<String>,
    /// Description
    pub description: Option<String>,
    /// Status
    pub status: Option<String>,
}

impl PolicyRule {
    /// Heading: rule type, title, name, or `Rule <id>`
    #[must_use]
    pub fn heading(&self) -> String {
        [&self.rule_type, &self.title, &self.name]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
            .cloned()
            .unwrap_or_else(|| format!("Rule {}", id_text(self.id.as_ref())))
    }
}

/// AI processing job attached to a document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiJob {
    /// Id
    pub id: Option<EntityId>,
    /// Job type
    pub job_type: Option<String>,
    /// Status
    pub status: Option<String>,
    /// Creation time
    pub created_at: Option<String>,
}

/// Delivery project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    /// Id
    pub id: Option<EntityId>,
    /// Name
    pub name: Option<String>,
    /// Description
    pub description: Option<String>,
    /// Active flag
    pub active: Option<bool>,
    /// Active flag, alternate spelling
    pub is_active: Option<bool>,
    /// Region
    pub region: Option<String>,
}

impl Project {
    /// `active`, else `is_active`, else inactive
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.or(self.is_active).unwrap_or(false)
    }
}

/// Workspace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Workspace {
    /// Id
    pub id: Option<EntityId>,
    /// Name
    pub name: Option<String>,
    /// Visibility
    pub visibility: Option<String>,
    /// Region
    pub region: Option<String>,
}

/// Office
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Office {
    /// Id
    pub id: Option<EntityId>,
    /// Name
    pub name: Option<String>,
    /// City
    pub city: Option<String>,
    /// Region
    pub region: Option<String>,
    /// Network status
    pub network_status: Option<String>,
}

impl Office {
    /// Name with `Office <id>` fallback
    #[must_use]
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("Office {}", id_text(self.id.as_ref())))
    }
}

/// Regulatory constraint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Constraint {
    /// Id
    pub id: Option<EntityId>,
    /// Title
    pub title: Option<String>,
    /// Name
    pub name: Option<String>,
    /// Description
    pub description: Option<String>,
    /// Notes
    pub notes: Option<String>,
    /// Region
    pub region: Option<String>,
}

/// Leaderboard row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaderboardEntry {
    /// Id
    pub id: Option<EntityId>,
    /// Rank
    pub rank: Option<i64>,
    /// Rank, alternate field
    pub position: Option<i64>,
    /// Ranked user
    pub user: Option<NamedRef>,
    /// Name when no user is embedded
    pub name: Option<String>,
    /// Scoring period
    pub period: Option<String>,
    /// Points
    pub points: Option<f64>,
}

impl LeaderboardEntry {
    /// `rank`, else `position`
    #[must_use]
    pub fn place(&self) -> Option<i64> {
        self.rank.or(self.position)
    }

    /// Embedded user name, else `name`
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.user
            .as_ref()
            .and_then(|u| u.name.as_deref())
            .or(self.name.as_deref())
            .unwrap_or("")
    }
}

/// Current user's score
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Gamification {
    /// Points
    pub points: Option<f64>,
    /// Badge list or single badge text
    pub badges: Value,
    /// Rank
    pub rank: Value,
}

impl Gamification {
    /// Badges joined with `, `, `None` when there are none
    #[must_use]
    pub fn badge_text(&self) -> String {
        match &self.badges {
            Value::Array(items) if !items.is_empty() => items
                .iter()
                .filter_map(scalar_text)
                .collect::<Vec<_>>()
                .join(", "),
            other => scalar_text(other).unwrap_or_else(|| "None".to_string()),
        }
    }
}

/// Skills and experience
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpertiseProfile {
    /// Skills
    pub skills: Option<String>,
    /// Experience level
    pub experience_level: Option<String>,
    /// Last update
    pub updated_at: Option<String>,
}

/// Recommended document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Recommendation {
    /// Id
    pub id: Option<EntityId>,
    /// Embedded document
    pub document: Option<Document>,
    /// Document id when not embedded
    pub knowledge_document_id: Option<EntityId>,
    /// Recommendation kind
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Relevance score
    pub score: Option<f64>,
}

impl Recommendation {
    /// Document title, else `Document #<id>`
    #[must_use]
    pub fn title(&self) -> String {
        self.document
            .as_ref()
            .and_then(|d| d.title.clone())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| format!("Document #{}", id_text(self.knowledge_document_id.as_ref())))
    }
}

/// Governance audit entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditLog {
    /// Id
    pub id: Option<EntityId>,
    /// Action
    pub action: Option<String>,
    /// Affected entity kind
    pub entity_type: Option<String>,
    /// Affected entity id
    pub entity_id: Option<EntityId>,
    /// Action category
    pub action_type: Option<String>,
    /// Who acted
    pub actor: Option<NamedRef>,
    /// When
    pub created_at: Option<String>,
}

/// Row of the admin user directory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryUser {
    /// Id
    pub id: Option<EntityId>,
    /// Name
    pub name: Option<String>,
    /// Email
    pub email: Option<String>,
    /// Role as sent, string or object
    pub role: Value,
    /// Office
    pub office: Option<NamedRef>,
    /// Region
    pub region: Option<String>,
}

impl DirectoryUser {
    /// Role name as the server spelled it, `Unknown role` when absent
    #[must_use]
    pub fn role_label(&self) -> String {
        self.role
            .get("role_name")
            .and_then(scalar_text)
            .or_else(|| scalar_text(&self.role))
            .unwrap_or_else(|| "Unknown role".to_string())
    }
}

/// `GET /api/roles` item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleRecord {
    /// Id
    pub id: Option<EntityId>,
    /// Role name
    pub role_name: Option<String>,
}

/// `POST /api/login` response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthResponse {
    /// Bearer token
    pub token: String,
    /// Signed-in user
    pub user: User,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn non_array_lists_decode_empty() {
        assert!(decode_list::<Tag>(json!({"data": []})).is_empty());
        assert!(decode_list::<Tag>(Value::Null).is_empty());
    }

    #[test]
    fn bad_items_are_skipped() {
        let tags: Vec<Tag> = decode_list(json!([{"id": 1, "name": "a"}, "oops", {"id": 2}]));
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[1].display_name(), "Tag 2");
    }

    #[test]
    fn document_tolerates_odd_fields() {
        let doc: Document = serde_json::from_value(json!({
            "id": "d-1",
            "title": "Plan",
            "status": "pending_validation",
            "tags": null,
            "creator": {"id": 5, "name": "Sam"}
        }))
        .unwrap();

        assert_eq!(doc.status, Some(DocumentStatus::PendingValidation));
        assert!(doc.tags.is_empty());
        assert_eq!(doc.creator_id(), Some(&EntityId::Number(5)));
    }

    #[test]
    fn project_active_flags() {
        let p: Project = serde_json::from_value(json!({"is_active": true})).unwrap();
        assert!(p.is_active());
        let p: Project = serde_json::from_value(json!({"active": false, "is_active": true})).unwrap();
        assert!(!p.is_active());
    }

    #[test]
    fn gamification_badges() {
        let g: Gamification =
            serde_json::from_value(json!({"points": 40, "badges": ["First upload", "Reviewer"]}))
                .unwrap();
        assert_eq!(g.badge_text(), "First upload, Reviewer");

        let g: Gamification = serde_json::from_value(json!({"badges": "Starter"})).unwrap();
        assert_eq!(g.badge_text(), "Starter");
        assert_eq!(Gamification::default().badge_text(), "None");
    }

    #[test]
    fn directory_role_label() {
        let u: DirectoryUser =
            serde_json::from_value(json!({"role": {"role_name": "CHAMPION"}})).unwrap();
        assert_eq!(u.role_label(), "CHAMPION");
        let u: DirectoryUser = serde_json::from_value(json!({"role": "ADMIN"})).unwrap();
        assert_eq!(u.role_label(), "ADMIN");
        assert_eq!(DirectoryUser::default().role_label(), "Unknown role");
    }

    #[test]
    fn recommendation_title_fallback() {
        let r: Recommendation =
            serde_json::from_value(json!({"knowledge_document_id": 12, "type": "similar"})).unwrap();
        assert_eq!(r.title(), "Document #12");
        assert_eq!(r.kind.as_deref(), Some("similar"));
    }

    #[test]
    fn timestamps_fall_back_to_raw() {
        assert_eq!(format_timestamp("yesterday"), "yesterday");
        assert_eq!(format_timestamp("2024-03-01 09:30:00"), "2024-03-01 09:30");
    }
}
