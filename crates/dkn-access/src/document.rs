//! Document lifecycle status and the advisory edit gate
//!
//! The governance tier may edit any document. A creator may edit their own
//! document until it reaches a locked status (VALIDATED or ARCHIVED). The
//! server enforces the same rule and answers 403 otherwise; this gate only
//! decides what the client offers.

use crate::error::AccessError;
use crate::role::Role;
use crate::user::{EntityId, User};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Document lifecycle status
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DocumentStatus {
    /// Work in progress
    Draft,
    /// Submitted, awaiting a champion
    PendingValidation,
    /// Published to the knowledge base
    Validated,
    /// Retired
    Archived,
    /// Any status this client does not know, upper-cased
    Other(String),
}

impl DocumentStatus {
    /// Wire value
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            DocumentStatus::Draft => "DRAFT",
            DocumentStatus::PendingValidation => "PENDING_VALIDATION",
            DocumentStatus::Validated => "VALIDATED",
            DocumentStatus::Archived => "ARCHIVED",
            DocumentStatus::Other(raw) => raw,
        }
    }

    /// Parse case-insensitively; unknown values are kept as [`DocumentStatus::Other`]
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.to_uppercase().as_str() {
            "DRAFT" => DocumentStatus::Draft,
            "PENDING_VALIDATION" => DocumentStatus::PendingValidation,
            "VALIDATED" => DocumentStatus::Validated,
            "ARCHIVED" => DocumentStatus::Archived,
            other => DocumentStatus::Other(other.to_string()),
        }
    }

    /// Locked statuses may only be edited by the governance tier
    #[inline]
    #[must_use]
    pub fn is_locked(&self) -> bool {
        matches!(self, DocumentStatus::Validated | DocumentStatus::Archived)
    }

    /// Title-cased label, e.g. `Pending Validation`
    #[must_use]
    pub fn label(&self) -> String {
        format_status(Some(self.as_str()))
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DocumentStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DocumentStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(DocumentStatus::parse(&raw))
    }
}

/// Title-case a wire status: `PENDING_VALIDATION` becomes `Pending Validation`.
///
/// Missing or empty input renders as `Unknown`.
#[must_use]
pub fn format_status(status: Option<&str>) -> String {
    let Some(status) = status.filter(|s| !s.is_empty()) else {
        return "Unknown".to_string();
    };

    status
        .split('_')
        .map(|piece| {
            let mut chars = piece.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Selectable target status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusOption {
    /// Wire value
    pub value: &'static str,
    /// Form label
    pub label: &'static str,
}

/// Every target status, in form order
pub const STATUS_OPTIONS: [StatusOption; 4] = [
    StatusOption {
        value: "DRAFT",
        label: "Draft",
    },
    StatusOption {
        value: "PENDING_VALIDATION",
        label: "Pending validation",
    },
    StatusOption {
        value: "VALIDATED",
        label: "Validated",
    },
    StatusOption {
        value: "ARCHIVED",
        label: "Archived",
    },
];

/// Confidentiality level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidentiality {
    /// Shareable outside the firm
    Public,
    /// Firm-internal
    #[default]
    Internal,
    /// Need-to-know
    Restricted,
}

impl Confidentiality {
    /// Every level, in form order
    pub const ALL: [Confidentiality; 3] = [
        Confidentiality::Public,
        Confidentiality::Internal,
        Confidentiality::Restricted,
    ];

    /// Wire value
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidentiality::Public => "PUBLIC",
            Confidentiality::Internal => "INTERNAL",
            Confidentiality::Restricted => "RESTRICTED",
        }
    }

    /// Parse case-insensitively
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let upper = raw.to_uppercase();
        Self::ALL.into_iter().find(|level| level.as_str() == upper)
    }
}

impl fmt::Display for Confidentiality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the current user may do with one document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentAccess {
    /// User created the document
    pub is_owner: bool,
    /// Status is VALIDATED or ARCHIVED
    pub is_locked: bool,
    /// User is in the governance tier
    pub can_govern: bool,
    /// Edit form is enabled
    pub can_edit: bool,
}

impl DocumentAccess {
    /// Evaluate the gate for `user` against a document's creator and status
    #[must_use]
    pub fn evaluate(
        user: Option<&User>,
        creator: Option<&EntityId>,
        status: Option<&DocumentStatus>,
    ) -> Self {
        let is_owner = user.is_some_and(|u| u.owns(creator));
        let is_locked = status.is_some_and(DocumentStatus::is_locked);
        let can_govern = crate::predicate::has_role(&Role::GOVERNANCE_TIER, user);

        Self {
            is_owner,
            is_locked,
            can_govern,
            can_edit: can_govern || (is_owner && !is_locked),
        }
    }

    /// Policy rules and AI jobs are managed by the governance tier
    #[inline]
    #[must_use]
    pub fn can_manage_add_ons(&self) -> bool {
        self.can_govern
    }

    /// Target statuses offered to this user
    #[must_use]
    pub fn status_options(&self) -> Vec<StatusOption> {
        STATUS_OPTIONS
            .into_iter()
            .filter(|opt| self.can_govern || !DocumentStatus::parse(opt.value).is_locked())
            .collect()
    }

    /// Check that the edit form may be submitted
    ///
    /// # Errors
    /// - `AccessError::EditDenied` if the user may not edit
    pub fn check_edit(&self) -> Result<(), AccessError> {
        if self.can_edit {
            Ok(())
        } else if self.is_owner {
            Err(AccessError::EditDenied(
                "validated or archived documents can only be edited by champions, governance, or admins"
                    .to_string(),
            ))
        } else {
            Err(AccessError::EditDenied(
                "only the document owner or the governance tier may edit".to_string(),
            ))
        }
    }

    /// Check that `target` is among the offered statuses
    ///
    /// # Errors
    /// - `AccessError::StatusNotOffered` if the status is reserved to the governance tier
    pub fn check_status_target(&self, target: &DocumentStatus) -> Result<(), AccessError> {
        if self.can_govern || !target.is_locked() {
            Ok(())
        } else {
            Err(AccessError::StatusNotOffered(target.as_str().to_string()))
        }
    }
}
