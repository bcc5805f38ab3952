//! Role-filtered navigation tree
//!
//! The dashboard is a fixed layout of sections and items. Each item is either
//! visible to everyone or to a set of roles; [`Navigation::for_user`] keeps the
//! visible items and drops sections left empty. The tree is never persisted,
//! it is recomputed from the user every time it is needed.

use crate::error::AccessError;
use crate::predicate::has_role;
use crate::role::Role;
use crate::user::User;
use std::fmt;
use std::str::FromStr;

/// Dashboard views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavKey {
    /// Validated knowledge base
    Knowledge,
    /// Documents created by the current user
    MyDocs,
    /// Delivery projects
    Projects,
    /// Workspaces and tags
    Metadata,
    /// Offices and regulatory constraints
    Constraints,
    /// Upload form
    Upload,
    /// Champion/governance validation queue
    Validation,
    /// Governance audit log
    Audit,
    /// Expertise profile
    Expertise,
    /// Points and leaderboard
    Gamification,
    /// Recommended documents
    Recommendations,
    /// Admin user directory
    Admin,
}

impl NavKey {
    /// Key as it appears in `/dashboard/<key>`
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            NavKey::Knowledge => "knowledge",
            NavKey::MyDocs => "myDocs",
            NavKey::Projects => "projects",
            NavKey::Metadata => "metadata",
            NavKey::Constraints => "constraints",
            NavKey::Upload => "upload",
            NavKey::Validation => "validation",
            NavKey::Audit => "audit",
            NavKey::Expertise => "expertise",
            NavKey::Gamification => "gamification",
            NavKey::Recommendations => "recommendations",
            NavKey::Admin => "admin",
        }
    }

    /// Button label
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            NavKey::Knowledge => "Knowledge base",
            NavKey::MyDocs => "My documents",
            NavKey::Projects => "Projects",
            NavKey::Metadata => "Workspaces & tags",
            NavKey::Constraints => "Offices & constraints",
            NavKey::Upload => "Upload",
            NavKey::Validation => "Validation queue",
            NavKey::Audit => "Audit logs",
            NavKey::Expertise => "Expertise profile",
            NavKey::Gamification => "Gamification",
            NavKey::Recommendations => "Recommendations",
            NavKey::Admin => "Admin users",
        }
    }

    /// Dashboard path for this view
    #[must_use]
    pub fn path(&self) -> String {
        format!("/dashboard/{}", self.as_str())
    }
}

impl FromStr for NavKey {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LAYOUT
            .iter()
            .flat_map(|(_, items)| items.iter())
            .map(|(key, _)| *key)
            .find(|key| key.as_str() == s)
            .ok_or_else(|| AccessError::UnknownNavItem(s.to_string()))
    }
}

impl fmt::Display for NavKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Navigation sections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// Browsing knowledge and reference data
    Knowledge,
    /// Submitting new documents
    Contribute,
    /// Validation and oversight
    Review,
    /// Profile, score and recommendations
    Engagement,
    /// Platform administration
    Administration,
}

impl Section {
    /// Section heading
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Section::Knowledge => "Knowledge",
            Section::Contribute => "Contribute",
            Section::Review => "Review",
            Section::Engagement => "Engagement",
            Section::Administration => "Administration",
        }
    }
}

/// Who may see an item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Visible to every signed-in user
    Everyone,
    /// Visible to users holding one of the roles
    Roles(&'static [Role]),
}

impl Visibility {
    /// Evaluate against a user
    #[must_use]
    pub fn allows(&self, user: Option<&User>) -> bool {
        match self {
            Visibility::Everyone => true,
            Visibility::Roles(roles) => has_role(roles, user),
        }
    }
}

const LAYOUT: &[(Section, &[(NavKey, Visibility)])] = &[
    (
        Section::Knowledge,
        &[
            (NavKey::Knowledge, Visibility::Everyone),
            (NavKey::MyDocs, Visibility::Everyone),
            (NavKey::Projects, Visibility::Everyone),
            (NavKey::Metadata, Visibility::Everyone),
            (NavKey::Constraints, Visibility::Everyone),
        ],
    ),
    (
        Section::Contribute,
        &[(NavKey::Upload, Visibility::Roles(&Role::ALL))],
    ),
    (
        Section::Review,
        &[
            (
                NavKey::Validation,
                Visibility::Roles(&[Role::Champion, Role::Governance]),
            ),
            (NavKey::Audit, Visibility::Roles(&[Role::Governance])),
        ],
    ),
    (
        Section::Engagement,
        &[
            (NavKey::Expertise, Visibility::Everyone),
            (NavKey::Gamification, Visibility::Everyone),
            (NavKey::Recommendations, Visibility::Everyone),
        ],
    ),
    (
        Section::Administration,
        &[(NavKey::Admin, Visibility::Roles(&[Role::Admin]))],
    ),
];

/// A navigation entry with its evaluated visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavItem {
    /// View key
    pub key: NavKey,
    /// Button label
    pub label: &'static str,
    /// Result of the visibility predicate
    pub visible: bool,
}

/// A group of navigation entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavSection {
    /// Section kind
    pub section: Section,
    /// Heading
    pub label: &'static str,
    /// Entries in display order
    pub items: Vec<NavItem>,
}

/// Result of syncing the active view with a URL segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// View to render
    pub active: NavKey,
    /// Corrected URL when the requested view is not available
    pub redirect: Option<String>,
}

/// Ordered, role-filtered navigation tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    sections: Vec<NavSection>,
}

impl Navigation {
    /// View shown when the URL names none, or names one the user cannot see
    pub const DEFAULT: NavKey = NavKey::Knowledge;

    /// Full tree with every item's visibility evaluated, nothing dropped
    #[must_use]
    pub fn evaluate(user: Option<&User>) -> Self {
        let sections = LAYOUT
            .iter()
            .map(|(section, items)| NavSection {
                section: *section,
                label: section.label(),
                items: items
                    .iter()
                    .map(|(key, visibility)| NavItem {
                        key: *key,
                        label: key.label(),
                        visible: visibility.allows(user),
                    })
                    .collect(),
            })
            .collect();

        Self { sections }
    }

    /// Tree of visible items only; empty sections are removed
    #[must_use]
    pub fn for_user(user: Option<&User>) -> Self {
        Self::evaluate(user).pruned()
    }

    /// Drop hidden items, then sections with no items left
    #[must_use]
    pub fn pruned(self) -> Self {
        let sections = self
            .sections
            .into_iter()
            .filter_map(|mut section| {
                section.items.retain(|item| item.visible);
                (!section.items.is_empty()).then_some(section)
            })
            .collect();

        Self { sections }
    }

    /// Sections in display order
    #[inline]
    #[must_use]
    pub fn sections(&self) -> &[NavSection] {
        &self.sections
    }

    /// Items across all sections, in display order
    pub fn items(&self) -> impl Iterator<Item = &NavItem> {
        self.sections.iter().flat_map(|section| section.items.iter())
    }

    /// Check if a view is present and visible
    #[must_use]
    pub fn contains(&self, key: NavKey) -> bool {
        self.items().any(|item| item.key == key && item.visible)
    }

    /// Fallback view: the default if present, otherwise the first visible item
    #[must_use]
    pub fn default_key(&self) -> NavKey {
        if self.contains(Self::DEFAULT) {
            return Self::DEFAULT;
        }
        self.items()
            .find(|item| item.visible)
            .map_or(Self::DEFAULT, |item| item.key)
    }

    /// Sync the active view with the URL segment.
    ///
    /// A segment naming a view outside this tree falls back to
    /// [`default_key`](Self::default_key) and yields the corrected URL.
    #[must_use]
    pub fn select(&self, segment: Option<&str>) -> Selection {
        let Some(segment) = segment.filter(|s| !s.is_empty()) else {
            return Selection {
                active: self.default_key(),
                redirect: None,
            };
        };

        match segment.parse::<NavKey>() {
            Ok(key) if self.contains(key) => Selection {
                active: key,
                redirect: None,
            },
            _ => {
                let fallback = self.default_key();
                tracing::debug!(requested = %segment, fallback = %fallback, "view not available");
                Selection {
                    active: fallback,
                    redirect: Some(fallback.path()),
                }
            }
        }
    }
}
