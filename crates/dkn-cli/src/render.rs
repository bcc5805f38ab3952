//! Plain-text views
//!
//! Every function here is pure: it takes decoded records and returns the
//! text to print.

use dkn_access::{format_status, DocumentAccess, DocumentStatus, Navigation, NavKey, User};
use dkn_client::auth::RoleChoices;
use dkn_client::dashboard::{DashboardData, Loadable, Resource};
use dkn_client::forms::{Notice, Tone};
use dkn_client::records::{
    format_timestamp, AuditLog, Constraint, DirectoryUser, Document, ExpertiseProfile,
    Gamification, LeaderboardEntry, Office, Project, Recommendation, Tag, Workspace,
};
use dkn_client::DocumentDetail;

const EMPTY: &str = "  (none)";

fn or_dash(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("-")
}

fn id_or_dash(id: Option<&dkn_access::EntityId>) -> String {
    id.map_or_else(|| "-".to_string(), ToString::to_string)
}

fn status_label(status: Option<&DocumentStatus>) -> String {
    status.map_or_else(|| format_status(None), DocumentStatus::label)
}

fn when(raw: Option<&str>) -> String {
    raw.map_or_else(|| "-".to_string(), format_timestamp)
}

fn block(title: &str, lines: Vec<String>) -> String {
    let mut out = vec![title.to_string()];
    if lines.is_empty() {
        out.push(EMPTY.to_string());
    } else {
        out.extend(lines);
    }
    out.join("\n")
}

/// Status line with a tone marker
#[must_use]
pub fn notice(notice: &Notice) -> String {
    let marker = match notice.tone {
        Tone::Success => "ok",
        Tone::Error => "error",
        Tone::Neutral => "note",
    };
    format!("{marker}: {}", notice.text)
}

/// One-line user chip
#[must_use]
pub fn user(user: &User) -> String {
    let email = user.email.as_deref().map(|e| format!(" <{e}>")).unwrap_or_default();
    format!(
        "[{}] {}{} - {}",
        user.initials(),
        user.display_name(),
        email,
        user.role_label()
    )
}

/// Navigation tree, marking the active view
#[must_use]
pub fn navigation(nav: &Navigation, active: Option<NavKey>) -> String {
    let mut lines = Vec::new();
    for section in nav.sections() {
        lines.push(section.label.to_string());
        for item in &section.items {
            let marker = if Some(item.key) == active { '*' } else { ' ' };
            lines.push(format!("  {marker} {:<28}{}", item.label, item.key.path()));
        }
    }
    lines.join("\n")
}

/// Role choices for registration
#[must_use]
pub fn roles(choices: &RoleChoices) -> String {
    let mut lines: Vec<String> = choices
        .options
        .iter()
        .enumerate()
        .map(|(idx, option)| {
            let default = if idx == 0 { " (default)" } else { "" };
            format!("  {}{default}", option.role_name)
        })
        .collect();
    if let Some(n) = &choices.notice {
        lines.push(notice(n));
    }
    block("Roles", lines)
}

fn document_line(doc: &Document) -> String {
    format!(
        "  #{:<6} {:<40} {:<20} {:<13} {}",
        id_or_dash(doc.id.as_ref()),
        doc.display_title(),
        status_label(doc.status.as_ref()),
        or_dash(doc.confidentiality.as_deref()),
        when(doc.updated_at.as_deref().or(doc.created_at.as_deref())),
    )
}

/// Document list
#[must_use]
pub fn documents(title: &str, docs: &[Document]) -> String {
    block(title, docs.iter().map(document_line).collect())
}

/// Document detail with the add-ons and what the user may do
#[must_use]
pub fn detail(detail: &DocumentDetail, access: &DocumentAccess) -> String {
    let doc = &detail.document;
    let mut lines = vec![
        format!("{} (#{})", doc.display_title(), id_or_dash(doc.id.as_ref())),
        format!("  Status:          {}", status_label(doc.status.as_ref())),
        format!("  Confidentiality: {}", or_dash(doc.confidentiality.as_deref())),
        format!(
            "  Project:         {}",
            or_dash(doc.project.as_ref().and_then(|p| p.name.as_deref()))
        ),
        format!(
            "  Workspace:       {}",
            or_dash(doc.workspace.as_ref().and_then(|w| w.name.as_deref()))
        ),
        format!(
            "  Creator:         {}",
            or_dash(doc.creator.as_ref().and_then(|c| c.name.as_deref()))
        ),
        format!("  Tags:            {}", or_dash(Some(doc.tag_names().as_str()))),
        format!("  Created:         {}", when(doc.created_at.as_deref())),
        format!("  Updated:         {}", when(doc.updated_at.as_deref())),
    ];
    if let Some(description) = doc.description.as_deref().filter(|d| !d.is_empty()) {
        lines.push(String::new());
        lines.push(format!("  {description}"));
    }

    lines.push(String::new());
    lines.push(block(
        "Policy rules",
        detail
            .policy_rules
            .iter()
            .map(|rule| {
                format!(
                    "  {} {}",
                    rule.heading(),
                    rule.description.as_deref().unwrap_or_default()
                )
                .trim_end()
                .to_string()
            })
            .collect(),
    ));
    lines.push(block(
        "AI jobs",
        detail
            .ai_jobs
            .iter()
            .map(|job| {
                format!(
                    "  {:<24} {:<12} {}",
                    or_dash(job.job_type.as_deref()),
                    or_dash(job.status.as_deref()),
                    when(job.created_at.as_deref())
                )
            })
            .collect(),
    ));

    lines.push(String::new());
    let edit = if access.can_edit {
        let targets: Vec<&str> = access.status_options().iter().map(|o| o.value).collect();
        format!("editable (status: {})", targets.join(", "))
    } else if access.is_owner {
        "locked: validated or archived documents need a champion, governance or admin".to_string()
    } else {
        "read only".to_string()
    };
    lines.push(format!("  Access: {edit}"));
    if access.can_manage_add_ons() {
        lines.push("  Add-ons: policy rules and AI jobs may be added".to_string());
    }
    lines.join("\n")
}

/// Projects
#[must_use]
pub fn projects(items: &[Project]) -> String {
    block(
        "Projects",
        items
            .iter()
            .map(|p| {
                format!(
                    "  #{:<6} {:<32} {:<10} {}",
                    id_or_dash(p.id.as_ref()),
                    or_dash(p.name.as_deref()),
                    if p.is_active() { "active" } else { "inactive" },
                    or_dash(p.region.as_deref())
                )
            })
            .collect(),
    )
}

/// Workspaces and tags
#[must_use]
pub fn metadata(workspaces: &[Workspace], tags: &[Tag]) -> String {
    let workspaces = block(
        "Workspaces",
        workspaces
            .iter()
            .map(|w| {
                format!(
                    "  #{:<6} {:<32} {}",
                    id_or_dash(w.id.as_ref()),
                    or_dash(w.name.as_deref()),
                    or_dash(w.visibility.as_deref())
                )
            })
            .collect(),
    );
    let tags = block(
        "Tags",
        tags.iter()
            .map(|t| format!("  #{:<6} {}", id_or_dash(t.id.as_ref()), t.display_name()))
            .collect(),
    );
    format!("{workspaces}\n\n{tags}")
}

/// Offices and regulatory constraints
#[must_use]
pub fn constraints(offices: &[Office], constraints: &[Constraint]) -> String {
    let offices = block(
        "Offices",
        offices
            .iter()
            .map(|o| {
                format!(
                    "  {:<32} {:<16} {}",
                    o.display_name(),
                    or_dash(o.city.as_deref()),
                    or_dash(o.network_status.as_deref())
                )
            })
            .collect(),
    );
    let constraints = block(
        "Regulatory constraints",
        constraints
            .iter()
            .map(|c| {
                format!(
                    "  {:<32} {:<8} {}",
                    or_dash(c.title.as_deref().or(c.name.as_deref())),
                    or_dash(c.region.as_deref()),
                    or_dash(c.description.as_deref().or(c.notes.as_deref()))
                )
            })
            .collect(),
    );
    format!("{offices}\n\n{constraints}")
}

/// Points, badges and the leaderboard
#[must_use]
pub fn gamification(score: Option<&Gamification>, leaderboard: &[LeaderboardEntry]) -> String {
    let summary = match score {
        Some(score) => vec![
            format!(
                "  Points: {}",
                score.points.map_or_else(|| "0".to_string(), |p| p.to_string())
            ),
            format!("  Badges: {}", score.badge_text()),
        ],
        None => Vec::new(),
    };
    let board = block(
        "Leaderboard",
        leaderboard
            .iter()
            .map(|entry| {
                format!(
                    "  {:>3}. {:<32} {}",
                    entry.place().map_or_else(|| "-".to_string(), |p| p.to_string()),
                    entry.display_name(),
                    entry.points.unwrap_or_default()
                )
            })
            .collect(),
    );
    format!("{}\n\n{board}", block("Score", summary))
}

/// Expertise profile
#[must_use]
pub fn expertise(profile: Option<&ExpertiseProfile>) -> String {
    let lines = profile.map_or_else(Vec::new, |p| {
        vec![
            format!("  Skills: {}", or_dash(p.skills.as_deref())),
            format!("  Level:  {}", or_dash(p.experience_level.as_deref())),
            format!("  Updated: {}", when(p.updated_at.as_deref())),
        ]
    });
    block("Expertise profile", lines)
}

/// Recommendations
#[must_use]
pub fn recommendations(items: &[Recommendation]) -> String {
    block(
        "Recommendations",
        items
            .iter()
            .map(|r| {
                format!(
                    "  {:<40} {:<16} {}",
                    r.title(),
                    or_dash(r.kind.as_deref()),
                    r.score.map_or_else(|| "-".to_string(), |s| format!("{s:.2}"))
                )
            })
            .collect(),
    )
}

/// Audit log
#[must_use]
pub fn audit_logs(items: &[AuditLog]) -> String {
    block(
        "Audit logs",
        items
            .iter()
            .map(|log| {
                format!(
                    "  {:<17} {:<20} {:<24} {}",
                    when(log.created_at.as_deref()),
                    or_dash(log.action.as_deref().or(log.action_type.as_deref())),
                    format!(
                        "{} {}",
                        or_dash(log.entity_type.as_deref()),
                        id_or_dash(log.entity_id.as_ref())
                    ),
                    or_dash(log.actor.as_ref().and_then(|a| a.name.as_deref()))
                )
            })
            .collect(),
    )
}

/// Admin user directory
#[must_use]
pub fn directory(items: &[DirectoryUser]) -> String {
    block(
        "Users",
        items
            .iter()
            .map(|u| {
                format!(
                    "  {:<24} {:<32} {:<12} {}",
                    or_dash(u.name.as_deref()),
                    or_dash(u.email.as_deref()),
                    u.role_label(),
                    or_dash(u.office.as_ref().and_then(|o| o.name.as_deref()).or(u.region.as_deref()))
                )
            })
            .collect(),
    )
}

fn resource_state<T>(state: &Loadable<T>, count: impl Fn(&T) -> String) -> String {
    match state {
        Loadable::Loading => "loading".to_string(),
        Loadable::Ready(value) => count(value),
        Loadable::Failed(message) => format!("failed: {message}"),
    }
}

fn items<T>(list: &[T]) -> String {
    format!("{} items", list.len())
}

fn present<T>(value: Option<&T>) -> String {
    if value.is_some() { "loaded" } else { "empty" }.to_string()
}

/// Per-resource dashboard summary
#[must_use]
pub fn dashboard(data: &DashboardData) -> String {
    let states = [
        resource_state(&data.documents, |list| items(list)),
        resource_state(&data.my_documents, |list| items(list)),
        resource_state(&data.projects, |list| items(list)),
        resource_state(&data.workspaces, |list| items(list)),
        resource_state(&data.tags, |list| items(list)),
        resource_state(&data.offices, |list| items(list)),
        resource_state(&data.constraints, |list| items(list)),
        resource_state(&data.leaderboard, |list| items(list)),
        resource_state(&data.gamification, |value| present(value.as_ref())),
        resource_state(&data.expertise, |value| present(value.as_ref())),
    ];
    let lines = Resource::ALL
        .iter()
        .zip(states)
        .map(|(resource, state)| format!("  {:<24} {state}", resource.label()))
        .collect();
    block("Dashboard", lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dkn_access::Role;
    use pretty_assertions::assert_eq;

    #[test]
    fn notice_marker_follows_tone() {
        assert_eq!(notice(&Notice::success("Tag created.")), "ok: Tag created.");
        assert_eq!(notice(&Notice::error("nope")), "error: nope");
    }

    #[test]
    fn user_chip() {
        let ada = User::new(1, "Ada Lovelace")
            .with_role(Role::Champion)
            .with_email("ada@example.com");
        assert_eq!(user(&ada), "[AL] Ada Lovelace <ada@example.com> - CHAMPION");
    }

    #[test]
    fn navigation_marks_active_view() {
        let consultant = User::new(1, "C").with_role(Role::Consultant);
        let text = navigation(&Navigation::for_user(Some(&consultant)), Some(NavKey::Upload));
        assert!(text.contains("* Upload"));
        assert!(!text.contains("Audit logs"));
    }

    #[test]
    fn empty_lists_say_so() {
        assert_eq!(documents("Knowledge base", &[]), "Knowledge base\n  (none)");
    }

    #[test]
    fn dashboard_summary_shows_each_state() {
        let data = DashboardData {
            documents: Loadable::Ready(vec![Document::default()]),
            tags: Loadable::Failed("Tags offline".to_string()),
            ..DashboardData::default()
        };
        let text = dashboard(&data);
        assert!(text.contains("documents                1 items"));
        assert!(text.contains("tags                     failed: Tags offline"));
        assert!(text.contains("leaderboard              loading"));
    }
}
