//! Notification rules.
//!
//! Every function here derives zero or more notifications from entities
//! and returns them for the caller to persist. None of them touch the
//! store or mutate their inputs.

use chrono::{DateTime, Utc};

use crate::model::{
    Comment, EntityKind, EntityRef, Notification, NotificationKind, Project, Task, User,
};
use crate::ops::i18n::Translator;

/// Display details of the entity a comment is attached to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub kind: EntityKind,
    /// Entity name; for tasks this includes the owning project
    pub label: String,
    /// Assignee for tasks; projects have no owner
    pub owner: Option<String>,
}

/// Resolve an entity to its display details. `None` when the entity no
/// longer exists, in which case the entity-based rules stay silent.
pub fn describe_entity(
    entity: &EntityRef,
    projects: &[Project],
    tasks: &[Task],
    tr: &Translator,
) -> Option<Subject> {
    match entity.kind {
        EntityKind::Project => projects.iter().find(|p| p.id == entity.id).map(|p| Subject {
            kind: EntityKind::Project,
            label: p.name.clone(),
            owner: None,
        }),
        EntityKind::Task => {
            let task = tasks.iter().find(|t| t.id == entity.id)?;
            let label = match projects.iter().find(|p| p.id == task.project_id) {
                Some(project) => tr.format(
                    "task_in_project",
                    &[("task", &task.name), ("project", &project.name)],
                ),
                None => task.name.clone(),
            };
            Some(Subject {
                kind: EntityKind::Task,
                label,
                owner: task.assigned_to.clone(),
            })
        }
    }
}

/// Display name of a user, or the translated "Someone"
pub fn author_name(user_id: &str, users: &[User], tr: &Translator) -> String {
    users
        .iter()
        .find(|u| u.id == user_id)
        .map(|u| u.name.clone())
        .unwrap_or_else(|| tr.translate("someone").to_string())
}

/// Resolve a mention token to a user.
///
/// The first user, in list order, whose name equals or starts with the
/// token (case-insensitive). `@John` therefore reaches "John Doe".
pub fn resolve_mention<'a>(token: &str, users: &'a [User]) -> Option<&'a User> {
    let token = token.to_lowercase();
    if token.is_empty() {
        return None;
    }
    users.iter().find(|u| {
        let name = u.name.to_lowercase();
        name == token || name.starts_with(&token)
    })
}

/// One `Comment` notification per distinct user resolved from `tokens`,
/// skipping the comment author.
pub fn mention_notifications(
    comment: &Comment,
    tokens: &[String],
    users: &[User],
    subject: &Subject,
    tr: &Translator,
    now: DateTime<Utc>,
) -> Vec<Notification> {
    let author = author_name(&comment.user_id, users, tr);
    let entity_type = tr.translate(subject.kind.as_str());
    let mut notified: Vec<&str> = Vec::new();
    let mut out = Vec::new();

    for token in tokens {
        let Some(user) = resolve_mention(token, users) else {
            tracing::debug!(mention = %token, "mention did not resolve to a user");
            continue;
        };
        if user.id == comment.user_id || notified.contains(&user.id.as_str()) {
            continue;
        }
        notified.push(&user.id);
        out.push(Notification::new(
            tr.translate("notif_mention_title"),
            tr.format(
                "notif_mention_message",
                &[
                    ("author", &author),
                    ("entity_type", entity_type),
                    ("entity", &subject.label),
                ],
            ),
            NotificationKind::Comment {
                comment_id: comment.id.clone(),
            },
            Some(user.id.clone()),
            now,
        ));
    }
    out
}

/// Notify the owner (task assignee) of a new comment. Project comments
/// and self-comments produce nothing.
pub fn owner_notification(
    comment: &Comment,
    subject: &Subject,
    users: &[User],
    tr: &Translator,
    now: DateTime<Utc>,
) -> Option<Notification> {
    let owner = subject.owner.as_deref()?;
    if owner == comment.user_id {
        return None;
    }
    let author = author_name(&comment.user_id, users, tr);
    let entity_type = tr.translate(subject.kind.as_str());
    Some(Notification::new(
        tr.format("notif_comment_title", &[("entity_type", entity_type)]),
        tr.format(
            "notif_comment_message",
            &[
                ("author", &author),
                ("entity_type", entity_type),
                ("entity", &subject.label),
            ],
        ),
        NotificationKind::Comment {
            comment_id: comment.id.clone(),
        },
        Some(owner.to_string()),
        now,
    ))
}

/// Notify the parent author of a reply, unless they wrote the reply or no
/// longer exist.
pub fn reply_notification(
    reply: &Comment,
    parent: &Comment,
    users: &[User],
    tr: &Translator,
    now: DateTime<Utc>,
) -> Option<Notification> {
    if parent.user_id == reply.user_id {
        return None;
    }
    users.iter().find(|u| u.id == parent.user_id)?;
    let author = author_name(&reply.user_id, users, tr);
    Some(Notification::new(
        tr.translate("notif_reply_title"),
        tr.format("notif_reply_message", &[("author", &author)]),
        NotificationKind::Comment {
            comment_id: reply.id.clone(),
        },
        Some(parent.user_id.clone()),
        now,
    ))
}

/// Notify a task's assignee when the assignment changes to a new user.
///
/// `previous` is the assignee before the change (`None` for a new task).
/// Clearing the assignee or saving with the same assignee is silent.
pub fn assignment_notification(
    task: &Task,
    previous: Option<&str>,
    project: Option<&Project>,
    tr: &Translator,
    now: DateTime<Utc>,
) -> Option<Notification> {
    let assignee = task.assigned_to.as_deref()?;
    if previous == Some(assignee) {
        return None;
    }
    let project = project?;
    Some(Notification::new(
        tr.translate("notif_assigned_title"),
        tr.format(
            "notif_assigned_message",
            &[("task", &task.name), ("project", &project.name)],
        ),
        NotificationKind::Task {
            task_id: task.id.clone(),
        },
        Some(assignee.to_string()),
        now,
    ))
}

/// Deadline warning for a task, targeted at its assignee (broadcast when
/// unassigned).
pub fn deadline_notification(
    task: &Task,
    project: &Project,
    tr: &Translator,
    now: DateTime<Utc>,
) -> Notification {
    Notification::new(
        tr.format("notif_deadline_title", &[("task", &task.name)]),
        tr.format(
            "notif_deadline_message",
            &[("task", &task.name), ("project", &project.name)],
        ),
        NotificationKind::Deadline {
            task_id: task.id.clone(),
        },
        task.assigned_to.clone(),
        now,
    )
}
