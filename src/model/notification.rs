use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a notification is about. Variants that point at a record carry
/// its ID, stored as `relatedId` next to the `type` tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Warning,
    Success,
    Danger,
    Deadline {
        #[serde(rename = "relatedId")]
        task_id: String,
    },
    Task {
        #[serde(rename = "relatedId")]
        task_id: String,
    },
    Project {
        #[serde(rename = "relatedId", default)]
        project_id: Option<String>,
    },
    User {
        #[serde(rename = "relatedId", default)]
        user_id: Option<String>,
    },
    Comment {
        #[serde(rename = "relatedId")]
        comment_id: String,
    },
}

impl NotificationKind {
    /// The lowercase tag written to the store
    pub fn tag(&self) -> &'static str {
        match self {
            NotificationKind::Info => "info",
            NotificationKind::Warning => "warning",
            NotificationKind::Success => "success",
            NotificationKind::Danger => "danger",
            NotificationKind::Deadline { .. } => "deadline",
            NotificationKind::Task { .. } => "task",
            NotificationKind::Project { .. } => "project",
            NotificationKind::User { .. } => "user",
            NotificationKind::Comment { .. } => "comment",
        }
    }

    /// ID of the record this notification refers to, if any
    pub fn related_id(&self) -> Option<&str> {
        match self {
            NotificationKind::Info
            | NotificationKind::Warning
            | NotificationKind::Success
            | NotificationKind::Danger => None,
            NotificationKind::Deadline { task_id } | NotificationKind::Task { task_id } => {
                Some(task_id)
            }
            NotificationKind::Project { project_id } => project_id.as_deref(),
            NotificationKind::User { user_id } => user_id.as_deref(),
            NotificationKind::Comment { comment_id } => Some(comment_id),
        }
    }

    /// Single-character marker used in plain-text listings
    pub fn marker(&self) -> char {
        match self {
            NotificationKind::Info => 'i',
            NotificationKind::Warning => '!',
            NotificationKind::Success => '+',
            NotificationKind::Danger => 'x',
            NotificationKind::Deadline { .. } => 'D',
            NotificationKind::Task { .. } => 'T',
            NotificationKind::Project { .. } => 'P',
            NotificationKind::User { .. } => 'U',
            NotificationKind::Comment { .. } => 'C',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub message: String,
    #[serde(flatten)]
    pub kind: NotificationKind,
    /// Target user; `None` broadcasts to everyone
    #[serde(default)]
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}

impl Notification {
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        kind: NotificationKind,
        user_id: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Notification {
            id: super::new_id(),
            title: title.into(),
            message: message.into(),
            kind,
            user_id,
            created_at: now,
            read: false,
        }
    }

    pub fn mark_as_read(&mut self) {
        self.read = true;
    }

    /// Broadcast notifications are visible to everyone
    pub fn is_visible_to(&self, user_id: &str) -> bool {
        self.user_id.as_deref().is_none_or(|u| u == user_id)
    }
}
