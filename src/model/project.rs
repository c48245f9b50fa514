use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Progress status shared by projects and tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::NotStarted, Status::InProgress, Status::Completed];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::NotStarted => "not-started",
            Status::InProgress => "in-progress",
            Status::Completed => "completed",
        }
    }

    pub fn parse_status(s: &str) -> Option<Status> {
        match s {
            "not-started" => Some(Status::NotStarted),
            "in-progress" => Some(Status::InProgress),
            "completed" => Some(Status::Completed),
            _ => None,
        }
    }

    /// Translation key for the status label
    pub fn label_key(self) -> &'static str {
        match self {
            Status::NotStarted => "not_started",
            Status::InProgress => "in_progress",
            Status::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Partial update for a project.
///
/// `name` and `status` only replace when present (and, for the name,
/// non-blank). `description` and `deadline` replace whenever present, so
/// `Some(None)` clears the deadline.
#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<Status>,
    pub deadline: Option<Option<DateTime<Utc>>>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Project {
            id: super::new_id(),
            name: name.into(),
            description: String::new(),
            status: Status::NotStarted,
            deadline: None,
            created_at: Utc::now(),
        }
    }

    pub fn update(&mut self, patch: ProjectPatch) {
        if let Some(name) = patch.name.filter(|n| !n.trim().is_empty()) {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(deadline) = patch.deadline {
            self.deadline = deadline;
        }
    }
}
