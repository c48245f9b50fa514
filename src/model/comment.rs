use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::parse::extract_mentions;

/// What kind of record a comment is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Project,
    Task,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Project => "project",
            EntityKind::Task => "task",
        }
    }

    pub fn parse_kind(s: &str) -> Option<EntityKind> {
        match s {
            "project" => Some(EntityKind::Project),
            "task" => Some(EntityKind::Task),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A project or task that comments attach to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: String,
}

impl EntityRef {
    pub fn project(id: impl Into<String>) -> Self {
        EntityRef {
            kind: EntityKind::Project,
            id: id.into(),
        }
    }

    pub fn task(id: impl Into<String>) -> Self {
        EntityRef {
            kind: EntityKind::Task,
            id: id.into(),
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}

/// A comment or a reply. Stored flat; `parent_id` links a reply to its
/// top-level comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub content: String,
    pub entity_type: EntityKind,
    pub entity_id: String,
    /// Author user ID
    pub user_id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Mention names in text order, duplicates kept
    #[serde(default)]
    pub mentions: Vec<String>,
    #[serde(default)]
    pub is_edited: bool,
}

impl Comment {
    pub fn new(
        content: impl Into<String>,
        entity: &EntityRef,
        user_id: impl Into<String>,
        parent_id: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let content = content.into();
        let mentions = extract_mentions(&content);
        Comment {
            id: super::new_id(),
            content,
            entity_type: entity.kind,
            entity_id: entity.id.clone(),
            user_id: user_id.into(),
            parent_id,
            created_at: now,
            updated_at: now,
            mentions,
            is_edited: false,
        }
    }

    /// Replace the content, recomputing mentions and marking the comment edited
    pub fn update(&mut self, content: impl Into<String>, now: DateTime<Utc>) {
        self.content = content.into();
        self.mentions = extract_mentions(&self.content);
        self.updated_at = now;
        self.is_edited = true;
    }

    pub fn entity(&self) -> EntityRef {
        EntityRef {
            kind: self.entity_type,
            id: self.entity_id.clone(),
        }
    }

    pub fn is_on(&self, entity: &EntityRef) -> bool {
        self.entity_type == entity.kind && self.entity_id == entity.id
    }

    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn new_comment_extracts_mentions() {
        let now = Utc::now();
        let c = Comment::new("hi @bob and @alice", &EntityRef::task("t1"), "u1", None, now);
        assert_eq!(c.mentions, vec!["bob", "alice"]);
        assert_eq!(c.created_at, c.updated_at);
        assert!(!c.is_edited);
        assert!(!c.is_reply());
        assert!(c.is_on(&EntityRef::task("t1")));
        assert!(!c.is_on(&EntityRef::project("t1")));
    }

    #[test]
    fn update_marks_edited() {
        let now = Utc::now();
        let mut c = Comment::new("first", &EntityRef::project("p1"), "u1", None, now);
        let later = now + Duration::minutes(5);
        c.update("second @dave", later);
        assert!(c.is_edited);
        assert_eq!(c.updated_at, later);
        assert_eq!(c.created_at, now);
        assert_eq!(c.mentions, vec!["dave"]);
    }

    #[test]
    fn stored_shape_uses_entity_type_key() {
        let c = Comment::new("x", &EntityRef::task("t9"), "u1", Some("c0".into()), Utc::now());
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["entityType"], "task");
        assert_eq!(json["entityId"], "t9");
        assert_eq!(json["parentId"], "c0");
        assert_eq!(json["isEdited"], false);
    }
}
