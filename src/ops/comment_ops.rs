use crate::io::store::{Key, Store, StoreError};
use crate::model::{Comment, EntityKind, EntityRef, Project, Task, User};
use crate::ops::Context;
use crate::ops::notification_ops::add_notifications;
use crate::ops::rules::{
    describe_entity, mention_notifications, owner_notification, reply_notification,
    resolve_mention,
};

/// Error type for comment operations
#[derive(Debug, thiserror::Error)]
pub enum CommentError {
    #[error("{0} not found: {1}")]
    NotFound(&'static str, String),
    #[error("{0}")]
    Validation(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// A top-level comment with its replies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadEntry {
    pub comment: Comment,
    /// Oldest first
    pub replies: Vec<Comment>,
}

/// Load the two-level thread for an entity: top-level comments newest
/// first, each with its replies oldest first.
pub fn load_thread<S: Store>(store: &S, entity: &EntityRef) -> Result<Vec<ThreadEntry>, StoreError> {
    let comments: Vec<Comment> = store.get(Key::Comments)?;
    let (mut top, replies): (Vec<Comment>, Vec<Comment>) = comments
        .into_iter()
        .filter(|c| c.is_on(entity))
        .partition(|c| !c.is_reply());
    top.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(top
        .into_iter()
        .map(|comment| {
            let mut own: Vec<Comment> = replies
                .iter()
                .filter(|r| r.parent_id.as_deref() == Some(comment.id.as_str()))
                .cloned()
                .collect();
            own.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            ThreadEntry {
                comment,
                replies: own,
            }
        })
        .collect())
}

pub fn get_comment<S: Store>(store: &S, id: &str) -> Result<Option<Comment>, StoreError> {
    let comments: Vec<Comment> = store.get(Key::Comments)?;
    Ok(comments.into_iter().find(|c| c.id == id))
}

/// Number of comments (including replies) on an entity
pub fn comment_count<S: Store>(store: &S, entity: &EntityRef) -> Result<usize, StoreError> {
    let comments: Vec<Comment> = store.get(Key::Comments)?;
    Ok(comments.iter().filter(|c| c.is_on(entity)).count())
}

/// Post a comment (or a reply when `parent_id` is set) as `ctx.user_id`.
///
/// The comment is stored before any notification is derived; a mention
/// that doesn't resolve, or a missing author record, only drops the
/// matching notification.
pub fn post_comment<S: Store>(
    store: &mut S,
    ctx: &Context,
    entity: &EntityRef,
    content: &str,
    parent_id: Option<&str>,
) -> Result<Comment, CommentError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(CommentError::Validation("comment is empty".into()));
    }

    let projects: Vec<Project> = store.get(Key::Projects)?;
    let tasks: Vec<Task> = store.get(Key::Tasks)?;
    let exists = match entity.kind {
        EntityKind::Project => projects.iter().any(|p| p.id == entity.id),
        EntityKind::Task => tasks.iter().any(|t| t.id == entity.id),
    };
    if !exists {
        return Err(CommentError::NotFound(entity.kind.as_str(), entity.id.clone()));
    }

    let mut comments: Vec<Comment> = store.get(Key::Comments)?;
    let parent = match parent_id {
        Some(pid) => {
            let parent = comments
                .iter()
                .find(|c| c.id == pid)
                .ok_or_else(|| CommentError::NotFound("comment", pid.to_string()))?;
            if !parent.is_on(entity) {
                return Err(CommentError::Validation(format!(
                    "comment {} belongs to a different {}",
                    pid, parent.entity_type
                )));
            }
            if parent.is_reply() {
                return Err(CommentError::Validation(
                    "replies can only be made to top-level comments".into(),
                ));
            }
            Some(parent.clone())
        }
        None => None,
    };

    let comment = Comment::new(
        content,
        entity,
        ctx.user_id,
        parent_id.map(str::to_string),
        ctx.now,
    );
    comments.push(comment.clone());
    store.set(Key::Comments, &comments)?;
    tracing::info!(
        comment = %comment.id,
        entity = %entity,
        reply = comment.is_reply(),
        mentions = comment.mentions.len(),
        "comment posted"
    );

    let users: Vec<User> = store.get(Key::Users)?;
    let tr = ctx.translator;
    let mut notes = Vec::new();
    if let Some(subject) = describe_entity(entity, &projects, &tasks, tr) {
        notes.extend(owner_notification(&comment, &subject, &users, tr, ctx.now));
        notes.extend(mention_notifications(
            &comment,
            &comment.mentions,
            &users,
            &subject,
            tr,
            ctx.now,
        ));
    }
    if let Some(parent) = &parent {
        notes.extend(reply_notification(&comment, parent, &users, tr, ctx.now));
    }
    add_notifications(store, notes)?;

    Ok(comment)
}

/// Replace a comment's content. Only mentions that were not in the
/// previous text (and don't resolve to an already-mentioned user) are
/// notified.
pub fn edit_comment<S: Store>(
    store: &mut S,
    ctx: &Context,
    id: &str,
    content: &str,
) -> Result<Comment, CommentError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(CommentError::Validation("comment is empty".into()));
    }

    let mut comments: Vec<Comment> = store.get(Key::Comments)?;
    let comment = comments
        .iter_mut()
        .find(|c| c.id == id)
        .ok_or_else(|| CommentError::NotFound("comment", id.to_string()))?;
    let old_mentions = std::mem::take(&mut comment.mentions);
    comment.update(content, ctx.now);
    let updated = comment.clone();
    store.set(Key::Comments, &comments)?;
    tracing::info!(comment = %updated.id, "comment edited");

    let users: Vec<User> = store.get(Key::Users)?;
    let previously: Vec<&str> = old_mentions
        .iter()
        .filter_map(|t| resolve_mention(t, &users))
        .map(|u| u.id.as_str())
        .collect();
    let fresh: Vec<String> = updated
        .mentions
        .iter()
        .filter(|t| !old_mentions.contains(t))
        .filter(|t| resolve_mention(t, &users).is_none_or(|u| !previously.contains(&u.id.as_str())))
        .cloned()
        .collect();

    if !fresh.is_empty() {
        let projects: Vec<Project> = store.get(Key::Projects)?;
        let tasks: Vec<Task> = store.get(Key::Tasks)?;
        if let Some(subject) = describe_entity(&updated.entity(), &projects, &tasks, ctx.translator)
        {
            let notes =
                mention_notifications(&updated, &fresh, &users, &subject, ctx.translator, ctx.now);
            add_notifications(store, notes)?;
        }
    }

    Ok(updated)
}

/// Delete a comment and its direct replies. Returns whether anything was
/// removed.
pub fn delete_comment<S: Store>(store: &mut S, id: &str) -> Result<bool, StoreError> {
    let mut comments: Vec<Comment> = store.get(Key::Comments)?;
    let before = comments.len();
    comments.retain(|c| c.id != id && c.parent_id.as_deref() != Some(id));
    let removed = before - comments.len();
    if removed == 0 {
        return Ok(false);
    }
    store.set(Key::Comments, &comments)?;
    tracing::info!(comment = %id, removed, "comment deleted");
    Ok(true)
}

/// Drop every comment attached to any of the given entities
pub(crate) fn delete_entity_comments<S: Store>(
    store: &mut S,
    entities: &[EntityRef],
) -> Result<usize, StoreError> {
    let mut comments: Vec<Comment> = store.get(Key::Comments)?;
    let before = comments.len();
    comments.retain(|c| !entities.iter().any(|e| c.is_on(e)));
    let removed = before - comments.len();
    if removed > 0 {
        store.set(Key::Comments, &comments)?;
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::store::MemoryStore;
    use crate::model::{Notification, Role};
    use crate::ops::i18n::Translator;
    use chrono::{DateTime, Duration, Utc};

    struct Fixture {
        store: MemoryStore,
        project: Project,
        task: Task,
        alice: String,
        bob: String,
        carol: String,
        dave: String,
    }

    fn fixture() -> Fixture {
        let mut store = MemoryStore::new();
        let users: Vec<User> = ["Alice", "Bob", "Carol", "Dave"]
            .iter()
            .map(|n| User::new(*n, format!("{}@example.com", n.to_lowercase()), Role::User))
            .collect();
        let project = Project::new("Website");
        let mut task = Task::new("Design", &project.id);
        task.assigned_to = Some(users[1].id.clone());
        store.set(Key::Users, &users).unwrap();
        store.set(Key::Projects, std::slice::from_ref(&project)).unwrap();
        store.set(Key::Tasks, std::slice::from_ref(&task)).unwrap();
        Fixture {
            store,
            project,
            task,
            alice: users[0].id.clone(),
            bob: users[1].id.clone(),
            carol: users[2].id.clone(),
            dave: users[3].id.clone(),
        }
    }

    fn ctx<'a>(user: &'a str, tr: &'a Translator, now: DateTime<Utc>) -> Context<'a> {
        Context {
            user_id: user,
            now,
            translator: tr,
        }
    }

    fn notifications(store: &MemoryStore) -> Vec<Notification> {
        store.get(Key::Notifications).unwrap()
    }

    #[test]
    fn post_notifies_mention_and_assignee() {
        let mut f = fixture();
        let tr = Translator::default();
        let entity = EntityRef::task(&f.task.id);
        post_comment(
            &mut f.store,
            &ctx(&f.carol, &tr, Utc::now()),
            &entity,
            "@Alice check this",
            None,
        )
        .unwrap();

        let notes = notifications(&f.store);
        assert_eq!(notes.len(), 2);
        let targets: Vec<_> = notes.iter().filter_map(|n| n.user_id.clone()).collect();
        assert!(targets.contains(&f.alice));
        assert!(targets.contains(&f.bob));
    }

    #[test]
    fn edit_notifies_only_new_mentions() {
        let mut f = fixture();
        let tr = Translator::default();
        let entity = EntityRef::task(&f.task.id);
        let now = Utc::now();
        let c = post_comment(
            &mut f.store,
            &ctx(&f.carol, &tr, now),
            &entity,
            "@Alice check this",
            None,
        )
        .unwrap();
        let before = notifications(&f.store).len();

        let later = now + Duration::minutes(3);
        let edited = edit_comment(
            &mut f.store,
            &ctx(&f.carol, &tr, later),
            &c.id,
            "@Alice @Dave check this",
        )
        .unwrap();
        assert!(edited.is_edited);
        assert_eq!(edited.updated_at, later);
        assert_eq!(edited.mentions, vec!["Alice", "Dave"]);

        let notes = notifications(&f.store);
        assert_eq!(notes.len(), before + 1);
        assert_eq!(notes.last().unwrap().user_id.as_deref(), Some(f.dave.as_str()));
    }

    #[test]
    fn edit_with_recased_mention_is_silent() {
        let mut f = fixture();
        let tr = Translator::default();
        let entity = EntityRef::project(&f.project.id);
        let c = post_comment(&mut f.store, &ctx(&f.carol, &tr, Utc::now()), &entity, "@Alice", None)
            .unwrap();
        let before = notifications(&f.store).len();
        edit_comment(&mut f.store, &ctx(&f.carol, &tr, Utc::now()), &c.id, "@alice again").unwrap();
        assert_eq!(notifications(&f.store).len(), before);
    }

    #[test]
    fn project_comment_without_mentions_is_silent() {
        let mut f = fixture();
        let tr = Translator::default();
        let entity = EntityRef::project(&f.project.id);
        post_comment(&mut f.store, &ctx(&f.carol, &tr, Utc::now()), &entity, "status?", None)
            .unwrap();
        assert!(notifications(&f.store).is_empty());
    }

    #[test]
    fn posting_twice_notifies_twice() {
        let mut f = fixture();
        let tr = Translator::default();
        let entity = EntityRef::project(&f.project.id);
        for _ in 0..2 {
            post_comment(&mut f.store, &ctx(&f.carol, &tr, Utc::now()), &entity, "@Dave", None)
                .unwrap();
        }
        assert_eq!(notifications(&f.store).len(), 2);
    }

    #[test]
    fn reply_notifies_parent_author() {
        let mut f = fixture();
        let tr = Translator::default();
        let entity = EntityRef::project(&f.project.id);
        let parent =
            post_comment(&mut f.store, &ctx(&f.alice, &tr, Utc::now()), &entity, "Thoughts?", None)
                .unwrap();
        let reply = post_comment(
            &mut f.store,
            &ctx(&f.dave, &tr, Utc::now()),
            &entity,
            "Looks good",
            Some(&parent.id),
        )
        .unwrap();
        assert_eq!(reply.parent_id.as_deref(), Some(parent.id.as_str()));

        let notes = notifications(&f.store);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].user_id.as_deref(), Some(f.alice.as_str()));
        assert_eq!(notes[0].kind.related_id(), Some(reply.id.as_str()));
    }

    #[test]
    fn reply_validation() {
        let mut f = fixture();
        let tr = Translator::default();
        let project = EntityRef::project(&f.project.id);
        let task = EntityRef::task(&f.task.id);
        let c = ctx(&f.alice, &tr, Utc::now());
        let parent = post_comment(&mut f.store, &c, &project, "top", None).unwrap();
        let reply = post_comment(&mut f.store, &c, &project, "child", Some(&parent.id)).unwrap();

        assert!(matches!(
            post_comment(&mut f.store, &c, &project, "grandchild", Some(&reply.id)),
            Err(CommentError::Validation(_))
        ));
        assert!(matches!(
            post_comment(&mut f.store, &c, &task, "elsewhere", Some(&parent.id)),
            Err(CommentError::Validation(_))
        ));
        assert!(matches!(
            post_comment(&mut f.store, &c, &project, "x", Some("nope")),
            Err(CommentError::NotFound("comment", _))
        ));
    }

    #[test]
    fn empty_and_unknown_entity_rejected() {
        let mut f = fixture();
        let tr = Translator::default();
        let c = ctx(&f.alice, &tr, Utc::now());
        assert!(matches!(
            post_comment(&mut f.store, &c, &EntityRef::project(&f.project.id), "   \n", None),
            Err(CommentError::Validation(_))
        ));
        assert!(matches!(
            post_comment(&mut f.store, &c, &EntityRef::task("missing"), "hi", None),
            Err(CommentError::NotFound("task", _))
        ));
        assert!(f.store.get::<Comment>(Key::Comments).unwrap().is_empty());
    }

    #[test]
    fn unknown_author_still_posts() {
        let mut f = fixture();
        let tr = Translator::default();
        let entity = EntityRef::task(&f.task.id);
        post_comment(&mut f.store, &ctx("ghost", &tr, Utc::now()), &entity, "@Zed hi", None)
            .unwrap();
        let notes = notifications(&f.store);
        assert_eq!(notes.len(), 1);
        assert!(notes[0].message.starts_with("Someone commented"));
    }

    #[test]
    fn thread_ordering() {
        let mut f = fixture();
        let tr = Translator::default();
        let entity = EntityRef::project(&f.project.id);
        let t0 = Utc::now();
        let older = post_comment(&mut f.store, &ctx(&f.alice, &tr, t0), &entity, "older", None)
            .unwrap();
        let newer = post_comment(
            &mut f.store,
            &ctx(&f.alice, &tr, t0 + Duration::minutes(1)),
            &entity,
            "newer",
            None,
        )
        .unwrap();
        let late_reply = post_comment(
            &mut f.store,
            &ctx(&f.bob, &tr, t0 + Duration::minutes(5)),
            &entity,
            "second reply",
            Some(&older.id),
        )
        .unwrap();
        let early_reply = post_comment(
            &mut f.store,
            &ctx(&f.bob, &tr, t0 + Duration::minutes(2)),
            &entity,
            "first reply",
            Some(&older.id),
        )
        .unwrap();

        let thread = load_thread(&f.store, &entity).unwrap();
        assert_eq!(thread.len(), 2);
        assert_eq!(thread[0].comment.id, newer.id);
        assert!(thread[0].replies.is_empty());
        assert_eq!(thread[1].comment.id, older.id);
        let reply_ids: Vec<_> = thread[1].replies.iter().map(|r| r.id.clone()).collect();
        assert_eq!(reply_ids, vec![early_reply.id, late_reply.id]);
        assert_eq!(comment_count(&f.store, &entity).unwrap(), 4);
    }

    #[test]
    fn thread_is_scoped_to_entity() {
        let mut f = fixture();
        let tr = Translator::default();
        let c = ctx(&f.alice, &tr, Utc::now());
        post_comment(&mut f.store, &c, &EntityRef::project(&f.project.id), "p", None).unwrap();
        let thread = load_thread(&f.store, &EntityRef::task(&f.task.id)).unwrap();
        assert!(thread.is_empty());
    }

    #[test]
    fn delete_cascades_one_level() {
        let mut f = fixture();
        let tr = Translator::default();
        let entity = EntityRef::project(&f.project.id);
        let c = ctx(&f.alice, &tr, Utc::now());
        let top = post_comment(&mut f.store, &c, &entity, "top", None).unwrap();
        let r1 = post_comment(&mut f.store, &c, &entity, "r1", Some(&top.id)).unwrap();
        post_comment(&mut f.store, &c, &entity, "r2", Some(&top.id)).unwrap();
        let other = post_comment(&mut f.store, &c, &entity, "other", None).unwrap();
        post_comment(&mut f.store, &c, &entity, "r3", Some(&other.id)).unwrap();

        assert!(delete_comment(&mut f.store, &r1.id).unwrap());
        assert_eq!(f.store.get::<Comment>(Key::Comments).unwrap().len(), 4);

        assert!(delete_comment(&mut f.store, &top.id).unwrap());
        assert_eq!(f.store.get::<Comment>(Key::Comments).unwrap().len(), 2);

        assert!(!delete_comment(&mut f.store, "missing").unwrap());
    }

    #[test]
    fn post_then_load_round_trip() {
        let mut f = fixture();
        let tr = Translator::default();
        let entity = EntityRef::task(&f.task.id);
        let c = ctx(&f.carol, &tr, Utc::now());
        let top = post_comment(&mut f.store, &c, &entity, "  **hi** @Bob  ", None).unwrap();
        let reply = post_comment(&mut f.store, &c, &entity, "@Dave too", Some(&top.id)).unwrap();

        let thread = load_thread(&f.store, &entity).unwrap();
        assert_eq!(thread[0].comment, top);
        assert_eq!(thread[0].comment.content, "**hi** @Bob");
        assert_eq!(thread[0].comment.mentions, vec!["Bob"]);
        assert_eq!(thread[0].replies, vec![reply]);
        assert_eq!(get_comment(&f.store, &top.id).unwrap(), Some(top));
    }
}
