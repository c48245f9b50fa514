use crate::io::store::{Key, Store, StoreError};
use crate::model::Notification;

/// Append notifications to the store in one write
pub fn add_notifications<S: Store>(
    store: &mut S,
    new: Vec<Notification>,
) -> Result<(), StoreError> {
    if new.is_empty() {
        return Ok(());
    }
    let mut all: Vec<Notification> = store.get(Key::Notifications)?;
    for n in &new {
        tracing::info!(
            kind = n.kind.tag(),
            target = n.user_id.as_deref().unwrap_or("*"),
            "notification created"
        );
    }
    all.extend(new);
    store.set(Key::Notifications, &all)
}

/// Notifications visible to `user_id` (broadcast or targeted), newest first
pub fn visible_to<S: Store>(store: &S, user_id: &str) -> Result<Vec<Notification>, StoreError> {
    let mut visible: Vec<Notification> = store
        .get::<Notification>(Key::Notifications)?
        .into_iter()
        .filter(|n| n.is_visible_to(user_id))
        .collect();
    visible.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(visible)
}

pub fn unread_count<S: Store>(store: &S, user_id: &str) -> Result<usize, StoreError> {
    Ok(visible_to(store, user_id)?.iter().filter(|n| !n.read).count())
}

/// Mark one notification read. Returns false if the ID is unknown.
pub fn mark_as_read<S: Store>(store: &mut S, id: &str) -> Result<bool, StoreError> {
    let mut all: Vec<Notification> = store.get(Key::Notifications)?;
    let Some(n) = all.iter_mut().find(|n| n.id == id) else {
        return Ok(false);
    };
    n.mark_as_read();
    store.set(Key::Notifications, &all)?;
    Ok(true)
}

/// Mark every unread notification visible to `user_id` as read.
/// Returns whether anything changed.
pub fn mark_all_as_read<S: Store>(store: &mut S, user_id: &str) -> Result<bool, StoreError> {
    let mut all: Vec<Notification> = store.get(Key::Notifications)?;
    let mut updated = false;
    for n in all.iter_mut().filter(|n| n.is_visible_to(user_id) && !n.read) {
        n.mark_as_read();
        updated = true;
    }
    if updated {
        store.set(Key::Notifications, &all)?;
    }
    Ok(updated)
}

/// Delete one notification. Returns false if the ID is unknown.
pub fn delete_notification<S: Store>(store: &mut S, id: &str) -> Result<bool, StoreError> {
    let mut all: Vec<Notification> = store.get(Key::Notifications)?;
    let before = all.len();
    all.retain(|n| n.id != id);
    if all.len() == before {
        return Ok(false);
    }
    store.set(Key::Notifications, &all)?;
    Ok(true)
}

/// Delete every notification visible to `user_id`. Other users' targeted
/// notifications are kept. Returns the number removed.
pub fn clear_all<S: Store>(store: &mut S, user_id: &str) -> Result<usize, StoreError> {
    let mut all: Vec<Notification> = store.get(Key::Notifications)?;
    let before = all.len();
    all.retain(|n| !n.is_visible_to(user_id));
    let removed = before - all.len();
    store.set(Key::Notifications, &all)?;
    Ok(removed)
}
