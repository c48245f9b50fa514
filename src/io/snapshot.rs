use serde::{Deserialize, Serialize};

use crate::io::store::{Key, Store, StoreError};
use crate::model::{Comment, Notification, Project, Task, User};

/// Every stored collection and preference in one document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub notifications: Vec<Notification>,
    #[serde(default)]
    pub current_user: Option<String>,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

pub fn export_snapshot<S: Store>(store: &S) -> Result<Snapshot, StoreError> {
    Ok(Snapshot {
        users: store.get(Key::Users)?,
        projects: store.get(Key::Projects)?,
        tasks: store.get(Key::Tasks)?,
        comments: store.get(Key::Comments)?,
        notifications: store.get(Key::Notifications)?,
        current_user: store.get_value(Key::CurrentUser)?,
        theme: store.get_value(Key::Theme)?,
        language: store.get_value(Key::Language)?,
    })
}

/// Overwrite every key with the snapshot's contents
pub fn import_snapshot<S: Store>(store: &mut S, snapshot: &Snapshot) -> Result<(), StoreError> {
    store.set(Key::Users, &snapshot.users)?;
    store.set(Key::Projects, &snapshot.projects)?;
    store.set(Key::Tasks, &snapshot.tasks)?;
    store.set(Key::Comments, &snapshot.comments)?;
    store.set(Key::Notifications, &snapshot.notifications)?;
    store.set_value(Key::CurrentUser, snapshot.current_user.as_deref())?;
    store.set_value(Key::Theme, snapshot.theme.as_deref())?;
    store.set_value(Key::Language, snapshot.language.as_deref())?;
    tracing::info!(
        users = snapshot.users.len(),
        projects = snapshot.projects.len(),
        tasks = snapshot.tasks.len(),
        comments = snapshot.comments.len(),
        "imported snapshot"
    );
    Ok(())
}
