use std::fmt;

use chrono::{DateTime, Duration, Utc};

use crate::io::store::{Key, Store, StoreError};
use crate::model::{
    EntityRef, Notification, NotificationKind, Priority, Project, ProjectPatch, Role, Status,
    Task, TaskPatch, User, UserPatch,
};
use crate::ops::comment_ops::delete_entity_comments;
use crate::ops::i18n::Translator;
use crate::ops::notification_ops::add_notifications;
use crate::ops::rules::assignment_notification;

/// Error type for project, task and user operations
#[derive(Debug, thiserror::Error)]
pub enum EntityError {
    #[error("{0} not found: {1}")]
    NotFound(&'static str, String),
    #[error("{0}")]
    Validation(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

fn require_name(name: &str, what: &str) -> Result<(), EntityError> {
    if name.trim().is_empty() {
        return Err(EntityError::Validation(format!("{what} name is required")));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

pub fn add_project<S: Store>(store: &mut S, project: Project) -> Result<Project, EntityError> {
    require_name(&project.name, "project")?;
    let mut projects: Vec<Project> = store.get(Key::Projects)?;
    projects.push(project.clone());
    store.set(Key::Projects, &projects)?;
    tracing::info!(project = %project.id, "project added");
    Ok(project)
}

pub fn get_project<S: Store>(store: &S, id: &str) -> Result<Project, EntityError> {
    let projects: Vec<Project> = store.get(Key::Projects)?;
    projects
        .into_iter()
        .find(|p| p.id == id)
        .ok_or_else(|| EntityError::NotFound("project", id.to_string()))
}

pub fn update_project<S: Store>(
    store: &mut S,
    id: &str,
    patch: ProjectPatch,
) -> Result<Project, EntityError> {
    let mut projects: Vec<Project> = store.get(Key::Projects)?;
    let project = projects
        .iter_mut()
        .find(|p| p.id == id)
        .ok_or_else(|| EntityError::NotFound("project", id.to_string()))?;
    project.update(patch);
    let updated = project.clone();
    store.set(Key::Projects, &projects)?;
    Ok(updated)
}

/// Delete a project together with its tasks and every comment on either.
/// Returns false if the project doesn't exist.
pub fn delete_project<S: Store>(store: &mut S, id: &str) -> Result<bool, EntityError> {
    let mut projects: Vec<Project> = store.get(Key::Projects)?;
    let before = projects.len();
    projects.retain(|p| p.id != id);
    if projects.len() == before {
        return Ok(false);
    }
    store.set(Key::Projects, &projects)?;

    let mut tasks: Vec<Task> = store.get(Key::Tasks)?;
    let mut entities = vec![EntityRef::project(id)];
    entities.extend(
        tasks
            .iter()
            .filter(|t| t.project_id == id)
            .map(|t| EntityRef::task(&t.id)),
    );
    tasks.retain(|t| t.project_id != id);
    store.set(Key::Tasks, &tasks)?;
    let comments = delete_entity_comments(store, &entities)?;
    tracing::info!(project = %id, tasks = entities.len() - 1, comments, "project deleted");
    Ok(true)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProjectSort {
    #[default]
    Name,
    /// Soonest first; no deadline sorts last
    Deadline,
    /// Newest first
    Created,
}

impl ProjectSort {
    pub fn parse_sort(s: &str) -> Option<ProjectSort> {
        match s {
            "name" => Some(ProjectSort::Name),
            "deadline" => Some(ProjectSort::Deadline),
            "created" => Some(ProjectSort::Created),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProjectQuery {
    /// Case-insensitive match against name or description
    pub text: Option<String>,
    pub status: Option<Status>,
    pub sort: ProjectSort,
}

pub fn query_projects<S: Store>(store: &S, query: &ProjectQuery) -> Result<Vec<Project>, EntityError> {
    let needle = query
        .text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase);
    let mut projects: Vec<Project> = store
        .get::<Project>(Key::Projects)?
        .into_iter()
        .filter(|p| query.status.is_none_or(|s| p.status == s))
        .filter(|p| {
            needle.as_deref().is_none_or(|n| {
                p.name.to_lowercase().contains(n) || p.description.to_lowercase().contains(n)
            })
        })
        .collect();

    match query.sort {
        ProjectSort::Name => projects.sort_by_key(|p| p.name.to_lowercase()),
        ProjectSort::Deadline => projects.sort_by(|a, b| match (a.deadline, b.deadline) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }),
        ProjectSort::Created => projects.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
    }
    Ok(projects)
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

fn require_user(users: &[User], id: Option<&str>) -> Result<(), EntityError> {
    if let Some(id) = id
        && !users.iter().any(|u| u.id == id)
    {
        return Err(EntityError::NotFound("user", id.to_string()));
    }
    Ok(())
}

/// Add a task to an existing project. Assigning it on creation notifies
/// the assignee.
pub fn add_task<S: Store>(
    store: &mut S,
    task: Task,
    tr: &Translator,
    now: DateTime<Utc>,
) -> Result<Task, EntityError> {
    require_name(&task.name, "task")?;
    let project = get_project(store, &task.project_id)?;
    let users: Vec<User> = store.get(Key::Users)?;
    require_user(&users, task.assigned_to.as_deref())?;

    let mut tasks: Vec<Task> = store.get(Key::Tasks)?;
    tasks.push(task.clone());
    store.set(Key::Tasks, &tasks)?;
    tracing::info!(task = %task.id, project = %project.id, "task added");

    let note = assignment_notification(&task, None, Some(&project), tr, now);
    add_notifications(store, note.into_iter().collect())?;
    Ok(task)
}

pub fn get_task<S: Store>(store: &S, id: &str) -> Result<Task, EntityError> {
    let tasks: Vec<Task> = store.get(Key::Tasks)?;
    tasks
        .into_iter()
        .find(|t| t.id == id)
        .ok_or_else(|| EntityError::NotFound("task", id.to_string()))
}

/// Apply a patch; a change of assignee notifies the new assignee.
pub fn update_task<S: Store>(
    store: &mut S,
    id: &str,
    patch: TaskPatch,
    tr: &Translator,
    now: DateTime<Utc>,
) -> Result<Task, EntityError> {
    if let Some(Some(assignee)) = &patch.assigned_to {
        let users: Vec<User> = store.get(Key::Users)?;
        require_user(&users, Some(assignee))?;
    }

    let mut tasks: Vec<Task> = store.get(Key::Tasks)?;
    let task = tasks
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or_else(|| EntityError::NotFound("task", id.to_string()))?;
    let previous = task.assigned_to.clone();
    task.update(patch);
    let updated = task.clone();
    store.set(Key::Tasks, &tasks)?;

    let projects: Vec<Project> = store.get(Key::Projects)?;
    let project = projects.iter().find(|p| p.id == updated.project_id);
    let note = assignment_notification(&updated, previous.as_deref(), project, tr, now);
    add_notifications(store, note.into_iter().collect())?;
    Ok(updated)
}

/// Delete a task and its comments. Returns false if the task doesn't exist.
pub fn delete_task<S: Store>(store: &mut S, id: &str) -> Result<bool, EntityError> {
    let mut tasks: Vec<Task> = store.get(Key::Tasks)?;
    let before = tasks.len();
    tasks.retain(|t| t.id != id);
    if tasks.len() == before {
        return Ok(false);
    }
    store.set(Key::Tasks, &tasks)?;
    delete_entity_comments(store, &[EntityRef::task(id)])?;
    tracing::info!(task = %id, "task deleted");
    Ok(true)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TaskFilter {
    pub status: Option<Status>,
    pub priority: Option<Priority>,
}

/// Tasks of one project, in store order
pub fn project_tasks<S: Store>(
    store: &S,
    project_id: &str,
    filter: TaskFilter,
) -> Result<Vec<Task>, EntityError> {
    Ok(store
        .get::<Task>(Key::Tasks)?
        .into_iter()
        .filter(|t| t.project_id == project_id)
        .filter(|t| filter.status.is_none_or(|s| t.status == s))
        .filter(|t| filter.priority.is_none_or(|p| t.priority == p))
        .collect())
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

pub fn add_user<S: Store>(store: &mut S, user: User) -> Result<User, EntityError> {
    require_name(&user.name, "user")?;
    if user.email.trim().is_empty() {
        return Err(EntityError::Validation("user email is required".into()));
    }
    let mut users: Vec<User> = store.get(Key::Users)?;
    users.push(user.clone());
    store.set(Key::Users, &users)?;
    tracing::info!(user = %user.id, "user added");
    Ok(user)
}

pub fn get_user<S: Store>(store: &S, id: &str) -> Result<User, EntityError> {
    let users: Vec<User> = store.get(Key::Users)?;
    users
        .into_iter()
        .find(|u| u.id == id)
        .ok_or_else(|| EntityError::NotFound("user", id.to_string()))
}

/// Find a user by ID, or by case-insensitive exact name
pub fn find_user<S: Store>(store: &S, id_or_name: &str) -> Result<User, EntityError> {
    let users: Vec<User> = store.get(Key::Users)?;
    let lowered = id_or_name.to_lowercase();
    users
        .iter()
        .find(|u| u.id == id_or_name)
        .or_else(|| users.iter().find(|u| u.name.to_lowercase() == lowered))
        .cloned()
        .ok_or_else(|| EntityError::NotFound("user", id_or_name.to_string()))
}

/// Apply a patch. Demoting the last admin is refused.
pub fn update_user<S: Store>(
    store: &mut S,
    id: &str,
    patch: UserPatch,
) -> Result<User, EntityError> {
    let mut users: Vec<User> = store.get(Key::Users)?;
    let admins = users.iter().filter(|u| u.is_admin()).count();
    let user = users
        .iter_mut()
        .find(|u| u.id == id)
        .ok_or_else(|| EntityError::NotFound("user", id.to_string()))?;
    if user.is_admin() && admins == 1 && patch.role == Some(Role::User) {
        return Err(EntityError::Validation("cannot demote the only admin".into()));
    }
    user.update(patch);
    let updated = user.clone();
    store.set(Key::Users, &users)?;
    Ok(updated)
}

/// Delete a user and unassign their tasks. Deleting the only admin is
/// refused. If the deleted user was current, the current user is cleared.
pub fn delete_user<S: Store>(store: &mut S, id: &str) -> Result<bool, EntityError> {
    let mut users: Vec<User> = store.get(Key::Users)?;
    let Some(user) = users.iter().find(|u| u.id == id) else {
        return Ok(false);
    };
    if user.is_admin() && users.iter().filter(|u| u.is_admin()).count() == 1 {
        return Err(EntityError::Validation("cannot delete the only admin".into()));
    }
    users.retain(|u| u.id != id);
    store.set(Key::Users, &users)?;

    let mut tasks: Vec<Task> = store.get(Key::Tasks)?;
    let mut unassigned = 0;
    for task in tasks.iter_mut().filter(|t| t.assigned_to.as_deref() == Some(id)) {
        task.assigned_to = None;
        unassigned += 1;
    }
    if unassigned > 0 {
        store.set(Key::Tasks, &tasks)?;
    }
    if store.get_value(Key::CurrentUser)?.as_deref() == Some(id) {
        store.set_value(Key::CurrentUser, None)?;
    }
    tracing::info!(user = %id, unassigned, "user deleted");
    Ok(true)
}

/// Make sure an admin exists, creating "Admin" if needed, and that a
/// current user is set. Returns the current user.
pub fn ensure_admin<S: Store>(store: &mut S) -> Result<User, EntityError> {
    let mut users: Vec<User> = store.get(Key::Users)?;
    let admin = match users.iter().find(|u| u.is_admin()) {
        Some(admin) => admin.clone(),
        None => {
            let admin = User::new("Admin", "admin@example.com", Role::Admin);
            users.push(admin.clone());
            store.set(Key::Users, &users)?;
            tracing::info!(user = %admin.id, "created default admin");
            admin
        }
    };
    match current_user(store)? {
        Some(user) => Ok(user),
        None => {
            store.set_value(Key::CurrentUser, Some(&admin.id))?;
            Ok(admin)
        }
    }
}

/// The current user, if set and still present
pub fn current_user<S: Store>(store: &S) -> Result<Option<User>, EntityError> {
    let Some(id) = store.get_value(Key::CurrentUser)? else {
        return Ok(None);
    };
    let users: Vec<User> = store.get(Key::Users)?;
    Ok(users.into_iter().find(|u| u.id == id))
}

pub fn set_current_user<S: Store>(store: &mut S, id: &str) -> Result<User, EntityError> {
    let user = get_user(store, id)?;
    store.set_value(Key::CurrentUser, Some(&user.id))?;
    tracing::info!(user = %user.id, "switched current user");
    Ok(user)
}

// ---------------------------------------------------------------------------
// Theme
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn parse_theme(s: &str) -> Option<Theme> {
        match s {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored theme, else `default` (config), else light
pub fn get_theme<S: Store>(store: &S, default: &str) -> Result<Theme, StoreError> {
    Ok(store
        .get_value(Key::Theme)?
        .and_then(|t| Theme::parse_theme(&t))
        .or_else(|| Theme::parse_theme(default))
        .unwrap_or_default())
}

pub fn set_theme<S: Store>(store: &mut S, theme: Theme) -> Result<(), StoreError> {
    store.set_value(Key::Theme, Some(theme.as_str()))
}

pub fn toggle_theme<S: Store>(store: &mut S, default: &str) -> Result<Theme, StoreError> {
    let theme = get_theme(store, default)?.toggled();
    set_theme(store, theme)?;
    Ok(theme)
}

// ---------------------------------------------------------------------------
// Sample data
// ---------------------------------------------------------------------------

/// Populate an empty store with an admin, a sample user, one project with
/// three tasks and two notifications. Returns false (and does nothing)
/// unless projects, tasks and users are all empty.
pub fn seed_sample_data<S: Store>(
    store: &mut S,
    tr: &Translator,
    now: DateTime<Utc>,
) -> Result<bool, EntityError> {
    let empty = store.get::<Project>(Key::Projects)?.is_empty()
        && store.get::<Task>(Key::Tasks)?.is_empty()
        && store.get::<User>(Key::Users)?.is_empty();
    if !empty {
        return Ok(false);
    }

    let admin = User::new("Admin", "admin@example.com", Role::Admin);
    let john = User::new("John Doe", "john@example.com", Role::User);

    let mut project = Project::new("Website Redesign");
    project.description = "Redesign the company website with modern UI/UX".into();
    project.status = Status::InProgress;
    project.deadline = Some(now + Duration::days(30));

    let task = |name: &str, description: &str, status, priority, days, assignee: Option<&User>| {
        let mut t = Task::new(name, &project.id);
        t.description = description.into();
        t.status = status;
        t.priority = priority;
        t.deadline = Some(now + Duration::days(days));
        t.assigned_to = assignee.map(|u| u.id.clone());
        t
    };
    let tasks = vec![
        task(
            "Design mockups",
            "Create mockups for homepage and product pages",
            Status::Completed,
            Priority::High,
            7,
            Some(&john),
        ),
        task(
            "Implement frontend",
            "Convert mockups to HTML/CSS/JS",
            Status::InProgress,
            Priority::Medium,
            14,
            Some(&john),
        ),
        task(
            "Backend integration",
            "Connect frontend to backend APIs",
            Status::NotStarted,
            Priority::Medium,
            21,
            None,
        ),
    ];

    let mut notifications = vec![Notification::new(
        tr.translate("notif_welcome_title"),
        tr.translate("notif_welcome_message"),
        NotificationKind::Info,
        None,
        now,
    )];
    notifications.extend(assignment_notification(&tasks[0], None, Some(&project), tr, now));

    store.set(Key::Users, &[admin.clone(), john])?;
    store.set(Key::Projects, &[project])?;
    store.set(Key::Tasks, &tasks)?;
    add_notifications(store, notifications)?;
    store.set_value(Key::CurrentUser, Some(&admin.id))?;
    tracing::info!("seeded sample data");
    Ok(true)
}
