use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

use crate::io::store::{Key, Store, StoreError};
use crate::model::{Priority, Project, Status, Task, User};
use crate::ops::deadline::ScanSettings;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectProgress {
    pub id: String,
    pub name: String,
    pub status: Status,
    pub total: usize,
    pub completed: usize,
    /// Rounded; 0 for a project without tasks
    pub percent: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Workload {
    pub name: String,
    pub assigned: usize,
    pub completed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadlineEntry {
    pub task_id: String,
    pub task: String,
    pub project: String,
    pub deadline: DateTime<Utc>,
    pub assignee: Option<String>,
}

/// Dashboard summary of the whole store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub projects: usize,
    pub tasks: usize,
    pub users: usize,
    /// Task counts keyed by status, in declaration order
    pub by_status: IndexMap<&'static str, usize>,
    pub by_priority: IndexMap<&'static str, usize>,
    /// Keyed by project ID, in store order
    pub progress: IndexMap<String, ProjectProgress>,
    /// Keyed by user ID, in store order
    pub workload: IndexMap<String, Workload>,
    /// Incomplete tasks due within the scan window, soonest first
    pub upcoming: Vec<DeadlineEntry>,
    /// Incomplete tasks past their deadline, most overdue first
    pub overdue: Vec<DeadlineEntry>,
}

fn percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((completed * 100 + total / 2) / total) as u8
}

pub fn build_report<S: Store>(
    store: &S,
    now: DateTime<Utc>,
    settings: &ScanSettings,
) -> Result<Report, StoreError> {
    let projects: Vec<Project> = store.get(Key::Projects)?;
    let tasks: Vec<Task> = store.get(Key::Tasks)?;
    let users: Vec<User> = store.get(Key::Users)?;

    let mut by_status: IndexMap<&'static str, usize> =
        Status::ALL.iter().map(|s| (s.as_str(), 0)).collect();
    let mut by_priority: IndexMap<&'static str, usize> =
        Priority::ALL.iter().map(|p| (p.as_str(), 0)).collect();
    for task in &tasks {
        *by_status.entry(task.status.as_str()).or_default() += 1;
        *by_priority.entry(task.priority.as_str()).or_default() += 1;
    }

    let progress = projects
        .iter()
        .map(|p| {
            let own: Vec<&Task> = tasks.iter().filter(|t| t.project_id == p.id).collect();
            let completed = own.iter().filter(|t| t.is_completed()).count();
            let entry = ProjectProgress {
                id: p.id.clone(),
                name: p.name.clone(),
                status: p.status,
                total: own.len(),
                completed,
                percent: percent(completed, own.len()),
            };
            (p.id.clone(), entry)
        })
        .collect();

    let workload = users
        .iter()
        .map(|u| {
            let own = tasks
                .iter()
                .filter(|t| t.assigned_to.as_deref() == Some(u.id.as_str()));
            let (assigned, completed) =
                own.fold((0, 0), |(a, c), t| (a + 1, c + usize::from(t.is_completed())));
            let entry = Workload {
                name: u.name.clone(),
                assigned,
                completed,
            };
            (u.id.clone(), entry)
        })
        .collect();

    let entry = |task: &Task, deadline: DateTime<Utc>| DeadlineEntry {
        task_id: task.id.clone(),
        task: task.name.clone(),
        project: projects
            .iter()
            .find(|p| p.id == task.project_id)
            .map(|p| p.name.clone())
            .unwrap_or_default(),
        deadline,
        assignee: task
            .assigned_to
            .as_deref()
            .and_then(|id| users.iter().find(|u| u.id == id))
            .map(|u| u.name.clone()),
    };
    let horizon = now + settings.window;
    let mut upcoming = Vec::new();
    let mut overdue = Vec::new();
    for task in tasks.iter().filter(|t| !t.is_completed()) {
        let Some(deadline) = task.deadline else {
            continue;
        };
        if deadline < now {
            overdue.push(entry(task, deadline));
        } else if deadline < horizon {
            upcoming.push(entry(task, deadline));
        }
    }
    upcoming.sort_by_key(|e| e.deadline);
    overdue.sort_by_key(|e| e.deadline);

    Ok(Report {
        projects: projects.len(),
        tasks: tasks.len(),
        users: users.len(),
        by_status,
        by_priority,
        progress,
        workload,
        upcoming,
        overdue,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::store::MemoryStore;
    use crate::ops::entity_ops::seed_sample_data;
    use crate::ops::i18n::Translator;
    use chrono::Duration;

    #[test]
    fn empty_store() {
        let report = build_report(&MemoryStore::new(), Utc::now(), &ScanSettings::default()).unwrap();
        assert_eq!(report.tasks, 0);
        assert_eq!(report.by_status.values().sum::<usize>(), 0);
        assert_eq!(
            report.by_status.keys().copied().collect::<Vec<_>>(),
            vec!["not-started", "in-progress", "completed"]
        );
        assert!(report.progress.is_empty());
    }

    #[test]
    fn sample_data_report() {
        let mut store = MemoryStore::new();
        let now = Utc::now();
        seed_sample_data(&mut store, &Translator::default(), now).unwrap();

        let report = build_report(&store, now, &ScanSettings::default()).unwrap();
        assert_eq!(report.projects, 1);
        assert_eq!(report.tasks, 3);
        assert_eq!(report.by_status["completed"], 1);
        assert_eq!(report.by_priority["medium"], 2);

        let progress = report.progress.values().next().unwrap();
        assert_eq!(progress.name, "Website Redesign");
        assert_eq!((progress.completed, progress.total, progress.percent), (1, 3, 33));

        let john = report.workload.values().find(|w| w.name == "John Doe").unwrap();
        assert_eq!((john.assigned, john.completed), (2, 1));
        assert!(report.upcoming.is_empty());
        assert!(report.overdue.is_empty());

        let later = build_report(&store, now + Duration::days(15), &ScanSettings::default()).unwrap();
        assert_eq!(later.overdue.len(), 1);
        assert_eq!(later.overdue[0].task, "Implement frontend");
        assert_eq!(later.overdue[0].assignee.as_deref(), Some("John Doe"));

        let near = build_report(&store, now + Duration::days(20), &ScanSettings::default()).unwrap();
        assert_eq!(near.upcoming.len(), 1);
        assert_eq!(near.upcoming[0].task, "Backend integration");
        assert_eq!(near.upcoming[0].project, "Website Redesign");
    }

    #[test]
    fn percent_rounds() {
        assert_eq!(percent(0, 0), 0);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(3, 3), 100);
    }
}
