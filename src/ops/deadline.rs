use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};

use crate::io::store::{Key, Store, StoreError};
use crate::model::{Notification, NotificationConfig, NotificationKind, Project, Task};
use crate::ops::i18n::Translator;
use crate::ops::notification_ops::add_notifications;
use crate::ops::rules::deadline_notification;

/// Timing for the deadline scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSettings {
    /// Tasks due within this long from now are warned about
    pub window: Duration,
    /// A task already warned about within this long is skipped
    pub dedup: Duration,
    /// Delay between scans
    pub interval: StdDuration,
}

impl Default for ScanSettings {
    fn default() -> Self {
        ScanSettings::from(&NotificationConfig::default())
    }
}

impl From<&NotificationConfig> for ScanSettings {
    fn from(config: &NotificationConfig) -> Self {
        ScanSettings {
            window: Duration::hours(config.deadline_window_hours),
            dedup: Duration::hours(config.dedup_hours),
            interval: StdDuration::from_secs(config.scan_interval_secs),
        }
    }
}

fn recently_warned(
    notifications: &[Notification],
    task_id: &str,
    since: DateTime<Utc>,
) -> bool {
    notifications.iter().any(|n| {
        matches!(&n.kind, NotificationKind::Deadline { task_id: t } if t == task_id)
            && n.created_at > since
    })
}

/// Run one deadline scan at `now` and persist what it produces.
///
/// A task qualifies when it is not completed, its deadline lies strictly
/// between `now` and `now + window`, its project still exists, and no
/// deadline notification for it was created after `now - dedup`.
pub fn run_scan_once<S: Store>(
    store: &mut S,
    now: DateTime<Utc>,
    settings: &ScanSettings,
    tr: &Translator,
) -> Result<Vec<Notification>, StoreError> {
    let tasks: Vec<Task> = store.get(Key::Tasks)?;
    let projects: Vec<Project> = store.get(Key::Projects)?;
    let existing: Vec<Notification> = store.get(Key::Notifications)?;
    let horizon = now + settings.window;
    let since = now - settings.dedup;

    let mut created = Vec::new();
    for task in &tasks {
        if task.is_completed() {
            continue;
        }
        let Some(deadline) = task.deadline else {
            continue;
        };
        if deadline <= now || deadline >= horizon {
            continue;
        }
        let Some(project) = projects.iter().find(|p| p.id == task.project_id) else {
            tracing::debug!(task = %task.id, "skipping task with missing project");
            continue;
        };
        if recently_warned(&existing, &task.id, since) || recently_warned(&created, &task.id, since)
        {
            continue;
        }
        created.push(deadline_notification(task, project, tr, now));
    }

    tracing::debug!(tasks = tasks.len(), created = created.len(), "deadline scan");
    add_notifications(store, created.clone())?;
    Ok(created)
}

/// Repeats the deadline scan with a fixed delay between runs
#[derive(Debug, Clone)]
pub struct DeadlineScanner {
    settings: ScanSettings,
}

impl DeadlineScanner {
    pub fn new(settings: ScanSettings) -> Self {
        DeadlineScanner { settings }
    }

    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    /// Scan immediately, then every `interval`, until `max_ticks` scans
    /// have run (forever when `None`). The language preference is re-read
    /// each tick. A failed tick is logged and the loop carries on.
    pub fn run<S: Store>(
        &self,
        store: &mut S,
        default_language: &str,
        max_ticks: Option<usize>,
        mut on_tick: impl FnMut(&[Notification]),
    ) -> usize {
        let mut ticks = 0;
        loop {
            let result = Translator::load(store, default_language)
                .and_then(|tr| run_scan_once(store, Utc::now(), &self.settings, &tr));
            match result {
                Ok(created) => on_tick(&created),
                Err(e) => tracing::warn!(error = %e, "deadline scan failed"),
            }
            ticks += 1;
            if max_ticks.is_some_and(|max| ticks >= max) {
                return ticks;
            }
            std::thread::sleep(self.settings.interval);
        }
    }
}
