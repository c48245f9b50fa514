use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{Comment, Notification, Project, Status, Task, User};
use crate::ops::comment_ops::ThreadEntry;
use crate::ops::i18n::Translator;
use crate::ops::report::Report;
use crate::ops::rules::author_name;
use crate::parse::render_markdown;
use crate::util::unicode::{fit_to_width, initials, truncate_to_width};

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentJson {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: String,
    pub html: String,
}

#[derive(Serialize)]
pub struct ThreadEntryJson {
    #[serde(flatten)]
    pub comment: CommentJson,
    pub replies: Vec<CommentJson>,
}

#[derive(Serialize)]
pub struct ProjectDetailJson {
    #[serde(flatten)]
    pub project: Project,
    pub tasks: Vec<Task>,
    pub comments: Vec<ThreadEntryJson>,
}

#[derive(Serialize)]
pub struct TaskDetailJson {
    #[serde(flatten)]
    pub task: Task,
    pub comments: Vec<ThreadEntryJson>,
}

#[derive(Serialize)]
pub struct NotificationListJson {
    pub unread: usize,
    pub notifications: Vec<Notification>,
}

#[derive(Serialize)]
pub struct SuggestJson {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    pub candidates: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<usize>,
}

pub fn comment_to_json(comment: &Comment, users: &[User], tr: &Translator) -> CommentJson {
    CommentJson {
        comment: comment.clone(),
        author: author_name(&comment.user_id, users, tr),
        html: render_markdown(&comment.content),
    }
}

pub fn thread_to_json(thread: &[ThreadEntry], users: &[User], tr: &Translator) -> Vec<ThreadEntryJson> {
    thread
        .iter()
        .map(|entry| ThreadEntryJson {
            comment: comment_to_json(&entry.comment, users, tr),
            replies: entry
                .replies
                .iter()
                .map(|r| comment_to_json(r, users, tr))
                .collect(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

const NAME_WIDTH: usize = 28;

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}

fn format_date(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn user_label(id: Option<&str>, users: &[User], tr: &Translator) -> String {
    match id {
        None => tr.translate("unassigned").to_string(),
        Some(id) => users
            .iter()
            .find(|u| u.id == id)
            .map(|u| u.name.clone())
            .unwrap_or_else(|| tr.translate("unknown_user").to_string()),
    }
}

/// `<id>  <name>  <status>  <deadline>`
pub fn format_project_line(project: &Project, tr: &Translator) -> String {
    format!(
        "{}  {}  {:<12}  {}",
        project.id,
        fit_to_width(&project.name, NAME_WIDTH),
        tr.translate(project.status.label_key()),
        format_date(project.deadline),
    )
}

/// `<id>  <name>  <status>  <priority>  <deadline>  <assignee>`
pub fn format_task_line(task: &Task, users: &[User], tr: &Translator) -> String {
    format!(
        "{}  {}  {:<12}  {:<6}  {}  {}",
        task.id,
        fit_to_width(&task.name, NAME_WIDTH),
        tr.translate(task.status.label_key()),
        tr.translate(task.priority.as_str()),
        format_date(task.deadline),
        user_label(task.assigned_to.as_deref(), users, tr),
    )
}

pub fn format_user_line(user: &User, current: Option<&str>) -> String {
    let marker = if current == Some(user.id.as_str()) { '*' } else { ' ' };
    format!(
        "{} {}  [{:<2}] {}  <{}>  {}",
        marker,
        user.id,
        initials(&user.name),
        fit_to_width(&user.name, NAME_WIDTH),
        user.email,
        user.role.as_str(),
    )
}

fn format_comment(comment: &Comment, users: &[User], tr: &Translator, html: bool, indent: &str) -> Vec<String> {
    let author = author_name(&comment.user_id, users, tr);
    let mut header = format!(
        "{}{} [{}]  {}  ({})",
        indent,
        author,
        initials(&author),
        format_timestamp(comment.created_at),
        comment.id
    );
    if comment.is_edited {
        header.push_str(&format!(" [{}]", tr.translate("edited")));
    }
    let body = if html {
        render_markdown(&comment.content)
    } else {
        comment.content.clone()
    };
    let mut lines = vec![header];
    lines.extend(body.lines().map(|l| format!("{}    {}", indent, l)));
    lines
}

/// Render a thread, replies indented under their parent
pub fn format_thread(thread: &[ThreadEntry], users: &[User], tr: &Translator, html: bool) -> Vec<String> {
    if thread.is_empty() {
        return vec![tr.translate("no_comments").to_string()];
    }
    let mut lines = Vec::new();
    for (i, entry) in thread.iter().enumerate() {
        if i > 0 {
            lines.push(String::new());
        }
        lines.extend(format_comment(&entry.comment, users, tr, html, ""));
        for reply in &entry.replies {
            lines.extend(format_comment(reply, users, tr, html, "  > "));
        }
    }
    lines
}

/// `[ ] <marker> <time>  <title>: <message>  (<id>)`
pub fn format_notification_line(n: &Notification) -> String {
    format!(
        "[{}] {} {}  {}: {}  ({})",
        if n.read { 'x' } else { ' ' },
        n.kind.marker(),
        format_timestamp(n.created_at),
        n.title,
        truncate_to_width(&n.message, 72),
        n.id
    )
}

pub fn format_report(report: &Report, tr: &Translator) -> Vec<String> {
    let mut lines = vec![format!(
        "{} {}, {} {}, {} users",
        report.projects,
        tr.translate("project"),
        report.tasks,
        tr.translate("task"),
        report.users
    )];

    let by_status: Vec<String> = report
        .by_status
        .iter()
        .map(|(k, v)| {
            let key = Status::parse_status(k).map_or(*k, |s| s.label_key());
            format!("{}: {}", tr.translate(key), v)
        })
        .collect();
    lines.push(by_status.join("  "));
    let by_priority: Vec<String> = report
        .by_priority
        .iter()
        .map(|(k, v)| format!("{}: {}", tr.translate(k), v))
        .collect();
    lines.push(by_priority.join("  "));

    if !report.progress.is_empty() {
        lines.push(String::new());
        for p in report.progress.values() {
            lines.push(format!(
                "{}  {:>3}%  {}/{}",
                fit_to_width(&p.name, NAME_WIDTH),
                p.percent,
                p.completed,
                p.total
            ));
        }
    }

    if !report.workload.is_empty() {
        lines.push(String::new());
        for w in report.workload.values() {
            lines.push(format!(
                "{}  {} {}, {} {}",
                fit_to_width(&w.name, NAME_WIDTH),
                w.assigned,
                tr.translate("task"),
                w.completed,
                tr.translate("completed").to_lowercase()
            ));
        }
    }

    for (label, entries) in [
        ("upcoming_deadlines", &report.upcoming),
        ("overdue", &report.overdue),
    ] {
        if entries.is_empty() {
            continue;
        }
        lines.push(String::new());
        lines.push(format!("{}:", tr.translate(label)));
        for e in entries {
            lines.push(format!(
                "  {}  {} ({})  {}",
                format_date(Some(e.deadline)),
                e.task,
                e.project,
                e.assignee.as_deref().unwrap_or(tr.translate("unassigned"))
            ));
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NotificationKind, Role};
    use chrono::TimeZone;

    fn fixed() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 4, 9, 30, 0).unwrap()
    }

    #[test]
    fn thread_text_layout() {
        let tr = Translator::default();
        let alice = User::new("Alice Smith", "alice@example.com", Role::User);
        let project = Project::new("Web");
        let mut top = Comment::new(
            "Looks **good**\nship it",
            &crate::model::EntityRef::project(&project.id),
            &alice.id,
            None,
            fixed(),
        );
        top.id = "c1".into();
        let mut reply = Comment::new(
            "thanks",
            &top.entity(),
            "ghost",
            Some("c1".into()),
            fixed(),
        );
        reply.id = "c2".into();
        reply.is_edited = true;
        let thread = vec![ThreadEntry {
            comment: top,
            replies: vec![reply],
        }];

        let lines = format_thread(&thread, &[alice], &tr, false);
        insta::assert_snapshot!(lines.join("\n"), @r"
        Alice Smith [AS]  2026-03-04 09:30  (c1)
            Looks **good**
            ship it
          > Someone [S]  2026-03-04 09:30  (c2) [edited]
          >     thanks
        ");
    }

    #[test]
    fn empty_thread_message() {
        let lines = format_thread(&[], &[], &Translator::default(), false);
        assert_eq!(lines, vec!["No comments yet"]);
    }

    #[test]
    fn notification_line() {
        let mut n = Notification::new(
            "Heads up",
            "Task \"Design\" is due soon.",
            NotificationKind::Deadline {
                task_id: "t1".into(),
            },
            None,
            fixed(),
        );
        n.id = "n1".into();
        assert_eq!(
            format_notification_line(&n),
            format!(
                "[ ] {} 2026-03-04 09:30  Heads up: Task \"Design\" is due soon.  (n1)",
                n.kind.marker()
            )
        );
    }

    #[test]
    fn task_line_shows_unassigned() {
        let tr = Translator::default();
        let mut task = Task::new("Design", "p1");
        task.id = "t1".into();
        task.status = Status::InProgress;
        let line = format_task_line(&task, &[], &tr);
        assert!(line.starts_with("t1  Design"));
        assert!(line.contains("In Progress"));
        assert!(line.contains("Medium"));
        assert!(line.ends_with("Unassigned"));
    }
}
