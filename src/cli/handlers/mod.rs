mod comments;
mod init;
pub use init::cmd_init;

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::board_io::{self, Board};
use crate::io::config_io;
use crate::io::snapshot::{Snapshot, export_snapshot, import_snapshot};
use crate::io::store::{Key, Store, StoreError, atomic_write};
use crate::model::{
    EntityKind, EntityRef, Priority, Project, ProjectPatch, Role, Status, Task, TaskPatch, User,
    UserPatch,
};
use crate::ops::comment_ops::load_thread;
use crate::ops::deadline::{DeadlineScanner, ScanSettings, run_scan_once};
use crate::ops::entity_ops::{self, ProjectQuery, ProjectSort, TaskFilter, Theme};
use crate::ops::i18n::{Language, Translator, set_language};
use crate::ops::report::build_report;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// An opened board plus the acting user
pub(crate) struct Session {
    pub board: Board,
    pub me: User,
    pub json: bool,
}

impl Session {
    fn translator(&self) -> Result<Translator, StoreError> {
        Translator::load(&self.board.store, &self.board.config.ui.default_language)
    }

    fn users(&self) -> Result<Vec<User>, StoreError> {
        self.board.store.get(Key::Users)
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let start = match &cli.board_dir {
        Some(dir) => std::fs::canonicalize(dir)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?,
        None => std::env::current_dir()?,
    };

    let json = cli.json;
    let session = || open_session(&start, json);

    match cli.command {
        // Init is handled before board discovery
        Commands::Init(args) => cmd_init(args, &start),
        Commands::Project(cmd) => cmd_project(cmd.action, &mut session()?),
        Commands::Task(cmd) => cmd_task(cmd.action, &mut session()?),
        Commands::User(cmd) => cmd_user(cmd.action, &mut session()?),
        Commands::Comment(cmd) => comments::cmd_comment(cmd.action, &mut session()?),
        Commands::Notify(cmd) => comments::cmd_notify(cmd.action, &mut session()?),
        Commands::Scan => cmd_scan(&mut session()?),
        Commands::Watch(args) => cmd_watch(args, &mut session()?),
        Commands::Report => cmd_report(&session()?),
        Commands::Lang(args) => cmd_lang(args, &mut session()?),
        Commands::Theme(args) => cmd_theme(args, &mut session()?),
        Commands::Export(args) => cmd_export(args, &session()?),
        Commands::Import(args) => cmd_import(args, &mut session()?),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn open_session(start: &Path, json: bool) -> Result<Session, Box<dyn std::error::Error>> {
    let root = board_io::discover_board(start)?;
    let mut board = board_io::open_board(&root)?;
    let me = entity_ops::ensure_admin(&mut board.store)?;
    tracing::debug!(root = %root.display(), user = %me.id, "opened board");
    Ok(Session { board, me, json })
}

fn print_json<T: serde::Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Accepts `YYYY-MM-DD` (midnight UTC) or RFC 3339
pub(crate) fn parse_deadline(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| format!("invalid date \"{}\" (expected YYYY-MM-DD)", s))
}

fn parse_status_arg(s: &str) -> Result<Status, String> {
    Status::parse_status(s).ok_or_else(|| {
        format!("invalid status \"{}\" (expected not-started, in-progress or completed)", s)
    })
}

fn parse_priority_arg(s: &str) -> Result<Priority, String> {
    Priority::parse_priority(s)
        .ok_or_else(|| format!("invalid priority \"{}\" (expected low, medium or high)", s))
}

pub(crate) fn parse_entity(kind: &str, id: &str) -> Result<EntityRef, String> {
    let kind = EntityKind::parse_kind(kind)
        .ok_or_else(|| format!("invalid entity \"{}\" (expected project or task)", kind))?;
    Ok(EntityRef {
        kind,
        id: id.to_string(),
    })
}

fn opt<T, E>(value: Option<&str>, parse: impl Fn(&str) -> Result<T, E>) -> Result<Option<T>, E> {
    value.map(parse).transpose()
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

fn cmd_project(action: ProjectAction, s: &mut Session) -> CmdResult {
    let tr = s.translator()?;
    match action {
        ProjectAction::Add(args) => {
            let mut project = Project::new(args.name);
            project.description = args.description.unwrap_or_default();
            project.status = opt(args.status.as_deref(), parse_status_arg)?.unwrap_or_default();
            project.deadline = opt(args.deadline.as_deref(), parse_deadline)?;
            let project = entity_ops::add_project(&mut s.board.store, project)?;
            if s.json {
                return print_json(&project);
            }
            println!("Added project {}: {}", project.id, project.name);
        }
        ProjectAction::List(args) => {
            let query = ProjectQuery {
                text: args.search,
                status: opt(args.status.as_deref(), parse_status_arg)?,
                sort: ProjectSort::parse_sort(&args.sort).ok_or_else(|| {
                    format!("invalid sort \"{}\" (expected name, deadline or created)", args.sort)
                })?,
            };
            let projects = entity_ops::query_projects(&s.board.store, &query)?;
            if s.json {
                return print_json(&projects);
            }
            for p in &projects {
                println!("{}", format_project_line(p, &tr));
            }
        }
        ProjectAction::Show(args) => {
            let project = entity_ops::get_project(&s.board.store, &args.id)?;
            let tasks = entity_ops::project_tasks(&s.board.store, &project.id, TaskFilter::default())?;
            let thread = load_thread(&s.board.store, &EntityRef::project(&project.id))?;
            let users = s.users()?;
            if s.json {
                return print_json(&ProjectDetailJson {
                    comments: thread_to_json(&thread, &users, &tr),
                    project,
                    tasks,
                });
            }
            println!("{}", format_project_line(&project, &tr));
            if !project.description.is_empty() {
                println!("  {}", project.description);
            }
            println!();
            for t in &tasks {
                println!("{}", format_task_line(t, &users, &tr));
            }
            println!();
            println!("{}:", tr.translate("comments"));
            for line in format_thread(&thread, &users, &tr, false) {
                println!("{}", line);
            }
        }
        ProjectAction::Update(args) => {
            let deadline = if args.clear_deadline {
                Some(None)
            } else {
                opt(args.deadline.as_deref(), parse_deadline)?.map(Some)
            };
            let patch = ProjectPatch {
                name: args.name,
                description: args.description,
                status: opt(args.status.as_deref(), parse_status_arg)?,
                deadline,
            };
            let project = entity_ops::update_project(&mut s.board.store, &args.id, patch)?;
            if s.json {
                return print_json(&project);
            }
            println!("Updated project {}", project.id);
        }
        ProjectAction::Delete(args) => {
            if !entity_ops::delete_project(&mut s.board.store, &args.id)? {
                return Err(format!("project not found: {}", args.id).into());
            }
            println!("Deleted project {}", args.id);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

fn resolve_assignee(s: &Session, who: &str) -> Result<String, Box<dyn std::error::Error>> {
    Ok(entity_ops::find_user(&s.board.store, who)?.id)
}

fn cmd_task(action: TaskAction, s: &mut Session) -> CmdResult {
    let tr = s.translator()?;
    let now = Utc::now();
    match action {
        TaskAction::Add(args) => {
            let mut task = Task::new(args.name, args.project);
            task.description = args.description.unwrap_or_default();
            task.status = opt(args.status.as_deref(), parse_status_arg)?.unwrap_or_default();
            task.priority = opt(args.priority.as_deref(), parse_priority_arg)?.unwrap_or_default();
            task.deadline = opt(args.deadline.as_deref(), parse_deadline)?;
            task.assigned_to = match args.assign.as_deref() {
                Some(who) => Some(resolve_assignee(s, who)?),
                None => None,
            };
            let task = entity_ops::add_task(&mut s.board.store, task, &tr, now)?;
            if s.json {
                return print_json(&task);
            }
            println!("Added task {}: {}", task.id, task.name);
        }
        TaskAction::List(args) => {
            let filter = TaskFilter {
                status: opt(args.status.as_deref(), parse_status_arg)?,
                priority: opt(args.priority.as_deref(), parse_priority_arg)?,
            };
            entity_ops::get_project(&s.board.store, &args.project)?;
            let tasks = entity_ops::project_tasks(&s.board.store, &args.project, filter)?;
            if s.json {
                return print_json(&tasks);
            }
            let users = s.users()?;
            for t in &tasks {
                println!("{}", format_task_line(t, &users, &tr));
            }
        }
        TaskAction::Show(args) => {
            let task = entity_ops::get_task(&s.board.store, &args.id)?;
            let thread = load_thread(&s.board.store, &EntityRef::task(&task.id))?;
            let users = s.users()?;
            if s.json {
                return print_json(&TaskDetailJson {
                    comments: thread_to_json(&thread, &users, &tr),
                    task,
                });
            }
            println!("{}", format_task_line(&task, &users, &tr));
            if !task.description.is_empty() {
                println!("  {}", task.description);
            }
            println!();
            println!("{}:", tr.translate("comments"));
            for line in format_thread(&thread, &users, &tr, false) {
                println!("{}", line);
            }
        }
        TaskAction::Update(args) => {
            let deadline = if args.clear_deadline {
                Some(None)
            } else {
                opt(args.deadline.as_deref(), parse_deadline)?.map(Some)
            };
            let assigned_to = if args.unassign {
                Some(None)
            } else {
                match args.assign.as_deref() {
                    Some(who) => Some(Some(resolve_assignee(s, who)?)),
                    None => None,
                }
            };
            let patch = TaskPatch {
                name: args.name,
                description: args.description,
                status: opt(args.status.as_deref(), parse_status_arg)?,
                priority: opt(args.priority.as_deref(), parse_priority_arg)?,
                deadline,
                assigned_to,
            };
            let task = entity_ops::update_task(&mut s.board.store, &args.id, patch, &tr, now)?;
            if s.json {
                return print_json(&task);
            }
            println!("Updated task {}", task.id);
        }
        TaskAction::Delete(args) => {
            if !entity_ops::delete_task(&mut s.board.store, &args.id)? {
                return Err(format!("task not found: {}", args.id).into());
            }
            println!("Deleted task {}", args.id);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

fn cmd_user(action: UserAction, s: &mut Session) -> CmdResult {
    match action {
        UserAction::Add(args) => {
            let role = if args.admin { Role::Admin } else { Role::User };
            let user = entity_ops::add_user(&mut s.board.store, User::new(args.name, args.email, role))?;
            if s.json {
                return print_json(&user);
            }
            println!("Added user {}: {}", user.id, user.name);
        }
        UserAction::List => {
            let users = s.users()?;
            if s.json {
                return print_json(&users);
            }
            for u in &users {
                println!("{}", format_user_line(u, Some(&s.me.id)));
            }
        }
        UserAction::Update(args) => {
            let role = match args.role.as_deref() {
                Some(r) => Some(
                    Role::parse_role(r)
                        .ok_or_else(|| format!("invalid role \"{}\" (expected admin or user)", r))?,
                ),
                None => None,
            };
            let id = resolve_assignee(s, &args.id)?;
            let patch = UserPatch {
                name: args.name,
                email: args.email,
                role,
            };
            let user = entity_ops::update_user(&mut s.board.store, &id, patch)?;
            if s.json {
                return print_json(&user);
            }
            println!("Updated user {}", user.id);
        }
        UserAction::Delete(args) => {
            if !s.me.is_admin() {
                return Err("only admins can delete users".into());
            }
            let id = resolve_assignee(s, &args.id)?;
            entity_ops::delete_user(&mut s.board.store, &id)?;
            println!("Deleted user {}", id);
        }
        UserAction::Switch(args) => {
            let id = resolve_assignee(s, &args.id)?;
            let user = entity_ops::set_current_user(&mut s.board.store, &id)?;
            if s.json {
                return print_json(&user);
            }
            println!("Now acting as {} ({})", user.name, user.id);
        }
        UserAction::Whoami => {
            if s.json {
                return print_json(&s.me);
            }
            println!("{} <{}> ({}, {})", s.me.name, s.me.email, s.me.role.as_str(), s.me.id);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Scanning, reporting and settings
// ---------------------------------------------------------------------------

fn cmd_scan(s: &mut Session) -> CmdResult {
    let tr = s.translator()?;
    let settings = ScanSettings::from(&s.board.config.notifications);
    let created = run_scan_once(&mut s.board.store, Utc::now(), &settings, &tr)?;
    if s.json {
        return print_json(&created);
    }
    println!("{} deadline notification(s) created", created.len());
    for n in &created {
        println!("{}", format_notification_line(n));
    }
    Ok(())
}

fn cmd_watch(args: WatchArgs, s: &mut Session) -> CmdResult {
    let mut settings = ScanSettings::from(&s.board.config.notifications);
    if let Some(secs) = args.interval {
        settings.interval = std::time::Duration::from_secs(secs);
    }
    let scanner = DeadlineScanner::new(settings);
    let json = s.json;
    let default_language = s.board.config.ui.default_language.clone();
    scanner.run(&mut s.board.store, &default_language, args.ticks, |created| {
        for n in created {
            if json {
                match serde_json::to_string(n) {
                    Ok(line) => println!("{}", line),
                    Err(e) => tracing::warn!(error = %e, "could not encode notification"),
                }
            } else {
                println!("{}", format_notification_line(n));
            }
        }
    });
    Ok(())
}

fn cmd_report(s: &Session) -> CmdResult {
    let tr = s.translator()?;
    let settings = ScanSettings::from(&s.board.config.notifications);
    let report = build_report(&s.board.store, Utc::now(), &settings)?;
    if s.json {
        return print_json(&report);
    }
    for line in format_report(&report, &tr) {
        println!("{}", line);
    }
    Ok(())
}

fn cmd_lang(args: LangArgs, s: &mut Session) -> CmdResult {
    let language = match args.code.as_deref() {
        None => s.translator()?.language(),
        Some(code) => {
            let language = Language::from_code(code)
                .ok_or_else(|| format!("unknown language \"{}\" (expected en, es or ar)", code))?;
            set_language(&mut s.board.store, language)?;
            if args.default {
                let (_, mut doc) = config_io::read_config(&s.board.board_dir)?;
                config_io::set_ui_value(&mut doc, "default_language", language.code());
                config_io::write_config(&s.board.board_dir, &doc)?;
            }
            language
        }
    };
    if s.json {
        return print_json(&serde_json::json!({
            "code": language.code(),
            "name": language.name(),
            "rtl": language.is_rtl(),
        }));
    }
    let direction = if language.is_rtl() { "rtl" } else { "ltr" };
    println!("{} ({}, {})", language.name(), language.code(), direction);
    Ok(())
}

fn cmd_theme(args: ThemeArgs, s: &mut Session) -> CmdResult {
    let default = s.board.config.ui.default_theme.clone();
    let theme = match args.theme.as_deref() {
        None => entity_ops::get_theme(&s.board.store, &default)?,
        Some("toggle") => entity_ops::toggle_theme(&mut s.board.store, &default)?,
        Some(name) => {
            let theme = Theme::parse_theme(name)
                .ok_or_else(|| format!("unknown theme \"{}\" (expected light, dark or toggle)", name))?;
            entity_ops::set_theme(&mut s.board.store, theme)?;
            theme
        }
    };
    if s.json {
        return print_json(&serde_json::json!({ "theme": theme.as_str() }));
    }
    println!("{}", theme);
    Ok(())
}

fn cmd_export(args: ExportArgs, s: &Session) -> CmdResult {
    let snapshot = export_snapshot(&s.board.store)?;
    let text = serde_json::to_string_pretty(&snapshot)?;
    match args.output {
        Some(path) => {
            atomic_write(Path::new(&path), text.as_bytes())?;
            eprintln!("Exported to {}", path);
        }
        None => println!("{}", text),
    }
    Ok(())
}

fn cmd_import(args: ImportArgs, s: &mut Session) -> CmdResult {
    if !s.me.is_admin() {
        return Err("only admins can import".into());
    }
    let text = std::fs::read_to_string(&args.file)
        .map_err(|e| format!("could not read {}: {}", args.file, e))?;
    let snapshot: Snapshot = serde_json::from_str(&text)
        .map_err(|e| format!("{} is not a valid export: {}", args.file, e))?;
    import_snapshot(&mut s.board.store, &snapshot)?;
    println!(
        "Imported {} users, {} projects, {} tasks, {} comments",
        snapshot.users.len(),
        snapshot.projects.len(),
        snapshot.tasks.len(),
        snapshot.comments.len()
    );
    Ok(())
}
