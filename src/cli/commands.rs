use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tb", about = concat!("taskboard v", env!("CARGO_PKG_VERSION"), " - projects, threaded comments and notifications"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different board directory
    #[arg(short = 'C', long = "board-dir", global = true)]
    pub board_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new board in the current directory
    Init(InitArgs),
    /// Manage projects
    Project(ProjectCmd),
    /// Manage tasks
    Task(TaskCmd),
    /// Manage users and the current user
    User(UserCmd),
    /// Post, edit and view comments
    Comment(CommentCmd),
    /// List and manage notifications for the current user
    Notify(NotifyCmd),
    /// Run one deadline scan
    Scan,
    /// Run the deadline scan repeatedly
    Watch(WatchArgs),
    /// Show the dashboard summary
    Report,
    /// Show or set the display language (en, es, ar)
    Lang(LangArgs),
    /// Show or set the theme (light, dark, toggle)
    Theme(ThemeArgs),
    /// Write every collection to a JSON file (or stdout)
    Export(ExportArgs),
    /// Replace every collection from a JSON export
    Import(ImportArgs),
}

// ---------------------------------------------------------------------------
// Init
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct InitArgs {
    /// Board name (default: inferred from directory name)
    #[arg(long)]
    pub name: Option<String>,
    /// Default language written to config.toml
    #[arg(long)]
    pub lang: Option<String>,
    /// Default theme written to config.toml
    #[arg(long)]
    pub theme: Option<String>,
    /// Populate the board with sample users, a project and tasks
    #[arg(long)]
    pub sample: bool,
    /// Reinitialize even if taskboard/ already exists
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ProjectCmd {
    #[command(subcommand)]
    pub action: ProjectAction,
}

#[derive(Subcommand)]
pub enum ProjectAction {
    /// Add a project
    Add(ProjectAddArgs),
    /// List projects
    List(ProjectListArgs),
    /// Show a project with its tasks and comments
    Show(IdArg),
    /// Update project fields
    Update(ProjectUpdateArgs),
    /// Delete a project, its tasks and their comments
    Delete(IdArg),
}

#[derive(Args)]
pub struct IdArg {
    pub id: String,
}

#[derive(Args)]
pub struct ProjectAddArgs {
    pub name: String,
    #[arg(long, short)]
    pub description: Option<String>,
    /// not-started, in-progress, completed
    #[arg(long)]
    pub status: Option<String>,
    /// YYYY-MM-DD or RFC 3339
    #[arg(long)]
    pub deadline: Option<String>,
}

#[derive(Args)]
pub struct ProjectListArgs {
    /// Match name or description (case-insensitive)
    #[arg(long)]
    pub search: Option<String>,
    #[arg(long)]
    pub status: Option<String>,
    /// name, deadline or created
    #[arg(long, default_value = "name")]
    pub sort: String,
}

#[derive(Args)]
pub struct ProjectUpdateArgs {
    pub id: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long, short)]
    pub description: Option<String>,
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long, conflicts_with = "clear_deadline")]
    pub deadline: Option<String>,
    #[arg(long)]
    pub clear_deadline: bool,
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct TaskCmd {
    #[command(subcommand)]
    pub action: TaskAction,
}

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a task to a project
    Add(TaskAddArgs),
    /// List a project's tasks
    List(TaskListArgs),
    /// Show a task with its comments
    Show(IdArg),
    /// Update task fields
    Update(TaskUpdateArgs),
    /// Delete a task and its comments
    Delete(IdArg),
}

#[derive(Args)]
pub struct TaskAddArgs {
    /// Project ID
    pub project: String,
    pub name: String,
    #[arg(long, short)]
    pub description: Option<String>,
    #[arg(long)]
    pub status: Option<String>,
    /// low, medium, high
    #[arg(long)]
    pub priority: Option<String>,
    #[arg(long)]
    pub deadline: Option<String>,
    /// Assignee (user ID or name)
    #[arg(long)]
    pub assign: Option<String>,
}

#[derive(Args)]
pub struct TaskListArgs {
    /// Project ID
    pub project: String,
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub priority: Option<String>,
}

#[derive(Args)]
pub struct TaskUpdateArgs {
    pub id: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long, short)]
    pub description: Option<String>,
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub priority: Option<String>,
    #[arg(long, conflicts_with = "clear_deadline")]
    pub deadline: Option<String>,
    #[arg(long)]
    pub clear_deadline: bool,
    /// New assignee (user ID or name)
    #[arg(long, conflicts_with = "unassign")]
    pub assign: Option<String>,
    #[arg(long)]
    pub unassign: bool,
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct UserCmd {
    #[command(subcommand)]
    pub action: UserAction,
}

#[derive(Subcommand)]
pub enum UserAction {
    /// Add a user
    Add(UserAddArgs),
    /// List users
    List,
    /// Update user fields
    Update(UserUpdateArgs),
    /// Delete a user and unassign their tasks
    Delete(IdArg),
    /// Act as another user
    Switch(IdArg),
    /// Show the current user
    Whoami,
}

#[derive(Args)]
pub struct UserAddArgs {
    pub name: String,
    pub email: String,
    #[arg(long)]
    pub admin: bool,
}

#[derive(Args)]
pub struct UserUpdateArgs {
    pub id: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    /// admin or user
    #[arg(long)]
    pub role: Option<String>,
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct CommentCmd {
    #[command(subcommand)]
    pub action: CommentAction,
}

#[derive(Subcommand)]
pub enum CommentAction {
    /// Comment on a project or task
    Post(CommentPostArgs),
    /// Reply to a top-level comment
    Reply(CommentReplyArgs),
    /// Replace the text of your comment
    Edit(CommentEditArgs),
    /// Delete a comment and its replies
    Delete(IdArg),
    /// Show the comment thread of a project or task
    Thread(CommentThreadArgs),
    /// Render comment text as HTML
    Render(RenderArgs),
    /// Suggest users for the @mention being typed
    Suggest(SuggestArgs),
}

#[derive(Args)]
pub struct CommentPostArgs {
    /// project or task
    pub kind: String,
    pub id: String,
    pub text: String,
}

#[derive(Args)]
pub struct CommentReplyArgs {
    /// Parent comment ID
    pub parent: String,
    pub text: String,
}

#[derive(Args)]
pub struct CommentEditArgs {
    pub id: String,
    pub text: String,
}

#[derive(Args)]
pub struct CommentThreadArgs {
    /// project or task
    pub kind: String,
    pub id: String,
    /// Print rendered HTML instead of raw text
    #[arg(long)]
    pub html: bool,
}

#[derive(Args)]
pub struct RenderArgs {
    pub text: String,
}

#[derive(Args)]
pub struct SuggestArgs {
    pub text: String,
    /// Cursor byte offset (default: end of text)
    #[arg(long)]
    pub cursor: Option<usize>,
    /// Complete with the candidate at this index
    #[arg(long)]
    pub pick: Option<usize>,
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct NotifyCmd {
    #[command(subcommand)]
    pub action: Option<NotifyAction>,
}

#[derive(Subcommand)]
pub enum NotifyAction {
    /// List notifications, newest first
    List(NotifyListArgs),
    /// Mark one notification read
    Read(IdArg),
    /// Mark all notifications read
    ReadAll,
    /// Delete one notification
    Delete(IdArg),
    /// Delete all of your notifications
    Clear,
}

#[derive(Args, Default)]
pub struct NotifyListArgs {
    /// Only unread notifications
    #[arg(long)]
    pub unread: bool,
}

// ---------------------------------------------------------------------------
// Scanning and settings
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct WatchArgs {
    /// Stop after this many scans
    #[arg(long)]
    pub ticks: Option<usize>,
    /// Seconds between scans (default: from config.toml)
    #[arg(long)]
    pub interval: Option<u64>,
}

#[derive(Args)]
pub struct LangArgs {
    /// Language code to switch to
    pub code: Option<String>,
    /// Also make it the default in config.toml
    #[arg(long)]
    pub default: bool,
}

#[derive(Args)]
pub struct ThemeArgs {
    /// light, dark or toggle
    pub theme: Option<String>,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Output file (default: stdout)
    #[arg(long, short)]
    pub output: Option<String>,
}

#[derive(Args)]
pub struct ImportArgs {
    pub file: String,
}
