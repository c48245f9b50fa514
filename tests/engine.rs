//! End-to-end checks of the comment, mention and notification engine
//! through the public library API, backed by an on-disk board.

use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;

use taskboard::io::board_io::{Board, init_board};
use taskboard::io::store::{Key, Store};
use taskboard::model::{Comment, EntityRef, Notification, Project, Role, Task, User};
use taskboard::ops::Context;
use taskboard::ops::autocomplete::{KeyOutcome, MentionAutocomplete, MentionKey, MentionState};
use taskboard::ops::comment_ops::{delete_comment, edit_comment, load_thread, post_comment};
use taskboard::ops::deadline::{ScanSettings, run_scan_once};
use taskboard::ops::entity_ops::{add_project, add_task, add_user};
use taskboard::ops::i18n::Translator;
use taskboard::parse::{extract_mentions, render_markdown};

struct World {
    _tmp: tempfile::TempDir,
    board: Board,
    users: Vec<User>,
    project: Project,
    task: Task,
}

impl World {
    fn user(&self, name: &str) -> &User {
        self.users.iter().find(|u| u.name == name).unwrap()
    }

    fn notifications(&self) -> Vec<Notification> {
        self.board.store.get(Key::Notifications).unwrap()
    }

    fn comments(&self) -> Vec<Comment> {
        self.board.store.get(Key::Comments).unwrap()
    }
}

/// Alice, Bob, Carol and Dave; project "Website" with task "Design"
/// assigned to Bob. Assignment notifications are cleared.
fn world() -> World {
    let tmp = tempfile::TempDir::new().unwrap();
    let mut board = init_board(tmp.path(), "engine", false).unwrap();
    let tr = Translator::default();
    let users: Vec<User> = ["Alice", "Bob", "Carol", "Dave"]
        .iter()
        .map(|n| {
            let user = User::new(*n, format!("{}@example.com", n.to_lowercase()), Role::User);
            add_user(&mut board.store, user).unwrap()
        })
        .collect();
    let project = add_project(&mut board.store, Project::new("Website")).unwrap();
    let mut task = Task::new("Design", &project.id);
    task.assigned_to = Some(users[1].id.clone());
    let task = add_task(&mut board.store, task, &tr, Utc::now()).unwrap();
    board.store.set::<Notification>(Key::Notifications, &[]).unwrap();
    World {
        _tmp: tmp,
        board,
        users,
        project,
        task,
    }
}

#[test]
fn extracts_mentions_in_order_with_duplicates() {
    assert_eq!(
        extract_mentions("hello @bob and @alice, cc @bob"),
        vec!["bob", "alice", "bob"]
    );
}

#[test]
fn renders_bold_and_italic() {
    assert_eq!(
        render_markdown("**bold** and *italic*"),
        "<strong>bold</strong> and <em>italic</em>"
    );
}

#[test]
fn mention_and_assignee_notified_once_each() {
    let mut w = world();
    let tr = Translator::default();
    let carol = w.user("Carol").id.clone();
    let ctx = Context {
        user_id: &carol,
        now: Utc::now(),
        translator: &tr,
    };
    let entity = EntityRef::task(&w.task.id);
    post_comment(&mut w.board.store, &ctx, &entity, "@Alice check this", None).unwrap();

    let notes = w.notifications();
    assert_eq!(notes.len(), 2);
    let alice = w.user("Alice").id.as_str();
    let bob = w.user("Bob").id.as_str();
    assert_eq!(notes.iter().filter(|n| n.user_id.as_deref() == Some(alice)).count(), 1);
    assert_eq!(notes.iter().filter(|n| n.user_id.as_deref() == Some(bob)).count(), 1);
}

#[test]
fn edit_notifies_only_newly_mentioned() {
    let mut w = world();
    let tr = Translator::default();
    let carol = w.user("Carol").id.clone();
    let ctx = Context {
        user_id: &carol,
        now: Utc::now(),
        translator: &tr,
    };
    let entity = EntityRef::task(&w.task.id);
    let c = post_comment(&mut w.board.store, &ctx, &entity, "@Alice check this", None).unwrap();
    let before = w.notifications().len();

    edit_comment(&mut w.board.store, &ctx, &c.id, "@Alice @Dave check this").unwrap();
    let notes = w.notifications();
    assert_eq!(notes.len(), before + 1);
    assert_eq!(notes[before].user_id.as_deref(), Some(w.user("Dave").id.as_str()));
}

#[test]
fn delete_removes_comment_and_replies() {
    let mut w = world();
    let tr = Translator::default();
    let alice = w.user("Alice").id.clone();
    let ctx = Context {
        user_id: &alice,
        now: Utc::now(),
        translator: &tr,
    };
    let entity = EntityRef::project(&w.project.id);
    let top = post_comment(&mut w.board.store, &ctx, &entity, "top", None).unwrap();
    let r1 = post_comment(&mut w.board.store, &ctx, &entity, "r1", Some(&top.id)).unwrap();
    post_comment(&mut w.board.store, &ctx, &entity, "r2", Some(&top.id)).unwrap();
    let keep = post_comment(&mut w.board.store, &ctx, &entity, "other", None).unwrap();

    assert!(delete_comment(&mut w.board.store, &r1.id).unwrap());
    assert_eq!(w.comments().len(), 3);

    assert!(delete_comment(&mut w.board.store, &top.id).unwrap());
    let left = w.comments();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].id, keep.id);
}

#[test]
fn deadline_scan_dedups_then_repeats() {
    let mut w = world();
    let tr = Translator::default();
    let settings = ScanSettings::default();
    let now = Utc::now();

    let mut tasks: Vec<Task> = w.board.store.get(Key::Tasks).unwrap();
    tasks[0].deadline = Some(now + Duration::days(1));
    w.board.store.set(Key::Tasks, &tasks).unwrap();

    run_scan_once(&mut w.board.store, now, &settings, &tr).unwrap();
    run_scan_once(&mut w.board.store, now + Duration::seconds(30), &settings, &tr).unwrap();
    assert_eq!(w.notifications().len(), 1);

    // Push the deadline out so it is still inside the window a day later
    tasks[0].deadline = Some(now + Duration::hours(47));
    w.board.store.set(Key::Tasks, &tasks).unwrap();
    run_scan_once(&mut w.board.store, now + Duration::hours(25), &settings, &tr).unwrap();
    assert_eq!(w.notifications().len(), 2);
}

#[test]
fn autocomplete_picks_second_candidate() {
    let users: Vec<User> = ["Alice", "Alison", "Bob"]
        .iter()
        .map(|n| User::new(*n, "x@example.com", Role::User))
        .collect();
    let mut ac = MentionAutocomplete::new();
    ac.open_suggestions("@ali", 4, &users);
    let names: Vec<_> = ac
        .suggestions()
        .unwrap()
        .candidates
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(names, vec!["Alice", "Alison"]);

    ac.handle_key(MentionKey::ArrowDown, "@ali", 4);
    let KeyOutcome::Committed(edit) = ac.handle_key(MentionKey::Enter { ctrl: false }, "@ali", 4)
    else {
        panic!("expected a completion");
    };
    assert_eq!(edit.text, "@Alison ");
    assert_eq!(ac.state(), &MentionState::Idle);
}

#[test]
fn autocomplete_matches_inside_names_and_closes_on_space() {
    let users: Vec<User> = ["Alice", "Alison", "Bob", "Natalie"]
        .iter()
        .map(|n| User::new(*n, "x@example.com", Role::User))
        .collect();
    let mut ac = MentionAutocomplete::new();
    assert!(ac.open_suggestions("@li", 3, &users));
    let names: Vec<_> = ac
        .suggestions()
        .unwrap()
        .candidates
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(names, vec!["Alice", "Alison", "Natalie"]);

    assert!(!ac.open_suggestions("@li x", 5, &users));
    assert_eq!(ac.state(), &MentionState::Idle);
}

#[test]
fn posted_comment_survives_reload() {
    let mut w = world();
    let tr = Translator::default();
    let dave = w.user("Dave").id.clone();
    let ctx = Context {
        user_id: &dave,
        now: Utc::now(),
        translator: &tr,
    };
    let entity = EntityRef::task(&w.task.id);
    let top = post_comment(&mut w.board.store, &ctx, &entity, "Plan: *soon* @Bob", None).unwrap();
    let reply = post_comment(&mut w.board.store, &ctx, &entity, "ok @Carol", Some(&top.id)).unwrap();

    let reopened = taskboard::io::board_io::open_board(&w.board.root).unwrap();
    let thread = load_thread(&reopened.store, &entity).unwrap();
    assert_eq!(thread.len(), 1);
    assert_eq!(thread[0].comment.content, top.content);
    assert_eq!(thread[0].comment.mentions, vec!["Bob"]);
    assert_eq!(thread[0].comment.parent_id, None);
    assert_eq!(thread[0].replies[0].content, "ok @Carol");
    assert_eq!(thread[0].replies[0].parent_id.as_deref(), Some(top.id.as_str()));
    assert_eq!(thread[0].replies[0], reply);
}
