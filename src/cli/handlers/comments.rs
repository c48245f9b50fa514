use chrono::Utc;

use super::{CmdResult, Session, parse_entity, print_json};
use crate::cli::commands::{CommentAction, NotifyAction, NotifyListArgs};
use crate::cli::output::*;
use crate::model::Comment;
use crate::ops::Context;
use crate::ops::autocomplete::MentionAutocomplete;
use crate::ops::comment_ops::{self, delete_comment, edit_comment, load_thread, post_comment};
use crate::ops::notification_ops;
use crate::parse::render_markdown;

fn owned_comment(s: &Session, id: &str, allow_admin: bool) -> Result<Comment, Box<dyn std::error::Error>> {
    let comment = comment_ops::get_comment(&s.board.store, id)?
        .ok_or_else(|| format!("comment not found: {}", id))?;
    if comment.user_id != s.me.id && !(allow_admin && s.me.is_admin()) {
        return Err(format!("comment {} belongs to another user", id).into());
    }
    Ok(comment)
}

fn print_posted(s: &Session, comment: &Comment, verb: &str) -> CmdResult {
    if s.json {
        let users = s.users()?;
        return print_json(&comment_to_json(comment, &users, &s.translator()?));
    }
    println!("{} comment {}", verb, comment.id);
    Ok(())
}

pub(super) fn cmd_comment(action: CommentAction, s: &mut Session) -> CmdResult {
    let tr = s.translator()?;
    let me = s.me.id.clone();
    let ctx = Context {
        user_id: &me,
        now: Utc::now(),
        translator: &tr,
    };
    match action {
        CommentAction::Post(args) => {
            let entity = parse_entity(&args.kind, &args.id)?;
            let comment = post_comment(&mut s.board.store, &ctx, &entity, &args.text, None)?;
            print_posted(s, &comment, "Posted")
        }
        CommentAction::Reply(args) => {
            let parent = comment_ops::get_comment(&s.board.store, &args.parent)?
                .ok_or_else(|| format!("comment not found: {}", args.parent))?;
            let comment = post_comment(
                &mut s.board.store,
                &ctx,
                &parent.entity(),
                &args.text,
                Some(&parent.id),
            )?;
            print_posted(s, &comment, "Posted reply")
        }
        CommentAction::Edit(args) => {
            owned_comment(s, &args.id, false)?;
            let comment = edit_comment(&mut s.board.store, &ctx, &args.id, &args.text)?;
            print_posted(s, &comment, "Edited")
        }
        CommentAction::Delete(args) => {
            owned_comment(s, &args.id, true)?;
            delete_comment(&mut s.board.store, &args.id)?;
            println!("Deleted comment {}", args.id);
            Ok(())
        }
        CommentAction::Thread(args) => {
            let entity = parse_entity(&args.kind, &args.id)?;
            let thread = load_thread(&s.board.store, &entity)?;
            let users = s.users()?;
            if s.json {
                return print_json(&thread_to_json(&thread, &users, &tr));
            }
            for line in format_thread(&thread, &users, &tr, args.html) {
                println!("{}", line);
            }
            Ok(())
        }
        CommentAction::Render(args) => {
            println!("{}", render_markdown(&args.text));
            Ok(())
        }
        CommentAction::Suggest(args) => {
            let users = s.users()?;
            let cursor = args.cursor.unwrap_or(args.text.len());
            let mut ac = MentionAutocomplete::new();
            ac.open_suggestions(&args.text, cursor, &users);
            let query = ac.suggestions().map(|sg| sg.query.clone());
            let candidates: Vec<String> = ac
                .suggestions()
                .map(|sg| sg.candidates.iter().map(|c| c.name.clone()).collect())
                .unwrap_or_default();
            let edit = match args.pick {
                Some(index) => Some(
                    ac.commit_index(index, &args.text, cursor)
                        .ok_or_else(|| format!("no suggestion at index {}", index))?,
                ),
                None => None,
            };
            if s.json {
                return print_json(&SuggestJson {
                    query,
                    candidates,
                    cursor: edit.as_ref().map(|e| e.cursor),
                    text: edit.map(|e| e.text),
                });
            }
            match edit {
                Some(edit) => println!("{}", edit.text),
                None => {
                    for (i, name) in candidates.iter().enumerate() {
                        println!("{}  @{}", i, name);
                    }
                }
            }
            Ok(())
        }
    }
}

pub(super) fn cmd_notify(action: Option<NotifyAction>, s: &mut Session) -> CmdResult {
    let me = s.me.id.clone();
    let json = s.json;
    let tr = s.translator()?;
    let store = &mut s.board.store;
    match action.unwrap_or(NotifyAction::List(NotifyListArgs::default())) {
        NotifyAction::List(args) => {
            let unread = notification_ops::unread_count(store, &me)?;
            let notifications: Vec<_> = notification_ops::visible_to(store, &me)?
                .into_iter()
                .filter(|n| !args.unread || !n.read)
                .collect();
            if json {
                return print_json(&NotificationListJson {
                    unread,
                    notifications,
                });
            }
            println!("{} ({} unread)", tr.translate("notifications"), unread);
            if notifications.is_empty() {
                println!("{}", tr.translate("no_notifications"));
            }
            for n in &notifications {
                println!("{}", format_notification_line(n));
            }
        }
        NotifyAction::Read(args) => {
            if !notification_ops::mark_as_read(store, &args.id)? {
                return Err(format!("notification not found: {}", args.id).into());
            }
            println!("Marked {} as read", args.id);
        }
        NotifyAction::ReadAll => {
            notification_ops::mark_all_as_read(store, &me)?;
            println!("Marked all notifications as read");
        }
        NotifyAction::Delete(args) => {
            if !notification_ops::delete_notification(store, &args.id)? {
                return Err(format!("notification not found: {}", args.id).into());
            }
            println!("Deleted notification {}", args.id);
        }
        NotifyAction::Clear => {
            let removed = notification_ops::clear_all(store, &me)?;
            println!("Deleted {} notification(s)", removed);
        }
    }
    Ok(())
}
