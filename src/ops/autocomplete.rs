//! Mention autocomplete for comment input.
//!
//! A small state machine driven by the text and cursor of an input field.
//! Typing after an `@` opens a suggestion list of users whose name contains
//! the typed query; arrow keys move the selection; Enter or Tab
//! replaces the `@query` span with `@Name ` and closes the list.
//!
//! Cursor positions are byte offsets into the text and must fall on char
//! boundaries.

use crate::model::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Keys the autocomplete reacts to; everything else is `Other`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MentionKey {
    ArrowDown,
    ArrowUp,
    Enter { ctrl: bool },
    Tab { ctrl: bool },
    Escape,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub user_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestions {
    /// Byte offset of the `@`
    pub anchor: usize,
    pub query: String,
    pub candidates: Vec<Candidate>,
    pub selected: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MentionState {
    #[default]
    Idle,
    Suggesting(Suggestions),
}

/// Input text and cursor after a completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub text: String,
    pub cursor: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Not handled; the caller should apply its default behaviour
    Ignored,
    /// Handled with no change to the text
    Consumed,
    Committed(TextEdit),
}

#[derive(Debug, Clone, Default)]
pub struct MentionAutocomplete {
    state: MentionState,
}

/// Find the `@query` being typed at `cursor`: scan left until an `@`
/// (found) or whitespace or the start of text (not found).
pub fn mention_query_at(text: &str, cursor: usize) -> Option<(usize, &str)> {
    if cursor > text.len() || !text.is_char_boundary(cursor) {
        return None;
    }
    let before = &text[..cursor];
    for (i, c) in before.char_indices().rev() {
        if c == '@' {
            return Some((i, &before[i + 1..]));
        }
        if c.is_whitespace() {
            return None;
        }
    }
    None
}

/// Users whose name contains `query` (case-insensitive), in list order
pub fn matching_users(query: &str, users: &[User]) -> Vec<Candidate> {
    let query = query.to_lowercase();
    users
        .iter()
        .filter(|u| u.name.to_lowercase().contains(&query))
        .map(|u| Candidate {
            user_id: u.id.clone(),
            name: u.name.clone(),
        })
        .collect()
}

impl MentionAutocomplete {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &MentionState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, MentionState::Suggesting(_))
    }

    pub fn suggestions(&self) -> Option<&Suggestions> {
        match &self.state {
            MentionState::Suggesting(s) => Some(s),
            MentionState::Idle => None,
        }
    }

    /// Re-evaluate after the text or cursor changed. Opens (or refreshes)
    /// the list when the cursor sits in an `@query` with at least one
    /// match; otherwise closes it. Returns whether the list is open.
    pub fn open_suggestions(&mut self, text: &str, cursor: usize, users: &[User]) -> bool {
        let Some((anchor, query)) = mention_query_at(text, cursor) else {
            self.close_suggestions();
            return false;
        };
        let candidates = matching_users(query, users);
        if candidates.is_empty() {
            self.close_suggestions();
            return false;
        }
        self.state = MentionState::Suggesting(Suggestions {
            anchor,
            query: query.to_string(),
            candidates,
            selected: 0,
        });
        true
    }

    /// Move the highlighted candidate, clamped to the list bounds
    pub fn move_selection(&mut self, direction: Direction) {
        if let MentionState::Suggesting(s) = &mut self.state {
            s.selected = match direction {
                Direction::Up => s.selected.saturating_sub(1),
                Direction::Down => (s.selected + 1).min(s.candidates.len().saturating_sub(1)),
            };
        }
    }

    /// Insert the highlighted candidate
    pub fn commit_selection(&mut self, text: &str, cursor: usize) -> Option<TextEdit> {
        let index = self.suggestions()?.selected;
        self.commit_index(index, text, cursor)
    }

    /// Insert the candidate at `index` (a click on the list), replacing the
    /// `@query` span up to the cursor with `@Name `. Closes the list.
    pub fn commit_index(&mut self, index: usize, text: &str, cursor: usize) -> Option<TextEdit> {
        let MentionState::Suggesting(s) = std::mem::take(&mut self.state) else {
            return None;
        };
        let candidate = s.candidates.get(index)?;
        if cursor < s.anchor || cursor > text.len() || !text.is_char_boundary(cursor) {
            return None;
        }
        let mut out = String::with_capacity(text.len() + candidate.name.len() + 2);
        out.push_str(&text[..s.anchor]);
        out.push('@');
        out.push_str(&candidate.name);
        out.push(' ');
        let cursor_after = out.len();
        out.push_str(&text[cursor..]);
        Some(TextEdit {
            text: out,
            cursor: cursor_after,
        })
    }

    pub fn close_suggestions(&mut self) {
        self.state = MentionState::Idle;
    }

    /// Dispatch a key press. Ctrl+Enter and Ctrl+Tab pass through so the
    /// caller can submit the comment.
    pub fn handle_key(&mut self, key: MentionKey, text: &str, cursor: usize) -> KeyOutcome {
        if !self.is_open() {
            return KeyOutcome::Ignored;
        }
        match key {
            MentionKey::ArrowDown => {
                self.move_selection(Direction::Down);
                KeyOutcome::Consumed
            }
            MentionKey::ArrowUp => {
                self.move_selection(Direction::Up);
                KeyOutcome::Consumed
            }
            MentionKey::Enter { ctrl: false } | MentionKey::Tab { ctrl: false } => {
                match self.commit_selection(text, cursor) {
                    Some(edit) => KeyOutcome::Committed(edit),
                    None => KeyOutcome::Consumed,
                }
            }
            MentionKey::Escape => {
                self.close_suggestions();
                KeyOutcome::Consumed
            }
            MentionKey::Enter { ctrl: true } | MentionKey::Tab { ctrl: true } | MentionKey::Other => {
                KeyOutcome::Ignored
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;
    use pretty_assertions::assert_eq;

    fn users() -> Vec<User> {
        ["Alice", "Alison", "Bob"]
            .iter()
            .map(|n| User::new(*n, format!("{}@example.com", n.to_lowercase()), Role::User))
            .collect()
    }

    fn names(ac: &MentionAutocomplete) -> Vec<String> {
        ac.suggestions()
            .map(|s| s.candidates.iter().map(|c| c.name.clone()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn query_detection() {
        assert_eq!(mention_query_at("@ali", 4), Some((0, "ali")));
        assert_eq!(mention_query_at("hi @", 4), Some((3, "")));
        assert_eq!(mention_query_at("hi @bo there", 6), Some((3, "bo")));
        assert_eq!(mention_query_at("@bob there", 10), None);
        assert_eq!(mention_query_at("no mention", 5), None);
        assert_eq!(mention_query_at("@x", 9), None);
        // inside a multi-byte char
        assert_eq!(mention_query_at("@é", 2), None);
        assert_eq!(mention_query_at("@é", 3), Some((0, "é")));
    }

    #[test]
    fn arrow_down_then_enter_picks_second() {
        let users = users();
        let mut ac = MentionAutocomplete::new();
        let text = "@ali";
        assert!(ac.open_suggestions(text, 4, &users));
        assert_eq!(names(&ac), vec!["Alice", "Alison"]);

        assert_eq!(ac.handle_key(MentionKey::ArrowDown, text, 4), KeyOutcome::Consumed);
        let outcome = ac.handle_key(MentionKey::Enter { ctrl: false }, text, 4);
        assert_eq!(
            outcome,
            KeyOutcome::Committed(TextEdit {
                text: "@Alison ".into(),
                cursor: 8,
            })
        );
        assert_eq!(ac.state(), &MentionState::Idle);
    }

    #[test]
    fn matches_inside_names() {
        let mut users = users();
        users.push(User::new("Natalie", "natalie@example.com", Role::User));
        let mut ac = MentionAutocomplete::new();
        assert!(ac.open_suggestions("@li", 3, &users));
        assert_eq!(names(&ac), vec!["Alice", "Alison", "Natalie"]);

        assert!(ac.open_suggestions("@OB", 3, &users));
        assert_eq!(names(&ac), vec!["Bob"]);
    }

    #[test]
    fn typing_a_space_closes() {
        let users = users();
        let mut ac = MentionAutocomplete::new();
        assert!(ac.open_suggestions("@al", 3, &users));
        assert!(!ac.open_suggestions("@al x", 5, &users));
        assert_eq!(ac.state(), &MentionState::Idle);
        assert_eq!(ac.commit_selection("@al x", 5), None);
    }

    #[test]
    fn selection_is_clamped() {
        let users = users();
        let mut ac = MentionAutocomplete::new();
        ac.open_suggestions("@al", 3, &users);
        ac.move_selection(Direction::Up);
        assert_eq!(ac.suggestions().unwrap().selected, 0);
        for _ in 0..5 {
            ac.move_selection(Direction::Down);
        }
        assert_eq!(ac.suggestions().unwrap().selected, 1);
    }

    #[test]
    fn bare_at_lists_everyone() {
        let users = users();
        let mut ac = MentionAutocomplete::new();
        assert!(ac.open_suggestions("ping @", 6, &users));
        assert_eq!(names(&ac), vec!["Alice", "Alison", "Bob"]);
    }

    #[test]
    fn no_match_closes() {
        let users = users();
        let mut ac = MentionAutocomplete::new();
        ac.open_suggestions("@a", 2, &users);
        assert!(ac.is_open());
        assert!(!ac.open_suggestions("@az", 3, &users));
        assert_eq!(ac.state(), &MentionState::Idle);
    }

    #[test]
    fn commit_keeps_surrounding_text() {
        let users = users();
        let mut ac = MentionAutocomplete::new();
        let text = "hey @b, look";
        ac.open_suggestions(text, 6, &users);
        let edit = ac.commit_selection(text, 6).unwrap();
        assert_eq!(edit.text, "hey @Bob , look");
        assert_eq!(edit.cursor, 9);
    }

    #[test]
    fn click_commits_by_index() {
        let users = users();
        let mut ac = MentionAutocomplete::new();
        ac.open_suggestions("@", 1, &users);
        let edit = ac.commit_index(2, "@", 1).unwrap();
        assert_eq!(edit.text, "@Bob ");
        assert!(!ac.is_open());
    }

    #[test]
    fn ctrl_enter_passes_through() {
        let users = users();
        let mut ac = MentionAutocomplete::new();
        ac.open_suggestions("@al", 3, &users);
        assert_eq!(
            ac.handle_key(MentionKey::Enter { ctrl: true }, "@al", 3),
            KeyOutcome::Ignored
        );
        assert!(ac.is_open());
        assert_eq!(ac.handle_key(MentionKey::Escape, "@al", 3), KeyOutcome::Consumed);
        assert!(!ac.is_open());
        assert_eq!(ac.handle_key(MentionKey::ArrowDown, "@al", 3), KeyOutcome::Ignored);
    }
}
