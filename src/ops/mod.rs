pub mod autocomplete;
pub mod comment_ops;
pub mod deadline;
pub mod entity_ops;
pub mod i18n;
pub mod notification_ops;
pub mod report;
pub mod rules;

use chrono::{DateTime, Utc};

use crate::ops::i18n::Translator;

/// Who is acting, when, and in which language notifications are written
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    pub user_id: &'a str,
    pub now: DateTime<Utc>,
    pub translator: &'a Translator,
}
