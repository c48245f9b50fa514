pub mod comment;
pub mod config;
pub mod notification;
pub mod project;
pub mod task;
pub mod user;

pub use comment::*;
pub use config::*;
pub use notification::*;
pub use project::*;
pub use task::*;
pub use user::*;

/// Generate a fresh opaque record ID (time-ordered UUID, hyphenless)
pub fn new_id() -> String {
    uuid::Uuid::now_v7().simple().to_string()
}
