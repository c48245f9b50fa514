pub mod markdown;
pub mod mention;

pub use markdown::{escape_html, render_markdown};
pub use mention::{extract_mentions, mention_spans};
