use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::mention::MENTION_RE;

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,3}) (.*)$").expect("heading pattern is valid"));
static UNORDERED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[*-] (.*)$").expect("list pattern is valid"));
static ORDERED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\. (.*)$").expect("list pattern is valid"));
static BOLD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("bold pattern is valid"));
// Italic runs may not cross a tag, so a strong span is never re-wrapped.
static ITALIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*<>]+?)\*").expect("italic pattern is valid"));
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\[\]]+)\]\(([^)\s<>]+)\)").expect("link pattern is valid")
});
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Unordered,
    Ordered,
}

impl ListKind {
    fn open(self) -> &'static str {
        match self {
            ListKind::Unordered => "<ul>",
            ListKind::Ordered => "<ol>",
        }
    }

    fn close(self) -> &'static str {
        match self {
            ListKind::Unordered => "</ul>",
            ListKind::Ordered => "</ol>",
        }
    }
}

/// Escape the five HTML-significant characters.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the comment Markdown subset to HTML.
///
/// The input is escaped first, so the only tags in the output are the ones
/// inserted here. Supported: `#`/`##`/`###` headings, `**bold**`,
/// `*italic*`, `[text](url)`, `* `/`- `/`1. ` list lines, line breaks, and
/// `@mention` highlighting.
pub fn render_markdown(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let escaped = escape_html(text);
    let mut out = String::new();
    let mut list: Option<ListKind> = None;
    // A <br> is only emitted between two consecutive inline lines
    let mut needs_break = false;

    for line in escaped.split('\n') {
        if let Some((kind, item)) = list_item(line) {
            if list != Some(kind) {
                if let Some(open) = list {
                    out.push_str(open.close());
                }
                out.push_str(kind.open());
                list = Some(kind);
            }
            out.push_str("<li>");
            out.push_str(&render_inline(item));
            out.push_str("</li>");
            needs_break = false;
            continue;
        }

        if let Some(open) = list.take() {
            out.push_str(open.close());
        }

        if let Some(caps) = HEADING_RE.captures(line) {
            let level = caps[1].len();
            out.push_str(&format!(
                "<h{level}>{}</h{level}>",
                render_inline(&caps[2])
            ));
            needs_break = false;
            continue;
        }

        if needs_break {
            out.push_str("<br>");
        }
        out.push_str(&render_inline(line));
        needs_break = true;
    }

    if let Some(open) = list {
        out.push_str(open.close());
    }

    highlight_mentions(&out)
}

fn list_item(line: &str) -> Option<(ListKind, &str)> {
    if let Some(caps) = UNORDERED_RE.captures(line) {
        return caps.get(1).map(|m| (ListKind::Unordered, m.as_str()));
    }
    ORDERED_RE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| (ListKind::Ordered, m.as_str()))
}

/// Bold, then italic, then links. Operates on already-escaped text.
fn render_inline(text: &str) -> String {
    let bold = BOLD_RE.replace_all(text, "<strong>$1</strong>");
    let italic = ITALIC_RE.replace_all(&bold, "<em>$1</em>");
    LINK_RE
        .replace_all(&italic, |caps: &Captures| {
            let label = &caps[1];
            let url = &caps[2];
            if is_unsafe_url(url) {
                caps[0].to_string()
            } else {
                format!(r#"<a href="{url}" target="_blank" rel="noopener">{label}</a>"#)
            }
        })
        .into_owned()
}

fn is_unsafe_url(url: &str) -> bool {
    let lower = url.trim().to_ascii_lowercase();
    lower.starts_with("javascript:") || lower.starts_with("vbscript:") || lower.starts_with("data:")
}

/// Wrap `@name` in a mention span, skipping anything inside a tag so
/// attribute values (e.g. link targets) are left alone.
fn highlight_mentions(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut last = 0;
    for tag in TAG_RE.find_iter(html) {
        let text = &html[last..tag.start()];
        out.push_str(&MENTION_RE.replace_all(text, r#"<span class="mention">@$1</span>"#));
        out.push_str(tag.as_str());
        last = tag.end();
    }
    out.push_str(&MENTION_RE.replace_all(&html[last..], r#"<span class="mention">@$1</span>"#));
    out
}
