//! Inline markdown helpers for node content
//!
//! Node content is a single line of text with a small set of inline markers:
//! `**bold**`, `*italic*`, `<u>underline</u>` and `==highlight==`. This module
//! strips them for plain-text display, renders them for HTML export, and pulls
//! `#hashtags` out of the text.

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};
use regex::Regex;
use std::sync::LazyLock;

/// Compiled regex patterns for markdown stripping
///
/// The order of these patterns matters:
/// 1. Images first (to not conflict with links or italic)
/// 2. Links (before italic since links use brackets)
/// 3. Bold (before italic since ** conflicts with *)
/// 4. Other inline styles
/// 5. Line-start patterns (headers, lists, etc.)
static MARKDOWN_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (Regex::new(r"!\[([^\]]*)\]\([^)]+\)").unwrap(), "$1"),
        (Regex::new(r"\[([^\]]+)\]\([^)]+\)").unwrap(), "$1"),
        (Regex::new(r"`([^`]+)`").unwrap(), "$1"),
        (Regex::new(r"\*\*([^*]+)\*\*").unwrap(), "$1"),
        (Regex::new(r"__([^_]+)__").unwrap(), "$1"),
        (Regex::new(r"~~([^~]+)~~").unwrap(), "$1"),
        (Regex::new(r"==([^=]+)==").unwrap(), "$1"),
        (Regex::new(r"\*([^*]+)\*").unwrap(), "$1"),
        (Regex::new(r"_([^_]+)_").unwrap(), "$1"),
        (Regex::new(r"^#{1,6}\s+").unwrap(), ""),
        (Regex::new(r"^>\s*").unwrap(), ""),
        (Regex::new(r"^[-*+]\s+").unwrap(), ""),
        // Underline and any other tags
        (Regex::new(r"<[^>]+>").unwrap(), ""),
    ]
});

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static HASHTAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)#([\p{L}\p{N}_-]+)").unwrap());

static HIGHLIGHT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"==([^=]+)==").unwrap());

/// Inline tags passed through to exported HTML; any other HTML is escaped
const ALLOWED_INLINE_HTML: [&str; 4] = ["<u>", "</u>", "<mark>", "</mark>"];

/// Strip inline markers from content to produce plain text
///
/// Used for diff descriptions and anywhere a node label is shown without
/// formatting.
///
/// # Examples
///
/// ```
/// use outline_core::utils::strip_markdown;
///
/// assert_eq!(strip_markdown("**bold** text"), "bold text");
/// assert_eq!(strip_markdown("<u>under</u> and ==marked=="), "under and marked");
/// assert_eq!(strip_markdown("[link](http://example.com)"), "link");
/// ```
pub fn strip_markdown(content: &str) -> String {
    let mut result = content.to_string();

    for (pattern, replacement) in MARKDOWN_PATTERNS.iter() {
        // Line-start patterns apply per line
        if replacement.is_empty() && pattern.as_str().starts_with('^') {
            result = result
                .lines()
                .map(|line| pattern.replace_all(line, *replacement).to_string())
                .collect::<Vec<_>>()
                .join("\n");
        } else {
            result = pattern.replace_all(&result, *replacement).to_string();
        }
    }

    result = WHITESPACE_RE.replace_all(&result, " ").to_string();
    result.trim().to_string()
}

/// Normalize a tag label: trim and drop a single leading `#`
///
/// Returns `None` when nothing is left.
pub fn normalize_tag(tag: &str) -> Option<String> {
    let trimmed = tag.trim();
    let label = trimmed.strip_prefix('#').unwrap_or(trimmed).trim();
    if label.is_empty() {
        None
    } else {
        Some(label.to_string())
    }
}

/// `#hashtags` written in `content`, in order of first appearance, without duplicates
///
/// A hashtag starts at the beginning of the text or after whitespace, so
/// `issue#12` and URL fragments are not picked up.
pub fn extract_hashtags(content: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for captures in HASHTAG_RE.captures_iter(content) {
        let tag = &captures[1];
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

/// Render node content as inline HTML
///
/// Emphasis, strong, strikethrough, links and code render as usual. Block
/// structure (paragraphs, headings, list markers) is flattened so the result
/// can sit inside an `<li>`. HTML other than the underline and highlight tags
/// is escaped.
pub fn render_inline_html(content: &str) -> String {
    let prepared = HIGHLIGHT_RE.replace_all(content, "<mark>$1</mark>");
    let parser = Parser::new_ext(&prepared, Options::ENABLE_STRIKETHROUGH);

    let mut events: Vec<Event> = Vec::new();
    let mut pending_break = false;
    for event in parser {
        let event = match event {
            Event::Start(Tag::Emphasis | Tag::Strong | Tag::Strikethrough | Tag::Link { .. })
            | Event::End(TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link) => {
                event
            }
            Event::End(TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::Item) => {
                pending_break = true;
                continue;
            }
            Event::Start(_) | Event::End(_) => continue,
            Event::Html(raw) | Event::InlineHtml(raw) => {
                let tag = raw.trim();
                if ALLOWED_INLINE_HTML.contains(&tag) {
                    Event::InlineHtml(CowStr::from(tag.to_string()))
                } else {
                    Event::Text(CowStr::from(tag.to_string()))
                }
            }
            Event::SoftBreak | Event::HardBreak => Event::Html("<br />".into()),
            other => other,
        };
        if pending_break {
            events.push(Event::Html("<br />".into()));
            pending_break = false;
        }
        events.push(event);
    }

    let mut out = String::with_capacity(content.len() * 2);
    html::push_html(&mut out, events.into_iter());
    out
}

/// Escape text for use in HTML element content or attribute values
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
