//! Utility functions for outline content
//!
//! Markdown and hashtag helpers shared by the operations, diff and export layers,
//! plus JSON parsing for deeply nested trees.

mod json;
mod markdown;

pub use json::from_json_unbounded;
pub use markdown::{escape_html, extract_hashtags, normalize_tag, render_inline_html, strip_markdown};
