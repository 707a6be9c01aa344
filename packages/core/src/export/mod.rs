//! Document export
//!
//! Stateless transforms from a [`Document`] to JSON or a standalone HTML page.
//! Both work on the nested tree, so collapsed nodes are exported expanded.

use crate::models::{Document, EditorSettings, NestedNode};
use crate::utils::{escape_html, render_inline_html};
use serde::Serialize;

#[derive(Serialize)]
struct JsonExport<'a> {
    #[serde(flatten)]
    document: &'a Document,
    settings: &'a EditorSettings,
}

/// Pretty-printed JSON of the document with the editor settings alongside
///
/// The top-level object holds the document fields (`id`, `title`, `root`,
/// `metadata`) plus `settings`.
pub fn export_json(document: &Document, settings: &EditorSettings) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonExport { document, settings })
}

const STYLE: &str = "body{font-family:system-ui,sans-serif;max-width:48rem;margin:2rem auto;line-height:1.5}\
ul{padding-left:1.5rem}\
li>img{display:block;max-width:100%;margin:.25rem 0}\
.tag{display:inline-block;margin-left:.35rem;padding:0 .4rem;border-radius:.6rem;background:#e8eefc;color:#2a4a9a;font-size:.8em}\
mark{background:#fff3a3}";

enum Step<'a> {
    Open(&'a NestedNode),
    Close,
}

fn render_content(content: &str, settings: &EditorSettings) -> String {
    if settings.render_markdown {
        render_inline_html(content)
    } else {
        escape_html(content)
    }
}

fn render_node_body(node: &NestedNode, settings: &EditorSettings, out: &mut String) {
    out.push_str(&render_content(&node.content, settings));
    for tag in &node.tags {
        out.push_str(&format!("<span class=\"tag\">#{}</span>", escape_html(tag)));
    }
    for image in &node.images {
        let alt = image.name.as_deref().unwrap_or("");
        out.push_str(&format!(
            "<img src=\"{}\" alt=\"{}\"",
            escape_html(&image.url),
            escape_html(alt)
        ));
        if let Some(width) = image.width {
            out.push_str(&format!(" width=\"{}\"", width));
        }
        if let Some(height) = image.height {
            out.push_str(&format!(" height=\"{}\"", height));
        }
        out.push_str(" />");
    }
}

/// Render the children of `root` as nested `<ul>` lists
fn render_list(root: &NestedNode, settings: &EditorSettings, out: &mut String) {
    if root.children.is_empty() {
        return;
    }
    out.push_str("<ul>");
    let mut stack: Vec<Step> = root.children.iter().rev().map(Step::Open).collect();
    while let Some(step) = stack.pop() {
        match step {
            Step::Open(node) => {
                out.push_str("<li>");
                render_node_body(node, settings, out);
                if node.children.is_empty() {
                    out.push_str("</li>");
                } else {
                    out.push_str("<ul>");
                    stack.push(Step::Close);
                    stack.extend(node.children.iter().rev().map(Step::Open));
                }
            }
            Step::Close => out.push_str("</ul></li>"),
        }
    }
    out.push_str("</ul>");
}

/// Standalone HTML page of the document
///
/// The title becomes the page heading, the root's own content (when present)
/// a paragraph below it, and the root's children nested lists. Inline markers
/// render when `settings.render_markdown` is set; otherwise content is escaped
/// verbatim.
pub fn export_html(document: &Document, settings: &EditorSettings) -> String {
    let title = escape_html(&document.title);
    let mut body = String::new();
    body.push_str(&format!("<h1>{}</h1>", title));
    if !document.root.content.trim().is_empty()
        || !document.root.tags.is_empty()
        || !document.root.images.is_empty()
    {
        body.push_str("<p>");
        render_node_body(&document.root, settings, &mut body);
        body.push_str("</p>");
    }
    render_list(&document.root, settings, &mut body);

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\" />\n<title>{}</title>\n<style>{}</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        title, STYLE, body
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DocumentMetadata, ImageAttachment};
    use chrono::Utc;

    fn document() -> Document {
        let mut milk = NestedNode::new("Buy **milk**");
        milk.tags = vec!["errand".to_string()];
        let mut photo = NestedNode::new("Photo");
        photo.images = vec![ImageAttachment::new("https://img.example/a.png").with_name("A \"pic\"")];
        Document {
            id: "doc-1".to_string(),
            title: "Plans & <Ideas>".to_string(),
            root: NestedNode::new("").with_children(vec![
                NestedNode::new("Shopping").with_children(vec![milk]),
                photo,
            ]),
            metadata: DocumentMetadata::new(Utc::now()),
        }
    }

    #[test]
    fn test_json_export_flattens_document_with_settings() {
        let json = export_json(&document(), &EditorSettings::default()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["id"], "doc-1");
        assert_eq!(value["title"], "Plans & <Ideas>");
        assert_eq!(value["root"]["children"][0]["content"], "Shopping");
        assert_eq!(value["settings"]["autosave"], true);
        assert!(value["metadata"]["createdAt"].is_string());
    }

    #[test]
    fn test_html_export_structure() {
        let settings = EditorSettings {
            render_markdown: true,
            ..EditorSettings::default()
        };
        let html = export_html(&document(), &settings);

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Plans &amp; &lt;Ideas&gt;</title>"));
        assert!(html.contains(
            "<ul><li>Shopping<ul><li>Buy <strong>milk</strong><span class=\"tag\">#errand</span></li></ul></li>"
        ));
        assert!(html.contains(
            "<li>Photo<img src=\"https://img.example/a.png\" alt=\"A &quot;pic&quot;\" /></li></ul>"
        ));
        // Empty root content produces no paragraph
        assert!(!html.contains("<p>"));
    }

    #[test]
    fn test_html_export_without_markdown_rendering() {
        let html = export_html(&document(), &EditorSettings::default());
        assert!(html.contains("<li>Buy **milk**"));
    }
}
