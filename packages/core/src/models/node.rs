//! Node Data Structures
//!
//! This module defines the `Node` record held by the in-memory node store and the
//! small value types attached to it.
//!
//! # Architecture
//!
//! - **Flat record**: A node references its parent by id and lists its children by id.
//!   The nested representation lives in [`crate::models::NestedNode`].
//! - **Cached level**: `level` is derived from the parent chain and is only ever
//!   written by the store while re-parenting.
//! - **Display flags**: `collapsed` affects visible traversal only, never tree semantics.
//!
//! # Examples
//!
//! ```rust
//! use outline_core::models::Node;
//! use chrono::Utc;
//!
//! let root = Node::new_root("My outline".to_string(), Utc::now());
//! assert!(root.is_root());
//! assert_eq!(root.level, 0);
//!
//! let child = Node::new_child(&root.id, root.level + 1, Utc::now());
//! assert_eq!(child.parent_id.as_deref(), Some(root.id.as_str()));
//! assert!(child.content.is_empty());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generate a fresh opaque node identifier
pub fn new_node_id() -> String {
    Uuid::new_v4().to_string()
}

/// Image attached to a node
///
/// The core treats images as opaque: only `id` (identity) and position in the
/// node's `images` list carry meaning. Upload and compression happen elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAttachment {
    /// Identity of the attachment within the document
    pub id: String,

    /// Location of the image data (data URL or remote URL)
    pub url: String,

    /// Optional display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl ImageAttachment {
    /// Create an attachment with a generated id
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            id: new_node_id(),
            url: url.into(),
            name: None,
            width: None,
            height: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// A single entry of the outline.
///
/// # Fields
///
/// - `id`: Unique identifier, immutable after creation
/// - `parent_id`: Owning node, `None` only for the document root
/// - `content`: Text with optional inline markers and `#hashtags`
/// - `level`: Depth from the root (root = 0), always `parent.level + 1`
/// - `children`: Ordered child ids (display order)
/// - `images`: Ordered image attachments
/// - `collapsed`: Whether children are hidden in the visible traversal
/// - `tags`: Labels, display order preserved, no duplicates
/// - `created_at` / `updated_at`: `updated_at` is bumped by every mutation touching the node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,

    pub parent_id: Option<String>,

    #[serde(default)]
    pub content: String,

    pub level: usize,

    #[serde(default)]
    pub children: Vec<String>,

    #[serde(default)]
    pub images: Vec<ImageAttachment>,

    #[serde(default)]
    pub collapsed: bool,

    #[serde(default)]
    pub tags: Vec<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Node {
    /// Create a root node (no parent, level 0)
    pub fn new_root(content: String, now: DateTime<Utc>) -> Self {
        Self::new_with_id(new_node_id(), None, 0, content, now)
    }

    /// Create an empty child node under `parent_id` at the given level
    pub fn new_child(parent_id: &str, level: usize, now: DateTime<Utc>) -> Self {
        Self::new_with_id(
            new_node_id(),
            Some(parent_id.to_string()),
            level,
            String::new(),
            now,
        )
    }

    /// Create a node with an explicit id
    ///
    /// Used by the flattener when importing a nested tree whose ids are kept.
    pub fn new_with_id(
        id: String,
        parent_id: Option<String>,
        level: usize,
        content: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            parent_id,
            content,
            level,
            children: Vec::new(),
            images: Vec::new(),
            collapsed: false,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if this node is the document root
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Check if this node has at least one child
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Bump the modification timestamp
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    /// Position of `child_id` in this node's children
    pub fn child_index(&self, child_id: &str) -> Option<usize> {
        self.children.iter().position(|id| id == child_id)
    }

    /// Check whether a tag is present (exact match on the normalized label)
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Result of a delete operation against the document repository
///
/// Deleting a missing document succeeds; `existed` tells the caller whether
/// anything was actually removed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteResult {
    pub existed: bool,
}

impl DeleteResult {
    /// Create a DeleteResult indicating the document existed
    pub fn existed() -> Self {
        Self { existed: true }
    }

    /// Create a DeleteResult indicating the document didn't exist
    pub fn not_found() -> Self {
        Self { existed: false }
    }
}
