//! Document and Nested Tree Structures
//!
//! The nested tree is the wire and storage format of an outline: every node embeds
//! its children instead of referencing them. It is used for persistence, export and
//! the AI reorganize round-trip.
//!
//! Fields that the AI collaborator never sends back (`id`, `level`, timestamps) are
//! optional, so a response made of `content` and `children` only deserializes into
//! the same type.

use crate::models::node::{ImageAttachment, Node};
use crate::utils::from_json_unbounded;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A node with its children embedded
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NestedNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default)]
    pub content: String,

    /// Depth hint; ignored on import, the flattener recomputes levels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<usize>,

    #[serde(default)]
    pub children: Vec<NestedNode>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImageAttachment>,

    #[serde(default)]
    pub collapsed: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl NestedNode {
    /// Create a node without id, carrying only content
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    /// Builder-style children setter
    pub fn with_children(mut self, children: Vec<NestedNode>) -> Self {
        self.children = children;
        self
    }

    /// Build the nested form of a flat node, given its already nested children
    pub fn from_node(node: &Node, children: Vec<NestedNode>) -> Self {
        Self {
            id: Some(node.id.clone()),
            content: node.content.clone(),
            level: Some(node.level),
            children,
            images: node.images.clone(),
            collapsed: node.collapsed,
            tags: node.tags.clone(),
            created_at: Some(node.created_at),
            updated_at: Some(node.updated_at),
        }
    }

    /// Number of nodes in this subtree, this node included
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }

    /// Copy of this subtree reduced to content and structure
    ///
    /// This is what leaves the process when asking the AI collaborator to
    /// reorganize: ids, timestamps, images and display flags are dropped, the
    /// level is kept as a structural hint.
    pub fn structure_only(&self) -> NestedNode {
        // Post-order: a node is built once all of its children sit on `built`
        let mut built: Vec<NestedNode> = Vec::new();
        let mut stack: Vec<(&NestedNode, bool)> = vec![(self, false)];
        while let Some((node, children_done)) = stack.pop() {
            if !children_done {
                stack.push((node, true));
                stack.extend(node.children.iter().rev().map(|child| (child, false)));
                continue;
            }
            let children = built.split_off(built.len() - node.children.len());
            built.push(NestedNode {
                id: None,
                content: node.content.clone(),
                level: node.level,
                children,
                ..Default::default()
            });
        }
        built.pop().unwrap_or_default()
    }

    /// Parse a nested tree from JSON, at any depth
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        from_json_unbounded(json)
    }

    /// Pre-order iterator over the subtree
    pub fn iter(&self) -> NestedIter<'_> {
        NestedIter { stack: vec![self] }
    }
}

/// Pre-order iterator over a [`NestedNode`] subtree
pub struct NestedIter<'a> {
    stack: Vec<&'a NestedNode>,
}

impl<'a> Iterator for NestedIter<'a> {
    type Item = &'a NestedNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Persistence metadata of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// Save revision, set by the repository (first save = 1)
    #[serde(default)]
    pub version: i64,

    /// Soft-delete marker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl DocumentMetadata {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            created_at: now,
            updated_at: now,
            version: 0,
            deleted_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// A persisted outline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,

    pub title: String,

    pub root: NestedNode,

    pub metadata: DocumentMetadata,
}

/// Listing entry returned by the document repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub id: String,

    pub title: String,

    pub updated_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}
