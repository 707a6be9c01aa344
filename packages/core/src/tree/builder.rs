//! Tree Builder and Flattener
//!
//! Converts between the flat store and the nested tree used for persistence,
//! export and the AI round-trip. The two directions are inverses:
//! `flatten(build_nested_tree(store))` reproduces the same parent/child edges and
//! contents.
//!
//! Both directions are iterative and refuse trees deeper than [`MAX_TREE_DEPTH`].

use super::{NodeStore, TreeError};
use crate::models::{new_node_id, Document, DocumentMetadata, NestedNode, Node, TimeProvider};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Maximum supported depth of an outline
pub const MAX_TREE_DEPTH: usize = 1000;

/// How the flattener treats ids found in the nested input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdPolicy {
    /// Keep incoming ids; missing, empty or colliding ids get a fresh one
    Preserve,
    /// Give every node a fresh id
    Regenerate,
}

/// Flat nodes produced from one nested subtree
#[derive(Debug, Clone)]
pub struct FlatSubtree {
    pub root_id: String,
    pub nodes: HashMap<String, Node>,
}

/// Flatten a nested subtree under `parent_id`
///
/// `level` is the level assigned to the subtree root. Ids listed in `taken` are
/// treated as collisions, and every id assigned here is added to `taken`, so
/// repeated calls with the same set never hand out the same id twice.
pub fn flatten_subtree(
    nested: &NestedNode,
    parent_id: Option<&str>,
    level: usize,
    policy: IdPolicy,
    taken: &mut HashSet<String>,
    now: DateTime<Utc>,
) -> Result<FlatSubtree, TreeError> {
    let root_id = assign_id(nested, policy, taken);
    let mut nodes = HashMap::new();
    let mut stack: Vec<(&NestedNode, String, Option<String>, usize)> =
        vec![(nested, root_id.clone(), parent_id.map(str::to_string), level)];

    while let Some((current, id, parent, depth)) = stack.pop() {
        if depth > MAX_TREE_DEPTH {
            return Err(TreeError::DepthExceeded {
                limit: MAX_TREE_DEPTH,
            });
        }

        let mut child_ids = Vec::with_capacity(current.children.len());
        let mut pending = Vec::with_capacity(current.children.len());
        for child in &current.children {
            let child_id = assign_id(child, policy, taken);
            child_ids.push(child_id.clone());
            pending.push((child, child_id, Some(id.clone()), depth + 1));
        }
        stack.extend(pending.into_iter().rev());

        let created_at = current.created_at.unwrap_or(now);
        nodes.insert(
            id.clone(),
            Node {
                id,
                parent_id: parent,
                content: current.content.clone(),
                level: depth,
                children: child_ids,
                images: current.images.clone(),
                collapsed: current.collapsed,
                tags: current.tags.clone(),
                created_at,
                updated_at: current.updated_at.unwrap_or(created_at),
            },
        );
    }

    Ok(FlatSubtree { root_id, nodes })
}

fn assign_id(nested: &NestedNode, policy: IdPolicy, taken: &mut HashSet<String>) -> String {
    let candidate = match policy {
        IdPolicy::Preserve => nested
            .id
            .as_deref()
            .filter(|id| !id.trim().is_empty() && !taken.contains(*id))
            .map(str::to_string),
        IdPolicy::Regenerate => None,
    };
    let id = candidate.unwrap_or_else(|| loop {
        let fresh = new_node_id();
        if !taken.contains(&fresh) {
            break fresh;
        }
    });
    taken.insert(id.clone());
    id
}

impl NodeStore {
    /// Expand the subtree rooted at `root_id` into its nested form
    ///
    /// # Errors
    ///
    /// Structural errors only: unknown root, a `children` entry pointing at a
    /// missing node, a node reachable twice, or depth beyond [`MAX_TREE_DEPTH`].
    pub fn build_nested_tree(&self, root_id: &str) -> Result<NestedNode, TreeError> {
        let root = self
            .get(root_id)
            .ok_or_else(|| TreeError::node_not_found(root_id))?;

        // Pre-order walk collecting every node once
        let mut order: Vec<&Node> = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut stack: Vec<(&Node, usize)> = vec![(root, 0)];
        while let Some((node, depth)) = stack.pop() {
            if depth > MAX_TREE_DEPTH {
                return Err(TreeError::DepthExceeded {
                    limit: MAX_TREE_DEPTH,
                });
            }
            if !visited.insert(node.id.as_str()) {
                return Err(TreeError::cycle(&node.id));
            }
            for child_id in node.children.iter().rev() {
                let child = self
                    .get(child_id)
                    .ok_or_else(|| TreeError::missing_child(&node.id, child_id))?;
                stack.push((child, depth + 1));
            }
            order.push(node);
        }

        // Reverse pre-order visits children before their parent
        let mut built: HashMap<&str, NestedNode> = HashMap::with_capacity(order.len());
        for node in order.iter().rev() {
            let mut children = Vec::with_capacity(node.children.len());
            for child_id in &node.children {
                let child = built
                    .remove(child_id.as_str())
                    .ok_or_else(|| TreeError::cycle(child_id))?;
                children.push(child);
            }
            built.insert(node.id.as_str(), NestedNode::from_node(node, children));
        }

        built
            .remove(root_id)
            .ok_or_else(|| TreeError::node_not_found(root_id))
    }

    /// Nested form of the whole outline
    pub fn to_nested(&self) -> Result<NestedNode, TreeError> {
        self.build_nested_tree(self.root_id())
    }

    /// Rebuild a store from a nested tree
    ///
    /// Parent references and levels come from the traversal. Missing or
    /// duplicated ids are replaced with fresh ones.
    pub fn from_nested(
        title: impl Into<String>,
        nested: &NestedNode,
        clock: Arc<dyn TimeProvider>,
    ) -> Result<Self, TreeError> {
        let mut taken = HashSet::new();
        let flat = flatten_subtree(nested, None, 0, IdPolicy::Preserve, &mut taken, clock.now())?;
        Ok(Self::from_parts(flat.nodes, flat.root_id, title.into(), clock))
    }

    /// Rebuild a store from a persisted document
    pub fn from_document(document: &Document, clock: Arc<dyn TimeProvider>) -> Result<Self, TreeError> {
        Self::from_nested(document.title.clone(), &document.root, clock)
    }

    /// Materialize the outline as a document with the given identity and metadata
    pub fn to_document(
        &self,
        id: impl Into<String>,
        metadata: DocumentMetadata,
    ) -> Result<Document, TreeError> {
        Ok(Document {
            id: id.into(),
            title: self.title().to_string(),
            root: self.to_nested()?,
            metadata,
        })
    }
}
