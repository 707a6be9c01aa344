//! Tree Operations
//!
//! Order-sensitive mutations of a [`NodeStore`]. Every operation is synchronous
//! and total: it either applies completely (levels included) or returns the
//! precondition that failed and leaves the store exactly as it was.
//!
//! A failed precondition is not an exceptional condition. Callers in interactive
//! code usually ignore the `Err` value; it is logged at `debug` level here.
//!
//! # Re-parenting
//!
//! Indent, outdent and move rewrite `level` on the moved node and every one of its
//! descendants. A shallow update would leave descendants at stale depths.
//!
//! # Examples
//!
//! ```rust
//! use outline_core::tree::NodeStore;
//!
//! let mut store = NodeStore::new("Plans");
//! let root = store.root_id().to_string();
//! let a = store.add_child(&root).unwrap();
//! let b = store.add_sibling(&a).unwrap();
//!
//! store.indent(&b).unwrap();
//! assert_eq!(store.get(&b).unwrap().level, 2);
//! assert_eq!(store.get(&a).unwrap().children, vec![b.clone()]);
//!
//! // Indenting the first child is refused and changes nothing
//! assert!(store.indent(&a).is_err());
//! ```

pub mod error;

pub use error::NodeOperationError;

use crate::models::{ImageAttachment, NestedNode, Node};
use crate::tree::builder::{flatten_subtree, FlatSubtree};
use crate::tree::{IdPolicy, NodeStore, TreeError};
use crate::utils::{extract_hashtags, normalize_tag};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Result type of tree operations
pub type OperationResult<T> = Result<T, NodeOperationError>;

/// Drop position of a drag-and-drop move, relative to the node hovered over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    /// Directly before the target, among the target's siblings
    Before,
    /// Directly after the target, among the target's siblings
    After,
    /// As the first child of the target
    Inside,
}

fn skip<T>(operation: &'static str, err: NodeOperationError) -> OperationResult<T> {
    tracing::debug!("Skipped {}: {}", operation, err);
    Err(err)
}

impl NodeStore {
    /// Parent id and index of a non-root node
    fn locate(&self, node_id: &str, operation: &'static str) -> OperationResult<(String, usize)> {
        let node = self
            .get(node_id)
            .ok_or_else(|| NodeOperationError::node_not_found(node_id))?;
        if node.is_root() {
            return Err(NodeOperationError::root_not_allowed(node_id, operation));
        }
        self.position(node_id)
            .map(|(parent_id, index)| (parent_id.to_string(), index))
            .ok_or_else(|| TreeError::Unreachable { id: node_id.to_string() }.into())
    }

    /// Rewrite `level` for `node_id` and all of its descendants
    fn recompute_levels(&mut self, node_id: &str, level: usize) {
        let mut stack = vec![(node_id.to_string(), level)];
        while let Some((id, level)) = stack.pop() {
            if let Some(node) = self.get_mut(&id) {
                node.level = level;
                stack.extend(node.children.iter().map(|child| (child.clone(), level + 1)));
            }
        }
    }

    fn set_parent(&mut self, node_id: &str, parent_id: &str) {
        let now = self.now();
        if let Some(node) = self.get_mut(node_id) {
            node.parent_id = Some(parent_id.to_string());
            node.touch(now);
        }
    }

    fn edit_children(&mut self, parent_id: &str, edit: impl FnOnce(&mut Vec<String>)) {
        let now = self.now();
        if let Some(parent) = self.get_mut(parent_id) {
            edit(&mut parent.children);
            parent.touch(now);
        }
    }

    //
    // STRUCTURAL OPERATIONS
    //

    /// Append a new empty node at the end of `parent_id`'s children
    ///
    /// Returns the id of the new node.
    pub fn add_child(&mut self, parent_id: &str) -> OperationResult<String> {
        let now = self.now();
        let Some(parent) = self.get_mut(parent_id) else {
            return skip("add_child", NodeOperationError::node_not_found(parent_id));
        };
        let child = Node::new_child(parent_id, parent.level + 1, now);
        let child_id = child.id.clone();
        parent.children.push(child_id.clone());
        parent.touch(now);
        self.insert(child);
        Ok(child_id)
    }

    /// Insert a new empty node directly after `node_id`, at the same level
    ///
    /// Refused on the root, which has no parent to hold a sibling.
    pub fn add_sibling(&mut self, node_id: &str) -> OperationResult<String> {
        let (parent_id, index) = match self.locate(node_id, "add a sibling to") {
            Ok(found) => found,
            Err(err) => return skip("add_sibling", err),
        };
        let level = self.get(node_id).map(|n| n.level).unwrap_or_default();
        let sibling = Node::new_child(&parent_id, level, self.now());
        let sibling_id = sibling.id.clone();
        self.insert(sibling);
        let inserted = sibling_id.clone();
        self.edit_children(&parent_id, |children| children.insert(index + 1, inserted));
        Ok(sibling_id)
    }

    /// Remove `node_id` and its whole subtree
    ///
    /// Returns the number of nodes removed. The root cannot be deleted.
    pub fn delete_node(&mut self, node_id: &str) -> OperationResult<usize> {
        let (parent_id, index) = match self.locate(node_id, "delete") {
            Ok(found) => found,
            Err(err) => return skip("delete_node", err),
        };
        let doomed = self.subtree_ids(node_id);
        for id in &doomed {
            self.remove(id);
        }
        self.edit_children(&parent_id, |children| {
            children.remove(index);
        });
        Ok(doomed.len())
    }

    /// Make `node_id` the last child of its previous sibling
    ///
    /// No-op on the first child (nothing to indent under).
    pub fn indent(&mut self, node_id: &str) -> OperationResult<()> {
        let (parent_id, index) = match self.locate(node_id, "indent") {
            Ok(found) => found,
            Err(err) => return skip("indent", err),
        };
        if index == 0 {
            return skip("indent", NodeOperationError::first_sibling(node_id));
        }
        let Some(previous_id) = self
            .get(&parent_id)
            .and_then(|parent| parent.children.get(index - 1))
            .cloned()
        else {
            return skip("indent", TreeError::node_not_found(&parent_id).into());
        };
        let Some(new_level) = self.get(&previous_id).map(|prev| prev.level + 1) else {
            return skip(
                "indent",
                TreeError::missing_child(&parent_id, &previous_id).into(),
            );
        };

        self.edit_children(&parent_id, |children| {
            children.remove(index);
        });
        let moved = node_id.to_string();
        self.edit_children(&previous_id, |children| children.push(moved));
        self.set_parent(node_id, &previous_id);
        self.recompute_levels(node_id, new_level);
        Ok(())
    }

    /// Make `node_id` a sibling of its parent, placed directly after the parent
    ///
    /// No-op when the parent is the root (already top level).
    pub fn outdent(&mut self, node_id: &str) -> OperationResult<()> {
        let (parent_id, index) = match self.locate(node_id, "outdent") {
            Ok(found) => found,
            Err(err) => return skip("outdent", err),
        };
        let Some(parent) = self.get(&parent_id) else {
            return skip("outdent", TreeError::node_not_found(&parent_id).into());
        };
        if parent.is_root() {
            return skip("outdent", NodeOperationError::parent_is_root(node_id));
        }
        let new_level = parent.level;
        let Some((grandparent_id, parent_index)) = self
            .position(&parent_id)
            .map(|(id, index)| (id.to_string(), index))
        else {
            return skip(
                "outdent",
                TreeError::Unreachable { id: parent_id }.into(),
            );
        };

        self.edit_children(&parent_id, |children| {
            children.remove(index);
        });
        let moved = node_id.to_string();
        self.edit_children(&grandparent_id, |children| {
            children.insert(parent_index + 1, moved)
        });
        self.set_parent(node_id, &grandparent_id);
        self.recompute_levels(node_id, new_level);
        Ok(())
    }

    /// Swap `node_id` with its previous sibling
    pub fn move_up(&mut self, node_id: &str) -> OperationResult<()> {
        let (parent_id, index) = match self.locate(node_id, "move") {
            Ok(found) => found,
            Err(err) => return skip("move_up", err),
        };
        if index == 0 {
            return skip("move_up", NodeOperationError::at_boundary(node_id, "up"));
        }
        self.edit_children(&parent_id, |children| children.swap(index - 1, index));
        self.touch_node(node_id);
        Ok(())
    }

    /// Swap `node_id` with its next sibling
    pub fn move_down(&mut self, node_id: &str) -> OperationResult<()> {
        let (parent_id, index) = match self.locate(node_id, "move") {
            Ok(found) => found,
            Err(err) => return skip("move_down", err),
        };
        let sibling_count = self.get(&parent_id).map_or(0, |p| p.children.len());
        if index + 1 >= sibling_count {
            return skip("move_down", NodeOperationError::at_boundary(node_id, "down"));
        }
        self.edit_children(&parent_id, |children| children.swap(index, index + 1));
        self.touch_node(node_id);
        Ok(())
    }

    /// Drag-and-drop move of `active_id` relative to `over_id`
    ///
    /// - `Inside`: `active_id` becomes the first child of `over_id`
    /// - `Before` / `After`: `active_id` joins `over_id`'s siblings next to it
    ///
    /// Refused when `over_id` is `active_id` itself or one of its descendants
    /// (the move would detach the subtree from the root), and for before/after
    /// placement relative to the root.
    pub fn move_node(
        &mut self,
        active_id: &str,
        over_id: &str,
        placement: Placement,
    ) -> OperationResult<()> {
        if let Err(err) = self.validate_move(active_id, over_id, placement) {
            return skip("move_node", err);
        }
        let (old_parent_id, old_index) = match self.locate(active_id, "move") {
            Ok(found) => found,
            Err(err) => return skip("move_node", err),
        };
        let Some(over) = self.get(over_id) else {
            return skip("move_node", NodeOperationError::node_not_found(over_id));
        };
        let (new_parent_id, new_level) = match placement {
            Placement::Inside => (over_id.to_string(), over.level + 1),
            Placement::Before | Placement::After => match over.parent_id.clone() {
                Some(parent_id) => (parent_id, over.level),
                None => {
                    return skip("move_node", NodeOperationError::root_has_no_siblings(over_id))
                }
            },
        };

        self.edit_children(&old_parent_id, |children| {
            children.remove(old_index);
        });
        let moved = active_id.to_string();
        self.edit_children(&new_parent_id, |children| {
            let at = match placement {
                Placement::Inside => 0,
                // Looked up after the detach, which may have shifted the target
                Placement::Before | Placement::After => children
                    .iter()
                    .position(|id| id == over_id)
                    .map_or(children.len(), |i| {
                        i + usize::from(placement == Placement::After)
                    }),
            };
            children.insert(at, moved);
        });

        self.set_parent(active_id, &new_parent_id);
        self.recompute_levels(active_id, new_level);
        Ok(())
    }

    fn validate_move(
        &self,
        active_id: &str,
        over_id: &str,
        placement: Placement,
    ) -> OperationResult<()> {
        let active = self
            .get(active_id)
            .ok_or_else(|| NodeOperationError::node_not_found(active_id))?;
        let over = self
            .get(over_id)
            .ok_or_else(|| NodeOperationError::node_not_found(over_id))?;
        if active.is_root() {
            return Err(NodeOperationError::root_not_allowed(active_id, "move"));
        }
        if active_id == over_id || self.is_descendant(active_id, over_id) {
            return Err(NodeOperationError::move_into_own_subtree(active_id, over_id));
        }
        if placement != Placement::Inside {
            if over.is_root() {
                return Err(NodeOperationError::root_has_no_siblings(over_id));
            }
            if self.position(over_id).is_none() {
                return Err(TreeError::Unreachable {
                    id: over_id.to_string(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Replace the children of `node_id` with freshly imported subtrees
    ///
    /// Used to splice an accepted reorganization back into the outline. Old
    /// descendants are removed; incoming ids are kept unless they are missing or
    /// collide with a node already in the store. Returns the new child ids.
    pub fn replace_children(
        &mut self,
        node_id: &str,
        children: &[NestedNode],
    ) -> OperationResult<Vec<String>> {
        let Some(node) = self.get(node_id) else {
            return skip("replace_children", NodeOperationError::node_not_found(node_id));
        };
        let level = node.level + 1;
        let old_children = node.children.clone();

        // Flatten everything before touching the store
        let now = self.now();
        let mut taken: HashSet<String> = self.nodes().map(|n| n.id.clone()).collect();
        let mut imported: Vec<FlatSubtree> = Vec::with_capacity(children.len());
        for child in children {
            match flatten_subtree(child, Some(node_id), level, IdPolicy::Preserve, &mut taken, now)
            {
                Ok(flat) => imported.push(flat),
                Err(err) => return skip("replace_children", err.into()),
            }
        }

        for old_child in &old_children {
            for id in self.subtree_ids(old_child) {
                self.remove(&id);
            }
        }
        let mut new_children = Vec::with_capacity(imported.len());
        for flat in imported {
            new_children.push(flat.root_id);
            for (_, node) in flat.nodes {
                self.insert(node);
            }
        }
        let replacement = new_children.clone();
        self.edit_children(node_id, |children| *children = replacement);
        Ok(new_children)
    }

    //
    // CONTENT OPERATIONS
    //

    fn touch_node(&mut self, node_id: &str) {
        let now = self.now();
        if let Some(node) = self.get_mut(node_id) {
            node.touch(now);
        }
    }

    /// Apply `edit` to a node and bump its timestamp when `edit` reports a change
    fn edit_node<T>(
        &mut self,
        operation: &'static str,
        node_id: &str,
        edit: impl FnOnce(&mut Node) -> OperationResult<(T, bool)>,
    ) -> OperationResult<T> {
        let now = self.now();
        let Some(node) = self.get_mut(node_id) else {
            return skip(operation, NodeOperationError::node_not_found(node_id));
        };
        match edit(node) {
            Ok((value, changed)) => {
                if changed {
                    node.touch(now);
                }
                Ok(value)
            }
            Err(err) => skip(operation, err),
        }
    }

    /// Replace the text of a node; `Ok(false)` when the text is unchanged
    pub fn update_content(
        &mut self,
        node_id: &str,
        content: impl Into<String>,
    ) -> OperationResult<bool> {
        let content = content.into();
        self.edit_node("update_content", node_id, |node| {
            if node.content == content {
                return Ok((false, false));
            }
            node.content = content;
            Ok((true, true))
        })
    }

    /// Set the collapsed flag; `Ok(false)` when it already had that value
    pub fn set_collapsed(&mut self, node_id: &str, collapsed: bool) -> OperationResult<bool> {
        self.edit_node("set_collapsed", node_id, |node| {
            let changed = node.collapsed != collapsed;
            node.collapsed = collapsed;
            Ok((changed, changed))
        })
    }

    /// Flip the collapsed flag, returning the new value
    pub fn toggle_collapsed(&mut self, node_id: &str) -> OperationResult<bool> {
        self.edit_node("toggle_collapsed", node_id, |node| {
            node.collapsed = !node.collapsed;
            Ok((node.collapsed, true))
        })
    }

    /// Expand every node; returns how many nodes changed
    pub fn expand_all(&mut self) -> usize {
        let targets: Vec<String> = self
            .nodes()
            .filter(|n| n.collapsed)
            .map(|n| n.id.clone())
            .collect();
        targets
            .iter()
            .filter(|id| matches!(self.set_collapsed(id, false), Ok(true)))
            .count()
    }

    /// Collapse every non-root node that has children; returns how many changed
    pub fn collapse_all(&mut self) -> usize {
        let targets: Vec<String> = self
            .nodes()
            .filter(|n| !n.is_root() && n.has_children() && !n.collapsed)
            .map(|n| n.id.clone())
            .collect();
        targets
            .iter()
            .filter(|id| matches!(self.set_collapsed(id, true), Ok(true)))
            .count()
    }

    /// Add a tag; `Ok(false)` when already present
    ///
    /// The label is trimmed and a leading `#` dropped. Empty labels are refused.
    pub fn add_tag(&mut self, node_id: &str, tag: &str) -> OperationResult<bool> {
        let Some(tag) = normalize_tag(tag) else {
            return skip("add_tag", NodeOperationError::invalid_tag(tag));
        };
        self.edit_node("add_tag", node_id, |node| {
            if node.has_tag(&tag) {
                return Ok((false, false));
            }
            node.tags.push(tag);
            Ok((true, true))
        })
    }

    /// Remove a tag; `Ok(false)` when it was not present
    pub fn remove_tag(&mut self, node_id: &str, tag: &str) -> OperationResult<bool> {
        let tag = normalize_tag(tag).unwrap_or_else(|| tag.to_string());
        self.edit_node("remove_tag", node_id, |node| {
            let before = node.tags.len();
            node.tags.retain(|t| *t != tag);
            let changed = node.tags.len() != before;
            Ok((changed, changed))
        })
    }

    /// Merge the `#hashtags` written in a node's content into its tags
    ///
    /// Returns the number of tags added.
    pub fn sync_hashtags(&mut self, node_id: &str) -> OperationResult<usize> {
        self.edit_node("sync_hashtags", node_id, |node| {
            let mut added = 0;
            for tag in extract_hashtags(&node.content) {
                if !node.has_tag(&tag) {
                    node.tags.push(tag);
                    added += 1;
                }
            }
            Ok((added, added > 0))
        })
    }

    /// Append an image; `Ok(false)` when an image with the same id is attached
    pub fn add_image(&mut self, node_id: &str, image: ImageAttachment) -> OperationResult<bool> {
        self.edit_node("add_image", node_id, |node| {
            if node.images.iter().any(|existing| existing.id == image.id) {
                return Ok((false, false));
            }
            node.images.push(image);
            Ok((true, true))
        })
    }

    /// Detach an image by id; `Ok(false)` when no such image is attached
    pub fn remove_image(&mut self, node_id: &str, image_id: &str) -> OperationResult<bool> {
        self.edit_node("remove_image", node_id, |node| {
            let before = node.images.len();
            node.images.retain(|image| image.id != image_id);
            let changed = node.images.len() != before;
            Ok((changed, changed))
        })
    }
}

#[cfg(test)]
#[path = "operations_test.rs"]
mod operations_test;
