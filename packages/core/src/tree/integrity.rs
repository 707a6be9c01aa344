//! Store integrity check
//!
//! Walks the whole store once and reports the first violated invariant. Used by
//! tests after every operation and by the session when adopting a store.

use super::{NodeStore, TreeError};
use std::collections::HashSet;

impl NodeStore {
    /// Verify the structural invariants of the store
    pub fn check_integrity(&self) -> Result<(), TreeError> {
        let root = self
            .root()
            .ok_or_else(|| TreeError::invalid_root(format!("root '{}' missing", self.root_id())))?;
        if let Some(parent) = &root.parent_id {
            return Err(TreeError::invalid_root(format!(
                "root '{}' has parent '{}'",
                root.id, parent
            )));
        }
        if root.level != 0 {
            return Err(TreeError::LevelMismatch {
                id: root.id.clone(),
                expected: 0,
                actual: root.level,
            });
        }
        if let Some(other) = self
            .nodes()
            .find(|node| node.parent_id.is_none() && node.id != root.id)
        {
            return Err(TreeError::invalid_root(format!(
                "second parentless node '{}'",
                other.id
            )));
        }

        let mut visited: HashSet<&str> = HashSet::with_capacity(self.len());
        visited.insert(root.id.as_str());
        let mut stack = vec![root];
        while let Some(parent) = stack.pop() {
            for child_id in &parent.children {
                let child = self
                    .get(child_id)
                    .ok_or_else(|| TreeError::missing_child(&parent.id, child_id))?;
                if !visited.insert(child.id.as_str()) {
                    return Err(TreeError::cycle(&child.id));
                }
                if child.parent_id.as_deref() != Some(parent.id.as_str()) {
                    return Err(TreeError::ParentMismatch {
                        id: child.id.clone(),
                        expected: parent.id.clone(),
                        actual: child.parent_id.clone(),
                    });
                }
                if child.level != parent.level + 1 {
                    return Err(TreeError::LevelMismatch {
                        id: child.id.clone(),
                        expected: parent.level + 1,
                        actual: child.level,
                    });
                }
                stack.push(child);
            }
        }

        if visited.len() != self.len() {
            if let Some(orphan) = self.nodes().find(|n| !visited.contains(n.id.as_str())) {
                return Err(TreeError::Unreachable {
                    id: orphan.id.clone(),
                });
            }
        }
        Ok(())
    }
}
