//! Tree Diff
//!
//! Describes how a reorganized outline differs from the original, for review
//! before the user accepts it. Nodes are matched by exact content because the
//! reorganized tree carries no stable ids: the first node of the old tree (in
//! depth-first order) with the same text is taken as the same node. Duplicate
//! texts therefore collapse onto that first match.

use crate::models::NestedNode;
use crate::utils::strip_markdown;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Kind of a detected change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Node exists in both trees under different parent paths
    Move,
    /// Node exists only in the new tree
    CreateCategory,
}

/// One entry of a diff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeChange {
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_path: Option<Vec<String>>,
    pub to_path: Vec<String>,
}

/// Ordered list of changes, in depth-first order of the new tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiffSummary {
    pub changes: Vec<TreeChange>,
}

impl DiffSummary {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn moves(&self) -> impl Iterator<Item = &TreeChange> {
        self.changes.iter().filter(|c| c.kind == ChangeKind::Move)
    }

    pub fn created_categories(&self) -> impl Iterator<Item = &TreeChange> {
        self.changes
            .iter()
            .filter(|c| c.kind == ChangeKind::CreateCategory)
    }
}

/// Pre-order walk yielding each node with the contents of its ancestors
fn walk_with_paths(root: &NestedNode) -> Vec<(&NestedNode, Vec<String>)> {
    let mut out = Vec::new();
    let mut stack: Vec<(&NestedNode, Vec<String>)> = vec![(root, Vec::new())];
    while let Some((node, path)) = stack.pop() {
        for child in node.children.iter().rev() {
            let mut child_path = path.clone();
            child_path.push(node.content.clone());
            stack.push((child, child_path));
        }
        out.push((node, path));
    }
    out
}

/// Breadcrumb label for a path; blank segments (an untitled root) are skipped
fn describe_path(path: &[String]) -> String {
    let segments: Vec<String> = path
        .iter()
        .map(|segment| strip_markdown(segment))
        .filter(|segment| !segment.trim().is_empty())
        .collect();
    if segments.is_empty() {
        return "the top level".to_string();
    }
    segments.join(" > ")
}

/// Compare two nested trees
pub fn diff_trees(old: &NestedNode, new: &NestedNode) -> DiffSummary {
    let mut old_paths: HashMap<&str, Vec<String>> = HashMap::new();
    for (node, path) in walk_with_paths(old) {
        old_paths.entry(node.content.as_str()).or_insert(path);
    }

    let mut changes = Vec::new();
    for (node, to_path) in walk_with_paths(new) {
        let label = strip_markdown(&node.content);
        match old_paths.get(node.content.as_str()) {
            Some(from_path) if *from_path == to_path => {}
            Some(from_path) => changes.push(TreeChange {
                kind: ChangeKind::Move,
                description: format!(
                    "Move \"{}\" from {} to {}",
                    label,
                    describe_path(from_path),
                    describe_path(&to_path)
                ),
                from_path: Some(from_path.clone()),
                to_path,
            }),
            None => changes.push(TreeChange {
                kind: ChangeKind::CreateCategory,
                description: format!(
                    "Create category \"{}\" under {}",
                    label,
                    describe_path(&to_path)
                ),
                from_path: None,
                to_path,
            }),
        }
    }

    tracing::debug!("Tree diff found {} changes", changes.len());
    DiffSummary { changes }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(content: &str) -> NestedNode {
        NestedNode::new(content)
    }

    #[test]
    fn test_move_into_new_category() {
        let old = NestedNode::new("Notes").with_children(vec![leaf("Buy milk")]);
        let new = NestedNode::new("Notes")
            .with_children(vec![NestedNode::new("Shopping").with_children(vec![leaf("Buy milk")])]);

        let diff = diff_trees(&old, &new);
        assert_eq!(diff.len(), 2);

        let created: Vec<_> = diff.created_categories().collect();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].to_path, vec!["Notes"]);
        assert!(created[0].description.contains("Shopping"));

        let moves: Vec<_> = diff.moves().collect();
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].from_path, Some(vec!["Notes".to_string()]));
        assert_eq!(moves[0].to_path, vec!["Notes", "Shopping"]);
        assert_eq!(
            moves[0].description,
            "Move \"Buy milk\" from Notes to Notes > Shopping"
        );
    }

    #[test]
    fn test_identical_trees_have_no_changes() {
        let tree = NestedNode::new("Notes")
            .with_children(vec![NestedNode::new("A").with_children(vec![leaf("B")])]);
        assert!(diff_trees(&tree, &tree.clone()).is_empty());
    }

    #[test]
    fn test_duplicate_content_matches_first_occurrence() {
        let old = NestedNode::new("Root").with_children(vec![
            NestedNode::new("X").with_children(vec![leaf("Todo")]),
            NestedNode::new("Y").with_children(vec![leaf("Todo")]),
        ]);
        let new = NestedNode::new("Root").with_children(vec![
            NestedNode::new("X"),
            NestedNode::new("Y").with_children(vec![leaf("Todo")]),
        ]);

        let diff = diff_trees(&old, &new);
        let moves: Vec<_> = diff.moves().collect();
        assert_eq!(moves.len(), 1);
        assert_eq!(
            moves[0].from_path,
            Some(vec!["Root".to_string(), "X".to_string()])
        );
    }

    #[test]
    fn test_descriptions_use_plain_text() {
        let old = NestedNode::new("Root");
        let new = NestedNode::new("Root").with_children(vec![leaf("**Urgent** work")]);
        let diff = diff_trees(&old, &new);
        assert_eq!(
            diff.changes[0].description,
            "Create category \"Urgent work\" under Root"
        );
    }

    #[test]
    fn test_untitled_root_reads_as_top_level() {
        let old = NestedNode::new("").with_children(vec![leaf("Buy milk")]);
        let new = NestedNode::new("")
            .with_children(vec![NestedNode::new("Shopping").with_children(vec![leaf("Buy milk")])]);

        let diff = diff_trees(&old, &new);
        let descriptions: Vec<_> = diff.changes.iter().map(|c| c.description.as_str()).collect();
        assert_eq!(
            descriptions,
            vec![
                "Create category \"Shopping\" under the top level",
                "Move \"Buy milk\" from the top level to Shopping",
            ]
        );
    }

    #[test]
    fn test_serialized_shape() {
        let old = NestedNode::new("Notes").with_children(vec![leaf("Buy milk")]);
        let new = NestedNode::new("Notes")
            .with_children(vec![NestedNode::new("Shopping").with_children(vec![leaf("Buy milk")])]);
        let json = serde_json::to_value(diff_trees(&old, &new)).unwrap();

        assert_eq!(json[0]["type"], "create_category");
        assert!(json[0].get("fromPath").is_none());
        assert_eq!(json[1]["type"], "move");
        assert_eq!(json[1]["fromPath"], serde_json::json!(["Notes"]));
        assert_eq!(json[1]["toPath"], serde_json::json!(["Notes", "Shopping"]));
    }
}
