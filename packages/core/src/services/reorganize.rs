//! AI reorganize round-trip
//!
//! Asks an external [`Reorganizer`] to restructure a subtree, then turns the
//! answer into a [`ReorganizeProposal`] the user can review:
//!
//! 1. Build the subtree and strip it to content and structure (no ids leave the process)
//! 2. Call the reorganizer
//! 3. Reject unusable answers
//! 4. Give every proposed node a fresh id
//! 5. Diff the current subtree against the proposal
//!
//! Nothing touches the store until the proposal is accepted through
//! [`EditorSession::apply_reorganization`](crate::services::EditorSession::apply_reorganization).

use crate::diff::{diff_trees, DiffSummary};
use crate::models::{new_node_id, NestedNode};
use crate::services::error::ReorganizeError;
use crate::tree::NodeStore;
use crate::utils::from_json_unbounded;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Answer of the reorganizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorganizeResponse {
    /// Free-form explanation shown next to the diff
    #[serde(default)]
    pub reasoning: String,

    /// Replacement for the subtree, root included
    pub new_structure: NestedNode,
}

impl ReorganizeResponse {
    /// Parse a collaborator answer; proposed trees may nest arbitrarily deep
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        from_json_unbounded(json)
    }
}

/// External collaborator that proposes a cleaner hierarchy
///
/// Receives a subtree without ids and must keep each node's text verbatim,
/// inline markers included.
#[async_trait]
pub trait Reorganizer: Send + Sync {
    async fn reorganize(&self, tree: &NestedNode) -> anyhow::Result<ReorganizeResponse>;
}

/// Reviewed-but-not-applied result of a reorganize request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorganizeProposal {
    /// Node whose subtree the proposal replaces
    pub target_id: String,
    pub reasoning: String,
    /// Proposed subtree, every node with a fresh id
    pub proposed: NestedNode,
    pub diff: DiffSummary,
}

/// Drives the reorganize round-trip for one collaborator
#[derive(Clone)]
pub struct ReorganizeService {
    reorganizer: Arc<dyn Reorganizer>,
}

impl ReorganizeService {
    pub fn new(reorganizer: Arc<dyn Reorganizer>) -> Self {
        Self { reorganizer }
    }

    /// Request a reorganization of the subtree rooted at `target_id`
    pub async fn propose(
        &self,
        store: &NodeStore,
        target_id: &str,
    ) -> Result<ReorganizeProposal, ReorganizeError> {
        if !store.contains(target_id) {
            return Err(ReorganizeError::target_not_found(target_id));
        }
        let original = store.build_nested_tree(target_id)?;
        let request = original.structure_only();

        tracing::info!(
            "Requesting reorganization of '{}' ({} nodes)",
            target_id,
            request.node_count()
        );
        let response = self
            .reorganizer
            .reorganize(&request)
            .await
            .map_err(|e| ReorganizeError::Collaborator(format!("{:#}", e)))?;

        validate_response(&request, &response.new_structure)?;

        let mut proposed = response.new_structure;
        assign_fresh_ids(&mut proposed);
        let diff = diff_trees(&request, &proposed);
        tracing::debug!(
            "Reorganization of '{}' proposes {} changes",
            target_id,
            diff.len()
        );

        Ok(ReorganizeProposal {
            target_id: target_id.to_string(),
            reasoning: response.reasoning,
            proposed,
            diff,
        })
    }
}

fn validate_response(request: &NestedNode, proposed: &NestedNode) -> Result<(), ReorganizeError> {
    if proposed.iter().all(|node| node.content.trim().is_empty()) {
        return Err(ReorganizeError::invalid_response("proposed structure is empty"));
    }
    if !request.children.is_empty() && proposed.children.is_empty() {
        return Err(ReorganizeError::invalid_response(
            "proposed structure drops every node",
        ));
    }
    Ok(())
}

/// Replace every id in the subtree and clear level hints
fn assign_fresh_ids(root: &mut NestedNode) {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        node.id = Some(new_node_id());
        node.level = None;
        stack.extend(node.children.iter_mut());
    }
}
