//! Edge types for workflow graphs.
//!
//! Edges connect a source node to a target node. Edges leaving a condition
//! node may carry the branch outcome they follow.

use serde::{Deserialize, Serialize};
use std::fmt;
use workflow_designer_core::{EdgeId, NodeId};

/// The outcome of a condition node an edge is taken on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchOutcome {
    True,
    False,
}

impl fmt::Display for BranchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::True => f.write_str("true"),
            Self::False => f.write_str("false"),
        }
    }
}

/// A directed edge in a workflow graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Unique identifier for this edge within the workflow.
    pub id: EdgeId,
    /// The node the edge leaves.
    pub source: NodeId,
    /// The node the edge enters.
    pub target: NodeId,
    /// Branch outcome, for edges leaving a condition node.
    #[serde(default)]
    pub kind: Option<BranchOutcome>,
}

impl Edge {
    /// Creates a new unconditional edge with a fresh ID.
    #[must_use]
    pub fn new(source: NodeId, target: NodeId) -> Self {
        Self::with_id(EdgeId::new(), source, target)
    }

    /// Creates an unconditional edge with a specific ID.
    #[must_use]
    pub fn with_id(id: EdgeId, source: NodeId, target: NodeId) -> Self {
        Self {
            id,
            source,
            target,
            kind: None,
        }
    }

    /// Tags the edge with a branch outcome.
    #[must_use]
    pub fn on(mut self, outcome: BranchOutcome) -> Self {
        self.kind = Some(outcome);
        self
    }

    /// Returns true if the edge starts or ends at `node_id`.
    #[must_use]
    pub fn touches(&self, node_id: NodeId) -> bool {
        self.source == node_id || self.target == node_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_edge_is_unconditional() {
        let edge = Edge::new(NodeId::new(), NodeId::new());
        assert_eq!(edge.kind, None);
    }

    #[test]
    fn edge_touches_both_endpoints() {
        let source = NodeId::new();
        let target = NodeId::new();
        let edge = Edge::new(source, target).on(BranchOutcome::False);

        assert!(edge.touches(source));
        assert!(edge.touches(target));
        assert!(!edge.touches(NodeId::new()));
        assert_eq!(edge.kind, Some(BranchOutcome::False));
    }

    #[test]
    fn outcome_serializes_lowercase() {
        let json = serde_json::to_string(&BranchOutcome::True).expect("serialize");
        assert_eq!(json, "\"true\"");
    }

    #[test]
    fn missing_kind_deserializes_as_none() {
        let source = NodeId::new();
        let target = NodeId::new();
        let id = EdgeId::new();
        let json = format!(
            r#"{{"id":"{}","source":"{}","target":"{}"}}"#,
            id.as_ulid(),
            source.as_ulid(),
            target.as_ulid()
        );
        let edge: Edge = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(edge, Edge::with_id(id, source, target));
    }
}
