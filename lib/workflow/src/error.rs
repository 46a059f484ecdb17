//! Error types for the workflow crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `GraphError`: Low-level graph operations (nodes, edges, topology, schemas)
//! - `WorkflowError`: Workflow operations (lifecycle, validation, documents)
//! - `StoreError`: Store operations, reported as `Report<StoreError>`
//!
//! Every error maps onto an [`ErrorKind`] so callers can branch on the
//! category without matching every variant.

use crate::edge::BranchOutcome;
use crate::node::Position;
use crate::schema::SchemaIssue;
use crate::validation::Violation;
use std::fmt;
use workflow_designer_core::{EdgeId, NodeId, WorkflowId};

/// The category of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A referenced id is absent.
    NotFound,
    /// A caller-supplied id collides with an existing one.
    DuplicateId,
    /// The operation would break the graph shape (cycle, edge into a trigger).
    InvalidTopology,
    /// A node configuration fails its type-specific schema.
    SchemaViolation,
    /// A canvas coordinate is NaN or infinite.
    InvalidPosition,
    /// Validation found one or more violations.
    ValidationFailed,
    /// A serialized workflow is structurally inconsistent.
    CorruptDocument,
    /// The workflow's status does not allow the operation.
    InvalidStateTransition,
    /// A write was based on a stale version.
    VersionConflict,
}

/// Errors from graph operations.
///
/// These errors contain only information available at the graph layer.
/// Workflow-level context is added by wrapping them in [`WorkflowError`].
#[derive(Debug, Clone, PartialEq)]
pub enum GraphError {
    /// Node with the given ID was not found in the graph.
    NodeNotFound { node_id: NodeId },
    /// Edge with the given ID was not found in the graph.
    EdgeNotFound { edge_id: EdgeId },
    /// A node with this ID already exists.
    DuplicateNodeId { node_id: NodeId },
    /// An edge with this ID already exists.
    DuplicateEdgeId { edge_id: EdgeId },
    /// Edges may not point at trigger nodes.
    TriggerTargeted { source: NodeId, target: NodeId },
    /// The edge would close a cycle among action and condition nodes.
    CycleDetected { source: NodeId, target: NodeId },
    /// Branch outcomes are only meaningful on edges leaving a condition.
    OutcomeWithoutCondition {
        source: NodeId,
        outcome: BranchOutcome,
    },
    /// The node configuration does not satisfy its schema.
    SchemaViolation {
        node_id: NodeId,
        issues: Vec<SchemaIssue>,
    },
    /// A node position has a NaN or infinite coordinate.
    NonFinitePosition { node_id: NodeId, position: Position },
}

impl GraphError {
    /// Returns the category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NodeNotFound { .. } | Self::EdgeNotFound { .. } => ErrorKind::NotFound,
            Self::DuplicateNodeId { .. } | Self::DuplicateEdgeId { .. } => ErrorKind::DuplicateId,
            Self::TriggerTargeted { .. }
            | Self::CycleDetected { .. }
            | Self::OutcomeWithoutCondition { .. } => ErrorKind::InvalidTopology,
            Self::SchemaViolation { .. } => ErrorKind::SchemaViolation,
            Self::NonFinitePosition { .. } => ErrorKind::InvalidPosition,
        }
    }
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeNotFound { node_id } => write!(f, "node not found: {node_id}"),
            Self::EdgeNotFound { edge_id } => write!(f, "edge not found: {edge_id}"),
            Self::DuplicateNodeId { node_id } => write!(f, "node already exists: {node_id}"),
            Self::DuplicateEdgeId { edge_id } => write!(f, "edge already exists: {edge_id}"),
            Self::TriggerTargeted { source, target } => {
                write!(f, "edge {source} -> {target} targets a trigger node")
            }
            Self::CycleDetected { source, target } => {
                write!(f, "edge {source} -> {target} would create a cycle")
            }
            Self::OutcomeWithoutCondition { source, outcome } => {
                write!(
                    f,
                    "branch outcome '{outcome}' requires a condition source, but {source} is not one"
                )
            }
            Self::SchemaViolation { node_id, issues } => {
                write!(f, "configuration of node {node_id} is invalid: ")?;
                for (i, issue) in issues.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{issue}")?;
                }
                Ok(())
            }
            Self::NonFinitePosition { node_id, position } => write!(
                f,
                "node {node_id} has a non-finite position ({}, {})",
                position.x, position.y
            ),
        }
    }
}

impl std::error::Error for GraphError {}

/// Workflow-level errors.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowError {
    /// A graph operation failed.
    Graph(GraphError),
    /// The workflow did not pass validation.
    ValidationFailed { violations: Vec<Violation> },
    /// A workflow document could not be turned into a consistent workflow.
    CorruptDocument { reason: String },
    /// The current status does not permit the operation.
    InvalidStateTransition { from: String, to: String },
}

impl WorkflowError {
    /// Returns the category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Graph(err) => err.kind(),
            Self::ValidationFailed { .. } => ErrorKind::ValidationFailed,
            Self::CorruptDocument { .. } => ErrorKind::CorruptDocument,
            Self::InvalidStateTransition { .. } => ErrorKind::InvalidStateTransition,
        }
    }

    /// Returns the violations carried by a `ValidationFailed` error.
    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::ValidationFailed { violations } => violations,
            _ => &[],
        }
    }
}

impl From<GraphError> for WorkflowError {
    fn from(err: GraphError) -> Self {
        Self::Graph(err)
    }
}

impl fmt::Display for WorkflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Graph(err) => write!(f, "{err}"),
            Self::ValidationFailed { violations } => {
                write!(f, "validation failed with {} violation(s)", violations.len())?;
                for violation in violations {
                    write!(f, "\n  - {violation}")?;
                }
                Ok(())
            }
            Self::CorruptDocument { reason } => write!(f, "corrupt workflow document: {reason}"),
            Self::InvalidStateTransition { from, to } => {
                write!(f, "invalid state transition from {from} to {to}")
            }
        }
    }
}

impl std::error::Error for WorkflowError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Graph(err) => Some(err),
            _ => None,
        }
    }
}

/// Errors from the workflow store.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// No workflow is stored under this id.
    NotFound { workflow_id: WorkflowId },
    /// A workflow with this id is already stored.
    AlreadyExists { workflow_id: WorkflowId },
    /// The caller edited a stale copy.
    VersionConflict {
        workflow_id: WorkflowId,
        expected: u64,
        actual: u64,
    },
    /// A document could not be turned into a workflow.
    Import(WorkflowError),
}

impl StoreError {
    /// Returns the category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::AlreadyExists { .. } => ErrorKind::DuplicateId,
            Self::VersionConflict { .. } => ErrorKind::VersionConflict,
            Self::Import(err) => err.kind(),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { workflow_id } => write!(f, "workflow not found: {workflow_id}"),
            Self::AlreadyExists { workflow_id } => {
                write!(f, "workflow already exists: {workflow_id}")
            }
            Self::VersionConflict {
                workflow_id,
                expected,
                actual,
            } => write!(
                f,
                "workflow {workflow_id} was modified concurrently (expected version {expected}, found {actual})"
            ),
            Self::Import(err) => write!(f, "failed to import workflow document: {err}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Import(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_error_display() {
        let node_id = NodeId::new();
        let err = GraphError::NodeNotFound { node_id };
        assert!(err.to_string().contains("node not found"));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn topology_errors_share_a_kind() {
        let source = NodeId::new();
        let target = NodeId::new();
        assert_eq!(
            GraphError::CycleDetected { source, target }.kind(),
            ErrorKind::InvalidTopology
        );
        assert_eq!(
            GraphError::TriggerTargeted { source, target }.kind(),
            ErrorKind::InvalidTopology
        );
        assert_eq!(
            GraphError::OutcomeWithoutCondition {
                source,
                outcome: BranchOutcome::True,
            }
            .kind(),
            ErrorKind::InvalidTopology
        );
    }

    #[test]
    fn schema_violation_lists_every_issue() {
        let err = GraphError::SchemaViolation {
            node_id: NodeId::new(),
            issues: vec![
                SchemaIssue::new("cron", "expected 5 fields"),
                SchemaIssue::new("timezone", "must not be blank"),
            ],
        };
        let text = err.to_string();
        assert!(text.contains("cron: expected 5 fields"));
        assert!(text.contains("timezone: must not be blank"));
    }

    #[test]
    fn workflow_error_delegates_kind_to_graph_error() {
        let err = WorkflowError::from(GraphError::DuplicateEdgeId {
            edge_id: EdgeId::new(),
        });
        assert_eq!(err.kind(), ErrorKind::DuplicateId);
        assert!(err.violations().is_empty());
    }

    #[test]
    fn store_error_display() {
        let workflow_id = WorkflowId::new();
        let err = StoreError::VersionConflict {
            workflow_id,
            expected: 1,
            actual: 2,
        };
        assert!(err.to_string().contains("expected version 1, found 2"));
        assert_eq!(err.kind(), ErrorKind::VersionConflict);
    }
}
