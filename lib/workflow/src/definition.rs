//! Workflow definition types.
//!
//! A workflow is a named automation that consists of:
//! - Metadata (name, status, timestamps)
//! - A directed graph of trigger, action and condition nodes
//!
//! All mutations go through [`Workflow`] so the timestamps and the status
//! stay consistent with the graph.

use crate::edge::{BranchOutcome, Edge};
use crate::error::WorkflowError;
use crate::graph::WorkflowGraph;
use crate::node::{Node, NodeConfig, Position};
use crate::validation::{self, Violation};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use tracing::{info, warn};
use workflow_designer_core::{EdgeId, NodeId, WorkflowId};

/// Lifecycle status of a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    /// Being edited; not yet validated for publication.
    #[default]
    Draft,
    /// Passed validation and was published.
    Published,
    /// Retired; read-only.
    Archived,
}

impl WorkflowStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A complete workflow definition.
#[derive(Debug, Clone)]
pub struct Workflow {
    id: WorkflowId,
    name: String,
    status: WorkflowStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    graph: WorkflowGraph,
}

impl Workflow {
    /// Creates a new, empty draft workflow with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(WorkflowId::new(), name)
    }

    /// Creates a new, empty draft workflow with a specific ID.
    #[must_use]
    pub fn with_id(id: WorkflowId, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            status: WorkflowStatus::Draft,
            created_at: now,
            updated_at: now,
            graph: WorkflowGraph::new(),
        }
    }

    /// Reassembles a workflow from already-checked parts.
    pub(crate) fn from_parts(
        id: WorkflowId,
        name: String,
        status: WorkflowStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        graph: WorkflowGraph,
    ) -> Self {
        Self {
            id,
            name,
            status,
            created_at,
            updated_at,
            graph,
        }
    }

    #[must_use]
    pub fn id(&self) -> WorkflowId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn status(&self) -> WorkflowStatus {
        self.status
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the workflow graph.
    #[must_use]
    pub fn graph(&self) -> &WorkflowGraph {
        &self.graph
    }

    #[must_use]
    pub fn get_node(&self, node_id: NodeId) -> Option<&Node> {
        self.graph.get_node(node_id)
    }

    #[must_use]
    pub fn get_edge(&self, edge_id: EdgeId) -> Option<&Edge> {
        self.graph.get_edge(edge_id)
    }

    /// Returns all nodes, ordered by ID.
    #[must_use]
    pub fn list_nodes(&self) -> Vec<&Node> {
        self.graph.nodes()
    }

    /// Returns all edges, ordered by ID.
    #[must_use]
    pub fn list_edges(&self) -> Vec<&Edge> {
        self.graph.edges()
    }

    /// Adds a node with a freshly generated ID.
    ///
    /// The node's kind is the variant of `config`. The configuration may be
    /// incomplete; schema problems are reported by [`Workflow::validate`].
    ///
    /// # Errors
    ///
    /// Returns `InvalidPosition` if a coordinate is NaN or infinite, or
    /// `InvalidStateTransition` if the workflow is archived.
    pub fn add_node(
        &mut self,
        config: impl Into<NodeConfig>,
        position: Position,
    ) -> Result<NodeId, WorkflowError> {
        self.insert_node(Node::new(config).at(position))
    }

    /// Adds a fully built node, keeping its ID.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateId` if the ID is taken, `InvalidPosition` if a
    /// coordinate is NaN or infinite, or `InvalidStateTransition` if the
    /// workflow is archived.
    pub fn insert_node(&mut self, node: Node) -> Result<NodeId, WorkflowError> {
        self.ensure_editable()?;
        let node_id = self.graph.insert_node(node)?;
        self.touch();
        Ok(node_id)
    }

    /// Removes a node together with every edge referencing it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the node doesn't exist, or
    /// `InvalidStateTransition` if the workflow is archived.
    pub fn remove_node(&mut self, node_id: NodeId) -> Result<Node, WorkflowError> {
        self.ensure_editable()?;
        let (node, _) = self.graph.remove_node(node_id)?;
        self.touch();
        Ok(node)
    }

    /// Merges a partial configuration into a node's configuration.
    ///
    /// The merged result must pass the full schema for the node's kind, even
    /// if the node was added incomplete. Send every field an operation
    /// requires in one patch: a `create_campaign` action given only
    /// `campaign_name` is rejected while `subject` is still missing.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the node doesn't exist, `SchemaViolation` if the
    /// result fails the node kind's schema, or `InvalidStateTransition` if
    /// the workflow is archived.
    pub fn update_node(
        &mut self,
        node_id: NodeId,
        partial_config: &Map<String, JsonValue>,
    ) -> Result<(), WorkflowError> {
        self.ensure_editable()?;
        self.graph.update_node_config(node_id, partial_config)?;
        self.touch();
        Ok(())
    }

    /// Moves a node on the canvas.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the node doesn't exist, `InvalidPosition` if a
    /// coordinate is NaN or infinite, or `InvalidStateTransition` if the
    /// workflow is archived.
    pub fn move_node(&mut self, node_id: NodeId, position: Position) -> Result<(), WorkflowError> {
        self.ensure_editable()?;
        self.graph.move_node(node_id, position)?;
        self.touch();
        Ok(())
    }

    /// Replaces a node's label.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the node doesn't exist, or
    /// `InvalidStateTransition` if the workflow is archived.
    pub fn set_node_label(
        &mut self,
        node_id: NodeId,
        label: Option<String>,
    ) -> Result<(), WorkflowError> {
        self.ensure_editable()?;
        self.graph.set_node_label(node_id, label)?;
        self.touch();
        Ok(())
    }

    /// Connects two nodes with a freshly generated edge ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if an endpoint is missing, `InvalidTopology` if the
    /// target is a trigger, the edge would close a cycle, or an outcome is set
    /// on a non-condition source, and `InvalidStateTransition` if the
    /// workflow is archived.
    pub fn add_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        kind: Option<BranchOutcome>,
    ) -> Result<EdgeId, WorkflowError> {
        let mut edge = Edge::new(source, target);
        edge.kind = kind;
        self.insert_edge(edge)
    }

    /// Adds a fully built edge, keeping its ID.
    ///
    /// # Errors
    ///
    /// Same as [`Workflow::add_edge`], plus `DuplicateId` if the ID is taken.
    pub fn insert_edge(&mut self, edge: Edge) -> Result<EdgeId, WorkflowError> {
        self.ensure_editable()?;
        let edge_id = self.graph.insert_edge(edge)?;
        self.touch();
        Ok(edge_id)
    }

    /// Removes an edge.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the edge doesn't exist, or
    /// `InvalidStateTransition` if the workflow is archived.
    pub fn remove_edge(&mut self, edge_id: EdgeId) -> Result<Edge, WorkflowError> {
        self.ensure_editable()?;
        let edge = self.graph.remove_edge(edge_id)?;
        self.touch();
        Ok(edge)
    }

    /// Renames the workflow.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` if the workflow is archived.
    pub fn rename(&mut self, name: impl Into<String>) -> Result<(), WorkflowError> {
        self.ensure_editable()?;
        self.name = name.into();
        self.touch();
        Ok(())
    }

    /// Checks every invariant. Never modifies the workflow.
    #[must_use]
    pub fn validate(&self) -> Vec<Violation> {
        validation::validate(&self.graph)
    }

    /// Publishes the workflow if it passes validation.
    ///
    /// # Errors
    ///
    /// Returns `ValidationFailed` with the violations if validation fails,
    /// or `InvalidStateTransition` if the workflow is archived. The status is
    /// unchanged on error.
    pub fn publish(&mut self) -> Result<(), WorkflowError> {
        if self.status == WorkflowStatus::Archived {
            return Err(self.transition_error(WorkflowStatus::Published));
        }

        let violations = self.validate();
        if !violations.is_empty() {
            warn!(
                workflow_id = %self.id,
                violations = violations.len(),
                "publish rejected"
            );
            return Err(WorkflowError::ValidationFailed { violations });
        }

        self.status = WorkflowStatus::Published;
        self.advance_clock();
        info!(workflow_id = %self.id, "workflow published");
        Ok(())
    }

    /// Archives the workflow. Allowed from any status.
    pub fn archive(&mut self) {
        self.status = WorkflowStatus::Archived;
        self.advance_clock();
        info!(workflow_id = %self.id, "workflow archived");
    }

    /// Returns summary information for listings.
    #[must_use]
    pub fn summary(&self) -> WorkflowSummary {
        WorkflowSummary::from(self)
    }

    fn ensure_editable(&self) -> Result<(), WorkflowError> {
        if self.status == WorkflowStatus::Archived {
            return Err(self.transition_error(WorkflowStatus::Draft));
        }
        Ok(())
    }

    fn transition_error(&self, to: WorkflowStatus) -> WorkflowError {
        WorkflowError::InvalidStateTransition {
            from: self.status.to_string(),
            to: to.to_string(),
        }
    }

    /// Records a structural change. Edits to a published workflow turn it
    /// back into a draft until it is published again.
    fn touch(&mut self) {
        if self.status == WorkflowStatus::Published {
            info!(workflow_id = %self.id, "published workflow edited, back to draft");
            self.status = WorkflowStatus::Draft;
        }
        self.advance_clock();
    }

    /// Moves `updated_at` strictly forward, even if the clock has not.
    fn advance_clock(&mut self) {
        let now = Utc::now();
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::nanoseconds(1)
        };
    }
}

/// Summary information about a workflow (for listings).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSummary {
    /// Workflow ID.
    pub id: WorkflowId,
    /// Workflow name.
    pub name: String,
    /// Lifecycle status.
    pub status: WorkflowStatus,
    /// Number of nodes in the graph.
    pub node_count: usize,
    /// Number of edges (connections) in the graph.
    pub edge_count: usize,
    /// Last updated timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<&Workflow> for WorkflowSummary {
    fn from(workflow: &Workflow) -> Self {
        Self {
            id: workflow.id,
            name: workflow.name.clone(),
            status: workflow.status,
            node_count: workflow.graph.node_count(),
            edge_count: workflow.graph.edge_count(),
            updated_at: workflow.updated_at,
        }
    }
}
