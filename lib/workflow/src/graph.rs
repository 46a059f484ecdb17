//! Workflow graph implementation using petgraph.
//!
//! Workflows are directed graphs where:
//! - Nodes are triggers, actions and conditions
//! - Edges connect a source node to a target node
//!
//! Every mutation checks the structural invariants before touching the
//! graph, so a failed call leaves the graph exactly as it was. A stable graph
//! is used so removals never shift the indices held in the lookup maps.

use crate::edge::Edge;
use crate::error::GraphError;
use crate::node::{Node, NodeKind, Position};
use petgraph::Direction;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use serde_json::{Map, Value as JsonValue};
use std::collections::{HashMap, HashSet};
use tracing::debug;
use workflow_designer_core::{EdgeId, NodeId};

/// A workflow graph using petgraph's stable directed graph.
#[derive(Debug, Clone, Default)]
pub struct WorkflowGraph {
    /// The underlying directed graph.
    graph: StableDiGraph<Node, Edge>,
    /// Map from NodeId to petgraph's NodeIndex for O(1) lookup.
    node_index_map: HashMap<NodeId, NodeIndex>,
    /// Map from EdgeId to petgraph's EdgeIndex for O(1) lookup.
    edge_index_map: HashMap<EdgeId, EdgeIndex>,
}

impl WorkflowGraph {
    /// Creates a new empty workflow graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if a node with this ID exists.
    #[must_use]
    pub fn contains_node(&self, node_id: NodeId) -> bool {
        self.node_index_map.contains_key(&node_id)
    }

    /// Returns a reference to a node by its ID.
    #[must_use]
    pub fn get_node(&self, node_id: NodeId) -> Option<&Node> {
        let index = self.node_index_map.get(&node_id)?;
        self.graph.node_weight(*index)
    }

    /// Returns a reference to an edge by its ID.
    #[must_use]
    pub fn get_edge(&self, edge_id: EdgeId) -> Option<&Edge> {
        let index = self.edge_index_map.get(&edge_id)?;
        self.graph.edge_weight(*index)
    }

    /// Returns all nodes, ordered by ID.
    #[must_use]
    pub fn nodes(&self) -> Vec<&Node> {
        let mut nodes: Vec<_> = self
            .graph
            .node_indices()
            .filter_map(|index| self.graph.node_weight(index))
            .collect();
        nodes.sort_by_key(|node| node.id);
        nodes
    }

    /// Returns all edges, ordered by ID.
    #[must_use]
    pub fn edges(&self) -> Vec<&Edge> {
        let mut edges: Vec<_> = self
            .graph
            .edge_indices()
            .filter_map(|index| self.graph.edge_weight(index))
            .collect();
        edges.sort_by_key(|edge| edge.id);
        edges
    }

    /// Returns the trigger nodes, ordered by ID.
    #[must_use]
    pub fn trigger_nodes(&self) -> Vec<&Node> {
        self.nodes().into_iter().filter(|n| n.is_trigger()).collect()
    }

    /// Returns the number of nodes in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of edges in the graph.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Adds a node to the graph.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateNodeId` if a node with the same ID exists, or
    /// `NonFinitePosition` if a coordinate is NaN or infinite.
    pub fn insert_node(&mut self, node: Node) -> Result<NodeId, GraphError> {
        let node_id = node.id;
        if self.node_index_map.contains_key(&node_id) {
            return Err(GraphError::DuplicateNodeId { node_id });
        }
        ensure_finite(node_id, node.position)?;

        let kind = node.kind();
        let index = self.graph.add_node(node);
        self.node_index_map.insert(node_id, index);
        debug!(%node_id, %kind, "node added");
        Ok(node_id)
    }

    /// Removes a node and every edge connected to it.
    ///
    /// Returns the node and the removed edges (ordered by ID).
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if the node doesn't exist.
    pub fn remove_node(&mut self, node_id: NodeId) -> Result<(Node, Vec<Edge>), GraphError> {
        let index = *self
            .node_index_map
            .get(&node_id)
            .ok_or(GraphError::NodeNotFound { node_id })?;

        let mut incident: Vec<EdgeIndex> = self
            .graph
            .edges_directed(index, Direction::Outgoing)
            .chain(self.graph.edges_directed(index, Direction::Incoming))
            .map(|edge| edge.id())
            .collect();
        incident.sort();
        incident.dedup();

        // Dependent edges go first so the node never dangles in the maps.
        let mut removed_edges = Vec::with_capacity(incident.len());
        for edge_index in incident {
            if let Some(edge) = self.graph.remove_edge(edge_index) {
                self.edge_index_map.remove(&edge.id);
                removed_edges.push(edge);
            }
        }
        removed_edges.sort_by_key(|edge| edge.id);

        self.node_index_map.remove(&node_id);
        let node = self
            .graph
            .remove_node(index)
            .ok_or(GraphError::NodeNotFound { node_id })?;

        debug!(%node_id, cascaded_edges = removed_edges.len(), "node removed");
        Ok((node, removed_edges))
    }

    /// Merges a partial configuration into a node's configuration.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if the node doesn't exist, or `SchemaViolation`
    /// if the merged configuration fails the schema for the node's kind.
    pub fn update_node_config(
        &mut self,
        node_id: NodeId,
        patch: &Map<String, JsonValue>,
    ) -> Result<(), GraphError> {
        let node = self.node_mut(node_id)?;
        let merged = node
            .config
            .merged(patch)
            .map_err(|issues| GraphError::SchemaViolation { node_id, issues })?;
        node.config = merged;
        debug!(%node_id, keys = patch.len(), "node configuration updated");
        Ok(())
    }

    /// Moves a node on the canvas.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if the node doesn't exist, or
    /// `NonFinitePosition` if a coordinate is NaN or infinite.
    pub fn move_node(&mut self, node_id: NodeId, position: Position) -> Result<(), GraphError> {
        let node = self.node_mut(node_id)?;
        ensure_finite(node_id, position)?;
        node.position = position;
        Ok(())
    }

    /// Replaces a node's label.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if the node doesn't exist.
    pub fn set_node_label(
        &mut self,
        node_id: NodeId,
        label: Option<String>,
    ) -> Result<(), GraphError> {
        self.node_mut(node_id)?.label = label;
        Ok(())
    }

    /// Adds an edge between two nodes.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - An edge with the same ID exists
    /// - Source or target node doesn't exist
    /// - The target is a trigger node
    /// - The edge carries a branch outcome but the source is not a condition
    /// - The edge would close a cycle among action and condition nodes
    pub fn insert_edge(&mut self, edge: Edge) -> Result<EdgeId, GraphError> {
        let edge_id = edge.id;
        if self.edge_index_map.contains_key(&edge_id) {
            return Err(GraphError::DuplicateEdgeId { edge_id });
        }

        let (source, target) = (edge.source, edge.target);
        let source_index = *self
            .node_index_map
            .get(&source)
            .ok_or(GraphError::NodeNotFound { node_id: source })?;
        let target_index = *self
            .node_index_map
            .get(&target)
            .ok_or(GraphError::NodeNotFound { node_id: target })?;

        let source_kind = self.kind_at(source_index, source)?;
        let target_kind = self.kind_at(target_index, target)?;

        if target_kind == NodeKind::Trigger {
            return Err(GraphError::TriggerTargeted { source, target });
        }

        if let Some(outcome) = edge.kind {
            if source_kind != NodeKind::Condition {
                return Err(GraphError::OutcomeWithoutCondition { source, outcome });
            }
        }

        if source_kind != NodeKind::Trigger && self.reaches(target_index, source_index) {
            return Err(GraphError::CycleDetected { source, target });
        }

        let index = self.graph.add_edge(source_index, target_index, edge);
        self.edge_index_map.insert(edge_id, index);
        debug!(%edge_id, %source, %target, "edge added");
        Ok(edge_id)
    }

    /// Removes an edge.
    ///
    /// # Errors
    ///
    /// Returns `EdgeNotFound` if the edge doesn't exist.
    pub fn remove_edge(&mut self, edge_id: EdgeId) -> Result<Edge, GraphError> {
        let index = self
            .edge_index_map
            .remove(&edge_id)
            .ok_or(GraphError::EdgeNotFound { edge_id })?;
        let edge = self
            .graph
            .remove_edge(index)
            .ok_or(GraphError::EdgeNotFound { edge_id })?;
        debug!(%edge_id, "edge removed");
        Ok(edge)
    }

    /// Adds an edge without topology checks, to build broken graphs in tests.
    #[cfg(test)]
    pub(crate) fn insert_edge_unchecked(&mut self, edge: Edge) {
        let source = self.node_index_map[&edge.source];
        let target = self.node_index_map[&edge.target];
        let edge_id = edge.id;
        let index = self.graph.add_edge(source, target, edge);
        self.edge_index_map.insert(edge_id, index);
    }

    /// Returns the petgraph index of a node.
    pub(crate) fn index_of(&self, node_id: NodeId) -> Option<NodeIndex> {
        self.node_index_map.get(&node_id).copied()
    }

    /// Returns the node stored at a petgraph index.
    pub(crate) fn node_at(&self, index: NodeIndex) -> Option<&Node> {
        self.graph.node_weight(index)
    }

    /// Returns the endpoints petgraph holds for an edge.
    pub(crate) fn endpoints_of(&self, edge_id: EdgeId) -> Option<(NodeIndex, NodeIndex)> {
        let index = self.edge_index_map.get(&edge_id)?;
        self.graph.edge_endpoints(*index)
    }

    /// Successors of a node restricted to action and condition nodes.
    pub(crate) fn flow_successors(&self, index: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph
            .neighbors_directed(index, Direction::Outgoing)
            .filter(|next| self.node_at(*next).is_some_and(|node| !node.is_trigger()))
    }

    fn node_mut(&mut self, node_id: NodeId) -> Result<&mut Node, GraphError> {
        let index = self
            .node_index_map
            .get(&node_id)
            .ok_or(GraphError::NodeNotFound { node_id })?;
        self.graph
            .node_weight_mut(*index)
            .ok_or(GraphError::NodeNotFound { node_id })
    }

    fn kind_at(&self, index: NodeIndex, node_id: NodeId) -> Result<NodeKind, GraphError> {
        self.node_at(index)
            .map(Node::kind)
            .ok_or(GraphError::NodeNotFound { node_id })
    }

    /// Returns true if `to` is reachable from `from` through action and
    /// condition nodes (a node always reaches itself).
    fn reaches(&self, from: NodeIndex, to: NodeIndex) -> bool {
        let mut stack = vec![from];
        let mut visited = HashSet::new();
        while let Some(index) = stack.pop() {
            if index == to {
                return true;
            }
            if visited.insert(index) {
                stack.extend(self.flow_successors(index));
            }
        }
        false
    }
}

/// JSON has no NaN or infinity, so such positions could not be reloaded.
fn ensure_finite(node_id: NodeId, position: Position) -> Result<(), GraphError> {
    if position.is_finite() {
        Ok(())
    } else {
        Err(GraphError::NonFinitePosition { node_id, position })
    }
}
