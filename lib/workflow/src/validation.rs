//! Whole-graph validation.
//!
//! [`validate`] runs every invariant check and returns the violations in a
//! fixed order: trigger count, edge endpoints, edges into triggers, branch
//! outcomes, cycles, node schemas. Within a check, entities are visited in
//! ascending ID order, so the same graph always yields the same list.

use crate::graph::WorkflowGraph;
use crate::node::NodeKind;
use crate::schema::SchemaIssue;
use petgraph::stable_graph::NodeIndex;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use workflow_designer_core::{EdgeId, NodeId};

/// A reference to a node or an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum EntityRef {
    Node(NodeId),
    Edge(EdgeId),
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node(id) => write!(f, "{id}"),
            Self::Edge(id) => write!(f, "{id}"),
        }
    }
}

/// One invariant breach found by validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "violation", rename_all = "snake_case")]
pub enum Violation {
    /// The workflow has no trigger and cannot start.
    MissingTrigger,
    /// The workflow has more than one trigger.
    MultipleTriggers { node_ids: Vec<NodeId> },
    /// An edge references a node that is not in the graph.
    DanglingEdge { edge_id: EdgeId, node_id: NodeId },
    /// An edge points at a trigger node.
    TriggerTargeted { edge_id: EdgeId, node_id: NodeId },
    /// An edge carries a branch outcome but its source is not a condition.
    OutcomeWithoutCondition { edge_id: EdgeId, node_id: NodeId },
    /// A cycle among action and condition nodes, in traversal order.
    Cycle { node_ids: Vec<NodeId> },
    /// A node's configuration fails its schema.
    Schema {
        node_id: NodeId,
        issues: Vec<SchemaIssue>,
    },
}

impl Violation {
    /// Returns a stable machine-readable code for this violation.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingTrigger => "missing_trigger",
            Self::MultipleTriggers { .. } => "multiple_triggers",
            Self::DanglingEdge { .. } => "dangling_edge",
            Self::TriggerTargeted { .. } => "trigger_targeted",
            Self::OutcomeWithoutCondition { .. } => "outcome_without_condition",
            Self::Cycle { .. } => "cycle",
            Self::Schema { .. } => "schema",
        }
    }

    /// Returns the entity the violation is attached to, if any.
    ///
    /// Multi-node violations point at their first node.
    #[must_use]
    pub fn entity(&self) -> Option<EntityRef> {
        match self {
            Self::MissingTrigger => None,
            Self::MultipleTriggers { node_ids } | Self::Cycle { node_ids } => {
                node_ids.first().copied().map(EntityRef::Node)
            }
            Self::DanglingEdge { edge_id, .. }
            | Self::TriggerTargeted { edge_id, .. }
            | Self::OutcomeWithoutCondition { edge_id, .. } => Some(EntityRef::Edge(*edge_id)),
            Self::Schema { node_id, .. } => Some(EntityRef::Node(*node_id)),
        }
    }
}

fn join_ids(f: &mut fmt::Formatter<'_>, ids: &[NodeId], separator: &str) -> fmt::Result {
    for (i, id) in ids.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{id}")?;
    }
    Ok(())
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTrigger => write!(f, "workflow has no trigger"),
            Self::MultipleTriggers { node_ids } => {
                write!(f, "workflow has {} triggers: ", node_ids.len())?;
                join_ids(f, node_ids, ", ")
            }
            Self::DanglingEdge { edge_id, node_id } => {
                write!(f, "edge {edge_id} references missing node {node_id}")
            }
            Self::TriggerTargeted { edge_id, node_id } => {
                write!(f, "edge {edge_id} targets trigger {node_id}")
            }
            Self::OutcomeWithoutCondition { edge_id, node_id } => {
                write!(
                    f,
                    "edge {edge_id} has a branch outcome but {node_id} is not a condition"
                )
            }
            Self::Cycle { node_ids } => {
                write!(f, "cycle: ")?;
                join_ids(f, node_ids, " -> ")
            }
            Self::Schema { node_id, issues } => {
                write!(f, "node {node_id} has {} schema issue(s)", issues.len())?;
                for issue in issues {
                    write!(f, "; {issue}")?;
                }
                Ok(())
            }
        }
    }
}

/// Validates the whole graph without modifying it.
///
/// An empty result means the graph satisfies every invariant.
#[must_use]
pub fn validate(graph: &WorkflowGraph) -> Vec<Violation> {
    let mut violations = Vec::new();

    let triggers: Vec<NodeId> = graph.trigger_nodes().iter().map(|n| n.id).collect();
    match triggers.len() {
        0 => violations.push(Violation::MissingTrigger),
        1 => {}
        _ => violations.push(Violation::MultipleTriggers { node_ids: triggers }),
    }

    let edges = graph.edges();

    for edge in &edges {
        let endpoints = graph.endpoints_of(edge.id);
        for (node_id, held) in [
            (edge.source, endpoints.map(|(source, _)| source)),
            (edge.target, endpoints.map(|(_, target)| target)),
        ] {
            if graph.index_of(node_id).is_none() || graph.index_of(node_id) != held {
                violations.push(Violation::DanglingEdge {
                    edge_id: edge.id,
                    node_id,
                });
            }
        }
    }

    for edge in &edges {
        if graph.get_node(edge.target).is_some_and(|n| n.is_trigger()) {
            violations.push(Violation::TriggerTargeted {
                edge_id: edge.id,
                node_id: edge.target,
            });
        }
    }

    for edge in &edges {
        let source_kind = graph.get_node(edge.source).map(|n| n.kind());
        if edge.kind.is_some() && source_kind.is_some_and(|kind| kind != NodeKind::Condition) {
            violations.push(Violation::OutcomeWithoutCondition {
                edge_id: edge.id,
                node_id: edge.source,
            });
        }
    }

    for node_ids in find_cycles(graph) {
        violations.push(Violation::Cycle { node_ids });
    }

    for node in graph.nodes() {
        let issues = node.config.check();
        if !issues.is_empty() {
            violations.push(Violation::Schema {
                node_id: node.id,
                issues,
            });
        }
    }

    violations
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

struct Frame {
    index: NodeIndex,
    successors: Vec<NodeIndex>,
    cursor: usize,
}

impl Frame {
    fn new(graph: &WorkflowGraph, index: NodeIndex) -> Self {
        Self {
            index,
            successors: graph.flow_successors(index).collect(),
            cursor: 0,
        }
    }
}

/// Finds cycles among action and condition nodes.
///
/// Iterative three-color depth-first search: white nodes are unvisited, gray
/// nodes are on the current path, black nodes are finished. Every edge into a
/// gray node closes a cycle, which is reported as the path segment from that
/// node to the top of the stack. Runs in O(nodes + edges).
pub(crate) fn find_cycles(graph: &WorkflowGraph) -> Vec<Vec<NodeId>> {
    let mut color: HashMap<NodeIndex, Color> = HashMap::new();
    let mut cycles = Vec::new();

    for start in graph.nodes() {
        if start.is_trigger() {
            continue;
        }
        let Some(start_index) = graph.index_of(start.id) else {
            continue;
        };
        if color.get(&start_index).copied().unwrap_or(Color::White) != Color::White {
            continue;
        }

        color.insert(start_index, Color::Gray);
        let mut stack = vec![Frame::new(graph, start_index)];

        while let Some(frame) = stack.last_mut() {
            let index = frame.index;
            let next = frame.successors.get(frame.cursor).copied();
            frame.cursor += 1;

            let Some(next) = next else {
                color.insert(index, Color::Black);
                stack.pop();
                continue;
            };

            match color.get(&next).copied().unwrap_or(Color::White) {
                Color::White => {
                    color.insert(next, Color::Gray);
                    stack.push(Frame::new(graph, next));
                }
                Color::Gray => {
                    let from = stack
                        .iter()
                        .position(|frame| frame.index == next)
                        .unwrap_or(0);
                    let cycle = stack[from..]
                        .iter()
                        .filter_map(|frame| graph.node_at(frame.index).map(|n| n.id))
                        .collect();
                    cycles.push(cycle);
                }
                Color::Black => {}
            }
        }
    }

    cycles
}
