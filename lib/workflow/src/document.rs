//! Serializable workflow documents.
//!
//! A [`WorkflowDocument`] is the plain-data form of a [`Workflow`]: what gets
//! written to disk or sent over the wire. Loading a document re-checks
//! referential integrity, so a workflow built from one always satisfies the
//! same structural rules as one built through the mutation API.

use crate::definition::{Workflow, WorkflowStatus};
use crate::edge::Edge;
use crate::error::WorkflowError;
use crate::graph::WorkflowGraph;
use crate::node::{Node, NodeConfig, NodeKind, Position};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::debug;
use workflow_designer_core::{NodeId, WorkflowId};

/// A workflow as plain data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDocument {
    pub id: WorkflowId,
    pub name: String,
    pub status: WorkflowStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Nodes in ascending ID order.
    pub nodes: Vec<NodeRecord>,
    /// Edges in ascending ID order.
    pub edges: Vec<Edge>,
}

/// A node as plain data. The configuration is read according to `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawNodeRecord")]
pub struct NodeRecord {
    pub id: NodeId,
    pub kind: NodeKind,
    pub config: NodeConfig,
    pub position: Position,
    pub label: Option<String>,
    pub integration_id: Option<String>,
}

#[derive(Deserialize)]
struct RawNodeRecord {
    id: NodeId,
    kind: NodeKind,
    config: JsonValue,
    #[serde(default)]
    position: Position,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    integration_id: Option<String>,
}

impl TryFrom<RawNodeRecord> for NodeRecord {
    type Error = String;

    fn try_from(raw: RawNodeRecord) -> Result<Self, Self::Error> {
        let config = NodeConfig::from_value(raw.kind, raw.config)
            .map_err(|e| format!("invalid {} configuration for node {}: {e}", raw.kind, raw.id))?;
        Ok(Self {
            id: raw.id,
            kind: raw.kind,
            config,
            position: raw.position,
            label: raw.label,
            integration_id: raw.integration_id,
        })
    }
}

impl From<&Node> for NodeRecord {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id,
            kind: node.kind(),
            config: node.config.clone(),
            position: node.position,
            label: node.label.clone(),
            integration_id: node.integration_id.clone(),
        }
    }
}

impl From<NodeRecord> for Node {
    fn from(record: NodeRecord) -> Self {
        Self {
            id: record.id,
            config: record.config,
            position: record.position,
            label: record.label,
            integration_id: record.integration_id,
        }
    }
}

impl WorkflowDocument {
    /// Parses a document from JSON.
    ///
    /// # Errors
    ///
    /// Returns `CorruptDocument` if the text is not a well-formed document.
    pub fn from_json(json: &str) -> Result<Self, WorkflowError> {
        serde_json::from_str(json).map_err(|e| WorkflowError::CorruptDocument {
            reason: e.to_string(),
        })
    }

    /// Renders the document as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}

fn corrupt<E: ToString>(reason: E) -> WorkflowError {
    WorkflowError::CorruptDocument {
        reason: reason.to_string(),
    }
}

impl Workflow {
    /// Returns the plain-data form of this workflow.
    ///
    /// Nodes and edges are ordered by ID, so equal workflows produce equal
    /// documents.
    #[must_use]
    pub fn to_document(&self) -> WorkflowDocument {
        WorkflowDocument {
            id: self.id(),
            name: self.name().to_string(),
            status: self.status(),
            created_at: self.created_at(),
            updated_at: self.updated_at(),
            nodes: self.list_nodes().into_iter().map(NodeRecord::from).collect(),
            edges: self.list_edges().into_iter().cloned().collect(),
        }
    }

    /// Rebuilds a workflow from a document.
    ///
    /// Schema conformance of node configurations is left to
    /// [`Workflow::validate`]; drafts may hold incomplete nodes.
    ///
    /// # Errors
    ///
    /// Returns `CorruptDocument` if the document has duplicate IDs, an edge
    /// with a missing endpoint, an edge into a trigger, a branch outcome on a
    /// non-condition source, a cycle among action and condition nodes, a
    /// non-finite node position, or an `updated_at` earlier than `created_at`.
    pub fn from_document(document: WorkflowDocument) -> Result<Self, WorkflowError> {
        if document.updated_at < document.created_at {
            return Err(corrupt(format!(
                "updated_at {} precedes created_at {}",
                document.updated_at, document.created_at
            )));
        }

        let mut graph = WorkflowGraph::new();
        for record in document.nodes {
            graph.insert_node(Node::from(record)).map_err(corrupt)?;
        }
        for edge in document.edges {
            graph.insert_edge(edge).map_err(corrupt)?;
        }

        debug!(
            workflow_id = %document.id,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "workflow loaded from document"
        );

        Ok(Self::from_parts(
            document.id,
            document.name,
            document.status,
            document.created_at,
            document.updated_at,
            graph,
        ))
    }

    /// Parses and loads a workflow from JSON.
    ///
    /// # Errors
    ///
    /// Returns `CorruptDocument` if the JSON is malformed or the document is
    /// inconsistent.
    pub fn from_json(json: &str) -> Result<Self, WorkflowError> {
        Self::from_document(WorkflowDocument::from_json(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::BranchOutcome;
    use crate::error::ErrorKind;
    use crate::node::{ActionConfig, ActionField, ActionOperation, ConditionConfig, TriggerConfig};
    use serde_json::json;

    fn sample() -> Workflow {
        let mut workflow = Workflow::new("Gmail subscribers");
        let trigger = workflow
            .insert_node(
                Node::new(TriggerConfig::Mailchimp {
                    list_id: "a1b2c3".to_string(),
                    events: vec![crate::node::MailchimpListEvent::Subscribed],
                })
                .with_label("New subscriber")
                .with_integration("mailchimp"),
            )
            .expect("trigger");
        let check = workflow
            .add_node(
                ConditionConfig::new("{{email}}.includes('@gmail.com')"),
                Position::new(0.0, 120.0),
            )
            .expect("condition");
        let send = workflow
            .add_node(
                ActionConfig::new(ActionOperation::SendCampaign)
                    .with(ActionField::CampaignId, "c-1"),
                Position::new(-80.0, 240.0),
            )
            .expect("action");
        workflow.add_edge(trigger, check, None).expect("edge");
        workflow
            .add_edge(check, send, Some(BranchOutcome::True))
            .expect("branch");
        workflow
    }

    #[test]
    fn document_round_trip_preserves_everything() {
        let workflow = sample();
        let restored = Workflow::from_document(workflow.to_document()).expect("load");

        assert_eq!(restored.id(), workflow.id());
        assert_eq!(restored.name(), workflow.name());
        assert_eq!(restored.status(), workflow.status());
        assert_eq!(restored.created_at(), workflow.created_at());
        assert_eq!(restored.updated_at(), workflow.updated_at());
        assert_eq!(restored.list_nodes(), workflow.list_nodes());
        assert_eq!(restored.list_edges(), workflow.list_edges());
    }

    #[test]
    fn json_round_trip_is_canonical() {
        let workflow = sample();
        let json = workflow.to_document().to_json(true).expect("serialize");
        let restored = Workflow::from_json(&json).expect("load");
        let again = restored.to_document().to_json(true).expect("serialize");
        assert_eq!(json, again);
    }

    #[test]
    fn non_finite_position_never_reaches_json() {
        let mut workflow = Workflow::new("Canvas");
        let err = workflow
            .add_node(TriggerConfig::Request, Position::new(f64::NAN, 0.0))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPosition);

        let json = workflow.to_document().to_json(false).expect("serialize");
        assert!(!json.contains("null"));
        assert!(Workflow::from_json(&json).is_ok());

        let mut document = sample().to_document();
        document.nodes[0].position = Position::new(f64::INFINITY, 0.0);
        let err = Workflow::from_document(document).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptDocument);
        assert!(err.to_string().contains("non-finite position"));
    }

    #[test]
    fn node_config_sits_next_to_its_kind() {
        let workflow = sample();
        let value = serde_json::to_value(workflow.to_document()).expect("serialize");
        let nodes = value["nodes"].as_array().expect("nodes");
        let trigger = nodes
            .iter()
            .find(|node| node["kind"] == "trigger")
            .expect("trigger record");
        assert_eq!(trigger["config"]["type"], "mailchimp");
        assert_eq!(trigger["label"], "New subscriber");
        assert_eq!(trigger["integration_id"], "mailchimp");
    }

    fn document_with(nodes: JsonValue, edges: JsonValue) -> String {
        json!({
            "id": WorkflowId::new(),
            "name": "Broken",
            "status": "draft",
            "created_at": "2024-05-01T10:00:00Z",
            "updated_at": "2024-05-01T10:00:00Z",
            "nodes": nodes,
            "edges": edges,
        })
        .to_string()
    }

    fn trigger_record(id: NodeId) -> JsonValue {
        json!({ "id": id, "kind": "trigger", "config": { "type": "request" } })
    }

    fn condition_record(id: NodeId) -> JsonValue {
        json!({ "id": id, "kind": "condition", "config": { "expression": "{{a}}" } })
    }

    #[test]
    fn edge_into_trigger_is_corrupt() {
        let (t, c) = (NodeId::new(), NodeId::new());
        let json = document_with(
            json!([trigger_record(t), condition_record(c)]),
            json!([{ "id": workflow_designer_core::EdgeId::new(), "source": c, "target": t }]),
        );
        let err = Workflow::from_json(&json).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptDocument);
    }

    #[test]
    fn cycle_is_corrupt() {
        let (a, b) = (NodeId::new(), NodeId::new());
        let json = document_with(
            json!([condition_record(a), condition_record(b)]),
            json!([
                { "id": workflow_designer_core::EdgeId::new(), "source": a, "target": b },
                { "id": workflow_designer_core::EdgeId::new(), "source": b, "target": a },
            ]),
        );
        let err = Workflow::from_json(&json).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptDocument);
        assert!(err.to_string().contains("cycle"));
    }

    #[test]
    fn dangling_edge_is_corrupt() {
        let t = NodeId::new();
        let json = document_with(
            json!([trigger_record(t)]),
            json!([{ "id": workflow_designer_core::EdgeId::new(), "source": t, "target": NodeId::new() }]),
        );
        let err = Workflow::from_json(&json).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptDocument);
    }

    #[test]
    fn duplicate_node_id_is_corrupt() {
        let t = NodeId::new();
        let json = document_with(json!([trigger_record(t), condition_record(t)]), json!([]));
        let err = Workflow::from_json(&json).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptDocument);
    }

    #[test]
    fn config_must_match_kind() {
        let json = document_with(
            json!([{ "id": NodeId::new(), "kind": "action", "config": { "expression": "{{a}}" } }]),
            json!([]),
        );
        let err = Workflow::from_json(&json).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptDocument);
    }

    #[test]
    fn clock_running_backwards_is_corrupt() {
        let mut document = sample().to_document();
        document.updated_at = document.created_at - chrono::Duration::seconds(1);
        let err = Workflow::from_document(document).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptDocument);
    }

    #[test]
    fn incomplete_drafts_still_load() {
        let json = document_with(
            json!([{ "id": NodeId::new(), "kind": "action", "config": { "operation": "send_campaign" } }]),
            json!([]),
        );
        let workflow = Workflow::from_json(&json).expect("drafts may be incomplete");
        assert_eq!(workflow.validate().len(), 2);
    }
}
