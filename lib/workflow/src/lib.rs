//! Workflow graph model for the workflow designer.
//!
//! This crate holds the editable model behind the visual designer:
//!
//! - **Graph Model**: Directed graphs using petgraph with typed nodes and edges
//! - **Node Types**: Trigger, Action and Condition, each with a checked configuration
//! - **Invariants**: Edges never enter triggers and action/condition nodes never form cycles
//! - **Lifecycle**: Draft, Published and Archived workflows with validation on publish
//! - **Documents**: A canonical JSON form that is re-checked on load
//! - **Store**: In-memory storage with optimistic concurrency

pub mod definition;
pub mod document;
pub mod edge;
pub mod error;
pub mod graph;
pub mod node;
pub mod schema;
pub mod store;
pub mod validation;

pub use definition::{Workflow, WorkflowStatus, WorkflowSummary};
pub use document::{NodeRecord, WorkflowDocument};
pub use edge::{BranchOutcome, Edge};
pub use error::{ErrorKind, GraphError, StoreError, WorkflowError};
pub use graph::WorkflowGraph;
pub use node::{
    ActionConfig, ActionField, ActionGroup, ActionOperation, ConditionConfig, MailchimpListEvent,
    Node, NodeConfig, NodeKind, Position, TriggerConfig,
};
pub use schema::{Schema, SchemaIssue};
pub use store::{Versioned, WorkflowStore};
pub use validation::{EntityRef, Violation, validate};
pub use workflow_designer_core::{EdgeId, NodeId, WorkflowId};
