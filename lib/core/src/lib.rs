//! Core identifiers and error handling for the workflow designer.
//!
//! This crate provides the foundational types shared by the workflow graph
//! model and the command-line front end.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{EdgeId, NodeId, ParseIdError, WorkflowId};
