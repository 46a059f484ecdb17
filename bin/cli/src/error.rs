//! Error types for the command-line tool.

use std::fmt;
use std::path::PathBuf;
use workflow_designer_workflow::WorkflowError;

/// Errors surfaced by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// Configuration could not be loaded.
    Config { details: String },
    /// A document file could not be read.
    Read { path: PathBuf, details: String },
    /// A document file could not be written.
    Write { path: PathBuf, details: String },
    /// A document could not be loaded or updated.
    Workflow { path: PathBuf, source: WorkflowError },
    /// A document could not be rendered as JSON.
    Render { details: String },
    /// Command output could not be written.
    Output { details: String },
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { details } => write!(f, "invalid configuration: {details}"),
            Self::Read { path, details } => {
                write!(f, "cannot read '{}': {details}", path.display())
            }
            Self::Write { path, details } => {
                write!(f, "cannot write '{}': {details}", path.display())
            }
            Self::Workflow { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Render { details } => write!(f, "cannot render document: {details}"),
            Self::Output { details } => write!(f, "cannot write output: {details}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Workflow { source, .. } => Some(source),
            _ => None,
        }
    }
}
