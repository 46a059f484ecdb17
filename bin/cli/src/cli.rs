use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Create, check and publish workflow designer documents.
#[derive(Debug, Parser)]
#[command(name = "workflow-designer")]
#[command(version)]
pub struct Cli {
    /// Log filter, overriding WORKFLOW_DESIGNER_LOG_FILTER.
    #[arg(long, global = true)]
    pub log_filter: Option<String>,

    /// Write documents as single-line JSON.
    #[arg(long, global = true)]
    pub compact: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Write a new, empty draft workflow.
    New {
        /// Workflow name.
        name: String,
        /// Output file (defaults to stdout).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check a workflow document and list its violations.
    Validate {
        /// Workflow document.
        file: PathBuf,
    },
    /// Publish a workflow if it passes validation.
    Publish {
        /// Workflow document.
        file: PathBuf,
        /// Output file (defaults to overwriting the input).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print name, status and size of a workflow.
    Summary {
        /// Workflow document.
        file: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::try_parse_from([
            "workflow-designer",
            "publish",
            "flow.json",
            "-o",
            "out.json",
            "--compact",
        ])
        .expect("parse");
        assert!(cli.compact);
        match cli.command {
            Command::Publish { file, output } => {
                assert_eq!(file, PathBuf::from("flow.json"));
                assert_eq!(output, Some(PathBuf::from("out.json")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
