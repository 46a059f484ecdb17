//! Command implementations.
//!
//! Each command reads and writes documents on disk and prints its report to
//! the given writer. A command that ran but found the workflow unacceptable
//! returns [`Outcome::Rejected`] rather than an error.

use crate::cli::Command;
use crate::error::CliError;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info, warn};
use workflow_designer_core::Result;
use workflow_designer_workflow::{ErrorKind, Violation, Workflow};

/// How a command finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// The workflow failed validation.
    Rejected,
}

/// Options shared by every command.
#[derive(Debug, Clone, Copy)]
pub struct Options {
    pub pretty: bool,
}

/// Runs a parsed command.
pub fn run(command: Command, options: Options, out: &mut dyn Write) -> Result<Outcome, CliError> {
    match command {
        Command::New { name, output } => new_workflow(&name, output.as_deref(), options, out),
        Command::Validate { file } => validate(&file, out),
        Command::Publish { file, output } => {
            let target = output.unwrap_or_else(|| file.clone());
            publish(&file, &target, options, out)
        }
        Command::Summary { file } => summary(&file, out),
    }
}

/// Writes a new draft workflow to `output`, or prints it.
pub fn new_workflow(
    name: &str,
    output: Option<&Path>,
    options: Options,
    out: &mut dyn Write,
) -> Result<Outcome, CliError> {
    let workflow = Workflow::new(name);
    info!(workflow_id = %workflow.id(), name, "created workflow");

    match output {
        Some(path) => save(&workflow, path, options)?,
        None => {
            let json = render(&workflow, options)?;
            emit(out, format_args!("{json}"))?;
        }
    }
    Ok(Outcome::Success)
}

/// Lists the violations of the workflow in `file`.
pub fn validate(file: &Path, out: &mut dyn Write) -> Result<Outcome, CliError> {
    let workflow = load(file)?;
    let violations = workflow.validate();

    if violations.is_empty() {
        emit(out, format_args!("{} is valid", workflow.name()))?;
        return Ok(Outcome::Success);
    }

    print_violations(out, &violations)?;
    Ok(Outcome::Rejected)
}

/// Publishes the workflow in `file` and writes it to `target`.
///
/// Nothing is written when validation fails.
pub fn publish(
    file: &Path,
    target: &Path,
    options: Options,
    out: &mut dyn Write,
) -> Result<Outcome, CliError> {
    let mut workflow = load(file)?;

    if let Err(source) = workflow.publish() {
        if source.kind() != ErrorKind::ValidationFailed {
            return Err(CliError::Workflow {
                path: file.to_path_buf(),
                source,
            }
            .into());
        }
        warn!(path = %file.display(), "workflow not published");
        print_violations(out, source.violations())?;
        return Ok(Outcome::Rejected);
    }

    save(&workflow, target, options)?;
    emit(
        out,
        format_args!("published {} to {}", workflow.name(), target.display()),
    )?;
    Ok(Outcome::Success)
}

/// Prints an overview of the workflow in `file`.
pub fn summary(file: &Path, out: &mut dyn Write) -> Result<Outcome, CliError> {
    let summary = load(file)?.summary();
    emit(out, format_args!("name:    {}", summary.name))?;
    emit(out, format_args!("id:      {}", summary.id))?;
    emit(out, format_args!("status:  {}", summary.status))?;
    emit(out, format_args!("nodes:   {}", summary.node_count))?;
    emit(out, format_args!("edges:   {}", summary.edge_count))?;
    emit(out, format_args!("updated: {}", summary.updated_at.to_rfc3339()))?;
    Ok(Outcome::Success)
}

fn load(path: &Path) -> Result<Workflow, CliError> {
    let json = fs::read_to_string(path).map_err(|e| CliError::Read {
        path: path.to_path_buf(),
        details: e.to_string(),
    })?;
    let workflow = Workflow::from_json(&json).map_err(|source| CliError::Workflow {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), workflow_id = %workflow.id(), "loaded workflow");
    Ok(workflow)
}

fn save(workflow: &Workflow, path: &Path, options: Options) -> Result<(), CliError> {
    let mut json = render(workflow, options)?;
    json.push('\n');
    fs::write(path, json).map_err(|e| CliError::Write {
        path: path.to_path_buf(),
        details: e.to_string(),
    })?;
    debug!(path = %path.display(), workflow_id = %workflow.id(), "saved workflow");
    Ok(())
}

fn render(workflow: &Workflow, options: Options) -> Result<String, CliError> {
    Ok(workflow
        .to_document()
        .to_json(options.pretty)
        .map_err(|e| CliError::Render {
            details: e.to_string(),
        })?)
}

fn print_violations(out: &mut dyn Write, violations: &[Violation]) -> Result<(), CliError> {
    for violation in violations {
        emit(out, format_args!("{}: {violation}", violation.code()))?;
    }
    Ok(())
}

fn emit(out: &mut dyn Write, line: std::fmt::Arguments<'_>) -> Result<(), CliError> {
    Ok(writeln!(out, "{line}").map_err(|e| CliError::Output {
        details: e.to_string(),
    })?)
}
