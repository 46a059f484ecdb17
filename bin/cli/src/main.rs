mod cli;
mod commands;
mod config;
mod error;

use clap::Parser;
use cli::Cli;
use commands::{Options, Outcome};
use config::CliConfig;
use error::CliError;
use std::io;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use workflow_designer_core::Result;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(Outcome::Success) => ExitCode::SUCCESS,
        Ok(Outcome::Rejected) => ExitCode::from(1),
        Err(error) => {
            eprintln!("Error: {}", error.current_context());
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<Outcome, CliError> {
    let config = CliConfig::from_env().map_err(|e| CliError::Config {
        details: e.to_string(),
    })?;

    let log_filter = cli.log_filter.as_deref().unwrap_or(&config.log_filter);
    init_tracing(log_filter);
    tracing::debug!(?config, "loaded configuration");

    let options = Options {
        pretty: config.pretty && !cli.compact,
    };
    let mut stdout = io::stdout().lock();
    commands::run(cli.command, options, &mut stdout)
}

/// Logs go to stderr so stdout stays free for documents and reports.
fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}
