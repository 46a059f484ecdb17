//! CLI configuration.
//!
//! Loaded via the `config` crate from environment variables prefixed with
//! `WORKFLOW_DESIGNER_` (nested keys use `__`). Command-line flags take
//! precedence where they overlap.

use serde::Deserialize;

/// Prefix shared by every configuration variable.
pub const ENV_PREFIX: &str = "WORKFLOW_DESIGNER";

/// Settings for the `workflow-designer` binary.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CliConfig {
    /// Log filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Whether documents are written as indented JSON.
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

fn default_log_filter() -> String {
    "info".to_string()
}

fn default_pretty() -> bool {
    true
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            pretty: default_pretty(),
        }
    }
}

impl CliConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_environment(environment())
    }

    fn from_environment(source: config::Environment) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
