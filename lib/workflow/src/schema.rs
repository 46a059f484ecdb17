//! Type-specific schema checks for node configurations.
//!
//! The shape of a configuration is enforced by its Rust type; the checks
//! here cover what the type cannot express (non-blank strings, cron field
//! counts, fields an action operation depends on, placeholder syntax).

use crate::node::{ActionConfig, ActionField, ConditionConfig, MailchimpListEvent, TriggerConfig};
use serde::Serialize;
use std::fmt;

/// One schema problem found in a node configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaIssue {
    /// The offending configuration field.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl SchemaIssue {
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// A configuration that can check itself against its kind's schema.
pub trait Schema {
    /// Returns every issue found; empty means the configuration conforms.
    fn check(&self) -> Vec<SchemaIssue>;
}

const CRON_FIELDS: usize = 5;

fn require_text(issues: &mut Vec<SchemaIssue>, field: &str, value: &str) {
    if value.trim().is_empty() {
        issues.push(SchemaIssue::new(field, "must not be blank"));
    }
}

impl Schema for TriggerConfig {
    fn check(&self) -> Vec<SchemaIssue> {
        let mut issues = Vec::new();
        match self {
            Self::Schedule { cron, timezone } => {
                let fields = cron.split_whitespace().count();
                if fields != CRON_FIELDS {
                    issues.push(SchemaIssue::new(
                        "cron",
                        format!("expected {CRON_FIELDS} space-separated fields, found {fields}"),
                    ));
                }
                if let Some(timezone) = timezone {
                    require_text(&mut issues, "timezone", timezone);
                }
            }
            Self::AppEvent { event_name } => require_text(&mut issues, "event_name", event_name),
            Self::IntegrationEnabled { integration } => {
                require_text(&mut issues, "integration", integration);
            }
            Self::Request => {}
            Self::Mailchimp { list_id, events } => {
                require_text(&mut issues, "list_id", list_id);
                if events.is_empty() {
                    issues.push(SchemaIssue::new("events", "at least one event is required"));
                }
                for event in [MailchimpListEvent::Subscribed, MailchimpListEvent::Unsubscribed] {
                    if events.iter().filter(|e| **e == event).count() > 1 {
                        issues.push(SchemaIssue::new(
                            "events",
                            format!("duplicate event {event:?}"),
                        ));
                    }
                }
            }
        }
        issues
    }
}

const ACTION_FIELDS: [ActionField; 6] = [
    ActionField::CampaignName,
    ActionField::Subject,
    ActionField::CampaignId,
    ActionField::ListName,
    ActionField::ListId,
    ActionField::ContactEmail,
];

impl Schema for ActionConfig {
    fn check(&self) -> Vec<SchemaIssue> {
        let mut issues = Vec::new();

        for field in ACTION_FIELDS {
            if let Some(value) = self.field(field) {
                require_text(&mut issues, field.as_str(), value);
            }
        }

        for field in self.operation.required_fields() {
            if self.field(*field).is_none() {
                issues.push(SchemaIssue::new(
                    field.as_str(),
                    format!("required for {}", self.operation.as_str()),
                ));
            }
        }

        if let Some(email) = self.field(ActionField::ContactEmail) {
            if !email.trim().is_empty() && !email.contains('@') {
                issues.push(SchemaIssue::new(
                    ActionField::ContactEmail.as_str(),
                    "must be an email address",
                ));
            }
        }

        issues
    }
}

impl Schema for ConditionConfig {
    fn check(&self) -> Vec<SchemaIssue> {
        let mut issues = Vec::new();
        require_text(&mut issues, "expression", &self.expression);
        if let Some(problem) = placeholder_problem(&self.expression) {
            issues.push(SchemaIssue::new("expression", problem));
        }
        issues
    }
}

/// Scans `{{variable}}` placeholders and reports the first malformed one.
fn placeholder_problem(expression: &str) -> Option<&'static str> {
    let mut rest = expression;
    loop {
        match (rest.find("{{"), rest.find("}}")) {
            (None, None) => return None,
            (None, Some(_)) => return Some("unmatched '}}'"),
            (Some(open), Some(close)) if close < open => return Some("unmatched '}}'"),
            (Some(open), _) => {
                let after = &rest[open + 2..];
                let Some(end) = after.find("}}") else {
                    return Some("unterminated '{{' placeholder");
                };
                let name = &after[..end];
                if name.contains("{{") {
                    return Some("nested '{{' inside placeholder");
                }
                if name.trim().is_empty() {
                    return Some("empty placeholder");
                }
                rest = &after[end + 2..];
            }
        }
    }
}
