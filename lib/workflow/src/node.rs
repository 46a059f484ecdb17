//! Workflow node types and configurations.
//!
//! Nodes are the building blocks of workflows. Each node has:
//! - A unique ID within the workflow
//! - A kind (Trigger, Action or Condition)
//! - Configuration specific to its kind
//! - A canvas position and optional descriptive metadata

use crate::schema::{Schema, SchemaIssue};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use workflow_designer_core::NodeId;

/// The kind of a workflow node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Entry point of the workflow. Has outgoing edges only.
    Trigger,
    /// Performs an effect through an integration.
    Action,
    /// Branches the flow on an evaluated expression.
    Condition,
}

impl NodeKind {
    /// Returns the kind as a lowercase string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Trigger => "trigger",
            Self::Action => "action",
            Self::Condition => "condition",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canvas coordinates of a node.
///
/// Owned by the presentation layer; the model stores it untouched.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns true if both coordinates are finite numbers.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Mailchimp list events that can start a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MailchimpListEvent {
    Subscribed,
    Unsubscribed,
}

/// Configuration for trigger nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TriggerConfig {
    /// Run as a scheduled background job.
    Schedule {
        /// Cron expression (e.g., "0 7 * * *" for 7am daily).
        cron: String,
        /// Timezone for the schedule.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timezone: Option<String>,
    },
    /// Custom event sent from the host application.
    AppEvent {
        /// Name of the event to listen for.
        event_name: String,
    },
    /// Fires when a user first activates an integration.
    IntegrationEnabled {
        /// The integration being activated (e.g., "mailchimp").
        integration: String,
    },
    /// Started directly through the SDK or API.
    Request,
    /// Subscribe/unsubscribe events on a Mailchimp list.
    Mailchimp {
        /// The Mailchimp list (audience) ID.
        list_id: String,
        /// Which list events start the workflow.
        events: Vec<MailchimpListEvent>,
    },
}

/// Groups of action operations, mirroring the designer's action picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionGroup {
    Campaigns,
    Lists,
}

/// Operations an action node can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionOperation {
    CreateCampaign,
    UpdateCampaign,
    SendCampaign,
    SearchCampaigns,
    GetCampaignById,
    DeleteCampaignById,
    CreateList,
    GetListById,
    SearchLists,
    AddContactToList,
    UpdateContactInList,
    GetContactsFromList,
}

impl ActionOperation {
    /// Every operation, in picker order.
    pub const ALL: [Self; 12] = [
        Self::CreateCampaign,
        Self::UpdateCampaign,
        Self::SendCampaign,
        Self::SearchCampaigns,
        Self::GetCampaignById,
        Self::DeleteCampaignById,
        Self::CreateList,
        Self::GetListById,
        Self::SearchLists,
        Self::AddContactToList,
        Self::UpdateContactInList,
        Self::GetContactsFromList,
    ];

    /// Returns the serialized operation name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CreateCampaign => "create_campaign",
            Self::UpdateCampaign => "update_campaign",
            Self::SendCampaign => "send_campaign",
            Self::SearchCampaigns => "search_campaigns",
            Self::GetCampaignById => "get_campaign_by_id",
            Self::DeleteCampaignById => "delete_campaign_by_id",
            Self::CreateList => "create_list",
            Self::GetListById => "get_list_by_id",
            Self::SearchLists => "search_lists",
            Self::AddContactToList => "add_contact_to_list",
            Self::UpdateContactInList => "update_contact_in_list",
            Self::GetContactsFromList => "get_contacts_from_list",
        }
    }

    /// Returns the picker group this operation belongs to.
    #[must_use]
    pub const fn group(&self) -> ActionGroup {
        match self {
            Self::CreateCampaign
            | Self::UpdateCampaign
            | Self::SendCampaign
            | Self::SearchCampaigns
            | Self::GetCampaignById
            | Self::DeleteCampaignById => ActionGroup::Campaigns,
            Self::CreateList
            | Self::GetListById
            | Self::SearchLists
            | Self::AddContactToList
            | Self::UpdateContactInList
            | Self::GetContactsFromList => ActionGroup::Lists,
        }
    }

    /// Returns the fields that must be filled in for this operation.
    #[must_use]
    pub const fn required_fields(&self) -> &'static [ActionField] {
        match self {
            Self::CreateCampaign => &[ActionField::CampaignName, ActionField::Subject],
            Self::UpdateCampaign
            | Self::SendCampaign
            | Self::GetCampaignById
            | Self::DeleteCampaignById => &[ActionField::CampaignId],
            Self::CreateList => &[ActionField::ListName],
            Self::GetListById | Self::GetContactsFromList => &[ActionField::ListId],
            Self::AddContactToList | Self::UpdateContactInList => {
                &[ActionField::ListId, ActionField::ContactEmail]
            }
            Self::SearchCampaigns | Self::SearchLists => &[],
        }
    }
}

/// Named string fields of an action configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionField {
    CampaignName,
    Subject,
    CampaignId,
    ListName,
    ListId,
    ContactEmail,
}

impl ActionField {
    /// Returns the serialized field name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CampaignName => "campaign_name",
            Self::Subject => "subject",
            Self::CampaignId => "campaign_id",
            Self::ListName => "list_name",
            Self::ListId => "list_id",
            Self::ContactEmail => "contact_email",
        }
    }
}

/// Configuration for action nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionConfig {
    /// The operation to perform.
    pub operation: ActionOperation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    /// Extra operation parameters passed through to the integration.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub parameters: Map<String, JsonValue>,
}

impl ActionConfig {
    /// Creates an action with no fields filled in.
    #[must_use]
    pub fn new(operation: ActionOperation) -> Self {
        Self {
            operation,
            campaign_name: None,
            subject: None,
            campaign_id: None,
            list_name: None,
            list_id: None,
            contact_email: None,
            parameters: Map::new(),
        }
    }

    /// Sets a named field.
    #[must_use]
    pub fn with(mut self, field: ActionField, value: impl Into<String>) -> Self {
        *self.field_mut(field) = Some(value.into());
        self
    }

    /// Returns the value of a named field.
    #[must_use]
    pub fn field(&self, field: ActionField) -> Option<&str> {
        match field {
            ActionField::CampaignName => self.campaign_name.as_deref(),
            ActionField::Subject => self.subject.as_deref(),
            ActionField::CampaignId => self.campaign_id.as_deref(),
            ActionField::ListName => self.list_name.as_deref(),
            ActionField::ListId => self.list_id.as_deref(),
            ActionField::ContactEmail => self.contact_email.as_deref(),
        }
    }

    fn field_mut(&mut self, field: ActionField) -> &mut Option<String> {
        match field {
            ActionField::CampaignName => &mut self.campaign_name,
            ActionField::Subject => &mut self.subject,
            ActionField::CampaignId => &mut self.campaign_id,
            ActionField::ListName => &mut self.list_name,
            ActionField::ListId => &mut self.list_id,
            ActionField::ContactEmail => &mut self.contact_email,
        }
    }
}

/// Configuration for condition nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConditionConfig {
    /// Expression with `{{variable}}` placeholders,
    /// e.g. `{{email}}.includes('@gmail.com')`.
    pub expression: String,
}

impl ConditionConfig {
    #[must_use]
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
        }
    }
}

/// Configuration for a node, one variant per kind.
///
/// Serializes as the bare payload; the kind travels next to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NodeConfig {
    Trigger(TriggerConfig),
    Action(ActionConfig),
    Condition(ConditionConfig),
}

impl NodeConfig {
    /// Returns the kind of node this configuration belongs to.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Trigger(_) => NodeKind::Trigger,
            Self::Action(_) => NodeKind::Action,
            Self::Condition(_) => NodeKind::Condition,
        }
    }

    /// Deserializes a payload for the given kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload does not match the kind's shape.
    pub fn from_value(kind: NodeKind, value: JsonValue) -> Result<Self, serde_json::Error> {
        match kind {
            NodeKind::Trigger => serde_json::from_value(value).map(Self::Trigger),
            NodeKind::Action => serde_json::from_value(value).map(Self::Action),
            NodeKind::Condition => serde_json::from_value(value).map(Self::Condition),
        }
    }

    /// Runs the schema check registered for this configuration's kind.
    #[must_use]
    pub fn check(&self) -> Vec<SchemaIssue> {
        match self {
            Self::Trigger(config) => config.check(),
            Self::Action(config) => config.check(),
            Self::Condition(config) => config.check(),
        }
    }

    /// Merges a partial configuration over this one.
    ///
    /// Keys of `patch` replace keys of the current payload; a `null` value
    /// removes the key. The kind never changes.
    ///
    /// # Errors
    ///
    /// Returns the schema issues if the merged payload is malformed or
    /// fails the kind's schema check.
    pub fn merged(&self, patch: &Map<String, JsonValue>) -> Result<Self, Vec<SchemaIssue>> {
        let current = serde_json::to_value(self)
            .map_err(|e| vec![SchemaIssue::new("config", e.to_string())])?;
        let JsonValue::Object(mut fields) = current else {
            return Err(vec![SchemaIssue::new(
                "config",
                "configuration is not an object",
            )]);
        };

        for (key, value) in patch {
            if value.is_null() {
                fields.remove(key);
            } else {
                fields.insert(key.clone(), value.clone());
            }
        }

        let merged = Self::from_value(self.kind(), JsonValue::Object(fields))
            .map_err(|e| vec![SchemaIssue::new("config", e.to_string())])?;

        let issues = merged.check();
        if issues.is_empty() {
            Ok(merged)
        } else {
            Err(issues)
        }
    }
}

impl From<TriggerConfig> for NodeConfig {
    fn from(config: TriggerConfig) -> Self {
        Self::Trigger(config)
    }
}

impl From<ActionConfig> for NodeConfig {
    fn from(config: ActionConfig) -> Self {
        Self::Action(config)
    }
}

impl From<ConditionConfig> for NodeConfig {
    fn from(config: ConditionConfig) -> Self {
        Self::Condition(config)
    }
}

/// A workflow node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Unique identifier for this node within the workflow.
    pub id: NodeId,
    /// Node configuration (determines the kind).
    pub config: NodeConfig,
    /// Canvas position.
    pub position: Position,
    /// Human-readable label.
    pub label: Option<String>,
    /// Integration this node talks to (e.g., "mailchimp").
    pub integration_id: Option<String>,
}

impl Node {
    /// Creates a new node with a fresh ID.
    #[must_use]
    pub fn new(config: impl Into<NodeConfig>) -> Self {
        Self::with_id(NodeId::new(), config)
    }

    /// Creates a new node with a specific ID.
    #[must_use]
    pub fn with_id(id: NodeId, config: impl Into<NodeConfig>) -> Self {
        Self {
            id,
            config: config.into(),
            position: Position::default(),
            label: None,
            integration_id: None,
        }
    }

    /// Sets the position.
    #[must_use]
    pub fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Sets the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets the integration.
    #[must_use]
    pub fn with_integration(mut self, integration_id: impl Into<String>) -> Self {
        self.integration_id = Some(integration_id.into());
        self
    }

    /// Returns the kind of this node.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.config.kind()
    }

    /// Returns true for trigger nodes.
    #[must_use]
    pub fn is_trigger(&self) -> bool {
        self.kind() == NodeKind::Trigger
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn patch(value: JsonValue) -> Map<String, JsonValue> {
        match value {
            JsonValue::Object(map) => map,
            _ => panic!("patch must be an object"),
        }
    }

    #[test]
    fn node_kind_follows_config() {
        let trigger = Node::new(TriggerConfig::Request);
        let action = Node::new(ActionConfig::new(ActionOperation::SearchLists));
        let condition = Node::new(ConditionConfig::new("{{email}} != ''"));

        assert_eq!(trigger.kind(), NodeKind::Trigger);
        assert!(trigger.is_trigger());
        assert_eq!(action.kind(), NodeKind::Action);
        assert_eq!(condition.kind(), NodeKind::Condition);
    }

    #[test]
    fn trigger_config_is_tagged_by_type() {
        let config = NodeConfig::Trigger(TriggerConfig::Schedule {
            cron: "0 7 * * *".to_string(),
            timezone: None,
        });
        let value = serde_json::to_value(&config).expect("serialize");
        assert_eq!(value, json!({ "type": "schedule", "cron": "0 7 * * *" }));
    }

    #[test]
    fn from_value_rejects_payload_of_another_kind() {
        let action_payload = json!({ "operation": "create_list" });
        assert!(NodeConfig::from_value(NodeKind::Condition, action_payload.clone()).is_err());
        assert!(NodeConfig::from_value(NodeKind::Action, action_payload).is_ok());
    }

    #[test]
    fn operations_group_like_the_picker() {
        let campaigns = ActionOperation::ALL
            .iter()
            .filter(|op| op.group() == ActionGroup::Campaigns)
            .count();
        assert_eq!(campaigns, 6);
        assert_eq!(ActionOperation::ALL.len() - campaigns, 6);
    }

    #[test]
    fn merge_fills_in_action_fields() {
        let config = NodeConfig::Action(ActionConfig::new(ActionOperation::CreateCampaign));
        let merged = config
            .merged(&patch(json!({
                "campaign_name": "Spring sale",
                "subject": "20% off everything",
            })))
            .expect("merge should pass the schema");

        let NodeConfig::Action(action) = merged else {
            panic!("kind must not change");
        };
        assert_eq!(action.field(ActionField::CampaignName), Some("Spring sale"));
        assert_eq!(action.field(ActionField::Subject), Some("20% off everything"));
    }

    #[test]
    fn merge_with_null_clears_optional_field() {
        let config = NodeConfig::Trigger(TriggerConfig::Schedule {
            cron: "0 7 * * *".to_string(),
            timezone: Some("Europe/Berlin".to_string()),
        });
        let merged = config
            .merged(&patch(json!({ "timezone": null })))
            .expect("merge");
        assert_eq!(
            merged,
            NodeConfig::Trigger(TriggerConfig::Schedule {
                cron: "0 7 * * *".to_string(),
                timezone: None,
            })
        );
    }

    #[test]
    fn merge_can_switch_trigger_subtype() {
        let config = NodeConfig::Trigger(TriggerConfig::Request);
        let merged = config
            .merged(&patch(json!({ "type": "app_event", "event_name": "signup" })))
            .expect("merge");
        assert_eq!(
            merged,
            NodeConfig::Trigger(TriggerConfig::AppEvent {
                event_name: "signup".to_string()
            })
        );
    }

    #[test]
    fn merge_reports_malformed_payload() {
        let config = NodeConfig::Condition(ConditionConfig::new("{{a}}"));
        let issues = config
            .merged(&patch(json!({ "expression": 42 })))
            .unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "config");
    }

    #[test]
    fn merge_reports_schema_issues() {
        let config = NodeConfig::Action(ActionConfig::new(ActionOperation::SearchLists));
        let issues = config
            .merged(&patch(json!({ "operation": "get_list_by_id" })))
            .unwrap_err();
        assert_eq!(issues, vec![SchemaIssue::new("list_id", "required for get_list_by_id")]);
    }
}
