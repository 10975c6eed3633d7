//! Agent Card — the published capability descriptor for an agent.
//!
//! Served at `/.well-known/agent.json` and immutable once resolved; a
//! client re-fetches it only on explicit re-registration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Capability and identity descriptor for an A2A agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgentCard {
    /// Human-readable agent name; also the registry key.
    pub name: String,

    /// Description of what the agent does.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Base URL where the agent's RPC endpoint lives.
    pub url: String,

    /// Provider information.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<AgentProvider>,

    /// Agent version string.
    pub version: String,

    /// Link to human-readable documentation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation_url: Option<String>,

    /// Protocol capabilities.
    #[serde(default)]
    pub capabilities: AgentCapabilities,

    /// Accepted authentication schemes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication: Option<AgentAuthentication>,

    /// Input modalities accepted when a skill does not override them.
    #[serde(default)]
    pub default_input_modes: Vec<String>,

    /// Output modalities produced when a skill does not override them.
    #[serde(default)]
    pub default_output_modes: Vec<String>,

    /// Skills the agent advertises.
    #[serde(default)]
    pub skills: Vec<AgentSkill>,
}

impl AgentCard {
    /// Card with required fields and text-only default modes.
    pub fn new(name: impl Into<String>, url: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            url: url.into(),
            provider: None,
            version: version.into(),
            documentation_url: None,
            capabilities: AgentCapabilities::default(),
            authentication: None,
            default_input_modes: vec!["text".to_string()],
            default_output_modes: vec!["text".to_string()],
            skills: Vec::new(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Advertise streaming support.
    pub fn with_streaming(mut self) -> Self {
        self.capabilities.streaming = true;
        self
    }

    /// Advertise push-notification support.
    pub fn with_push_notifications(mut self) -> Self {
        self.capabilities.push_notifications = true;
        self
    }

    /// Add a skill.
    pub fn with_skill(mut self, skill: AgentSkill) -> Self {
        self.skills.push(skill);
        self
    }

    /// Set the default output modes.
    pub fn with_default_output_modes(mut self, modes: Vec<String>) -> Self {
        self.default_output_modes = modes;
        self
    }
}

/// Information about the organization operating the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgentProvider {
    /// Organization name.
    pub organization: String,

    /// Organization URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Protocol-level capabilities of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgentCapabilities {
    /// Supports `tasks/sendSubscribe` / `tasks/resubscribe`.
    #[serde(default)]
    pub streaming: bool,

    /// Supports webhook push notifications.
    #[serde(default)]
    pub push_notifications: bool,

    /// Reports full state-transition history on task snapshots.
    #[serde(default)]
    pub state_transition_history: bool,
}

/// Authentication schemes the agent accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgentAuthentication {
    /// Scheme names (e.g. "bearer").
    pub schemes: Vec<String>,

    /// Optional static credentials hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<String>,
}

/// A skill advertised on an agent card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgentSkill {
    /// Skill identifier.
    pub id: String,

    /// Human-readable name.
    pub name: String,

    /// What the skill does.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Tags for categorization.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,

    /// Example prompts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub examples: Option<Vec<String>>,

    /// Input modes overriding the card defaults.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_modes: Option<Vec<String>>,

    /// Output modes overriding the card defaults.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_modes: Option<Vec<String>>,
}

impl AgentSkill {
    /// Skill with the given id and name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            tags: None,
            examples: None,
            input_modes: None,
            output_modes: None,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_round_trip() {
        let card = AgentCard::new("review-agent", "http://127.0.0.1:8089/", "1.0.0")
            .with_description("Reviews code changes")
            .with_streaming()
            .with_push_notifications()
            .with_skill(AgentSkill::new("review", "Code Review"));

        let json = serde_json::to_string(&card).unwrap();
        let parsed: AgentCard = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, card);
        assert!(parsed.capabilities.streaming);
        assert!(parsed.capabilities.push_notifications);
    }

    #[test]
    fn capabilities_default_to_false() {
        let parsed: AgentCard = serde_json::from_value(serde_json::json!({
            "name": "x", "url": "http://localhost/", "version": "0.1"
        }))
        .unwrap();
        assert!(!parsed.capabilities.streaming);
        assert!(parsed.skills.is_empty());
    }
}
