//! Agent-card discovery.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};
use url::Url;

use a2a_proto::{A2aError, A2aResult, AgentCard};

/// Default well-known path for agent cards.
pub const DEFAULT_AGENT_CARD_PATH: &str = "/.well-known/agent.json";

/// Discovery timeout.
const RESOLVE_TIMEOUT: Duration = Duration::from_secs(30);

/// Resolves an agent's capability card from its well-known endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct AgentCardResolver {
    /// Symbolic name the caller registers the agent under.
    pub name: String,

    /// Base URL of the agent.
    pub base_url: String,

    /// Path of the card document, `/.well-known/agent.json` by default.
    pub agent_card_path: String,
}

impl AgentCardResolver {
    /// Resolver for the given agent.
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            agent_card_path: DEFAULT_AGENT_CARD_PATH.to_string(),
        }
    }

    /// Override the card path.
    pub fn with_card_path(mut self, path: impl Into<String>) -> Self {
        self.agent_card_path = path.into();
        self
    }

    /// One-shot GET + decode of the agent card.
    pub async fn resolve(&self) -> A2aResult<AgentCard> {
        let base = Url::parse(&self.base_url)
            .map_err(|e| A2aError::discovery(format!("invalid base URL {}: {e}", self.base_url)))?;
        let url = base
            .join(&self.agent_card_path)
            .map_err(|e| A2aError::discovery(format!("invalid card path: {e}")))?;

        debug!(agent = %self.name, url = %url, "Resolving agent card");

        let response = reqwest::Client::new()
            .get(url.clone())
            .timeout(RESOLVE_TIMEOUT)
            .send()
            .await
            .map_err(|e| A2aError::discovery(format!("failed to fetch agent card: {e}")))?;

        if !response.status().is_success() {
            return Err(A2aError::discovery(format!(
                "agent card endpoint {url} answered {}",
                response.status()
            )));
        }

        let card: AgentCard = response
            .json()
            .await
            .map_err(|e| A2aError::discovery(format!("failed to parse agent card: {e}")))?;

        info!(
            agent = %card.name,
            version = %card.version,
            skills = card.skills.len(),
            "Agent card resolved"
        );
        Ok(card)
    }
}
