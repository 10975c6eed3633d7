//! Client registry: one logical agent name, N client instances.
//!
//! Registration resolves a base URL (or a `svc://name` reference through
//! the discovery collaborator) into one client per endpoint, indexed under
//! the agent-card name. Selection round-robins over the instances with an
//! atomic per-name cursor. Health checks are a signal for the caller —
//! the registry never fails over on its own.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{error, info, warn};

use a2a_proto::{A2aError, A2aResult, AgentCard, PushNotificationConfig};

use crate::client::{A2aClient, SseEventHandler};
use crate::discovery::ServiceDiscovery;
use crate::resolver::AgentCardResolver;

/// Scheme marking a base reference as a discovery service name.
pub const SERVICE_SCHEME: &str = "svc://";

/// Registration request for a remote agent.
#[derive(Debug, Clone)]
pub struct AgentRegistration {
    /// Symbolic name used while resolving (the registry indexes under the
    /// resolved card's name).
    pub name: String,

    /// Concrete base URL, or `svc://<service>` to go through discovery.
    pub base_url: String,

    /// Card path override.
    pub agent_card_path: Option<String>,

    /// Push-notification config for tasks sent through these clients.
    pub notification: Option<PushNotificationConfig>,
}

impl AgentRegistration {
    /// Registration with defaults.
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            agent_card_path: None,
            notification: None,
        }
    }

    /// Override the card path.
    pub fn with_card_path(mut self, path: impl Into<String>) -> Self {
        self.agent_card_path = Some(path.into());
        self
    }

    /// Attach a push-notification config.
    pub fn with_notification(mut self, notification: PushNotificationConfig) -> Self {
        self.notification = Some(notification);
        self
    }
}

/// The instances registered under one agent name plus their cursor.
#[derive(Debug)]
struct Pool {
    clients: Vec<Arc<A2aClient>>,
    cursor: AtomicUsize,
}

impl Pool {
    /// Round-robin pick. `fetch_add` hands every caller a distinct ticket,
    /// so concurrent callers never observe a lost update or an
    /// out-of-range index.
    fn next(&self) -> Arc<A2aClient> {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.clients.len();
        Arc::clone(&self.clients[index])
    }
}

/// Registry of A2A clients keyed by agent name.
pub struct ClientRegistry {
    discovery: Option<Arc<dyn ServiceDiscovery>>,
    handlers: Vec<Arc<dyn SseEventHandler>>,
    default_notification: Option<PushNotificationConfig>,
    pools: RwLock<HashMap<String, Arc<Pool>>>,
}

impl std::fmt::Debug for ClientRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientRegistry")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

impl ClientRegistry {
    /// Registry with no discovery backend (only concrete base URLs).
    pub fn new(handlers: Vec<Arc<dyn SseEventHandler>>) -> Self {
        Self {
            discovery: None,
            handlers,
            default_notification: None,
            pools: RwLock::new(HashMap::new()),
        }
    }

    /// Attach a discovery backend for `svc://` references.
    pub fn with_discovery(mut self, discovery: Arc<dyn ServiceDiscovery>) -> Self {
        self.discovery = Some(discovery);
        self
    }

    /// Push-notification config used when a registration carries none.
    pub fn with_default_notification(mut self, notification: PushNotificationConfig) -> Self {
        self.default_notification = Some(notification);
        self
    }

    /// Resolve a registration into one client per endpoint and index them
    /// under the resolved card's name, replacing any previous pool (cards
    /// are re-fetched only on explicit re-registration).
    pub async fn register(&self, registration: AgentRegistration) -> A2aResult<AgentCard> {
        let endpoints = self.resolve_endpoints(&registration).await?;

        let mut clients = Vec::with_capacity(endpoints.len());
        let mut card: Option<AgentCard> = None;
        for endpoint in endpoints {
            let mut resolver = AgentCardResolver::new(&registration.name, &endpoint);
            if let Some(path) = &registration.agent_card_path {
                resolver = resolver.with_card_path(path);
            }
            let resolved = match resolver.resolve().await {
                Ok(card) => card,
                Err(e) => {
                    error!(agent = %registration.name, endpoint = %endpoint, error = %e, "Agent resolve failed");
                    return Err(e);
                }
            };
            let notification = registration
                .notification
                .clone()
                .or_else(|| self.default_notification.clone());
            clients.push(Arc::new(A2aClient::new(
                resolved.clone(),
                self.handlers.clone(),
                notification,
            )?));
            card = Some(resolved);
        }

        let card = card.ok_or_else(|| {
            A2aError::discovery(format!("no endpoints for agent {}", registration.name))
        })?;

        info!(agent = %card.name, instances = clients.len(), "Agent registered");
        let pool = Arc::new(Pool {
            clients,
            cursor: AtomicUsize::new(0),
        });
        self.pools.write().await.insert(card.name.clone(), pool);
        Ok(card)
    }

    /// Round-robin a client registered under `name`.
    pub async fn get_client(&self, name: &str) -> A2aResult<Arc<A2aClient>> {
        let pool = self
            .pools
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| A2aError::NoClient(name.to_string()))?;
        Ok(pool.next())
    }

    /// Best-effort liveness probe against the next instance of `name`.
    /// The caller decides what to do with the answer; this layer never
    /// fails over automatically.
    pub async fn check_health(&self, name: &str) -> bool {
        match self.get_client(name).await {
            Ok(client) => match client.probe().await {
                Ok(_) => true,
                Err(e) => {
                    warn!(agent = %name, error = %e, "Health probe failed");
                    false
                }
            },
            Err(_) => false,
        }
    }

    /// Cards of every registered agent.
    pub async fn agent_cards(&self) -> Vec<AgentCard> {
        let pools = self.pools.read().await;
        pools
            .values()
            .filter_map(|pool| pool.clients.first())
            .map(|client| client.agent_card().clone())
            .collect()
    }

    /// Drop every instance registered under `name`.
    pub async fn deregister(&self, name: &str) -> bool {
        self.pools.write().await.remove(name).is_some()
    }

    async fn resolve_endpoints(&self, registration: &AgentRegistration) -> A2aResult<Vec<String>> {
        let Some(service) = registration.base_url.strip_prefix(SERVICE_SCHEME) else {
            return Ok(vec![registration.base_url.clone()]);
        };

        let discovery = self.discovery.as_ref().ok_or_else(|| {
            A2aError::discovery(format!(
                "registration {} uses {SERVICE_SCHEME} but no discovery backend is configured",
                registration.name
            ))
        })?;
        let instances = discovery.resolve(service).await?;
        if instances.is_empty() {
            return Err(A2aError::discovery(format!(
                "service {service} has no instances"
            )));
        }
        Ok(instances.into_iter().map(normalize_endpoint).collect())
    }
}

/// Discovery backends hand back host:port pairs; make them base URLs.
fn normalize_endpoint(endpoint: String) -> String {
    let mut url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint
    } else {
        format!("http://{endpoint}")
    };
    if !url.ends_with('/') {
        url.push('/');
    }
    url
}
