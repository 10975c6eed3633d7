//! # a2a-client
//!
//! Client side of the Agent-to-Agent (A2A) protocol:
//!
//! - **Discovery** — resolve a remote agent's capability card from its
//!   well-known endpoint ([`resolver::AgentCardResolver`])
//! - **RPC + streaming** — unary calls and SSE subscriptions with
//!   observer-based event dispatch ([`client::A2aClient`])
//! - **Registry** — map a logical agent name to one or more client
//!   instances with round-robin selection and liveness probing
//!   ([`registry::ClientRegistry`])
//! - **Service discovery seam** — `svc://name` references resolved through
//!   an external collaborator ([`discovery::ServiceDiscovery`])
//!
//! ## Calling a remote agent
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use a2a_client::{AgentRegistration, ClientRegistry};
//! use a2a_proto::{Message, TaskSendParams};
//!
//! #[tokio::main]
//! async fn main() -> a2a_proto::A2aResult<()> {
//!     let registry = ClientRegistry::new(Vec::new());
//!     let card = registry
//!         .register(AgentRegistration::new("ReviewAgent", "http://127.0.0.1:8089/"))
//!         .await?;
//!
//!     let client = registry.get_client(&card.name).await?;
//!     let params = TaskSendParams::new("task-1", Message::user_text("review this change"))
//!         .with_metadata_entry("caller", serde_json::json!("user@example.com"));
//!     client.send_task_subscribe(params).await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod discovery;
pub mod registry;
pub mod resolver;

pub use client::{A2aClient, SseEventHandler};
pub use discovery::{ServiceDiscovery, StaticDiscovery};
pub use registry::{AgentRegistration, ClientRegistry, SERVICE_SCHEME};
pub use resolver::{AgentCardResolver, DEFAULT_AGENT_CARD_PATH};
