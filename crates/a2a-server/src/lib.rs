//! # a2a-server
//!
//! Server-side engine for the Agent-to-Agent (A2A) protocol:
//!
//! - **Task store** — in-memory records with state-machine enforcement
//!   ([`store::TaskStore`])
//! - **Event queue** — per-task multicast streaming with resubscription
//!   ([`queue::EventQueue`])
//! - **Task manager** — request validation, task lifecycle, executor
//!   dispatch, push fan-out ([`manager::TaskManager`])
//! - **Push-notification auth** — EdDSA-signed webhooks with JWKS-based
//!   verification ([`auth`])
//! - **HTTP binding** — JSON-RPC + SSE over axum ([`http::A2aServer`])
//!
//! The execution engine that produces task output is a collaborator behind
//! the [`manager::AgentExecutor`] trait; this crate only drives it.
//!
//! ## Wiring a server
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use a2a_proto::{AgentCard, Artifact, Message, TaskSendParams};
//! use a2a_server::{A2aServer, AgentExecutor, ResumeKind, TaskManager, TaskUpdater};
//!
//! struct Echo;
//!
//! #[async_trait::async_trait]
//! impl AgentExecutor for Echo {
//!     async fn start(&self, updater: TaskUpdater, params: TaskSendParams) -> a2a_proto::A2aResult<()> {
//!         updater.working(None).await?;
//!         updater.artifact(Artifact::text(params.message.text_content())).await?;
//!         updater.completed(Some(Message::agent_text("done"))).await?;
//!         Ok(())
//!     }
//!
//!     async fn resume(&self, updater: TaskUpdater, _kind: Option<ResumeKind>, params: TaskSendParams) -> a2a_proto::A2aResult<()> {
//!         self.start(updater, params).await
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> a2a_proto::A2aResult<()> {
//!     let card = AgentCard::new("echo-agent", "http://127.0.0.1:8089/", "0.5.0").with_streaming();
//!     let manager = Arc::new(TaskManager::new(card, Arc::new(Echo)));
//!     A2aServer::new(manager).serve("127.0.0.1:8089").await
//! }
//! ```

pub mod auth;
pub mod http;
pub mod manager;
pub mod push;
pub mod queue;
pub mod store;

pub use auth::{
    PushNotificationReceiverAuth, PushNotificationSenderAuth, AUTH_HEADER, AUTH_HEADER_PREFIX,
};
pub use http::{A2aServer, AGENT_CARD_PATH, JWKS_PATH};
pub use manager::{
    AgentExecutor, ResumeKind, TaskManager, TaskUpdater, CALLER_METADATA_KEY, METHOD_METADATA_KEY,
};
pub use push::PushNotifier;
pub use queue::{EventQueue, EventStream};
pub use store::TaskStore;
