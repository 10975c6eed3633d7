//! # a2a-proto
//!
//! Wire types for the Agent-to-Agent (A2A) protocol: tasks and their state
//! machine, messages and parts, artifacts, update events, agent cards,
//! push-notification configs, and the JSON-RPC 2.0 envelope everything
//! travels in.
//!
//! This crate is pure schema + invariants — no I/O. The server engine lives
//! in `a2a-server`, the client/registry in `a2a-client`.
//!
//! ## Quick look
//!
//! ```rust
//! use a2a_proto::{Message, TaskSendParams, TaskState};
//!
//! let params = TaskSendParams::new("task-1", Message::user_text("summarize this"));
//! assert_eq!(params.session_id.len(), 32);
//! assert!(!TaskState::Working.is_terminal());
//! ```

pub mod agent_card;
pub mod artifact;
pub mod error;
pub mod event;
pub mod jsonrpc;
pub mod message;
pub mod notification;
pub mod task;

pub use agent_card::{
    AgentAuthentication, AgentCapabilities, AgentCard, AgentProvider, AgentSkill,
};
pub use artifact::Artifact;
pub use error::{A2aError, A2aResult};
pub use event::{TaskArtifactUpdateEvent, TaskStatusUpdateEvent, UpdateEvent};
pub use jsonrpc::{methods, JsonRpcError, Request, Response, JSONRPC_VERSION};
pub use message::{FileContent, Message, Part, Role};
pub use notification::{AuthenticationInfo, PushNotificationConfig};
pub use task::{
    Task, TaskIdParams, TaskPushNotificationConfig, TaskQueryParams, TaskSendParams, TaskState,
    TaskStatus,
};

/// A 32-character lowercase hex token (uuid4 without hyphens), used for
/// JSON-RPC request ids and default session ids.
pub fn uuid4_hex() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Whether the modalities a caller accepts can be served.
///
/// An empty or missing list on either side means "no constraint". Otherwise
/// the server must support every mode the caller requested.
pub fn are_modalities_compatible(
    server_output_modes: Option<&[String]>,
    client_output_modes: Option<&[String]>,
) -> bool {
    let server = match server_output_modes {
        Some(modes) if !modes.is_empty() => modes,
        _ => return true,
    };
    let client = match client_output_modes {
        Some(modes) if !modes.is_empty() => modes,
        _ => return true,
    };
    client.iter().all(|mode| server.contains(mode))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modes(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn uuid4_hex_shape() {
        let id = uuid4_hex();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, uuid4_hex());
    }

    #[test]
    fn modality_compatibility() {
        let server = modes(&["text", "data", "file"]);

        assert!(are_modalities_compatible(Some(&server), None));
        assert!(are_modalities_compatible(None, Some(&modes(&["video"]))));
        assert!(are_modalities_compatible(Some(&server), Some(&modes(&[]))));
        assert!(are_modalities_compatible(
            Some(&server),
            Some(&modes(&["text", "data"]))
        ));
        assert!(!are_modalities_compatible(
            Some(&server),
            Some(&modes(&["text", "video"]))
        ));
    }
}
