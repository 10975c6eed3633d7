//! Update events streamed to subscribers while a task executes.
//!
//! The wire discriminator `_type` (`status` / `artifact`) is handled by the
//! serialization layer; consumers match on the enum.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::artifact::Artifact;
use crate::task::TaskStatus;

/// An event emitted during task execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "_type")]
pub enum UpdateEvent {
    /// The task's status changed.
    #[serde(rename = "status")]
    Status(TaskStatusUpdateEvent),

    /// The task produced (a chunk of) an artifact.
    #[serde(rename = "artifact")]
    Artifact(TaskArtifactUpdateEvent),
}

impl UpdateEvent {
    /// The task the event belongs to.
    pub fn task_id(&self) -> &str {
        match self {
            UpdateEvent::Status(e) => &e.id,
            UpdateEvent::Artifact(e) => &e.id,
        }
    }

    /// True for a status event that terminates the stream.
    pub fn is_final(&self) -> bool {
        matches!(self, UpdateEvent::Status(e) if e.is_final)
    }
}

/// A task status change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusUpdateEvent {
    /// Task id.
    pub id: String,

    /// The new status.
    pub status: TaskStatus,

    /// No further events will follow for this task.
    #[serde(rename = "final", default)]
    pub is_final: bool,

    /// Optional metadata (request/session correlation entries).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl TaskStatusUpdateEvent {
    /// Event for the given task and status.
    pub fn new(id: impl Into<String>, status: TaskStatus, is_final: bool) -> Self {
        Self {
            id: id.into(),
            status,
            is_final,
            metadata: None,
        }
    }
}

/// An artifact (chunk) produced by a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskArtifactUpdateEvent {
    /// Task id.
    pub id: String,

    /// The artifact payload.
    pub artifact: Artifact,

    /// Optional metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl TaskArtifactUpdateEvent {
    /// Event for the given task and artifact.
    pub fn new(id: impl Into<String>, artifact: Artifact) -> Self {
        Self {
            id: id.into(),
            artifact,
            metadata: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{TaskState, TaskStatus};

    #[test]
    fn event_discriminators() {
        let status = UpdateEvent::Status(TaskStatusUpdateEvent::new(
            "t1",
            TaskStatus::new(TaskState::Working),
            false,
        ));
        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"_type\":\"status\""));
        assert!(json.contains("\"final\":false"));

        let artifact = UpdateEvent::Artifact(TaskArtifactUpdateEvent::new(
            "t1",
            Artifact::text("chunk"),
        ));
        let json = serde_json::to_string(&artifact).unwrap();
        assert!(json.contains("\"_type\":\"artifact\""));

        let parsed: UpdateEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, artifact);
        assert_eq!(parsed.task_id(), "t1");
    }

    #[test]
    fn final_flag() {
        let event = UpdateEvent::Status(TaskStatusUpdateEvent::new(
            "t1",
            TaskStatus::new(TaskState::Completed),
            true,
        ));
        assert!(event.is_final());

        let event = UpdateEvent::Artifact(TaskArtifactUpdateEvent::new(
            "t1",
            Artifact::text("x"),
        ));
        assert!(!event.is_final());
    }
}
