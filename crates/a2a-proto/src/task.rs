//! Task — the stateful unit of delegated work in the A2A protocol.
//!
//! A Task is created by the first `tasks/send` (or `tasks/sendSubscribe`)
//! carrying its id and is mutated in place from then on. Its lifecycle is a
//! closed state machine:
//!
//! ```text
//! SUBMITTED → WORKING ⇄ INPUT_REQUIRED / ACTION_REQUIRED
//!                     → COMPLETED (terminal)
//!                     → CANCELED (terminal)
//!                     → FAILED (terminal)
//!             UNKNOWN (terminal catch-all)
//! ```

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::artifact::Artifact;
use crate::message::Message;
use crate::notification::PushNotificationConfig;

/// A Task — the fundamental unit of work delegated between agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Caller-assigned unique identifier.
    pub id: String,

    /// Groups tasks belonging to the same logical conversation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// Current status (state + optional agent message + timestamp).
    pub status: TaskStatus,

    /// Artifacts produced so far, ordered by arrival.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<Vec<Artifact>>,

    /// Messages exchanged during the task, oldest first.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<Message>>,

    /// Optional metadata attached to the task.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl Task {
    /// Create a freshly submitted task.
    pub fn submitted(id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            session_id: Some(session_id.into()),
            status: TaskStatus::new(TaskState::Submitted),
            artifacts: None,
            history: None,
            metadata: None,
        }
    }

    /// Check if the task has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.state.is_terminal()
    }

    /// Append a message to the task history.
    pub fn push_history(&mut self, message: Message) {
        self.history.get_or_insert_with(Vec::new).push(message);
    }

    /// Append artifacts, honoring each artifact's `index`/`append` chunking
    /// contract: an `append` chunk is concatenated onto the artifact already
    /// occupying its index slot, anything else replaces or extends the list.
    pub fn merge_artifacts(&mut self, incoming: Vec<Artifact>) {
        let artifacts = self.artifacts.get_or_insert_with(Vec::new);
        for artifact in incoming {
            if artifact.append.unwrap_or(false) {
                if let Some(existing) = artifacts.iter_mut().find(|a| a.index == artifact.index) {
                    existing.parts.extend(artifact.parts);
                    existing.last_chunk = artifact.last_chunk;
                    continue;
                }
            }
            match artifacts.iter_mut().find(|a| a.index == artifact.index) {
                Some(existing) => *existing = artifact,
                None => artifacts.push(artifact),
            }
        }
    }

    /// Copy of this task with history truncated to the `length` most recent
    /// messages. `None` leaves history untouched.
    pub fn with_history_length(&self, length: Option<u32>) -> Task {
        let mut snapshot = self.clone();
        if let (Some(length), Some(history)) = (length, snapshot.history.as_mut()) {
            let keep = length as usize;
            if history.len() > keep {
                history.drain(..history.len() - keep);
            }
        }
        snapshot
    }
}

/// Status of a task: its state plus an optional message from the agent
/// explaining it (progress text, required input prompt, failure diagnostic).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatus {
    /// Current lifecycle state.
    pub state: TaskState,

    /// Optional message accompanying the state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,

    /// When this status was produced.
    pub timestamp: DateTime<Utc>,
}

impl TaskStatus {
    /// Status with the given state and the current time.
    pub fn new(state: TaskState) -> Self {
        Self {
            state,
            message: None,
            timestamp: Utc::now(),
        }
    }

    /// Attach a message to the status.
    pub fn with_message(mut self, message: Message) -> Self {
        self.message = Some(message);
        self
    }
}

/// The lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum TaskState {
    /// Accepted, execution not started yet.
    Submitted,

    /// Actively being worked on.
    Working,

    /// Paused — the caller must supply more input.
    InputRequired,

    /// Paused — the caller must perform an out-of-band action.
    ActionRequired,

    /// Finished successfully (terminal).
    Completed,

    /// Canceled by the caller (terminal).
    Canceled,

    /// Failed during execution (terminal).
    Failed,

    /// Catch-all terminal state.
    Unknown,
}

impl TaskState {
    /// Terminal states admit no further transition or task mutation.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Canceled | TaskState::Failed | TaskState::Unknown
        )
    }

    /// Paused states waiting on the caller.
    pub fn is_paused(self) -> bool {
        matches!(self, TaskState::InputRequired | TaskState::ActionRequired)
    }

    /// Whether a transition from `self` to `next` is a legal path through
    /// the state machine. Repeated writes of the same non-terminal state
    /// are allowed (progress updates carry the same state).
    pub fn can_transition_to(self, next: TaskState) -> bool {
        use TaskState::*;
        if self == next {
            return !self.is_terminal();
        }
        match self {
            Submitted => matches!(next, Working | Canceled | Failed | Unknown),
            Working => matches!(
                next,
                InputRequired | ActionRequired | Completed | Canceled | Failed | Unknown
            ),
            InputRequired | ActionRequired => matches!(next, Working | Canceled | Failed | Unknown),
            Completed | Canceled | Failed | Unknown => false,
        }
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskState::Submitted => "submitted",
            TaskState::Working => "working",
            TaskState::InputRequired => "input-required",
            TaskState::ActionRequired => "action-required",
            TaskState::Completed => "completed",
            TaskState::Canceled => "canceled",
            TaskState::Failed => "failed",
            TaskState::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// Parameters of `tasks/send` and `tasks/sendSubscribe`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskSendParams {
    /// Caller-assigned task id.
    pub id: String,

    /// Conversation the task belongs to; generated when the caller omits it.
    #[serde(default = "crate::uuid4_hex")]
    pub session_id: String,

    /// The message carrying the task input.
    pub message: Message,

    /// Output modalities the caller accepts (e.g. "text", "file", "data").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted_output_modes: Option<Vec<String>>,

    /// Webhook for out-of-band delivery of task updates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_notification: Option<PushNotificationConfig>,

    /// How much history the caller wants back on snapshots.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_length: Option<u32>,

    /// Optional metadata (carries the caller identity and the resume
    /// `method` tag on continuation sends).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl TaskSendParams {
    /// Params for a new task with a generated session id.
    pub fn new(id: impl Into<String>, message: Message) -> Self {
        Self {
            id: id.into(),
            session_id: crate::uuid4_hex(),
            message,
            accepted_output_modes: None,
            push_notification: None,
            history_length: None,
            metadata: None,
        }
    }

    /// Set the session id.
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    /// Set the accepted output modes.
    pub fn with_accepted_output_modes(mut self, modes: Vec<String>) -> Self {
        self.accepted_output_modes = Some(modes);
        self
    }

    /// Attach a push-notification config.
    pub fn with_push_notification(mut self, config: PushNotificationConfig) -> Self {
        self.push_notification = Some(config);
        self
    }

    /// Merge a metadata key into the params.
    pub fn with_metadata_entry(mut self, key: &str, value: serde_json::Value) -> Self {
        let metadata = self
            .metadata
            .get_or_insert_with(|| serde_json::Value::Object(Default::default()));
        if let Some(map) = metadata.as_object_mut() {
            map.insert(key.to_string(), value);
        }
        self
    }

    /// Look up a string entry in the params metadata.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.as_ref()?.get(key)?.as_str()
    }
}

/// Parameters identifying a task by id (`tasks/cancel`, `tasks/resubscribe`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskIdParams {
    /// The task id.
    pub id: String,

    /// Optional metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl TaskIdParams {
    /// Params for the given task id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            metadata: None,
        }
    }
}

/// Parameters of `tasks/get`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskQueryParams {
    /// The task id.
    pub id: String,

    /// Truncate returned history to the most recent N messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_length: Option<u32>,

    /// Optional metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl TaskQueryParams {
    /// Query for the given task id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            history_length: None,
            metadata: None,
        }
    }
}

/// Parameters of `tasks/pushNotification/set` and the result of both
/// push-notification operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskPushNotificationConfig {
    /// The task id the config applies to.
    pub id: String,

    /// The webhook configuration.
    pub push_notification_config: PushNotificationConfig,
}
