//! Server-side task manager.
//!
//! Drives a task from acceptance to completion: validates incoming
//! requests, creates or resumes tasks in the store, hands execution to the
//! [`AgentExecutor`] collaborator, and fans every status/artifact write out
//! through the event queue and (for terminal states) the push notifier.
//!
//! Accepting a task and running it are decoupled: the RPC call returns once
//! the task is accepted, execution continues on a spawned worker, and
//! failures inside the engine surface as a terminal FAILED event on the
//! stream — never as an RPC error, which has already been answered.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use a2a_proto::{
    are_modalities_compatible, A2aError, A2aResult, AgentCard, Artifact, Message, Task,
    TaskArtifactUpdateEvent, TaskIdParams, TaskPushNotificationConfig, TaskQueryParams,
    TaskSendParams, TaskState, TaskStatus, TaskStatusUpdateEvent, UpdateEvent,
};

use crate::auth::PushNotificationSenderAuth;
use crate::push::PushNotifier;
use crate::queue::{EventQueue, EventStream};
use crate::store::TaskStore;

/// Metadata key carrying the caller identity on subscribe requests.
pub const CALLER_METADATA_KEY: &str = "caller";

/// Metadata key carrying the resume dispatch tag on continuation sends.
pub const METHOD_METADATA_KEY: &str = "method";

/// How a continuation send resumes a paused task, derived from the
/// out-of-band `method` metadata tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeKind {
    /// Free-text reply from the human caller.
    UserInput,
    /// Results of a tool call executed on the caller's side.
    ToolResult,
    /// Human confirmation of a proposed action.
    Confirmation,
    /// Replay from an earlier checkpoint.
    Replay,
}

impl ResumeKind {
    /// Map a metadata tag to its resume kind.
    pub fn from_method(tag: &str) -> Option<Self> {
        match tag {
            "user_input" => Some(Self::UserInput),
            "tool_call" => Some(Self::ToolResult),
            "confirm" => Some(Self::Confirmation),
            "replay" => Some(Self::Replay),
            _ => None,
        }
    }

    /// The wire tag for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UserInput => "user_input",
            Self::ToolResult => "tool_call",
            Self::Confirmation => "confirm",
            Self::Replay => "replay",
        }
    }
}

/// The external execution engine that actually produces task output.
///
/// The manager only defines the seam: `start` runs a fresh task, `resume`
/// continues a paused one. Both report progress through the given
/// [`TaskUpdater`]; returning an error marks the task FAILED. Cancellation
/// is cooperative — the engine observes the CANCELED state via the store,
/// it is not forcibly interrupted.
#[async_trait]
pub trait AgentExecutor: Send + Sync + 'static {
    /// Run a freshly submitted task.
    async fn start(&self, updater: TaskUpdater, params: TaskSendParams) -> A2aResult<()>;

    /// Continue a paused or running task. `kind` is `None` when the
    /// continuation carried no recognized `method` tag, in which case the
    /// engine should treat the message as a fresh run over the task.
    async fn resume(
        &self,
        updater: TaskUpdater,
        kind: Option<ResumeKind>,
        params: TaskSendParams,
    ) -> A2aResult<()>;
}

struct ManagerInner {
    card: AgentCard,
    store: TaskStore,
    queue: EventQueue,
    notifier: Option<PushNotifier>,
    sender_auth: Option<Arc<PushNotificationSenderAuth>>,
}

impl ManagerInner {
    /// Apply a status write: store first, then push notification for
    /// terminal states, then the stream event.
    async fn write_status(
        &self,
        task_id: &str,
        status: TaskStatus,
        is_final: bool,
    ) -> A2aResult<Task> {
        let task = self
            .store
            .update_status(task_id, status.clone(), None)
            .await?;

        if task.is_terminal() {
            self.dispatch_push(&task).await;
        }

        let mut event = TaskStatusUpdateEvent::new(task_id, status, is_final);
        event.metadata = Some(correlation(&task));
        self.queue
            .enqueue(task_id, UpdateEvent::Status(event))
            .await;
        Ok(task)
    }

    /// Apply an artifact write: store, then the stream event.
    async fn write_artifact(&self, task_id: &str, artifact: Artifact) -> A2aResult<Task> {
        let task = self
            .store
            .append_artifacts(task_id, vec![artifact.clone()])
            .await?;

        let mut event = TaskArtifactUpdateEvent::new(task_id, artifact);
        event.metadata = Some(correlation(&task));
        self.queue
            .enqueue(task_id, UpdateEvent::Artifact(event))
            .await;
        Ok(task)
    }

    /// Fire the webhook for a terminal snapshot, off the event path.
    async fn dispatch_push(&self, task: &Task) {
        let Some(notifier) = &self.notifier else {
            return;
        };
        match self.store.get_push_config(&task.id).await {
            Ok(Some(config)) => {
                let notifier = notifier.clone();
                let task = task.clone();
                tokio::spawn(async move {
                    notifier.notify(task, config).await;
                });
            }
            Ok(None) => {}
            Err(e) => warn!(task_id = %task.id, error = %e, "Push config lookup failed"),
        }
    }
}

fn correlation(task: &Task) -> serde_json::Value {
    serde_json::json!({
        "requestId": task.id,
        "sessionId": task.session_id,
    })
}

/// Handle through which the execution engine reports task progress.
///
/// Every write flows through the store (which enforces the state machine)
/// before anything is streamed, so subscribers only ever observe legal
/// transitions.
#[derive(Clone)]
pub struct TaskUpdater {
    inner: Arc<ManagerInner>,
    task_id: String,
}

impl TaskUpdater {
    /// The task this updater writes to.
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Mark the task WORKING, optionally with a progress message.
    pub async fn working(&self, message: Option<Message>) -> A2aResult<Task> {
        let mut status = TaskStatus::new(TaskState::Working);
        status.message = message;
        self.inner.write_status(&self.task_id, status, false).await
    }

    /// Pause the task waiting for caller input. Closes the current stream;
    /// the caller resumes with a continuation send.
    pub async fn input_required(&self, message: Message) -> A2aResult<Task> {
        let status = TaskStatus::new(TaskState::InputRequired).with_message(message);
        self.inner.write_status(&self.task_id, status, true).await
    }

    /// Pause the task waiting for an out-of-band caller action.
    pub async fn action_required(&self, message: Message) -> A2aResult<Task> {
        let status = TaskStatus::new(TaskState::ActionRequired).with_message(message);
        self.inner.write_status(&self.task_id, status, true).await
    }

    /// Finish the task successfully.
    pub async fn completed(&self, message: Option<Message>) -> A2aResult<Task> {
        let mut status = TaskStatus::new(TaskState::Completed);
        status.message = message;
        self.inner.write_status(&self.task_id, status, true).await
    }

    /// Fail the task with a diagnostic message.
    pub async fn failed(&self, message: Message) -> A2aResult<Task> {
        let status = TaskStatus::new(TaskState::Failed).with_message(message);
        self.inner.write_status(&self.task_id, status, true).await
    }

    /// Emit an artifact (chunk).
    pub async fn artifact(&self, artifact: Artifact) -> A2aResult<Task> {
        self.inner.write_artifact(&self.task_id, artifact).await
    }

    /// Escape hatch for custom status writes.
    pub async fn status(&self, status: TaskStatus, is_final: bool) -> A2aResult<Task> {
        self.inner.write_status(&self.task_id, status, is_final).await
    }
}

/// Server-side orchestrator for the A2A task RPC surface.
pub struct TaskManager {
    inner: Arc<ManagerInner>,
    executor: Arc<dyn AgentExecutor>,
}

impl TaskManager {
    /// Manager for the given card and execution engine, without push
    /// notification support.
    pub fn new(card: AgentCard, executor: Arc<dyn AgentExecutor>) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                card,
                store: TaskStore::new(),
                queue: EventQueue::new(),
                notifier: None,
                sender_auth: None,
            }),
            executor,
        }
    }

    /// Manager with webhook push notifications signed by `auth`.
    pub fn with_push_auth(
        card: AgentCard,
        executor: Arc<dyn AgentExecutor>,
        auth: Arc<PushNotificationSenderAuth>,
    ) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                card,
                store: TaskStore::new(),
                queue: EventQueue::new(),
                notifier: Some(PushNotifier::new(Arc::clone(&auth))),
                sender_auth: Some(auth),
            }),
            executor,
        }
    }

    /// The card this server advertises.
    pub fn agent_card(&self) -> &AgentCard {
        &self.inner.card
    }

    /// The JWKS document for push-notification verification, when signing
    /// is configured.
    pub fn jwks(&self) -> Option<serde_json::Value> {
        self.inner.sender_auth.as_ref().map(|auth| auth.jwks())
    }

    /// `tasks/send` — this server is streaming-first and does not implement
    /// the synchronous variant.
    pub async fn on_send_task(&self, params: TaskSendParams) -> A2aResult<Task> {
        let _ = params;
        Err(A2aError::UnsupportedOperation(
            "tasks/send is not supported, use tasks/sendSubscribe".into(),
        ))
    }

    /// `tasks/sendSubscribe` — accept a new task (or a continuation of an
    /// existing one) and open an event stream for it. The returned stream
    /// observes everything enqueued after this call; the engine runs on a
    /// spawned worker.
    pub async fn on_send_task_subscribe(&self, params: TaskSendParams) -> A2aResult<EventStream> {
        let caller = params.metadata_str(CALLER_METADATA_KEY).unwrap_or_default();
        if caller.is_empty() {
            return Err(A2aError::AuthenticationRequired(format!(
                "missing '{CALLER_METADATA_KEY}' identity in request metadata"
            )));
        }
        self.validate_send(&params)?;

        info!(task_id = %params.id, session_id = %params.session_id, "Send-subscribe accepted");

        if let Some(task) = self.inner.store.try_create(&params).await {
            // Subscribe before the SUBMITTED event so the caller sees it.
            let stream = self.inner.queue.subscribe(&task.id, false).await;
            let mut event =
                TaskStatusUpdateEvent::new(&task.id, TaskStatus::new(TaskState::Submitted), false);
            event.metadata = Some(correlation(&task));
            self.inner
                .queue
                .enqueue(&task.id, UpdateEvent::Status(event))
                .await;

            self.spawn_start(params);
            return Ok(stream);
        }

        let task = self
            .inner
            .store
            .get(&params.id)
            .await
            .ok_or_else(|| A2aError::internal("task vanished during send"))?;

        match task.status.state {
            TaskState::Submitted => Err(A2aError::invalid_task_state(
                &params.id,
                "task is already submitted",
            )),
            state if state.is_terminal() => Err(A2aError::invalid_task_state(
                &params.id,
                format!("task is terminal ({state})"),
            )),
            _ => {
                self.inner.store.upsert(&params).await?;
                let stream = self.inner.queue.subscribe(&params.id, false).await;

                let kind = params
                    .metadata_str(METHOD_METADATA_KEY)
                    .or_else(|| params.message.metadata_str(METHOD_METADATA_KEY))
                    .and_then(ResumeKind::from_method);
                self.spawn_resume(kind, params);
                Ok(stream)
            }
        }
    }

    /// `tasks/resubscribe` — re-attach a reader to a running task's feed.
    /// Events already delivered before this point are not replayed.
    pub async fn on_resubscribe_task(&self, params: TaskIdParams) -> A2aResult<EventStream> {
        if self.inner.store.get(&params.id).await.is_none() {
            return Err(A2aError::internal(format!(
                "cannot resubscribe to unknown task {}",
                params.id
            )));
        }
        Ok(self.inner.queue.subscribe(&params.id, true).await)
    }

    /// `tasks/get` — snapshot of a task, history truncated on request.
    pub async fn on_get_task(&self, params: TaskQueryParams) -> A2aResult<Task> {
        self.inner
            .store
            .get_with_history(&params.id, params.history_length)
            .await
            .ok_or_else(|| A2aError::task_not_found(&params.id))
    }

    /// `tasks/cancel` — transition an active task to CANCELED and emit the
    /// terminal event. The engine is not interrupted; it observes the
    /// cancellation through its next status write failing.
    pub async fn on_cancel_task(&self, params: TaskIdParams) -> A2aResult<Task> {
        let task = self
            .inner
            .store
            .get(&params.id)
            .await
            .ok_or_else(|| A2aError::task_not_found(&params.id))?;
        if task.is_terminal() {
            return Err(A2aError::TaskNotCancelable {
                task_id: params.id,
                state: task.status.state,
            });
        }
        info!(task_id = %params.id, "Task canceled");
        self.inner
            .write_status(&params.id, TaskStatus::new(TaskState::Canceled), true)
            .await
    }

    /// `tasks/pushNotification/set` — attach a webhook config to a task.
    pub async fn on_set_push_notification(
        &self,
        params: TaskPushNotificationConfig,
    ) -> A2aResult<TaskPushNotificationConfig> {
        if !self.inner.card.capabilities.push_notifications {
            return Err(A2aError::PushNotificationNotSupported);
        }
        if params.push_notification_config.url.trim().is_empty() {
            return Err(A2aError::invalid_params("push notification URL is missing"));
        }
        self.inner
            .store
            .set_push_config(&params.id, params.push_notification_config.clone())
            .await?;
        Ok(params)
    }

    /// `tasks/pushNotification/get` — the webhook config attached to a task.
    pub async fn on_get_push_notification(
        &self,
        params: TaskIdParams,
    ) -> A2aResult<TaskPushNotificationConfig> {
        let config = self
            .inner
            .store
            .get_push_config(&params.id)
            .await?
            .ok_or_else(|| {
                A2aError::invalid_params(format!("task {} has no push notification config", params.id))
            })?;
        Ok(TaskPushNotificationConfig {
            id: params.id,
            push_notification_config: config,
        })
    }

    /// The most recently created task of a session.
    pub async fn last_task_for_session(&self, session_id: &str) -> Option<Task> {
        self.inner.store.last_task_for_session(session_id).await
    }

    /// Drop every task belonging to a session, together with their event
    /// channels. Tasks are never dropped automatically — this is the
    /// explicit cleanup entry point.
    pub async fn clean_session(&self, session_id: &str) {
        for task_id in self.inner.store.clean_session(session_id).await {
            self.inner.queue.close(&task_id).await;
        }
    }

    fn validate_send(&self, params: &TaskSendParams) -> A2aResult<()> {
        if params.id.trim().is_empty() {
            return Err(A2aError::invalid_params("task id is missing"));
        }
        let supported = &self.inner.card.default_output_modes;
        if !are_modalities_compatible(
            Some(supported.as_slice()),
            params.accepted_output_modes.as_deref(),
        ) {
            warn!(
                requested = ?params.accepted_output_modes,
                supported = ?supported,
                "Unsupported output modes"
            );
            return Err(A2aError::IncompatibleContentTypes(format!(
                "requested {:?}, supported {supported:?}",
                params.accepted_output_modes
            )));
        }
        if let Some(push) = &params.push_notification {
            if push.url.trim().is_empty() {
                return Err(A2aError::invalid_params("push notification URL is missing"));
            }
        }
        Ok(())
    }

    fn updater(&self, task_id: &str) -> TaskUpdater {
        TaskUpdater {
            inner: Arc::clone(&self.inner),
            task_id: task_id.to_string(),
        }
    }

    fn spawn_start(&self, params: TaskSendParams) {
        let updater = self.updater(&params.id);
        let executor = Arc::clone(&self.executor);
        tokio::spawn(async move {
            let task_id = params.id.clone();
            if let Err(e) = executor.start(updater.clone(), params).await {
                error!(task_id = %task_id, error = %e, "Executor failed");
                let _ = updater.failed(Message::agent_text(e.to_string())).await;
            }
        });
    }

    fn spawn_resume(&self, kind: Option<ResumeKind>, params: TaskSendParams) {
        let updater = self.updater(&params.id);
        let executor = Arc::clone(&self.executor);
        tokio::spawn(async move {
            let task_id = params.id.clone();
            if let Err(e) = executor.resume(updater.clone(), kind, params).await {
                error!(task_id = %task_id, error = %e, "Executor resume failed");
                let _ = updater.failed(Message::agent_text(e.to_string())).await;
            }
        });
    }
}
