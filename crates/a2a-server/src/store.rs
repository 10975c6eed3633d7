//! In-memory task store with state-machine enforcement.
//!
//! The store is the single owner of task mutation invariants: writers to the
//! same task id serialize on a per-task lock, distinct task ids never contend,
//! and a write against a task in a terminal state is rejected. Reads return
//! cloned snapshots, so a reader concurrent with a writer sees either the
//! pre- or post-write task, never a partial update.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use a2a_proto::{
    A2aError, A2aResult, Artifact, PushNotificationConfig, Task, TaskSendParams, TaskStatus,
};

/// A task plus its server-side bookkeeping.
#[derive(Debug, Clone)]
struct TaskRecord {
    task: Task,
    push_config: Option<PushNotificationConfig>,
}

/// In-memory task store keyed by task id, with a session index for bulk
/// cleanup. Tasks are never dropped automatically; callers clear them via
/// [`TaskStore::clean_session`] or [`TaskStore::remove`].
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: RwLock<HashMap<String, Arc<Mutex<TaskRecord>>>>,
    sessions: Mutex<HashMap<String, Vec<String>>>,
}

impl TaskStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    async fn entry(&self, id: &str) -> Option<Arc<Mutex<TaskRecord>>> {
        self.tasks.read().await.get(id).cloned()
    }

    /// Snapshot of a task.
    pub async fn get(&self, id: &str) -> Option<Task> {
        let entry = self.entry(id).await?;
        let record = entry.lock().await;
        Some(record.task.clone())
    }

    /// Snapshot with history truncated to the requested length.
    pub async fn get_with_history(&self, id: &str, history_length: Option<u32>) -> Option<Task> {
        let task = self.get(id).await?;
        Some(task.with_history_length(history_length))
    }

    /// Create the task for `params` if its id is unseen. Returns `None` when
    /// a task with this id already exists — the caller decides whether that
    /// is a duplicate submit or a continuation.
    pub async fn try_create(&self, params: &TaskSendParams) -> Option<Task> {
        let task = {
            let mut tasks = self.tasks.write().await;
            if tasks.contains_key(&params.id) {
                return None;
            }
            let mut task = Task::submitted(&params.id, &params.session_id);
            task.push_history(params.message.clone());
            task.metadata = params.metadata.clone();
            let record = TaskRecord {
                task: task.clone(),
                push_config: params.push_notification.clone(),
            };
            tasks.insert(params.id.clone(), Arc::new(Mutex::new(record)));
            task
        };
        debug!(task_id = %params.id, session_id = %params.session_id, "Task created");
        self.index_session(params).await;
        Some(task)
    }

    /// Create the task if absent, otherwise append the message to the
    /// existing task's history and return the updated snapshot. Appending to
    /// a terminal task is rejected.
    pub async fn upsert(&self, params: &TaskSendParams) -> A2aResult<Task> {
        if let Some(task) = self.try_create(params).await {
            return Ok(task);
        }
        let entry = self
            .entry(&params.id)
            .await
            .ok_or_else(|| A2aError::task_not_found(&params.id))?;
        let mut record = entry.lock().await;
        if record.task.is_terminal() {
            return Err(A2aError::invalid_task_state(
                &params.id,
                format!("task is terminal ({})", record.task.status.state),
            ));
        }
        record.task.push_history(params.message.clone());
        if params.push_notification.is_some() {
            record.push_config = params.push_notification.clone();
        }
        Ok(record.task.clone())
    }

    /// Apply a status transition and append artifacts, returning the updated
    /// snapshot. Rejects writes against terminal tasks and transitions that
    /// are not a legal path through the state machine.
    pub async fn update_status(
        &self,
        id: &str,
        status: TaskStatus,
        artifacts: Option<Vec<Artifact>>,
    ) -> A2aResult<Task> {
        let entry = self
            .entry(id)
            .await
            .ok_or_else(|| A2aError::task_not_found(id))?;
        let mut record = entry.lock().await;
        let current = record.task.status.state;
        if current.is_terminal() {
            return Err(A2aError::invalid_task_state(
                id,
                format!("task is terminal ({current})"),
            ));
        }
        if !current.can_transition_to(status.state) {
            return Err(A2aError::invalid_task_state(
                id,
                format!("illegal transition {current} -> {}", status.state),
            ));
        }
        if let Some(message) = &status.message {
            record.task.push_history(message.clone());
        }
        record.task.status = status;
        if let Some(artifacts) = artifacts {
            record.task.merge_artifacts(artifacts);
        }
        debug!(task_id = %id, state = %record.task.status.state, "Task status updated");
        Ok(record.task.clone())
    }

    /// Append artifacts without touching the state. Terminal tasks reject
    /// the write.
    pub async fn append_artifacts(&self, id: &str, artifacts: Vec<Artifact>) -> A2aResult<Task> {
        let entry = self
            .entry(id)
            .await
            .ok_or_else(|| A2aError::task_not_found(id))?;
        let mut record = entry.lock().await;
        if record.task.is_terminal() {
            return Err(A2aError::invalid_task_state(
                id,
                format!("task is terminal ({})", record.task.status.state),
            ));
        }
        record.task.merge_artifacts(artifacts);
        Ok(record.task.clone())
    }

    /// Store a push-notification config for a task.
    pub async fn set_push_config(
        &self,
        id: &str,
        config: PushNotificationConfig,
    ) -> A2aResult<()> {
        let entry = self
            .entry(id)
            .await
            .ok_or_else(|| A2aError::task_not_found(id))?;
        entry.lock().await.push_config = Some(config);
        Ok(())
    }

    /// The push-notification config for a task, if any.
    pub async fn get_push_config(&self, id: &str) -> A2aResult<Option<PushNotificationConfig>> {
        let entry = self
            .entry(id)
            .await
            .ok_or_else(|| A2aError::task_not_found(id))?;
        let record = entry.lock().await;
        Ok(record.push_config.clone())
    }

    /// The most recently created task of a session.
    pub async fn last_task_for_session(&self, session_id: &str) -> Option<Task> {
        let last_id = {
            let sessions = self.sessions.lock().await;
            sessions.get(session_id)?.last()?.clone()
        };
        self.get(&last_id).await
    }

    /// Drop every task belonging to a session, returning the removed ids.
    pub async fn clean_session(&self, session_id: &str) -> Vec<String> {
        let ids = {
            let mut sessions = self.sessions.lock().await;
            sessions.remove(session_id).unwrap_or_default()
        };
        if ids.is_empty() {
            return ids;
        }
        {
            let mut tasks = self.tasks.write().await;
            for id in &ids {
                tasks.remove(id);
            }
        }
        debug!(session_id = %session_id, count = ids.len(), "Session tasks cleared");
        ids
    }

    /// Drop a single task.
    pub async fn remove(&self, id: &str) {
        self.tasks.write().await.remove(id);
    }

    async fn index_session(&self, params: &TaskSendParams) {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(params.session_id.clone())
            .or_default()
            .push(params.id.clone());
    }
}
