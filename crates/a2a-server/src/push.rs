//! Webhook delivery of task updates.
//!
//! Delivery is best-effort: a failure is logged and swallowed, never
//! propagated into the task's own event path.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error};

use a2a_proto::{A2aError, A2aResult, PushNotificationConfig, Task};

use crate::auth::{PushNotificationSenderAuth, AUTH_HEADER};

/// Header echoing the caller-supplied notification token.
const NOTIFICATION_TOKEN_HEADER: &str = "x-a2a-notification-token";

/// Delivery timeout per webhook POST.
const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// POSTs signed task snapshots to configured webhooks.
#[derive(Debug, Clone)]
pub struct PushNotifier {
    http: reqwest::Client,
    auth: Arc<PushNotificationSenderAuth>,
}

impl PushNotifier {
    /// Notifier signing with the given sender identity.
    pub fn new(auth: Arc<PushNotificationSenderAuth>) -> Self {
        Self {
            http: reqwest::Client::new(),
            auth,
        }
    }

    /// Deliver a task snapshot to its webhook. Errors are logged, not
    /// returned — notification delivery must never fail the task.
    pub async fn notify(&self, task: Task, config: PushNotificationConfig) {
        let task_id = task.id.clone();
        match self.deliver(task, &config).await {
            Ok(()) => debug!(task_id = %task_id, url = %config.url, "Push notification delivered"),
            Err(e) => {
                error!(task_id = %task_id, url = %config.url, error = %e, "Push notification delivery failed")
            }
        }
    }

    async fn deliver(&self, mut task: Task, config: &PushNotificationConfig) -> A2aResult<()> {
        // Receivers get the snapshot without conversation history.
        task.history = None;

        let body = serde_json::to_vec(&task)?;
        let bearer = self.auth.bearer(&body)?;

        let mut request = self
            .http
            .post(&config.url)
            .timeout(DELIVERY_TIMEOUT)
            .header(AUTH_HEADER, bearer)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body);
        if let Some(token) = &config.token {
            request = request.header(NOTIFICATION_TOKEN_HEADER, token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| A2aError::transport(e.to_string()))?;
        response
            .error_for_status()
            .map_err(|e| A2aError::transport(e.to_string()))?;
        Ok(())
    }
}
