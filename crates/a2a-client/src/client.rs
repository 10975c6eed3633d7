//! RPC and streaming client for one remote A2A agent.
//!
//! Unary calls are request/response pairs correlated by the JSON-RPC id.
//! Streaming calls open an SSE connection whose frames are decoded as
//! `Response<UpdateEvent>` and fanned out to every registered
//! [`SseEventHandler`]; connection failures mid-stream go to the handlers'
//! `on_error`, never into caller code.

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use a2a_proto::{
    methods, A2aError, A2aResult, AgentCard, PushNotificationConfig, Request, Response, Task,
    TaskIdParams, TaskPushNotificationConfig, TaskQueryParams, TaskSendParams, UpdateEvent,
};

use crate::resolver::AgentCardResolver;

/// Timeout for unary RPC calls.
const RPC_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for opening a streaming connection (the stream itself is
/// unbounded once established).
const STREAM_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

type FrameStream = Pin<Box<dyn Stream<Item = A2aResult<Response<UpdateEvent>>> + Send>>;

/// Observer of a client's streaming responses.
///
/// Handlers are shared across every stream the client opens; each event is
/// dispatched to all of them (multicast local dispatch).
#[async_trait]
pub trait SseEventHandler: Send + Sync + 'static {
    /// A decoded streaming frame arrived.
    async fn on_event(&self, agent: &AgentCard, frame: &Response<UpdateEvent>);

    /// The stream failed at the connection level.
    async fn on_error(&self, agent: &AgentCard, error: &A2aError);
}

/// Client for a single remote A2A agent.
#[derive(Clone)]
pub struct A2aClient {
    card: Arc<AgentCard>,
    rpc_url: Url,
    http: reqwest::Client,
    handlers: Arc<Vec<Arc<dyn SseEventHandler>>>,
    push_config: Option<PushNotificationConfig>,
}

impl std::fmt::Debug for A2aClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("A2aClient")
            .field("agent", &self.card.name)
            .field("rpc_url", &self.rpc_url.as_str())
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

impl A2aClient {
    /// Client for a resolved agent card.
    ///
    /// `push_config` is attached to outgoing sends when the card advertises
    /// push-notification support.
    pub fn new(
        card: AgentCard,
        handlers: Vec<Arc<dyn SseEventHandler>>,
        push_config: Option<PushNotificationConfig>,
    ) -> A2aResult<Self> {
        let rpc_url = Url::parse(&card.url)?;
        Ok(Self {
            card: Arc::new(card),
            rpc_url,
            http: reqwest::Client::new(),
            handlers: Arc::new(handlers),
            push_config,
        })
    }

    /// The card this client was built from.
    pub fn agent_card(&self) -> &AgentCard {
        &self.card
    }

    /// Liveness probe: re-fetch the agent card document.
    pub async fn probe(&self) -> A2aResult<AgentCard> {
        AgentCardResolver::new(&self.card.name, &self.card.url)
            .resolve()
            .await
    }

    // ── Unary operations ─────────────────────────────────────

    /// `tasks/send`.
    pub async fn send_task(&self, params: TaskSendParams) -> A2aResult<Task> {
        let params = self.attach_push_config(params);
        self.send_rpc(methods::SEND_TASK, params).await
    }

    /// `tasks/get`.
    pub async fn get_task(&self, params: TaskQueryParams) -> A2aResult<Task> {
        self.send_rpc(methods::GET_TASK, params).await
    }

    /// `tasks/cancel`.
    pub async fn cancel_task(&self, task_id: impl Into<String>) -> A2aResult<Task> {
        self.send_rpc(methods::CANCEL_TASK, TaskIdParams::new(task_id))
            .await
    }

    /// `tasks/pushNotification/set`.
    pub async fn set_push_notification(
        &self,
        config: TaskPushNotificationConfig,
    ) -> A2aResult<TaskPushNotificationConfig> {
        self.send_rpc(methods::SET_PUSH_NOTIFICATION, config).await
    }

    /// `tasks/pushNotification/get`.
    pub async fn get_push_notification(
        &self,
        task_id: impl Into<String>,
    ) -> A2aResult<TaskPushNotificationConfig> {
        self.send_rpc(methods::GET_PUSH_NOTIFICATION, TaskIdParams::new(task_id))
            .await
    }

    // ── Streaming operations ─────────────────────────────────

    /// `tasks/sendSubscribe` — open the stream and dispatch every frame to
    /// the registered handlers on a spawned worker.
    ///
    /// Returns once the connection is established (or was rejected with an
    /// RPC error); everything after that flows through the handlers.
    pub async fn send_task_subscribe(
        &self,
        params: TaskSendParams,
    ) -> A2aResult<tokio::task::JoinHandle<()>> {
        let params = self.attach_push_config(params);
        let request = Request::new(methods::SEND_TASK_SUBSCRIBE, params);
        let frames = self.open_stream(&request).await?;
        let client = self.clone();
        Ok(tokio::spawn(async move {
            client.dispatch_frames(frames).await;
        }))
    }

    /// `tasks/resubscribe` — re-attach to a running task's stream.
    pub async fn resubscribe_task(
        &self,
        params: TaskIdParams,
    ) -> A2aResult<tokio::task::JoinHandle<()>> {
        let request = Request::new(methods::RESUBSCRIBE_TASK, params);
        let frames = self.open_stream(&request).await?;
        let client = self.clone();
        Ok(tokio::spawn(async move {
            client.dispatch_frames(frames).await;
        }))
    }

    /// Synchronous convenience layered on the streaming primitive: send,
    /// consume events until the final one, then return the task snapshot.
    pub async fn send_task_and_wait(
        &self,
        params: TaskSendParams,
        timeout: Duration,
    ) -> A2aResult<Task> {
        let task_id = params.id.clone();
        let params = self.attach_push_config(params);
        let request = Request::new(methods::SEND_TASK_SUBSCRIBE, params);
        let mut frames = self.open_stream(&request).await?;

        let drain = async {
            while let Some(frame) = frames.next().await {
                let frame = frame?;
                if let Some(error) = frame.error {
                    return Err(A2aError::Rpc(error));
                }
                if frame.result.as_ref().is_some_and(UpdateEvent::is_final) {
                    return Ok(());
                }
            }
            Err(A2aError::streaming("stream ended before a final event"))
        };

        tokio::time::timeout(timeout, drain)
            .await
            .map_err(|_| A2aError::streaming(format!("no final event within {timeout:?}")))??;

        self.get_task(TaskQueryParams::new(task_id)).await
    }

    // ── Internal transport ───────────────────────────────────

    fn attach_push_config(&self, mut params: TaskSendParams) -> TaskSendParams {
        if params.push_notification.is_none() && self.card.capabilities.push_notifications {
            params.push_notification = self.push_config.clone();
        }
        params
    }

    async fn send_rpc<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> A2aResult<R> {
        let request = Request::new(method, params);
        debug!(agent = %self.card.name, method = %method, rpc_id = %request.id, "Sending RPC");

        let response = self
            .http
            .post(self.rpc_url.clone())
            .timeout(RPC_TIMEOUT)
            .json(&request)
            .send()
            .await
            .map_err(|e| A2aError::transport(format!("{method} request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(A2aError::transport(format!(
                "{method} answered HTTP {status}"
            )));
        }

        let rpc: Response<R> = response
            .json()
            .await
            .map_err(|e| A2aError::transport(format!("failed to decode {method} response: {e}")))?;
        rpc.into_result().map_err(A2aError::Rpc)
    }

    /// Open a streaming connection for a request. A JSON (non-SSE) body is
    /// a synchronous rejection and surfaces as the carried RPC error.
    async fn open_stream<P: Serialize>(&self, request: &Request<P>) -> A2aResult<FrameStream> {
        let response = self
            .http
            .post(self.rpc_url.clone())
            .timeout(STREAM_CONNECT_TIMEOUT)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(request)
            .send()
            .await
            .map_err(|e| A2aError::streaming(format!("failed to open stream: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(A2aError::streaming(format!(
                "stream request answered HTTP {status}"
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        if !content_type.starts_with("text/event-stream") {
            // The server rejected the subscription with a plain RPC body.
            let rpc: Response<UpdateEvent> = response.json().await.map_err(|e| {
                A2aError::streaming(format!("failed to decode stream rejection: {e}"))
            })?;
            return match rpc.into_result() {
                Ok(_) => Err(A2aError::streaming(
                    "expected an event stream, got a unary result",
                )),
                Err(error) => Err(A2aError::Rpc(error)),
            };
        }

        let frames = response
            .bytes_stream()
            .eventsource()
            .map(|item| match item {
                Ok(event) => serde_json::from_str::<Response<UpdateEvent>>(&event.data)
                    .map_err(|e| A2aError::streaming(format!("malformed stream frame: {e}"))),
                Err(e) => Err(A2aError::streaming(format!("stream read error: {e}"))),
            });
        Ok(Box::pin(frames))
    }

    /// Pump frames into the handlers until the stream ends.
    async fn dispatch_frames(&self, mut frames: FrameStream) {
        while let Some(item) = frames.next().await {
            match item {
                Ok(frame) => {
                    let done = frame.error.is_some()
                        || frame.result.as_ref().is_some_and(UpdateEvent::is_final);
                    for handler in self.handlers.iter() {
                        handler.on_event(&self.card, &frame).await;
                    }
                    if done {
                        debug!(agent = %self.card.name, "Stream finished");
                        return;
                    }
                }
                Err(error) => {
                    warn!(agent = %self.card.name, error = %error, "Stream failed");
                    for handler in self.handlers.iter() {
                        handler.on_error(&self.card, &error).await;
                    }
                    return;
                }
            }
        }
    }
}
