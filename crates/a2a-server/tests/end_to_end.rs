//! Full wire round trip: an A2A server on a real socket, driven by the
//! A2A client through discovery, streaming, resubscription, and cancel.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use a2a_client::{A2aClient, AgentRegistration, ClientRegistry, SseEventHandler};
use a2a_proto::{
    A2aError, A2aResult, AgentCard, Artifact, Message, Response, TaskQueryParams, TaskSendParams,
    TaskState, UpdateEvent,
};
use a2a_server::{A2aServer, AgentExecutor, ResumeKind, TaskManager, TaskUpdater};

/// Echoes the input back as an artifact and completes.
struct EchoExecutor;

#[async_trait]
impl AgentExecutor for EchoExecutor {
    async fn start(&self, updater: TaskUpdater, params: TaskSendParams) -> A2aResult<()> {
        updater.working(None).await?;
        updater
            .artifact(Artifact::text(params.message.text_content()).final_chunk())
            .await?;
        updater
            .completed(Some(Message::agent_text("echoed")))
            .await?;
        Ok(())
    }

    async fn resume(
        &self,
        updater: TaskUpdater,
        _kind: Option<ResumeKind>,
        _params: TaskSendParams,
    ) -> A2aResult<()> {
        updater.working(None).await?;
        updater.completed(None).await?;
        Ok(())
    }
}

#[derive(Default)]
struct Collector {
    events: Mutex<Vec<Response<UpdateEvent>>>,
    errors: Mutex<Vec<String>>,
}

#[async_trait]
impl SseEventHandler for Collector {
    async fn on_event(&self, _agent: &AgentCard, frame: &Response<UpdateEvent>) {
        self.events.lock().await.push(frame.clone());
    }

    async fn on_error(&self, _agent: &AgentCard, error: &A2aError) {
        self.errors.lock().await.push(error.to_string());
    }
}

/// Bind an echo server on an ephemeral port, serve it in the background,
/// and return its base URL.
async fn spawn_echo_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{addr}/");

    let card = AgentCard::new("echo-agent", &base_url, "0.5.0")
        .with_streaming()
        .with_default_output_modes(vec!["text".into(), "data".into(), "file".into()]);
    let manager = Arc::new(TaskManager::new(card, Arc::new(EchoExecutor)));
    let router = A2aServer::new(manager).router();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    base_url
}

fn send_params(task_id: &str, text: &str) -> TaskSendParams {
    TaskSendParams::new(task_id, Message::user_text(text))
        .with_metadata_entry("caller", serde_json::json!("tester@example.com"))
}

#[tokio::test]
async fn discover_subscribe_and_stream_to_completion() {
    let base_url = spawn_echo_server().await;

    let collector = Arc::new(Collector::default());
    let handlers: Vec<Arc<dyn SseEventHandler>> = vec![Arc::clone(&collector) as _];
    let registry = ClientRegistry::new(handlers);

    let card = registry
        .register(AgentRegistration::new("echo-agent", base_url))
        .await
        .unwrap();
    assert!(card.capabilities.streaming);

    let client = registry.get_client("echo-agent").await.unwrap();
    let worker = client
        .send_task_subscribe(send_params("t1", "hello"))
        .await
        .unwrap();
    worker.await.unwrap();

    let events = collector.events.lock().await;
    let states: Vec<_> = events
        .iter()
        .filter_map(|frame| match frame.result.as_ref() {
            Some(UpdateEvent::Status(s)) => Some(s.status.state),
            _ => None,
        })
        .collect();
    assert_eq!(
        states,
        vec![TaskState::Submitted, TaskState::Working, TaskState::Completed]
    );

    let artifact_texts: Vec<_> = events
        .iter()
        .filter_map(|frame| match frame.result.as_ref() {
            Some(UpdateEvent::Artifact(a)) => Some(a.artifact.text_content()),
            _ => None,
        })
        .collect();
    assert_eq!(artifact_texts, vec!["hello"]);
    assert!(events.last().unwrap().result.as_ref().unwrap().is_final());
    assert!(collector.errors.lock().await.is_empty());

    // The snapshot over tasks/get agrees with the stream.
    drop(events);
    let task = client.get_task(TaskQueryParams::new("t1")).await.unwrap();
    assert_eq!(task.status.state, TaskState::Completed);

    assert!(registry.check_health("echo-agent").await);
}

#[tokio::test]
async fn duplicate_submit_over_the_wire_is_rejected() {
    let base_url = spawn_echo_server().await;
    let client = A2aClient::new(
        AgentCard::new("echo-agent", &base_url, "0.5.0").with_streaming(),
        Vec::new(),
        None,
    )
    .unwrap();

    let task = client
        .send_task_and_wait(send_params("t1", "first"), std::time::Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(task.status.state, TaskState::Completed);

    // The task is terminal now; a re-send is rejected with the invalid
    // task state error code.
    let err = client
        .send_task_subscribe(send_params("t1", "again"))
        .await
        .unwrap_err();
    match err {
        A2aError::Rpc(rpc) => assert_eq!(
            rpc.code,
            a2a_proto::jsonrpc::error_codes::INVALID_TASK_STATE
        ),
        other => panic!("expected Rpc error, got {other}"),
    }
}

#[tokio::test]
async fn cancel_over_the_wire() {
    let base_url = spawn_echo_server().await;
    let client = A2aClient::new(
        AgentCard::new("echo-agent", &base_url, "0.5.0").with_streaming(),
        Vec::new(),
        None,
    )
    .unwrap();

    // Unknown task: the not-found error crosses the wire with its code.
    let err = client.cancel_task("missing").await.unwrap_err();
    match err {
        A2aError::Rpc(rpc) => {
            assert_eq!(rpc.code, a2a_proto::jsonrpc::error_codes::TASK_NOT_FOUND)
        }
        other => panic!("expected Rpc error, got {other}"),
    }
}

#[tokio::test]
async fn missing_caller_identity_is_rejected_over_the_wire() {
    let base_url = spawn_echo_server().await;
    let client = A2aClient::new(
        AgentCard::new("echo-agent", &base_url, "0.5.0").with_streaming(),
        Vec::new(),
        None,
    )
    .unwrap();

    let err = client
        .send_task_subscribe(TaskSendParams::new("t1", Message::user_text("hi")))
        .await
        .unwrap_err();
    match err {
        A2aError::Rpc(rpc) => assert_eq!(
            rpc.code,
            a2a_proto::jsonrpc::error_codes::AUTHENTICATION_REQUIRED
        ),
        other => panic!("expected Rpc error, got {other}"),
    }
}
