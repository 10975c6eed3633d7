//! End-to-end task manager scenarios: accept, stream, resume, cancel,
//! resubscribe, and push-notification delivery.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::Semaphore;

use a2a_proto::{
    A2aError, A2aResult, AgentCard, Artifact, Message, PushNotificationConfig, TaskIdParams,
    TaskPushNotificationConfig, TaskQueryParams, TaskSendParams, TaskState, UpdateEvent,
};
use a2a_server::{
    AgentExecutor, PushNotificationReceiverAuth, PushNotificationSenderAuth, ResumeKind,
    TaskManager, TaskUpdater,
};

fn card() -> AgentCard {
    AgentCard::new("test-agent", "http://127.0.0.1:8089/", "0.5.0")
        .with_streaming()
        .with_push_notifications()
        .with_default_output_modes(vec!["text".into(), "data".into(), "file".into()])
}

fn send_params(task_id: &str, text: &str) -> TaskSendParams {
    TaskSendParams::new(task_id, Message::user_text(text))
        .with_session("session-1")
        .with_metadata_entry("caller", serde_json::json!("tester@example.com"))
}

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
        kind: Option<ResumeKind>,
        params: TaskSendParams,
    ) -> A2aResult<()> {
        updater.working(None).await?;
        let tag = kind.map(ResumeKind::as_str).unwrap_or("restart");
        updater
            .completed(Some(Message::agent_text(format!(
                "{tag}: {}",
                params.message.text_content()
            ))))
            .await?;
        Ok(())
    }
}

/// Never writes anything — tasks stay SUBMITTED.
struct StalledExecutor;

#[async_trait]
impl AgentExecutor for StalledExecutor {
    async fn start(&self, _updater: TaskUpdater, _params: TaskSendParams) -> A2aResult<()> {
        std::future::pending::<()>().await;
        Ok(())
    }

    async fn resume(
        &self,
        _updater: TaskUpdater,
        _kind: Option<ResumeKind>,
        _params: TaskSendParams,
    ) -> A2aResult<()> {
        Ok(())
    }
}

/// Takes one permit per step so the test paces execution.
struct StepExecutor {
    gate: Arc<Semaphore>,
}

#[async_trait]
impl AgentExecutor for StepExecutor {
    async fn start(&self, updater: TaskUpdater, _params: TaskSendParams) -> A2aResult<()> {
        self.gate.acquire().await.expect("gate closed").forget();
        updater.working(None).await?;
        self.gate.acquire().await.expect("gate closed").forget();
        updater.completed(None).await?;
        Ok(())
    }

    async fn resume(
        &self,
        _updater: TaskUpdater,
        _kind: Option<ResumeKind>,
        _params: TaskSendParams,
    ) -> A2aResult<()> {
        Ok(())
    }
}

/// Always fails mid-run.
struct FailingExecutor;

#[async_trait]
impl AgentExecutor for FailingExecutor {
    async fn start(&self, updater: TaskUpdater, _params: TaskSendParams) -> A2aResult<()> {
        updater.working(None).await?;
        Err(A2aError::internal("engine exploded"))
    }

    async fn resume(
        &self,
        _updater: TaskUpdater,
        _kind: Option<ResumeKind>,
        _params: TaskSendParams,
    ) -> A2aResult<()> {
        Ok(())
    }
}

#[tokio::test]
async fn happy_path_streams_to_final_and_closes() {
    let manager = TaskManager::new(card(), Arc::new(EchoExecutor));
    let stream = manager
        .on_send_task_subscribe(send_params("t1", "hello"))
        .await
        .unwrap();

    let events: Vec<UpdateEvent> = stream.collect().await;

    let states: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            UpdateEvent::Status(s) => Some(s.status.state),
            UpdateEvent::Artifact(_) => None,
        })
        .collect();
    assert_eq!(
        states,
        vec![TaskState::Submitted, TaskState::Working, TaskState::Completed]
    );

    let artifacts: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            UpdateEvent::Artifact(a) => Some(a.artifact.text_content()),
            UpdateEvent::Status(_) => None,
        })
        .collect();
    assert_eq!(artifacts, vec!["hello"]);

    // The final event is last and the stream closed after it.
    assert!(events.last().unwrap().is_final());

    // The stored task reflects the terminal state and the artifact.
    let task = manager
        .on_get_task(TaskQueryParams::new("t1"))
        .await
        .unwrap();
    assert_eq!(task.status.state, TaskState::Completed);
    assert_eq!(task.artifacts.unwrap().len(), 1);
}

#[tokio::test]
async fn duplicate_submit_is_rejected_without_new_events() {
    let manager = TaskManager::new(card(), Arc::new(StalledExecutor));
    let mut stream = manager
        .on_send_task_subscribe(send_params("t1", "first"))
        .await
        .unwrap();
    assert_eq!(
        stream.next().await.unwrap().task_id(),
        "t1",
        "SUBMITTED event expected"
    );

    let err = manager
        .on_send_task_subscribe(send_params("t1", "again"))
        .await
        .unwrap_err();
    assert!(matches!(err, A2aError::InvalidTaskState { .. }));

    // No further event reached the original subscriber.
    let pending = tokio::time::timeout(std::time::Duration::from_millis(50), stream.next()).await;
    assert!(pending.is_err(), "no duplicate SUBMITTED may be emitted");
}

#[tokio::test]
async fn concurrent_first_sends_create_exactly_one_task() {
    let manager = Arc::new(TaskManager::new(card(), Arc::new(StalledExecutor)));

    let mut handles = Vec::new();
    for i in 0..8 {
        let manager = Arc::clone(&manager);
        handles.push(tokio::spawn(async move {
            manager
                .on_send_task_subscribe(send_params("t1", &format!("send-{i}")))
                .await
                .map(|_| ())
        }));
    }

    let mut accepted = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            accepted += 1;
        }
    }
    assert_eq!(accepted, 1);
}

#[tokio::test]
async fn cancel_emits_terminal_event() {
    let manager = TaskManager::new(card(), Arc::new(StalledExecutor));
    let stream = manager
        .on_send_task_subscribe(send_params("t1", "work"))
        .await
        .unwrap();

    let canceled = manager
        .on_cancel_task(TaskIdParams::new("t1"))
        .await
        .unwrap();
    assert_eq!(canceled.status.state, TaskState::Canceled);

    let events: Vec<UpdateEvent> = stream.collect().await;
    assert_eq!(events.len(), 2);
    assert!(events[1].is_final());

    // A second cancel is rejected: the task is already terminal.
    let err = manager
        .on_cancel_task(TaskIdParams::new("t1"))
        .await
        .unwrap_err();
    assert!(matches!(err, A2aError::TaskNotCancelable { .. }));
}

#[tokio::test]
async fn cancel_unknown_task_is_not_found() {
    let manager = TaskManager::new(card(), Arc::new(StalledExecutor));
    let err = manager
        .on_cancel_task(TaskIdParams::new("missing"))
        .await
        .unwrap_err();
    assert!(matches!(err, A2aError::TaskNotFound { .. }));
}

#[tokio::test]
async fn resubscribe_sees_only_later_events() {
    let gate = Arc::new(Semaphore::new(0));
    let manager = TaskManager::new(
        card(),
        Arc::new(StepExecutor {
            gate: Arc::clone(&gate),
        }),
    );

    let mut original = manager
        .on_send_task_subscribe(send_params("t1", "paced"))
        .await
        .unwrap();
    assert!(!original.next().await.unwrap().is_final()); // SUBMITTED

    gate.add_permits(1);
    assert!(!original.next().await.unwrap().is_final()); // WORKING

    // Re-attach mid-stream.
    let resubscribed = manager
        .on_resubscribe_task(TaskIdParams::new("t1"))
        .await
        .unwrap();

    gate.add_permits(1);
    let late_events: Vec<UpdateEvent> = resubscribed.collect().await;
    assert_eq!(late_events.len(), 1, "no replay of earlier events");
    assert!(late_events[0].is_final());

    let original_rest: Vec<UpdateEvent> = original.collect().await;
    assert!(original_rest.last().unwrap().is_final());
}

#[tokio::test]
async fn resubscribe_unknown_task_is_internal_error() {
    let manager = TaskManager::new(card(), Arc::new(StalledExecutor));
    let err = manager
        .on_resubscribe_task(TaskIdParams::new("nope"))
        .await
        .unwrap_err();
    assert!(matches!(err, A2aError::Internal(_)));
}

#[tokio::test]
async fn continuation_of_terminal_task_is_rejected() {
    let manager = TaskManager::new(card(), Arc::new(EchoExecutor));

    let first = manager
        .on_send_task_subscribe(send_params("t1", "start"))
        .await
        .unwrap();
    let _ = first.collect::<Vec<_>>().await;

    // The echo run completed the task; continuations must be rejected.
    let err = manager
        .on_send_task_subscribe(
            send_params("t1", "more").with_metadata_entry("method", serde_json::json!("user_input")),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, A2aError::InvalidTaskState { .. }));
}

#[tokio::test]
async fn continuation_of_working_task_dispatches_resume() {
    let gate = Arc::new(Semaphore::new(0));
    let manager = TaskManager::new(
        card(),
        Arc::new(StepExecutor {
            gate: Arc::clone(&gate),
        }),
    );

    let mut original = manager
        .on_send_task_subscribe(send_params("t1", "start"))
        .await
        .unwrap();
    assert!(!original.next().await.unwrap().is_final()); // SUBMITTED
    gate.add_permits(1);
    assert!(!original.next().await.unwrap().is_final()); // WORKING

    // Continuation of a WORKING task is accepted and returns a new stream.
    let continuation = manager
        .on_send_task_subscribe(
            send_params("t1", "tool output")
                .with_metadata_entry("method", serde_json::json!("tool_call")),
        )
        .await;
    assert!(continuation.is_ok());

    // The history carries both messages.
    let task = manager
        .on_get_task(TaskQueryParams::new("t1"))
        .await
        .unwrap();
    assert_eq!(task.history.unwrap().len(), 2);
}

#[tokio::test]
async fn executor_failure_becomes_failed_final_event() {
    let manager = TaskManager::new(card(), Arc::new(FailingExecutor));
    let stream = manager
        .on_send_task_subscribe(send_params("t1", "doomed"))
        .await
        .unwrap();

    let events: Vec<UpdateEvent> = stream.collect().await;
    let last = events.last().unwrap();
    assert!(last.is_final());
    match last {
        UpdateEvent::Status(s) => {
            assert_eq!(s.status.state, TaskState::Failed);
            let diagnostic = s.status.message.as_ref().unwrap().text_content();
            assert!(diagnostic.contains("engine exploded"));
        }
        UpdateEvent::Artifact(_) => panic!("expected a status event"),
    }
}

#[tokio::test]
async fn validation_rejections() {
    let manager = TaskManager::new(card(), Arc::new(EchoExecutor));

    // Missing caller identity.
    let err = manager
        .on_send_task_subscribe(TaskSendParams::new("t1", Message::user_text("hi")))
        .await
        .unwrap_err();
    assert!(matches!(err, A2aError::AuthenticationRequired(_)));

    // Unsupported output modality.
    let err = manager
        .on_send_task_subscribe(
            send_params("t2", "hi").with_accepted_output_modes(vec!["video".into()]),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, A2aError::IncompatibleContentTypes(_)));

    // Blank push-notification URL.
    let err = manager
        .on_send_task_subscribe(
            send_params("t3", "hi").with_push_notification(PushNotificationConfig::new("  ")),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, A2aError::InvalidParams(_)));

    // Blank task id.
    let err = manager
        .on_send_task_subscribe(send_params("", "hi"))
        .await
        .unwrap_err();
    assert!(matches!(err, A2aError::InvalidParams(_)));

    // No task was created by any rejected request.
    assert!(manager
        .on_get_task(TaskQueryParams::new("t1"))
        .await
        .is_err());
}

#[tokio::test]
async fn send_task_is_unsupported() {
    let manager = TaskManager::new(card(), Arc::new(EchoExecutor));
    let err = manager
        .on_send_task(send_params("t1", "hi"))
        .await
        .unwrap_err();
    assert!(matches!(err, A2aError::UnsupportedOperation(_)));
}

#[tokio::test]
async fn push_notification_config_round_trip() {
    let auth = Arc::new(PushNotificationSenderAuth::generate().unwrap());
    let manager = TaskManager::with_push_auth(card(), Arc::new(StalledExecutor), auth);

    let _ = manager
        .on_send_task_subscribe(send_params("t1", "hi"))
        .await
        .unwrap();

    let config = TaskPushNotificationConfig {
        id: "t1".into(),
        push_notification_config: PushNotificationConfig::new("http://127.0.0.1:9100/notify"),
    };
    manager
        .on_set_push_notification(config.clone())
        .await
        .unwrap();

    let fetched = manager
        .on_get_push_notification(TaskIdParams::new("t1"))
        .await
        .unwrap();
    assert_eq!(fetched, config);
}

#[tokio::test]
async fn terminal_push_notification_is_delivered_and_verifiable() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let webhook = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/notify"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&webhook)
        .await;

    let auth = Arc::new(PushNotificationSenderAuth::generate().unwrap());
    let jwks = auth.jwks().to_string();
    let manager = TaskManager::with_push_auth(card(), Arc::new(EchoExecutor), auth);

    let params = send_params("t1", "notify me")
        .with_push_notification(PushNotificationConfig::new(format!("{}/notify", webhook.uri())));
    let stream = manager.on_send_task_subscribe(params).await.unwrap();
    let events: Vec<UpdateEvent> = stream.collect().await;
    assert!(events.last().unwrap().is_final());

    // Delivery is async; give the spawned POST a moment.
    for _ in 0..50 {
        if !webhook.received_requests().await.unwrap().is_empty() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    let requests = webhook.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);

    let receiver = PushNotificationReceiverAuth::new(Vec::new());
    receiver.load_jwks_json(&jwks).unwrap();
    let header = requests[0].headers.get("authorization").unwrap();
    assert!(receiver.verify(header.to_str().unwrap(), &requests[0].body));

    let delivered: a2a_proto::Task = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(delivered.status.state, TaskState::Completed);
    assert!(delivered.history.is_none());
}

#[tokio::test]
async fn unreachable_push_url_does_not_break_the_stream() {
    let auth = Arc::new(PushNotificationSenderAuth::generate().unwrap());
    let manager = TaskManager::with_push_auth(card(), Arc::new(EchoExecutor), auth);

    let params = send_params("t1", "hello")
        .with_push_notification(PushNotificationConfig::new("http://127.0.0.1:1/notify"));
    let stream = manager.on_send_task_subscribe(params).await.unwrap();

    let events: Vec<UpdateEvent> = stream.collect().await;
    let last = events.last().unwrap();
    assert!(last.is_final());
    match last {
        UpdateEvent::Status(s) => assert_eq!(s.status.state, TaskState::Completed),
        UpdateEvent::Artifact(_) => panic!("expected a status event"),
    }
}

#[tokio::test]
async fn get_task_honors_history_length() {
    let manager = TaskManager::new(card(), Arc::new(EchoExecutor));
    let stream = manager
        .on_send_task_subscribe(send_params("t1", "hello"))
        .await
        .unwrap();
    let _ = stream.collect::<Vec<_>>().await;

    let mut query = TaskQueryParams::new("t1");
    query.history_length = Some(1);
    let task = manager.on_get_task(query).await.unwrap();
    assert_eq!(task.history.unwrap().len(), 1);
}

#[tokio::test]
async fn session_cleanup_removes_tasks() {
    let manager = TaskManager::new(card(), Arc::new(EchoExecutor));
    let stream = manager
        .on_send_task_subscribe(send_params("t1", "hello"))
        .await
        .unwrap();
    let _ = stream.collect::<Vec<_>>().await;

    let last = manager.last_task_for_session("session-1").await.unwrap();
    assert_eq!(last.id, "t1");

    manager.clean_session("session-1").await;
    assert!(manager
        .on_get_task(TaskQueryParams::new("t1"))
        .await
        .is_err());
}
