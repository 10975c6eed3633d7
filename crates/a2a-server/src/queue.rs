//! Per-task event queue with multicast streaming.
//!
//! Each task id owns a broadcast channel. Every subscriber receives every
//! event enqueued after its subscription point, in enqueue order; there is
//! no replay of earlier events on resubscribe (the queue is the single
//! owner of that policy, so a persistent, replaying implementation can
//! replace this one without touching the task manager).
//!
//! Back-pressure: the channel is bounded and a lagging reader skips the
//! events it missed (drop-oldest) — a slow subscriber never blocks the
//! producer or its sibling subscribers.

use std::collections::HashMap;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use pin_project_lite::pin_project;
use tokio::sync::{broadcast, RwLock};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};

use a2a_proto::UpdateEvent;

/// Events buffered per subscriber before lagging sets in.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Per-task multicast event queue.
#[derive(Debug, Default)]
pub struct EventQueue {
    channels: RwLock<HashMap<String, broadcast::Sender<UpdateEvent>>>,
}

impl EventQueue {
    /// Empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    async fn sender(&self, task_id: &str) -> broadcast::Sender<UpdateEvent> {
        if let Some(tx) = self.channels.read().await.get(task_id) {
            return tx.clone();
        }
        let mut channels = self.channels.write().await;
        channels
            .entry(task_id.to_string())
            .or_insert_with(|| broadcast::channel(EVENT_CHANNEL_CAPACITY).0)
            .clone()
    }

    /// Append an event for a task and wake its subscribers. An event with
    /// no subscriber is dropped silently — enqueue never blocks.
    pub async fn enqueue(&self, task_id: &str, event: UpdateEvent) {
        let tx = self.sender(task_id).await;
        if tx.send(event).is_err() {
            debug!(task_id = %task_id, "Event enqueued with no active subscriber");
        }
    }

    /// Open a reader for a task's events.
    ///
    /// `resubscribe = false` is a fresh subscription, `true` re-attaches a
    /// reader to a running task; both start from the subscription point —
    /// historical events are not replayed.
    pub async fn subscribe(&self, task_id: &str, resubscribe: bool) -> EventStream {
        let rx = self.sender(task_id).await.subscribe();
        debug!(task_id = %task_id, resubscribe, "Subscriber attached");
        EventStream::new(task_id, rx)
    }

    /// Drop a task's channel, ending all its subscriber streams.
    pub async fn close(&self, task_id: &str) {
        self.channels.write().await.remove(task_id);
    }
}

pin_project! {
    /// A stream of update events for one task.
    ///
    /// Ends after yielding a status event with `final = true`, or when the
    /// task's channel is closed. Dropping the stream releases only this
    /// reader; other subscribers and the producer are unaffected.
    pub struct EventStream {
        task_id: String,
        #[pin]
        inner: BroadcastStream<UpdateEvent>,
        done: bool,
    }
}

impl EventStream {
    fn new(task_id: &str, rx: broadcast::Receiver<UpdateEvent>) -> Self {
        Self {
            task_id: task_id.to_string(),
            inner: BroadcastStream::new(rx),
            done: false,
        }
    }

    /// The task this stream belongs to.
    pub fn task_id(&self) -> &str {
        &self.task_id
    }
}

impl std::fmt::Debug for EventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream")
            .field("task_id", &self.task_id)
            .field("done", &self.done)
            .finish()
    }
}

impl Stream for EventStream {
    type Item = UpdateEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        if *this.done {
            return Poll::Ready(None);
        }
        loop {
            match this.inner.as_mut().poll_next(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Some(Ok(event))) => {
                    if event.is_final() {
                        *this.done = true;
                    }
                    return Poll::Ready(Some(event));
                }
                Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(missed)))) => {
                    warn!(task_id = %this.task_id, missed, "Subscriber lagged, dropping oldest events");
                    continue;
                }
                Poll::Ready(None) => {
                    *this.done = true;
                    return Poll::Ready(None);
                }
            }
        }
    }
}
