//! HTTP binding: JSON-RPC over a single POST endpoint, with SSE upgrade
//! for the streaming methods.
//!
//! Every SSE frame is one serialized `Response<UpdateEvent>` carrying the
//! originating request's id, so streaming consumers decode the same
//! envelope as unary callers.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response as AxumResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::StreamExt;
use serde::Serialize;
use tracing::{debug, info};

use a2a_proto::{
    methods, A2aError, A2aResult, AgentCard, JsonRpcError, Request, Response, UpdateEvent,
};

use crate::manager::TaskManager;
use crate::queue::EventStream;

/// Path the agent card is served at.
pub const AGENT_CARD_PATH: &str = "/.well-known/agent.json";

/// Path the push-notification JWKS is served at.
pub const JWKS_PATH: &str = "/.well-known/jwks.json";

/// SSE keep-alive interval.
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Clone)]
struct AppState {
    manager: Arc<TaskManager>,
}

/// HTTP server exposing a [`TaskManager`] over the A2A wire protocol.
pub struct A2aServer {
    manager: Arc<TaskManager>,
}

impl A2aServer {
    /// Server for the given manager.
    pub fn new(manager: Arc<TaskManager>) -> Self {
        Self { manager }
    }

    /// Build the axum router.
    pub fn router(&self) -> Router {
        let state = AppState {
            manager: Arc::clone(&self.manager),
        };
        Router::new()
            .route("/", post(dispatch_rpc))
            .route(AGENT_CARD_PATH, get(get_agent_card))
            .route(JWKS_PATH, get(get_jwks))
            .with_state(state)
    }

    /// Serve on the given address until the process exits.
    pub async fn serve(self, addr: &str) -> A2aResult<()> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| A2aError::internal(format!("failed to bind {addr}: {e}")))?;

        let card = self.manager.agent_card();
        info!(agent = %card.name, address = %addr, "A2A server starting");

        axum::serve(listener, self.router())
            .await
            .map_err(|e| A2aError::internal(format!("server error: {e}")))
    }
}

/// GET /.well-known/agent.json
async fn get_agent_card(State(state): State<AppState>) -> Json<AgentCard> {
    debug!(agent = %state.manager.agent_card().name, "Serving agent card");
    Json(state.manager.agent_card().clone())
}

/// GET /.well-known/jwks.json
async fn get_jwks(State(state): State<AppState>) -> AxumResponse {
    match state.manager.jwks() {
        Some(jwks) => Json(jwks).into_response(),
        None => (
            axum::http::StatusCode::NOT_FOUND,
            "push notifications are not configured",
        )
            .into_response(),
    }
}

/// POST / — JSON-RPC dispatch.
async fn dispatch_rpc(
    State(state): State<AppState>,
    Json(request): Json<Request<serde_json::Value>>,
) -> AxumResponse {
    let manager = &state.manager;
    let id = request.id.clone();
    debug!(method = %request.method, rpc_id = %id, "RPC received");

    match request.method.as_str() {
        methods::SEND_TASK => match request.typed_params() {
            Ok(params) => unary(id, manager.on_send_task(params).await),
            Err(e) => rpc_error(id, e),
        },
        methods::SEND_TASK_SUBSCRIBE => match request.typed_params() {
            Ok(params) => streaming(id, manager.on_send_task_subscribe(params).await),
            Err(e) => rpc_error(id, e),
        },
        methods::RESUBSCRIBE_TASK => match request.typed_params() {
            Ok(params) => streaming(id, manager.on_resubscribe_task(params).await),
            Err(e) => rpc_error(id, e),
        },
        methods::GET_TASK => match request.typed_params() {
            Ok(params) => unary(id, manager.on_get_task(params).await),
            Err(e) => rpc_error(id, e),
        },
        methods::CANCEL_TASK => match request.typed_params() {
            Ok(params) => unary(id, manager.on_cancel_task(params).await),
            Err(e) => rpc_error(id, e),
        },
        methods::SET_PUSH_NOTIFICATION => match request.typed_params() {
            Ok(params) => unary(id, manager.on_set_push_notification(params).await),
            Err(e) => rpc_error(id, e),
        },
        methods::GET_PUSH_NOTIFICATION => match request.typed_params() {
            Ok(params) => unary(id, manager.on_get_push_notification(params).await),
            Err(e) => rpc_error(id, e),
        },
        other => rpc_error(id, JsonRpcError::method_not_found(other)),
    }
}

/// A single JSON-RPC response body.
fn unary<T: Serialize>(id: String, result: A2aResult<T>) -> AxumResponse {
    match result {
        Ok(value) => Json(Response::success(id, value)).into_response(),
        Err(e) => Json(Response::<T>::error(id, e.into())).into_response(),
    }
}

/// An error as a JSON-RPC response body.
fn rpc_error(id: String, error: JsonRpcError) -> AxumResponse {
    Json(Response::<serde_json::Value>::error(id, error)).into_response()
}

/// A stream of `Response<UpdateEvent>` frames over SSE, or a JSON-RPC error
/// body when the subscription was rejected.
fn streaming(id: String, result: A2aResult<EventStream>) -> AxumResponse {
    let events = match result {
        Ok(events) => events,
        Err(e) => return Json(Response::<UpdateEvent>::error(id, e.into())).into_response(),
    };

    let frames = events.map(move |event| {
        let frame = Response::success(id.clone(), event);
        let data = serde_json::to_string(&frame).unwrap_or_default();
        Ok::<_, Infallible>(Event::default().data(data))
    });

    Sse::new(frames)
        .keep_alive(
            KeepAlive::new()
                .interval(KEEP_ALIVE_INTERVAL)
                .text("keep-alive"),
        )
        .into_response()
}
