//! Shared error taxonomy for the A2A crates.
//!
//! Everything crossing the wire is mapped to a [`JsonRpcError`] with a
//! stable code; exceptions never leak through the RPC boundary.

use thiserror::Error;

use crate::jsonrpc::JsonRpcError;
use crate::task::TaskState;

/// Result alias for A2A operations.
pub type A2aResult<T> = Result<T, A2aError>;

/// Errors raised by A2A operations, server- and client-side.
#[derive(Debug, Error)]
pub enum A2aError {
    /// Malformed or missing required fields.
    #[error("invalid params: {0}")]
    InvalidParams(String),

    /// The request named an unknown RPC method.
    #[error("method not found: {0}")]
    MethodNotFound(String),

    /// No task with the given id.
    #[error("task not found: {task_id}")]
    TaskNotFound { task_id: String },

    /// The task is terminal and cannot be canceled.
    #[error("task {task_id} cannot be canceled in state {state}")]
    TaskNotCancelable { task_id: String, state: TaskState },

    /// The agent does not advertise push-notification support.
    #[error("push notifications are not supported")]
    PushNotificationNotSupported,

    /// The agent does not implement the requested operation.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Requested output modes do not intersect the server's.
    #[error("incompatible content types: {0}")]
    IncompatibleContentTypes(String),

    /// Attempted transition or re-send on a task whose state forbids it.
    #[error("invalid state for task {task_id}: {detail}")]
    InvalidTaskState { task_id: String, detail: String },

    /// Missing caller identity on a subscribe request.
    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    /// Unexpected server-side failure.
    #[error("internal error: {0}")]
    Internal(String),

    /// Agent-card discovery failed (network or schema mismatch).
    #[error("agent discovery failed: {0}")]
    Discovery(String),

    /// HTTP transport failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Streaming connection failure.
    #[error("streaming error: {0}")]
    Streaming(String),

    /// No client registered under the requested agent name.
    #[error("no client registered for agent: {0}")]
    NoClient(String),

    /// The remote agent answered with a JSON-RPC error object.
    #[error("{0}")]
    Rpc(#[from] JsonRpcError),

    /// JSON (de)serialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failure.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl A2aError {
    /// Invalid-params error.
    pub fn invalid_params(detail: impl Into<String>) -> Self {
        Self::InvalidParams(detail.into())
    }

    /// Task-not-found error.
    pub fn task_not_found(task_id: impl Into<String>) -> Self {
        Self::TaskNotFound {
            task_id: task_id.into(),
        }
    }

    /// Invalid-task-state error.
    pub fn invalid_task_state(task_id: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::InvalidTaskState {
            task_id: task_id.into(),
            detail: detail.into(),
        }
    }

    /// Internal error.
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal(detail.into())
    }

    /// Discovery error.
    pub fn discovery(detail: impl Into<String>) -> Self {
        Self::Discovery(detail.into())
    }

    /// Transport error.
    pub fn transport(detail: impl Into<String>) -> Self {
        Self::Transport(detail.into())
    }

    /// Streaming error.
    pub fn streaming(detail: impl Into<String>) -> Self {
        Self::Streaming(detail.into())
    }
}

impl From<A2aError> for JsonRpcError {
    fn from(err: A2aError) -> Self {
        match err {
            A2aError::InvalidParams(detail) => JsonRpcError::invalid_params(detail),
            A2aError::MethodNotFound(method) => JsonRpcError::method_not_found(&method),
            A2aError::TaskNotFound { task_id } => JsonRpcError::task_not_found(&task_id),
            A2aError::TaskNotCancelable { task_id, .. } => {
                JsonRpcError::task_not_cancelable(&task_id)
            }
            A2aError::PushNotificationNotSupported => {
                JsonRpcError::push_notification_not_supported()
            }
            A2aError::UnsupportedOperation(detail) => JsonRpcError::unsupported_operation(detail),
            A2aError::IncompatibleContentTypes(detail) => {
                JsonRpcError::incompatible_content_types(detail)
            }
            A2aError::InvalidTaskState { task_id, detail } => {
                JsonRpcError::invalid_task_state(format!("task {task_id}: {detail}"))
            }
            A2aError::AuthenticationRequired(detail) => {
                JsonRpcError::authentication_required(detail)
            }
            A2aError::Rpc(error) => error,
            other => JsonRpcError::internal_error(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jsonrpc::error_codes;

    #[test]
    fn error_to_rpc_codes() {
        let cases: Vec<(A2aError, i64)> = vec![
            (A2aError::invalid_params("x"), error_codes::INVALID_PARAMS),
            (A2aError::task_not_found("t1"), error_codes::TASK_NOT_FOUND),
            (
                A2aError::invalid_task_state("t1", "already submitted"),
                error_codes::INVALID_TASK_STATE,
            ),
            (
                A2aError::AuthenticationRequired("caller missing".into()),
                error_codes::AUTHENTICATION_REQUIRED,
            ),
            (
                A2aError::IncompatibleContentTypes("video".into()),
                error_codes::INCOMPATIBLE_CONTENT_TYPES,
            ),
            (A2aError::internal("boom"), error_codes::INTERNAL_ERROR),
            (A2aError::discovery("no route"), error_codes::INTERNAL_ERROR),
        ];

        for (err, code) in cases {
            let rpc: JsonRpcError = err.into();
            assert_eq!(rpc.code, code);
        }
    }

    #[test]
    fn rpc_error_passes_through() {
        let rpc = JsonRpcError::task_not_cancelable("t2");
        let err = A2aError::Rpc(rpc.clone());
        let back: JsonRpcError = err.into();
        assert_eq!(back, rpc);
    }
}
