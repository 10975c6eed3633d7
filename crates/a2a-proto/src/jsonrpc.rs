//! JSON-RPC 2.0 envelope for A2A.
//!
//! Every operation travels as a JSON-RPC request/response over HTTP(S).
//! Streaming methods keep the same envelope: each SSE frame is one
//! serialized [`Response`] carrying an [`crate::UpdateEvent`] result.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC 2.0 protocol version.
pub const JSONRPC_VERSION: &str = "2.0";

/// Standard A2A JSON-RPC method names.
pub mod methods {
    /// Send a task and wait for the snapshot.
    pub const SEND_TASK: &str = "tasks/send";

    /// Send a task and stream update events back.
    pub const SEND_TASK_SUBSCRIBE: &str = "tasks/sendSubscribe";

    /// Get a task snapshot by id.
    pub const GET_TASK: &str = "tasks/get";

    /// Cancel a task.
    pub const CANCEL_TASK: &str = "tasks/cancel";

    /// Re-attach a streaming reader to a running task.
    pub const RESUBSCRIBE_TASK: &str = "tasks/resubscribe";

    /// Set a task's push-notification config.
    pub const SET_PUSH_NOTIFICATION: &str = "tasks/pushNotification/set";

    /// Get a task's push-notification config.
    pub const GET_PUSH_NOTIFICATION: &str = "tasks/pushNotification/get";
}

// ── Request ──────────────────────────────────────────────────

/// A JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Request<P> {
    /// Always "2.0".
    pub jsonrpc: String,

    /// Request identifier, matched by the response; a 32-hex token is
    /// generated when the caller does not supply one.
    #[serde(default = "crate::uuid4_hex")]
    pub id: String,

    /// The method to invoke.
    pub method: String,

    /// Method parameters.
    pub params: P,
}

impl<P> Request<P> {
    /// Request with a generated id.
    pub fn new(method: impl Into<String>, params: P) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            id: crate::uuid4_hex(),
            method: method.into(),
            params,
        }
    }
}

impl Request<Value> {
    /// Decode the raw params into their typed form.
    pub fn typed_params<P: serde::de::DeserializeOwned>(&self) -> Result<P, JsonRpcError> {
        serde_json::from_value(self.params.clone())
            .map_err(|e| JsonRpcError::invalid_params(e.to_string()))
    }
}

// ── Response ─────────────────────────────────────────────────

/// A JSON-RPC 2.0 response. Exactly one of `result`/`error` is populated.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Response<R> {
    /// Always "2.0".
    pub jsonrpc: String,

    /// The id of the request this answers.
    pub id: String,

    /// The result, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<R>,

    /// The error, on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl<R> Response<R> {
    /// Success response.
    pub fn success(id: impl Into<String>, result: R) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            id: id.into(),
            result: Some(result),
            error: None,
        }
    }

    /// Error response.
    pub fn error(id: impl Into<String>, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            id: id.into(),
            result: None,
            error: Some(error),
        }
    }

    /// Whether this is an error response.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Extract the result, surfacing the error object if present.
    pub fn into_result(self) -> Result<R, JsonRpcError> {
        match (self.result, self.error) {
            (_, Some(error)) => Err(error),
            (Some(result), None) => Ok(result),
            (None, None) => Err(JsonRpcError::internal_error(
                "response carried neither result nor error",
            )),
        }
    }
}

// ── Error object ─────────────────────────────────────────────

/// Error codes: the JSON-RPC standard range plus the A2A-specific range.
pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;

    pub const TASK_NOT_FOUND: i64 = -32001;
    pub const TASK_NOT_CANCELABLE: i64 = -32002;
    pub const PUSH_NOTIFICATION_NOT_SUPPORTED: i64 = -32003;
    pub const UNSUPPORTED_OPERATION: i64 = -32004;
    pub const INCOMPATIBLE_CONTENT_TYPES: i64 = -32005;
    pub const INVALID_TASK_STATE: i64 = -32006;
    pub const AUTHENTICATION_REQUIRED: i64 = -32007;
}

/// A JSON-RPC 2.0 error object with a stable code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct JsonRpcError {
    /// Error code.
    pub code: i64,

    /// Human-readable message.
    pub message: String,

    /// Optional additional data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    fn with_detail(code: i64, message: &str, detail: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: Some(Value::String(detail.into())),
        }
    }

    /// Parse error (-32700).
    pub fn parse_error(detail: impl Into<String>) -> Self {
        Self::with_detail(error_codes::PARSE_ERROR, "Parse error", detail)
    }

    /// Invalid request (-32600).
    pub fn invalid_request(detail: impl Into<String>) -> Self {
        Self::with_detail(error_codes::INVALID_REQUEST, "Invalid Request", detail)
    }

    /// Method not found (-32601).
    pub fn method_not_found(method: &str) -> Self {
        Self::with_detail(
            error_codes::METHOD_NOT_FOUND,
            "Method not found",
            format!("Unknown method: {method}"),
        )
    }

    /// Invalid params (-32602).
    pub fn invalid_params(detail: impl Into<String>) -> Self {
        Self::with_detail(error_codes::INVALID_PARAMS, "Invalid params", detail)
    }

    /// Internal error (-32603).
    pub fn internal_error(detail: impl Into<String>) -> Self {
        Self::with_detail(error_codes::INTERNAL_ERROR, "Internal error", detail)
    }

    /// Task not found (-32001).
    pub fn task_not_found(task_id: &str) -> Self {
        Self::with_detail(
            error_codes::TASK_NOT_FOUND,
            "Task not found",
            format!("Task {task_id} not found"),
        )
    }

    /// Task not cancelable (-32002).
    pub fn task_not_cancelable(task_id: &str) -> Self {
        Self::with_detail(
            error_codes::TASK_NOT_CANCELABLE,
            "Task cannot be canceled",
            format!("Task {task_id} is in a terminal state"),
        )
    }

    /// Push notifications not supported (-32003).
    pub fn push_notification_not_supported() -> Self {
        Self {
            code: error_codes::PUSH_NOTIFICATION_NOT_SUPPORTED,
            message: "Push Notification is not supported".into(),
            data: None,
        }
    }

    /// Unsupported operation (-32004).
    pub fn unsupported_operation(detail: impl Into<String>) -> Self {
        Self::with_detail(
            error_codes::UNSUPPORTED_OPERATION,
            "This operation is not supported",
            detail,
        )
    }

    /// Incompatible content types (-32005).
    pub fn incompatible_content_types(detail: impl Into<String>) -> Self {
        Self::with_detail(
            error_codes::INCOMPATIBLE_CONTENT_TYPES,
            "Incompatible content types",
            detail,
        )
    }

    /// Invalid task state (-32006).
    pub fn invalid_task_state(detail: impl Into<String>) -> Self {
        Self::with_detail(error_codes::INVALID_TASK_STATE, "Invalid task state", detail)
    }

    /// Authentication required (-32007).
    pub fn authentication_required(detail: impl Into<String>) -> Self {
        Self::with_detail(
            error_codes::AUTHENTICATION_REQUIRED,
            "Authentication required",
            detail,
        )
    }
}

impl std::fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JSON-RPC error {}: {}", self.code, self.message)
    }
}

impl std::error::Error for JsonRpcError {}
