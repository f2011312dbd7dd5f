//! JSON-RPC frame types for the engine socket.
//!
//! The engine speaks JSON-RPC 2.0 with one extension: every request carries a
//! `handle` addressing the server-side object the method is invoked on
//! (`-1` is the global scope). Frames without an `id` are unsolicited pushes
//! (session notifications, change lists) rather than responses.

use serde::{Deserialize, Serialize};
use serde_json::Value;

fn jsonrpc_version() -> String {
    "2.0".to_string()
}

/// Request frame sent to the engine.
///
/// ```json
/// {
///   "jsonrpc": "2.0",
///   "id": 7,
///   "handle": 1,
///   "method": "GetLayout",
///   "params": {}
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    #[serde(default = "jsonrpc_version")]
    pub jsonrpc: String,
    /// Unique request ID for correlating responses.
    pub id: u32,
    /// Server-side object the method targets (`-1` for the global scope).
    pub handle: i32,
    /// Method name to invoke.
    pub method: String,
    /// Named method parameters as a JSON object.
    pub params: Value,
}

impl Request {
    pub fn new(id: u32, handle: i32, method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: jsonrpc_version(),
            id,
            handle,
            method: method.into(),
            params,
        }
    }
}

/// Response frame from the engine, correlated by `id`.
///
/// Exactly one of `result`/`error` is present:
/// ```json
/// {"id": 7, "result": {"qLayout": {}}}
/// {"id": 7, "error": {"code": 8000, "message": "App not found"}}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Request ID this response correlates to.
    pub id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorPayload>,
}

/// Engine-side error details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Numeric engine error code (e.g. 8000 series for app access).
    pub code: i64,
    pub message: String,
    /// Offending parameter, when the engine names one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
}

/// Unsolicited push from the engine (no `id`).
///
/// ```json
/// {"method": "OnConnectionClosed", "params": {"reason": "idle"}}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Push {
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

/// Discriminated union of inbound frames.
///
/// Uses serde's `untagged` to distinguish based on presence of `id`:
/// frames with `id` are responses, frames without are pushes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
    Response(Response),
    Push(Push),
}
