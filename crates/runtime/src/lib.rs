//! Engine connection runtime.
//!
//! This crate owns everything between the orchestration layer in `qix` and
//! the wire: the transport seam, the JSON-RPC request/response correlation
//! loop, and the object-safe [`EngineRpc`] trait the client calls through.
//! It is deliberately thin - no delta protocol, no reconnection - sequencing
//! and cleanup policy live in the client crate.

pub mod connection;
pub mod fake;
pub mod transport;

use serde_json::Value;

pub use connection::{Connection, EngineEvent};
pub use transport::{SocketTransport, Transport, TransportParts, TransportReceiver};

/// Errors surfaced by the connection runtime.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The engine answered a request with an error payload.
    #[error("engine error {code}: {message}")]
    Engine {
        code: i64,
        message: String,
        parameter: Option<String>,
    },

    /// The websocket failed to connect or dropped mid-frame.
    #[error("transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    /// A frame could not be serialized or parsed.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// The connection closed before a pending request was answered.
    #[error("connection closed before response arrived")]
    ChannelClosed,

    /// The engine sent something the correlation layer cannot attribute.
    #[error("protocol error: {0}")]
    Protocol(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Object-safe seam for issuing engine calls.
///
/// Implemented by [`Connection`] for live sockets and by
/// [`fake::FakeEngine`] in tests. `handle` addresses the server-side object
/// (`qix_protocol::GLOBAL_HANDLE` for the global scope).
#[async_trait::async_trait]
pub trait EngineRpc: Send + Sync {
    async fn call(&self, handle: i32, method: &str, params: Value) -> Result<Value>;
}
