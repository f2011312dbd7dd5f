//! Test doubles for the engine, at two levels.
//!
//! [`pipe`] fakes the transport so [`crate::Connection`] can be exercised
//! frame by frame. [`FakeEngine`] fakes the [`EngineRpc`] seam with
//! method-keyed responders and an ordered call log, which is what the client
//! crate's tests assert against (call order, create/destroy pairing).

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;

use crate::transport::{Transport, TransportParts, TransportReceiver};
use crate::{EngineRpc, Error, Result};

/// Builds an in-memory transport plus a controller for injecting frames and
/// inspecting what was sent.
pub fn pipe() -> (TransportParts, FakeSocketController) {
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let (message_tx, message_rx) = mpsc::unbounded_channel();
    let sent = Arc::new(parking_lot::Mutex::new(Vec::new()));

    let parts = TransportParts {
        sender: Box::new(PipeSender {
            sent: Arc::clone(&sent),
        }),
        receiver: Box::new(PipeReceiver {
            inbound_rx,
            message_tx,
        }),
        message_rx,
    };

    (parts, FakeSocketController { inbound_tx: Some(inbound_tx), sent })
}

/// Injects inbound frames and records outbound ones.
pub struct FakeSocketController {
    inbound_tx: Option<mpsc::UnboundedSender<Value>>,
    sent: Arc<parking_lot::Mutex<Vec<Value>>>,
}

impl FakeSocketController {
    /// Injects a raw frame, as if the engine had sent it.
    pub fn inject(&self, frame: Value) {
        if let Some(tx) = &self.inbound_tx {
            let _ = tx.send(frame);
        }
    }

    pub fn inject_response(&self, id: u32, result: Value) {
        self.inject(serde_json::json!({"jsonrpc": "2.0", "id": id, "result": result}));
    }

    pub fn inject_error(&self, id: u32, code: i64, message: &str) {
        self.inject(serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": {"code": code, "message": message}
        }));
    }

    /// Simulates the peer closing the socket.
    pub fn close(&mut self) {
        self.inbound_tx = None;
    }

    /// Takes all sent frames, clearing the buffer.
    pub fn take_sent(&self) -> Vec<Value> {
        std::mem::take(&mut *self.sent.lock())
    }
}

struct PipeSender {
    sent: Arc<parking_lot::Mutex<Vec<Value>>>,
}

impl Transport for PipeSender {
    fn send(&mut self, message: Value) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        self.sent.lock().push(message);
        Box::pin(async { Ok(()) })
    }
}

struct PipeReceiver {
    inbound_rx: mpsc::UnboundedReceiver<Value>,
    message_tx: mpsc::UnboundedSender<Value>,
}

impl TransportReceiver for PipeReceiver {
    fn run(mut self: Box<Self>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> {
        Box::pin(async move {
            while let Some(message) = self.inbound_rx.recv().await {
                if self.message_tx.send(message).is_err() {
                    break;
                }
            }
            Ok(())
        })
    }
}

/// One engine call as the fake saw it.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub handle: i32,
    pub method: String,
    pub params: Value,
}

type Handler = Box<dyn FnMut(&RecordedCall) -> Result<Value> + Send>;

/// Scriptable [`EngineRpc`] implementation.
///
/// Responders are keyed by method name and may be stateful (`FnMut`), so a
/// test can hand out fresh handles per `CreateSessionObject`. Unscripted
/// methods fail loudly.
#[derive(Default)]
pub struct FakeEngine {
    handlers: parking_lot::Mutex<HashMap<String, Handler>>,
    log: parking_lot::Mutex<Vec<RecordedCall>>,
}

impl FakeEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers a responder for `method`, replacing any previous one.
    pub fn on<F>(&self, method: &str, handler: F)
    where
        F: FnMut(&RecordedCall) -> Result<Value> + Send + 'static,
    {
        self.handlers
            .lock()
            .insert(method.to_string(), Box::new(handler));
    }

    /// Registers a responder that always returns a clone of `value`.
    pub fn on_value(&self, method: &str, value: Value) {
        self.on(method, move |_| Ok(value.clone()));
    }

    /// Registers a responder that always fails with an engine error.
    pub fn fail_on(&self, method: &str, code: i64, message: &str) {
        let message = message.to_string();
        self.on(method, move |_| {
            Err(Error::Engine {
                code,
                message: message.clone(),
                parameter: None,
            })
        });
    }

    /// Snapshot of every call made so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.log.lock().clone()
    }

    /// Snapshot of the calls to one method, in order.
    pub fn calls_of(&self, method: &str) -> Vec<RecordedCall> {
        self.log
            .lock()
            .iter()
            .filter(|call| call.method == method)
            .cloned()
            .collect()
    }

    /// The method names of every call so far, in order.
    pub fn call_sequence(&self) -> Vec<String> {
        self.log.lock().iter().map(|call| call.method.clone()).collect()
    }
}

#[async_trait::async_trait]
impl EngineRpc for FakeEngine {
    async fn call(&self, handle: i32, method: &str, params: Value) -> Result<Value> {
        let call = RecordedCall {
            handle,
            method: method.to_string(),
            params,
        };
        self.log.lock().push(call.clone());

        match self.handlers.lock().get_mut(method) {
            Some(handler) => handler(&call),
            None => Err(Error::Protocol(format!("no fake responder for {method}"))),
        }
    }
}
