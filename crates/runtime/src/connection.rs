//! Request/response correlation on top of the transport.
//!
//! One outbound counter, one callback map. Requests get a fresh id and a
//! oneshot channel; the run loop matches inbound responses back to their
//! channel and forwards unsolicited pushes to the installed event sink.
//! When the transport closes, every pending request fails with
//! [`Error::ChannelClosed`] and the sink is told the connection is gone.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use serde_json::Value;
use tokio::sync::{Mutex, mpsc, oneshot};

use crate::transport::{Transport, TransportParts, TransportReceiver};
use crate::{EngineRpc, Error, Result};
use qix_protocol::{ErrorPayload, Message, Push, Request};

/// Engine-level happenings that are not responses to any request.
///
/// The orchestrator installs a sink for these at connect time; lost
/// connections and engine pushes (session notifications) land here.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Unsolicited engine push, e.g. `OnAuthenticationInformation`.
    Push { method: String, params: Value },
    /// The socket closed; no further calls will succeed.
    ConnectionClosed,
}

/// JSON-RPC connection to the engine.
///
/// Thread-safe behind `Arc`; concurrent in-flight requests are correlated by
/// id. [`run`](Connection::run) must be spawned once in a background task.
pub struct Connection {
    last_id: AtomicU32,
    callbacks: Mutex<HashMap<u32, oneshot::Sender<Result<Value>>>>,
    sender: Mutex<Box<dyn Transport>>,
    inbound: Mutex<Option<Inbound>>,
    event_sink: parking_lot::Mutex<Option<mpsc::UnboundedSender<EngineEvent>>>,
}

struct Inbound {
    receiver: Box<dyn TransportReceiver>,
    message_rx: mpsc::UnboundedReceiver<Value>,
}

impl Connection {
    pub fn new(parts: TransportParts) -> Self {
        Self {
            last_id: AtomicU32::new(0),
            callbacks: Mutex::new(HashMap::new()),
            sender: Mutex::new(parts.sender),
            inbound: Mutex::new(Some(Inbound {
                receiver: parts.receiver,
                message_rx: parts.message_rx,
            })),
            event_sink: parking_lot::Mutex::new(None),
        }
    }

    /// Installs the sink that receives [`EngineEvent`]s. Replaces any
    /// previously installed sink.
    pub fn set_event_sink(&self, sink: mpsc::UnboundedSender<EngineEvent>) {
        *self.event_sink.lock() = Some(sink);
    }

    /// Sends one request to the engine and awaits its response.
    ///
    /// # Errors
    ///
    /// Fails when the transport send fails, the engine answers with an error
    /// payload, or the connection closes before the response arrives.
    pub async fn send_message(&self, handle: i32, method: &str, params: Value) -> Result<Value> {
        let id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;

        let (tx, rx) = oneshot::channel();
        self.callbacks.lock().await.insert(id, tx);

        let request = Request::new(id, handle, method, params);
        let frame = serde_json::to_value(&request)?;

        if let Err(error) = self.sender.lock().await.send(frame).await {
            self.callbacks.lock().await.remove(&id);
            return Err(error);
        }

        rx.await.map_err(|_| Error::ChannelClosed).and_then(|r| r)
    }

    /// Runs the dispatch loop until the transport closes.
    ///
    /// Spawn this once in a background task; a second call panics.
    pub async fn run(&self) {
        let Inbound {
            receiver,
            mut message_rx,
        } = self
            .inbound
            .lock()
            .await
            .take()
            .expect("run() can only be called once");

        let receiver_handle = tokio::spawn(async move {
            if let Err(error) = receiver.run().await {
                tracing::error!(target = "qix.connection", %error, "transport loop failed");
            }
        });

        while let Some(frame) = message_rx.recv().await {
            match serde_json::from_value::<Message>(frame.clone()) {
                Ok(message) => self.dispatch(message).await,
                Err(error) => {
                    tracing::error!(target = "qix.connection", %error, %frame, "unattributable frame");
                }
            }
        }

        tracing::debug!(target = "qix.connection", "message loop ended (transport closed)");
        self.fail_pending().await;
        self.emit(EngineEvent::ConnectionClosed);

        let _ = receiver_handle.await;
    }

    async fn dispatch(&self, message: Message) {
        match message {
            Message::Response(response) => {
                let Some(callback) = self.callbacks.lock().await.remove(&response.id) else {
                    tracing::error!(
                        target = "qix.connection",
                        id = response.id,
                        "response for unknown request"
                    );
                    return;
                };

                let result = match response.error {
                    Some(payload) => Err(engine_error(payload)),
                    None => Ok(response.result.unwrap_or(Value::Null)),
                };

                // Receiver may have been dropped by an abandoned caller.
                let _ = callback.send(result);
            }
            Message::Push(Push { method, params }) => {
                tracing::debug!(target = "qix.connection", %method, "engine push");
                self.emit(EngineEvent::Push { method, params });
            }
        }
    }

    async fn fail_pending(&self) {
        let pending = std::mem::take(&mut *self.callbacks.lock().await);
        for (_, callback) in pending {
            let _ = callback.send(Err(Error::ChannelClosed));
        }
    }

    fn emit(&self, event: EngineEvent) {
        if let Some(sink) = self.event_sink.lock().as_ref() {
            let _ = sink.send(event);
        }
    }
}

#[async_trait::async_trait]
impl EngineRpc for Connection {
    async fn call(&self, handle: i32, method: &str, params: Value) -> Result<Value> {
        self.send_message(handle, method, params).await
    }
}

fn engine_error(payload: ErrorPayload) -> Error {
    Error::Engine {
        code: payload.code,
        message: payload.message,
        parameter: payload.parameter,
    }
}
