//! Transport seam between the connection and the socket.
//!
//! The connection never touches the websocket directly; it talks to a boxed
//! [`Transport`] sender and drains frames a [`TransportReceiver`] pumps into
//! an unbounded channel. That keeps the correlation layer testable without a
//! live engine.

use std::future::Future;
use std::pin::Pin;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::Result;

/// Outbound half: serializes one JSON frame to the peer.
pub trait Transport: Send {
    fn send(&mut self, message: Value) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Inbound half: owns the read loop until the peer closes.
pub trait TransportReceiver: Send {
    fn run(self: Box<Self>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>>;
}

/// Everything a [`crate::Connection`] needs to operate.
pub struct TransportParts {
    pub sender: Box<dyn Transport>,
    pub receiver: Box<dyn TransportReceiver>,
    pub message_rx: mpsc::UnboundedReceiver<Value>,
}

type WsSink = futures_util::stream::SplitSink<
    WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
    WsMessage,
>;
type WsSource = futures_util::stream::SplitStream<WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>>;

/// Websocket transport for a live engine endpoint.
pub struct SocketTransport;

impl SocketTransport {
    /// Dials `url` and returns the connected transport parts.
    pub async fn connect(url: &str) -> Result<TransportParts> {
        let (socket, _response) = connect_async(url).await?;
        let (sink, source) = socket.split();
        let (message_tx, message_rx) = mpsc::unbounded_channel();

        Ok(TransportParts {
            sender: Box::new(SocketSender { sink }),
            receiver: Box::new(SocketReceiver { source, message_tx }),
            message_rx,
        })
    }
}

struct SocketSender {
    sink: WsSink,
}

impl Transport for SocketSender {
    fn send(&mut self, message: Value) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            let text = serde_json::to_string(&message)?;
            self.sink.send(WsMessage::Text(text)).await?;
            Ok(())
        })
    }
}

struct SocketReceiver {
    source: WsSource,
    message_tx: mpsc::UnboundedSender<Value>,
}

impl TransportReceiver for SocketReceiver {
    fn run(mut self: Box<Self>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> {
        Box::pin(async move {
            while let Some(frame) = self.source.next().await {
                let frame = frame?;
                let text = match frame {
                    WsMessage::Text(text) => text,
                    WsMessage::Close(_) => break,
                    // Engine frames are always text; ignore pings and the like.
                    _ => continue,
                };

                match serde_json::from_str::<Value>(&text) {
                    Ok(value) => {
                        if self.message_tx.send(value).is_err() {
                            break;
                        }
                    }
                    Err(error) => {
                        tracing::error!(target = "qix.transport", %error, "unparseable frame");
                    }
                }
            }
            Ok(())
        })
    }
}
