//! WebSocket transport with ping/pong keepalive

use super::types::{WsConfig, WsError, WsMessage};
use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::{interval_at, sleep_until, Instant, Interval, MissedTickBehavior};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsStream = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Opens connections to a feed address
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a new connection
    async fn connect(&self, url: &str) -> Result<Box<dyn Connection>, WsError>;
}

/// A single open connection
#[async_trait]
pub trait Connection: Send {
    /// Write a text frame
    async fn send_text(&mut self, text: String) -> Result<(), WsError>;

    /// Wait for the next payload
    ///
    /// Returns `Err(WsError::Closed)` once the peer has gone away.
    async fn recv(&mut self) -> Result<WsMessage, WsError>;
}

/// Connector backed by tokio-tungstenite
pub struct WsClient {
    config: WsConfig,
}

impl WsClient {
    /// Create a new WebSocket client with the given configuration
    pub fn new(config: WsConfig) -> Self {
        Self { config }
    }
}

impl Default for WsClient {
    fn default() -> Self {
        Self::new(WsConfig::default())
    }
}

#[async_trait]
impl Connector for WsClient {
    async fn connect(&self, url: &str) -> Result<Box<dyn Connection>, WsError> {
        tracing::debug!(url, "Connecting to WebSocket");

        let (ws_stream, _response) = connect_async(url)
            .await
            .map_err(|e| WsError::ConnectionFailed(e.to_string()))?;

        let (write, read) = ws_stream.split();

        let mut ping_interval = interval_at(
            Instant::now() + self.config.ping_interval,
            self.config.ping_interval,
        );
        ping_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        Ok(Box::new(WsConnection {
            write,
            read,
            ping_interval,
            pong_timeout: self.config.pong_timeout,
            pong_deadline: None,
        }))
    }
}

struct WsConnection {
    write: WsSink,
    read: WsStream,
    ping_interval: Interval,
    pong_timeout: std::time::Duration,
    /// Set while a ping is outstanding
    pong_deadline: Option<Instant>,
}

#[async_trait]
impl Connection for WsConnection {
    async fn send_text(&mut self, text: String) -> Result<(), WsError> {
        self.write
            .send(Message::Text(text))
            .await
            .map_err(|e| WsError::SendFailed(e.to_string()))
    }

    async fn recv(&mut self) -> Result<WsMessage, WsError> {
        loop {
            let deadline = self.pong_deadline;
            let pong_wait = async move {
                match deadline {
                    Some(at) => sleep_until(at).await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                msg = self.read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => return Ok(WsMessage::Text(text)),
                        Some(Ok(Message::Binary(data))) => return Ok(WsMessage::Binary(data)),
                        Some(Ok(Message::Ping(data))) => {
                            self.write.send(Message::Pong(data)).await
                                .map_err(|e| WsError::SendFailed(e.to_string()))?;
                        }
                        Some(Ok(Message::Pong(_))) => {
                            self.pong_deadline = None;
                        }
                        Some(Ok(Message::Close(frame))) => {
                            tracing::debug!(?frame, "Received close frame");
                            return Err(WsError::Closed);
                        }
                        Some(Ok(Message::Frame(_))) => {}
                        Some(Err(e)) => {
                            return Err(WsError::ConnectionFailed(e.to_string()));
                        }
                        None => return Err(WsError::Closed),
                    }
                }

                _ = self.ping_interval.tick() => {
                    if self.pong_deadline.is_none() {
                        self.write.send(Message::Ping(Vec::new())).await
                            .map_err(|e| WsError::SendFailed(e.to_string()))?;
                        self.pong_deadline = Some(Instant::now() + self.pong_timeout);
                    }
                }

                _ = pong_wait => {
                    return Err(WsError::ConnectionFailed("Pong timeout".into()));
                }
            }
        }
    }
}
