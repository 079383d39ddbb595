//! WebSocket types and configuration

use std::time::Duration;
use thiserror::Error;

/// WebSocket transport configuration
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// Interval for sending ping frames
    pub ping_interval: Duration,
    /// Timeout for pong response
    pub pong_timeout: Duration,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_secs(30),
            pong_timeout: Duration::from_secs(10),
        }
    }
}

impl WsConfig {
    /// Set ping interval
    pub fn ping_interval(mut self, d: Duration) -> Self {
        self.ping_interval = d;
        self
    }

    /// Set pong timeout
    pub fn pong_timeout(mut self, d: Duration) -> Self {
        self.pong_timeout = d;
        self
    }
}

/// Inbound WebSocket payloads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsMessage {
    /// Text message
    Text(String),
    /// Binary message
    Binary(Vec<u8>),
}

/// Transport failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WsError {
    /// Connection could not be opened or broke while reading
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    /// Frame could not be written
    #[error("Send failed: {0}")]
    SendFailed(String),
    /// Peer closed the connection
    #[error("Connection closed by peer")]
    Closed,
}
