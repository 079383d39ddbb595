//! WebSocket transport
//!
//! A thin connection abstraction over tokio-tungstenite with ping/pong
//! keepalive. Reconnection lives in the supervisor.

mod client;
mod types;

pub use client::{Connection, Connector, WsClient};
pub use types::{WsConfig, WsError, WsMessage};
