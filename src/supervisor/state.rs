//! Supervisor lifecycle state

use crate::message::Exchange;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Connection lifecycle of one exchange feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SupervisorState {
    Disconnected,
    Connecting,
    /// Handshake sent, no frame received yet
    Subscribed,
    Streaming,
    /// Waiting out the reconnect delay
    Backoff,
    /// Terminal, after cancellation
    Stopped,
}

impl SupervisorState {
    pub fn as_str(self) -> &'static str {
        match self {
            SupervisorState::Disconnected => "disconnected",
            SupervisorState::Connecting => "connecting",
            SupervisorState::Subscribed => "subscribed",
            SupervisorState::Streaming => "streaming",
            SupervisorState::Backoff => "backoff",
            SupervisorState::Stopped => "stopped",
        }
    }

    pub fn is_streaming(self) -> bool {
        self == SupervisorState::Streaming
    }
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only view of a running supervisor
#[derive(Debug, Clone)]
pub struct SupervisorHealth {
    exchange: Exchange,
    state: watch::Receiver<SupervisorState>,
    reconnects: Arc<AtomicU64>,
}

impl SupervisorHealth {
    pub(crate) fn new(
        exchange: Exchange,
        state: watch::Receiver<SupervisorState>,
        reconnects: Arc<AtomicU64>,
    ) -> Self {
        Self {
            exchange,
            state,
            reconnects,
        }
    }

    pub fn exchange(&self) -> Exchange {
        self.exchange
    }

    /// Current lifecycle state
    pub fn state(&self) -> SupervisorState {
        *self.state.borrow()
    }

    /// Connection attempts made after the first one
    pub fn reconnects(&self) -> u64 {
        self.reconnects.load(Ordering::Relaxed)
    }

    /// Wait until the supervisor reaches `target`
    ///
    /// Returns false if the supervisor went away first.
    pub async fn wait_for(&mut self, target: SupervisorState) -> bool {
        self.state.wait_for(|state| *state == target).await.is_ok()
    }
}
