//! Subscriber sinks

use crate::message::PriceMessage;
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// Sink delivery errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    /// The sink can no longer accept messages
    #[error("Sink unavailable: {0}")]
    Unavailable(String),
}

/// Destination for published messages, owned by the caller
///
/// A sink may be slow; the hub feeds it from a dedicated bounded queue
/// so it never holds up other sinks or the feed supervisors.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Deliver one message; an error unregisters the sink
    async fn deliver(&self, message: PriceMessage) -> Result<(), SinkError>;
}

#[async_trait]
impl Sink for mpsc::Sender<PriceMessage> {
    async fn deliver(&self, message: PriceMessage) -> Result<(), SinkError> {
        self.send(message)
            .await
            .map_err(|_| SinkError::Unavailable("receiver dropped".to_string()))
    }
}

#[async_trait]
impl Sink for mpsc::UnboundedSender<PriceMessage> {
    async fn deliver(&self, message: PriceMessage) -> Result<(), SinkError> {
        self.send(message)
            .map_err(|_| SinkError::Unavailable("receiver dropped".to_string()))
    }
}
