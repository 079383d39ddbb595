//! Per-sink delivery channels
//!
//! Drop-oldest sinks sit behind a `broadcast` channel, whose receivers
//! lose the oldest values when they lag. Disconnect sinks sit behind an
//! `mpsc` channel fed with `try_send`, so a full buffer is reported back
//! to the publisher.

use super::OverflowPolicy;
use crate::message::PriceMessage;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc::{self, error::TrySendError};

/// Largest per-sink buffer
pub const MAX_BUFFER: usize = 1 << 16;

/// Result of handing a message to an [`Outbox`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Push {
    Queued,
    /// Buffer full under [`OverflowPolicy::Disconnect`]
    Overflow,
    /// Forwarder already gone
    Closed,
}

/// What a forwarder gets from its [`Inbox`]
#[derive(Debug)]
pub(crate) enum Received {
    Message(PriceMessage),
    /// This many of the oldest messages were discarded
    Lagged(u64),
    Closed,
}

/// Sending half, held by the hub registry
pub(crate) enum Outbox {
    Lossy(broadcast::Sender<PriceMessage>),
    Strict(mpsc::Sender<PriceMessage>),
}

/// Receiving half, owned by the sink's forwarder task
pub(crate) enum Inbox {
    Lossy(broadcast::Receiver<PriceMessage>),
    Strict(mpsc::Receiver<PriceMessage>),
}

/// Create a buffer of `capacity` messages for one sink
///
/// Drop-oldest buffers are rounded up to a power of two.
pub(crate) fn channel(capacity: usize, policy: OverflowPolicy) -> (Outbox, Inbox) {
    let capacity = capacity.clamp(1, MAX_BUFFER);
    match policy {
        OverflowPolicy::DropOldest => {
            let (tx, rx) = broadcast::channel(capacity);
            (Outbox::Lossy(tx), Inbox::Lossy(rx))
        }
        OverflowPolicy::Disconnect => {
            let (tx, rx) = mpsc::channel(capacity);
            (Outbox::Strict(tx), Inbox::Strict(rx))
        }
    }
}

impl Outbox {
    /// Enqueue without blocking
    pub(crate) fn push(&self, message: PriceMessage) -> Push {
        match self {
            Outbox::Lossy(tx) => match tx.send(message) {
                Ok(_) => Push::Queued,
                Err(_) => Push::Closed,
            },
            Outbox::Strict(tx) => match tx.try_send(message) {
                Ok(()) => Push::Queued,
                Err(TrySendError::Full(_)) => Push::Overflow,
                Err(TrySendError::Closed(_)) => Push::Closed,
            },
        }
    }
}

impl Inbox {
    pub(crate) async fn recv(&mut self) -> Received {
        match self {
            Inbox::Lossy(rx) => match rx.recv().await {
                Ok(message) => Received::Message(message),
                Err(RecvError::Lagged(skipped)) => Received::Lagged(skipped),
                Err(RecvError::Closed) => Received::Closed,
            },
            Inbox::Strict(rx) => match rx.recv().await {
                Some(message) => Received::Message(message),
                None => Received::Closed,
            },
        }
    }
}
