//! Canonical messages
//!
//! Every exchange adapter produces [`PriceMessage`]s. The wider
//! [`SocketMessage`] union is what goes out on client sockets.

use crate::currency::{Currency, CurrencyPair};
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Source of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Exchange {
    Kraken,
    Coinbase,
    FakeLocal,
}

impl Exchange {
    /// Lower-case name used in logs and metric labels
    pub fn as_str(self) -> &'static str {
        match self {
            Exchange::Kraken => "kraken",
            Exchange::Coinbase => "coinbase",
            Exchange::FakeLocal => "fake_local",
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized rate update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceMessage {
    /// Milliseconds since the Unix epoch, as reported by the exchange
    pub timestamp: i64,
    pub exchange: Exchange,
    pub pair: CurrencyPair,
    pub rate: Decimal,
}

impl PriceMessage {
    pub fn new(timestamp: i64, exchange: Exchange, pair: CurrencyPair, rate: Decimal) -> Self {
        Self {
            timestamp,
            exchange,
            pair,
            rate,
        }
    }

    /// Exchange timestamp as a UTC date-time
    pub fn time(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp).single()
    }
}

/// Executed trade reported by an exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeMessage {
    pub timestamp: i64,
    pub exchange: Exchange,
    pub pair: CurrencyPair,
    pub price: Decimal,
    pub volume: Decimal,
}

/// Balance of a single wallet currency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletStateMessage {
    pub timestamp: i64,
    pub exchange: Exchange,
    pub currency: Currency,
    pub balance: Decimal,
}

/// Discriminant of [`SocketMessage`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageKind {
    PriceUpdate,
    Trade,
    WalletState,
}

/// Message sent to client sockets, tagged by kind
///
/// The hub only carries price updates; the other variants are for
/// collaborators that multiplex more data over the same socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SocketMessage {
    PriceUpdate(PriceMessage),
    Trade(TradeMessage),
    WalletState(WalletStateMessage),
}

impl SocketMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            SocketMessage::PriceUpdate(_) => MessageKind::PriceUpdate,
            SocketMessage::Trade(_) => MessageKind::Trade,
            SocketMessage::WalletState(_) => MessageKind::WalletState,
        }
    }

    pub fn exchange(&self) -> Exchange {
        match self {
            SocketMessage::PriceUpdate(m) => m.exchange,
            SocketMessage::Trade(m) => m.exchange,
            SocketMessage::WalletState(m) => m.exchange,
        }
    }

    pub fn timestamp(&self) -> i64 {
        match self {
            SocketMessage::PriceUpdate(m) => m.timestamp,
            SocketMessage::Trade(m) => m.timestamp,
            SocketMessage::WalletState(m) => m.timestamp,
        }
    }
}

impl From<PriceMessage> for SocketMessage {
    fn from(message: PriceMessage) -> Self {
        SocketMessage::PriceUpdate(message)
    }
}
