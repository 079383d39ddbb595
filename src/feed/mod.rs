//! Exchange adapters
//!
//! Each adapter owns one exchange's wire protocol: the subscription
//! handshake, the frame validity predicate and the mapping into
//! canonical [`PriceMessage`]s.

mod coinbase;
mod kraken;
mod types;

pub use coinbase::{CoinbaseAdapter, COINBASE_WS_URL};
pub use kraken::{KrakenAdapter, KRAKEN_WS_URL};
pub use types::{ExchangeCredentials, FeedError};

use crate::message::{Exchange, PriceMessage};
use serde_json::Value;

/// Wire protocol of a single exchange
///
/// Validation and normalization are pure; the connection supervisor
/// owns all I/O.
pub trait ExchangeAdapter: Send + Sync {
    /// Exchange this adapter speaks for
    fn exchange(&self) -> Exchange;

    /// Socket address of the exchange feed
    fn feed_url(&self) -> &str;

    /// Serialized subscription handshake sent right after connecting
    fn subscription_message(&self) -> Result<String, FeedError>;

    /// Structural check of a raw frame; `false` means drop silently
    fn is_valid_frame(&self, frame: &Value) -> bool;

    /// Map a valid frame to zero or more price messages
    fn normalize(&self, frame: &Value) -> Result<Vec<PriceMessage>, FeedError>;

    /// Look at a frame that failed validation (status, heartbeat, errors)
    fn inspect_control_frame(&self, _frame: &Value) {}
}

/// String field of a JSON object, empty when absent or not a string
pub(crate) fn str_field<'a>(frame: &'a Value, key: &str) -> &'a str {
    frame.get(key).and_then(Value::as_str).unwrap_or("")
}
