//! Coinbase ticker channel adapter

use super::{str_field, ExchangeAdapter, ExchangeCredentials, FeedError};
use crate::currency::{Currency, CurrencyPair};
use crate::message::{Exchange, PriceMessage};
use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Coinbase Pro WebSocket feed URL
pub const COINBASE_WS_URL: &str = "wss://ws-feed.pro.coinbase.com";

/// Channel carrying one message per matched trade
const TICKER_CHANNEL: &str = "ticker";

/// Products this adapter subscribes to, in subscription order
const PRODUCTS: [(&str, Currency, Currency); 4] = [
    ("ETH-USD", Currency::ETH, Currency::USD),
    ("ETH-EUR", Currency::ETH, Currency::EUR),
    ("BTC-USD", Currency::BTC, Currency::USD),
    ("BTC-EUR", Currency::BTC, Currency::EUR),
];

/// Fields a ticker frame must carry, all non-null
const TICK_FIELDS: [&str; 15] = [
    "best_ask",
    "best_bid",
    "high_24h",
    "last_size",
    "low_24h",
    "open_24h",
    "price",
    "product_id",
    "sequence",
    "side",
    "time",
    "trade_id",
    "type",
    "volume_24h",
    "volume_30d",
];

/// Subscription handshake for the ticker channel
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CoinbaseSubscription {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub product_ids: Vec<String>,
    pub channels: Vec<String>,
    pub key: String,
    pub passphrase: String,
    /// Unix seconds, as a string
    pub timestamp: String,
}

/// Fields of a ticker frame used for normalization
///
/// Presence of the remaining ticker fields is checked by `is_valid_frame`.
#[derive(Debug, Deserialize)]
struct CoinbaseTick {
    price: Decimal,
    product_id: String,
    time: String,
}

/// Adapter for the Coinbase ticker channel
pub struct CoinbaseAdapter {
    url: String,
    credentials: ExchangeCredentials,
    products: HashMap<&'static str, CurrencyPair>,
}

impl CoinbaseAdapter {
    /// Create an adapter for the public Coinbase feed
    pub fn new(credentials: ExchangeCredentials) -> Self {
        Self::with_url(COINBASE_WS_URL, credentials)
    }

    /// Create an adapter pointing at a custom feed address
    pub fn with_url(url: impl Into<String>, credentials: ExchangeCredentials) -> Self {
        let products = PRODUCTS
            .iter()
            .map(|(code, base, target)| (*code, CurrencyPair::of(*base, *target)))
            .collect();

        Self {
            url: url.into(),
            credentials,
            products,
        }
    }

    /// Credentials this adapter was built with
    pub fn credentials(&self) -> &ExchangeCredentials {
        &self.credentials
    }

    /// Resolve a product id through the registry
    pub fn pair_for(&self, product_id: &str) -> Option<CurrencyPair> {
        self.products.get(product_id).copied()
    }

    /// Build the ticker subscription for the full product set
    pub fn build_subscription(&self, credentials: &ExchangeCredentials) -> CoinbaseSubscription {
        self.build_subscription_at(credentials, Utc::now().timestamp())
    }

    fn build_subscription_at(
        &self,
        credentials: &ExchangeCredentials,
        unix_secs: i64,
    ) -> CoinbaseSubscription {
        CoinbaseSubscription {
            msg_type: "subscribe".to_string(),
            product_ids: PRODUCTS.iter().map(|(code, _, _)| code.to_string()).collect(),
            channels: vec![TICKER_CHANNEL.to_string()],
            key: credentials.api_key.clone(),
            passphrase: credentials.passphrase.clone(),
            timestamp: unix_secs.to_string(),
        }
    }

    /// Normalize a single ticker frame
    pub fn normalize_tick(&self, frame: &Value) -> Result<PriceMessage, FeedError> {
        let tick = CoinbaseTick::deserialize(frame)
            .map_err(|e| FeedError::MalformedFrame(e.to_string()))?;

        let pair = self
            .pair_for(&tick.product_id)
            .ok_or_else(|| FeedError::UnknownInstrument(tick.product_id.clone()))?;

        let timestamp = parse_wire_time(&tick.time)
            .ok_or_else(|| FeedError::MalformedFrame(format!("bad time '{}'", tick.time)))?;

        Ok(PriceMessage::new(timestamp, Exchange::Coinbase, pair, tick.price))
    }
}

/// Convert a Coinbase wire time (UTC) to epoch milliseconds
///
/// Accepts RFC 3339 and zone-less ISO date-times.
fn parse_wire_time(text: &str) -> Option<i64> {
    if let Ok(time) = DateTime::parse_from_rfc3339(text) {
        return Some(time.with_timezone(&Utc).timestamp_millis());
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc().timestamp_millis())
}

impl ExchangeAdapter for CoinbaseAdapter {
    fn exchange(&self) -> Exchange {
        Exchange::Coinbase
    }

    fn feed_url(&self) -> &str {
        &self.url
    }

    fn subscription_message(&self) -> Result<String, FeedError> {
        let subscription = self.build_subscription(&self.credentials);
        Ok(serde_json::to_string(&subscription)?)
    }

    fn is_valid_frame(&self, frame: &Value) -> bool {
        match frame.as_object() {
            Some(object) => TICK_FIELDS
                .iter()
                .all(|field| object.get(*field).is_some_and(|v| !v.is_null())),
            None => false,
        }
    }

    fn normalize(&self, frame: &Value) -> Result<Vec<PriceMessage>, FeedError> {
        self.normalize_tick(frame).map(|message| vec![message])
    }

    fn inspect_control_frame(&self, frame: &Value) {
        match frame.get("type").and_then(Value::as_str) {
            Some("subscriptions") => {
                let channels = frame
                    .get("channels")
                    .map(|v| v.to_string())
                    .unwrap_or_default();
                tracing::info!(exchange = "coinbase", %channels, "Subscription confirmed");
            }
            Some("error") => {
                let error = str_field(frame, "message");
                let reason = str_field(frame, "reason");
                tracing::warn!(exchange = "coinbase", error, reason, "Exchange reported an error");
            }
            _ => {}
        }
    }
}
