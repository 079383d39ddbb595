//! Kraken trade channel adapter
//!
//! Trade frames are positional arrays and batch several trades:
//! `[channelID, [[price, volume, time, side, orderType, misc], ...], "trade", "XBT/USD"]`

use super::{str_field, ExchangeAdapter, FeedError};
use crate::currency::{Currency, CurrencyPair};
use crate::message::{Exchange, PriceMessage};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use std::str::FromStr;

/// Kraken public WebSocket feed URL
pub const KRAKEN_WS_URL: &str = "wss://ws.kraken.com";

/// Subscription name of the trade channel
const TRADE_CHANNEL: &str = "trade";

/// Kraken asset codes understood by this adapter
const CURRENCY_CODES: [(&str, Currency); 4] = [
    ("XBT", Currency::BTC),
    ("ETH", Currency::ETH),
    ("EUR", Currency::EUR),
    ("USD", Currency::USD),
];

/// Subscription details block
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct KrakenSubscriptionInfo {
    pub name: String,
}

/// Subscription handshake for the trade channel
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct KrakenSubscription {
    pub event: String,
    pub pair: Vec<String>,
    pub subscription: KrakenSubscriptionInfo,
}

/// Adapter for the Kraken trade channel
pub struct KrakenAdapter {
    url: String,
    pairs: Vec<CurrencyPair>,
}

impl KrakenAdapter {
    /// Create an adapter for the public Kraken feed
    pub fn new(pairs: Vec<CurrencyPair>) -> Self {
        Self::with_url(KRAKEN_WS_URL, pairs)
    }

    /// Create an adapter pointing at a custom feed address
    pub fn with_url(url: impl Into<String>, pairs: Vec<CurrencyPair>) -> Self {
        Self {
            url: url.into(),
            pairs,
        }
    }

    /// Pairs subscribed on connect
    pub fn pairs(&self) -> &[CurrencyPair] {
        &self.pairs
    }

    /// Build the trade subscription for the given pairs
    pub fn build_subscription(&self, pairs: &[CurrencyPair]) -> KrakenSubscription {
        KrakenSubscription {
            event: "subscribe".to_string(),
            pair: pairs.iter().map(CurrencyPair::to_string).collect(),
            subscription: KrakenSubscriptionInfo {
                name: TRADE_CHANNEL.to_string(),
            },
        }
    }

    /// Resolve a Kraken asset code
    pub fn currency_for(code: &str) -> Option<Currency> {
        CURRENCY_CODES
            .iter()
            .find(|(known, _)| *known == code)
            .map(|(_, currency)| *currency)
    }

    /// Resolve a Kraken pair name such as `XBT/USD`
    pub fn pair_for(name: &str) -> Result<CurrencyPair, FeedError> {
        let tokens: Vec<&str> = name.split('/').collect();
        let [base, target] = tokens.as_slice() else {
            return Err(FeedError::UnknownInstrument(name.to_string()));
        };

        match (Self::currency_for(base), Self::currency_for(target)) {
            (Some(base), Some(target)) => Ok(CurrencyPair::of(base, target)),
            _ => Err(FeedError::UnknownInstrument(name.to_string())),
        }
    }
}

/// Decimal held in a JSON string or number, without going through f64
fn decimal_of(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(text) => Decimal::from_str(text)
            .or_else(|_| Decimal::from_scientific(text))
            .ok(),
        Value::Number(number) => {
            let text = number.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .ok()
        }
        _ => None,
    }
}

/// A trade entry whose price and volume slots are decimals
fn is_trade_entry(entry: &Value) -> bool {
    match entry.as_array() {
        Some(slots) if slots.len() >= 2 => {
            decimal_of(&slots[0]).is_some() && decimal_of(&slots[1]).is_some()
        }
        _ => false,
    }
}

impl ExchangeAdapter for KrakenAdapter {
    fn exchange(&self) -> Exchange {
        Exchange::Kraken
    }

    fn feed_url(&self) -> &str {
        &self.url
    }

    fn subscription_message(&self) -> Result<String, FeedError> {
        let subscription = self.build_subscription(&self.pairs);
        Ok(serde_json::to_string(&subscription)?)
    }

    fn is_valid_frame(&self, frame: &Value) -> bool {
        let Some(items) = frame.as_array() else {
            return false;
        };
        if items.len() != 4 {
            return false;
        }

        let channel_ok = items[0].is_i64() || items[0].is_u64();
        let Some(trades) = items[1].as_array() else {
            return false;
        };
        if !channel_ok || items[2].as_str() != Some(TRADE_CHANNEL) {
            return false;
        }

        let pair_ok = items[3]
            .as_str()
            .is_some_and(|name| Self::pair_for(name).is_ok());

        pair_ok && trades.iter().all(is_trade_entry)
    }

    fn normalize(&self, frame: &Value) -> Result<Vec<PriceMessage>, FeedError> {
        let malformed = || FeedError::MalformedFrame("not a trade frame".to_string());

        let items = frame.as_array().ok_or_else(malformed)?;
        let trades = items.get(1).and_then(Value::as_array).ok_or_else(malformed)?;
        let name = items.get(3).and_then(Value::as_str).ok_or_else(malformed)?;
        let pair = Self::pair_for(name)?;

        trades
            .iter()
            .map(|entry| {
                let slots = entry.as_array().ok_or_else(malformed)?;
                let rate = slots.first().and_then(decimal_of).ok_or_else(|| {
                    FeedError::MalformedFrame("trade price is not a decimal".to_string())
                })?;
                let seconds = slots.get(2).and_then(decimal_of).ok_or_else(|| {
                    FeedError::MalformedFrame("trade time is not a decimal".to_string())
                })?;
                let timestamp = seconds
                    .checked_mul(Decimal::ONE_THOUSAND)
                    .and_then(|millis| millis.floor().to_i64())
                    .ok_or_else(|| {
                        FeedError::MalformedFrame(format!("trade time {seconds} out of range"))
                    })?;

                Ok(PriceMessage::new(timestamp, Exchange::Kraken, pair, rate))
            })
            .collect()
    }

    fn inspect_control_frame(&self, frame: &Value) {
        match frame.get("event").and_then(Value::as_str) {
            Some("subscriptionStatus") => {
                let pair = str_field(frame, "pair");
                let status = str_field(frame, "status");
                if status == "error" {
                    let error = str_field(frame, "errorMessage");
                    tracing::warn!(exchange = "kraken", pair, error, "Subscription rejected");
                } else {
                    tracing::info!(exchange = "kraken", pair, status, "Subscription status");
                }
            }
            Some("systemStatus") => {
                let status = str_field(frame, "status");
                tracing::info!(exchange = "kraken", status, "System status");
            }
            _ => {}
        }
    }
}
