//! Integration tests for exchange adapters

use rate_feed::currency::{Currency, CurrencyPair, ExchangeDirection, PairError};
use rate_feed::feed::{
    CoinbaseAdapter, ExchangeAdapter, ExchangeCredentials, FeedError, KrakenAdapter,
};
use rate_feed::message::Exchange;
use rust_decimal_macros::dec;
use serde_json::json;
use tokio_test::{assert_err, assert_ok};

fn coinbase() -> CoinbaseAdapter {
    CoinbaseAdapter::new(ExchangeCredentials::new("key", "pass", "secret"))
}

fn kraken() -> KrakenAdapter {
    KrakenAdapter::new(vec![CurrencyPair::of(Currency::BTC, Currency::EUR)])
}

fn ticker(product_id: &str) -> serde_json::Value {
    json!({
        "type": "ticker",
        "trade_id": 6529,
        "sequence": 1_082_462_104u64,
        "time": "2019-05-13T12:38:32.617000Z",
        "product_id": product_id,
        "price": "187.61",
        "side": "sell",
        "last_size": "1.2",
        "best_bid": "187.60",
        "best_ask": "187.61",
        "open_24h": "180.2",
        "volume_24h": "239234.8",
        "low_24h": "176.0",
        "high_24h": "197.05",
        "volume_30d": "5367842.1"
    })
}

#[test]
fn test_coinbase_eth_usd() {
    let adapter = coinbase();
    let frame = ticker("ETH-USD");
    assert!(adapter.is_valid_frame(&frame));

    let messages = assert_ok!(adapter.normalize(&frame));
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].pair, CurrencyPair::of(Currency::ETH, Currency::USD));
    assert_eq!(messages[0].exchange, Exchange::Coinbase);
    assert_eq!(messages[0].rate, dec!(187.61));
    assert_eq!(messages[0].timestamp, 1_557_751_112_617);
}

#[test]
fn test_coinbase_unregistered_product() {
    let frame = ticker("LTC-USD");
    let err = assert_err!(coinbase().normalize(&frame));
    assert!(matches!(err, FeedError::UnknownInstrument(ref id) if id == "LTC-USD"));
}

#[test]
fn test_coinbase_handshake() {
    let handshake: serde_json::Value =
        serde_json::from_str(&coinbase().subscription_message().unwrap()).unwrap();

    assert_eq!(handshake["type"], "subscribe");
    assert_eq!(handshake["channels"], json!(["ticker"]));
    assert_eq!(handshake["key"], "key");
    assert_eq!(handshake["passphrase"], "pass");
    assert_eq!(handshake["product_ids"].as_array().unwrap().len(), 4);
    assert!(handshake.get("secret").is_none());
    assert!(!handshake.to_string().contains("secret"));
}

#[test]
fn test_kraken_three_trades() {
    let frame = json!([
        321,
        [
            ["5541.20000", "0.15850568", "1534614057.321597", "s", "l", ""],
            ["6060.00000", "0.02455000", "1534614057.324998", "b", "l", ""],
            ["6000.10000", "1.00000000", "1534614060.999999", "b", "m", ""]
        ],
        "trade",
        "XBT/EUR"
    ]);

    let adapter = kraken();
    assert!(adapter.is_valid_frame(&frame));

    let messages = adapter.normalize(&frame).unwrap();
    assert_eq!(messages.len(), 3);

    let rates: Vec<_> = messages.iter().map(|m| m.rate).collect();
    assert_eq!(rates, vec![dec!(5541.2), dec!(6060), dec!(6000.1)]);

    let stamps: Vec<_> = messages.iter().map(|m| m.timestamp).collect();
    assert_eq!(stamps, vec![1_534_614_057_321, 1_534_614_057_324, 1_534_614_060_999]);

    assert!(messages
        .iter()
        .all(|m| m.pair == CurrencyPair::of(Currency::BTC, Currency::EUR)));
}

#[test]
fn test_kraken_rejects_bad_shapes() {
    let adapter = kraken();
    let trade = json!([["1.0", "1.0", "1.0", "b", "l", ""]]);

    assert!(!adapter.is_valid_frame(&json!([0, trade, "trade"])));
    assert!(!adapter.is_valid_frame(&json!([0, trade, "trade", "XBT/EUR", 1])));
    assert!(!adapter.is_valid_frame(&json!([0, trade, "spread", "XBT/EUR"])));
    assert!(!adapter.is_valid_frame(&json!([0, trade, "trade", "DOGE/EUR"])));
    assert!(!adapter.is_valid_frame(&json!([0, trade, "trade", "XBTEUR"])));
    assert!(!adapter.is_valid_frame(&json!(["0", trade, "trade", "XBT/EUR"])));
    assert!(!adapter.is_valid_frame(&json!([0, [["x", "1.0"]], "trade", "XBT/EUR"])));
    assert!(!adapter.is_valid_frame(&json!({"event": "heartbeat"})));
}

#[test]
fn test_pair_parsing() {
    let pair: CurrencyPair = "BTC/USD".parse().unwrap();
    assert_eq!(pair.direction(), ExchangeDirection::SellCrypto);
    assert_eq!(pair.to_string(), "BTC/USD");

    assert!(matches!("BTC-USD".parse::<CurrencyPair>(), Err(PairError::InvalidFormat(_))));
    assert!(matches!("XYZ/USD".parse::<CurrencyPair>(), Err(PairError::InvalidFormat(_))));
    assert!(matches!("BTC/USD/".parse::<CurrencyPair>(), Err(PairError::InvalidFormat(_))));

    let lower: CurrencyPair = "eur/eth".parse().unwrap();
    assert_eq!(lower.direction(), ExchangeDirection::BuyCrypto);
}
