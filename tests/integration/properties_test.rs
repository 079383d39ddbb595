//! Property tests for pairs and frame predicates

use proptest::prelude::*;
use rate_feed::currency::{Currency, CurrencyPair};
use rate_feed::feed::{CoinbaseAdapter, ExchangeAdapter, ExchangeCredentials, KrakenAdapter};
use serde_json::{json, Map, Value};

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

fn currency() -> impl Strategy<Value = Currency> {
    prop::sample::select(Currency::ALL.to_vec())
}

/// Per-field fate: kept, removed or nulled
#[derive(Debug, Clone, Copy)]
enum Fate {
    Keep,
    Remove,
    Null,
}

fn fate() -> impl Strategy<Value = Fate> {
    prop_oneof![
        6 => Just(Fate::Keep),
        1 => Just(Fate::Remove),
        1 => Just(Fate::Null),
    ]
}

fn field_value(field: &str) -> Value {
    match field {
        "product_id" => json!("BTC-USD"),
        "sequence" | "trade_id" => json!(42),
        "side" => json!("buy"),
        "type" => json!("ticker"),
        "time" => json!("2019-05-13T12:38:32.617Z"),
        _ => json!("1.5"),
    }
}

proptest! {
    #[test]
    fn pair_round_trips(base in currency(), target in currency()) {
        let pair = CurrencyPair::of(base, target);
        let parsed: CurrencyPair = pair.to_string().parse().unwrap();
        prop_assert_eq!(parsed, pair);
        prop_assert_eq!(parsed.direction(), pair.direction());
    }

    #[test]
    fn pair_parse_is_case_insensitive(base in currency(), target in currency()) {
        let pair = CurrencyPair::of(base, target);
        let parsed: CurrencyPair = pair.to_string().to_lowercase().parse().unwrap();
        prop_assert_eq!(parsed, pair);
    }

    #[test]
    fn coinbase_valid_iff_all_fields_present(
        fates in prop::collection::vec(fate(), TICK_FIELDS.len()),
        extra in prop::option::of("[a-z]{3,8}"),
    ) {
        let mut object = Map::new();
        for (field, fate) in TICK_FIELDS.iter().zip(&fates) {
            match fate {
                Fate::Keep => { object.insert(field.to_string(), field_value(field)); }
                Fate::Null => { object.insert(field.to_string(), Value::Null); }
                Fate::Remove => {}
            }
        }
        if let Some(name) = extra {
            if !TICK_FIELDS.contains(&name.as_str()) {
                object.insert(name, json!("extra"));
            }
        }

        let adapter = CoinbaseAdapter::new(ExchangeCredentials::default());
        let expected = fates.iter().all(|f| matches!(f, Fate::Keep));
        prop_assert_eq!(adapter.is_valid_frame(&Value::Object(object)), expected);
    }

    #[test]
    fn kraken_rejects_wrong_length(len in (0usize..8).prop_filter("not four", |n| *n != 4)) {
        let mut items = vec![
            json!(0),
            json!([["1.0", "1.0", "1.0", "b", "l", ""]]),
            json!("trade"),
            json!("XBT/USD"),
        ];
        items.resize(len, json!(null));

        let adapter = KrakenAdapter::new(Vec::new());
        prop_assert!(!adapter.is_valid_frame(&Value::Array(items)));
    }

    #[test]
    fn kraken_rejects_other_channels(channel in "[a-z]{1,10}".prop_filter("not trade", |c| c != "trade")) {
        let frame = json!([0, [["1.0", "1.0", "1.0", "b", "l", ""]], channel, "XBT/USD"]);
        let adapter = KrakenAdapter::new(Vec::new());
        prop_assert!(!adapter.is_valid_frame(&frame));
    }
}
