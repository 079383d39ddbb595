//! End-to-end integration tests

use crate::supervisor_test::{ScriptedConnector, Step};
use rate_feed::cli::{replay, ReplaySummary};
use rate_feed::config::Config;
use rate_feed::feed::{CoinbaseAdapter, ExchangeCredentials};
use rate_feed::hub::{FeedHub, HubConfig};
use rate_feed::message::Exchange;
use rate_feed::pipeline::Pipeline;
use rate_feed::supervisor::SupervisorState;
use std::io::{BufReader, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

#[test]
fn test_config_example_loads() {
    let config = Config::parse(include_str!("../../config.toml.example")).unwrap();
    assert_eq!(config.hub.subscriber_buffer, 64);
    assert_eq!(config.kraken.pairs.len(), 4);
    assert!(config.telemetry.metrics_port.is_none());
}

#[test]
fn test_config_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
        [coinbase]
        enabled = false

        [kraken]
        pairs = ["ETH/USD"]
        "#
    )
    .unwrap();

    let config = Config::load(file.path()).unwrap();
    assert!(!config.coinbase.enabled);
    assert_eq!(config.kraken.pairs[0].to_string(), "ETH/USD");
    config.validate().unwrap();
}

#[test]
fn test_config_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::load(dir.path().join("absent.toml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

#[test]
fn test_replay_coinbase_capture() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, r#"{{"type":"subscriptions","channels":[{{"name":"ticker"}}]}}"#).unwrap();
    writeln!(
        file,
        r#"{{"type":"ticker","trade_id":1,"sequence":2,"time":"2019-05-13T12:38:32.617Z","product_id":"BTC-EUR","price":"7000.5","side":"buy","last_size":"0.1","best_bid":"7000.4","best_ask":"7000.5","open_24h":"6900","volume_24h":"10","low_24h":"6800","high_24h":"7100","volume_30d":"300"}}"#
    )
    .unwrap();
    writeln!(
        file,
        r#"{{"type":"ticker","trade_id":1,"sequence":2,"time":"2019-05-13T12:38:32.617Z","product_id":"LTC-EUR","price":"70.5","side":"buy","last_size":"0.1","best_bid":"70.4","best_ask":"70.5","open_24h":"69","volume_24h":"10","low_24h":"68","high_24h":"71","volume_30d":"300"}}"#
    )
    .unwrap();

    let adapter = CoinbaseAdapter::new(ExchangeCredentials::default());
    let input = BufReader::new(std::fs::File::open(file.path()).unwrap());
    let mut out = Vec::new();

    let summary = replay(&adapter, input, &mut out).unwrap();
    assert_eq!(
        summary,
        ReplaySummary {
            frames: 3,
            accepted: 1,
            dropped: 1,
            failed: 1,
            messages: 1,
        }
    );

    let output = String::from_utf8(out).unwrap();
    let line: serde_json::Value = serde_json::from_str(output.trim()).unwrap();
    assert_eq!(line["exchange"], "COINBASE");
    assert_eq!(line["pair"], "BTC/EUR");
    assert_eq!(line["rate"], "7000.5");
}

#[tokio::test]
async fn test_pipeline_end_to_end() {
    let mut config = Config::default();
    config.coinbase.enabled = false;
    config.supervisor.reconnect_delay_secs = 1;

    let connector = Arc::new(ScriptedConnector::new(vec![Step::Hold(vec![
        r#"{"event":"systemStatus","status":"online"}"#,
        r#"[7,[["3000.5","1.0","1600000000.5","b","l",""]],"trade","ETH/USD"]"#,
    ])]));

    let hub = Arc::new(FeedHub::new(HubConfig::default()));
    let (tx, mut rx) = mpsc::unbounded_channel();
    hub.subscribe("client", Arc::new(tx)).unwrap();

    let pipeline = Pipeline::start_with(&config, hub.clone(), connector.clone());

    let message = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out")
        .expect("sink closed");
    assert_eq!(message.exchange, Exchange::Kraken);
    assert_eq!(message.pair.to_string(), "ETH/USD");
    assert_eq!(message.timestamp, 1_600_000_000_500);

    let mut health = pipeline.health()[0].clone();
    assert!(health.wait_for(SupervisorState::Streaming).await);
    assert!(pipeline.is_healthy());

    pipeline.shutdown().await;
    assert_eq!(health.state(), SupervisorState::Stopped);
    assert_eq!(hub.subscriber_count(), 0);
    assert_eq!(connector.connects(), 1);
}
