//! Integration tests for the broadcast hub

use async_trait::async_trait;
use rate_feed::currency::{Currency, CurrencyPair};
use rate_feed::hub::{FeedHub, HubConfig, OverflowPolicy, Sink, SinkError};
use rate_feed::message::{Exchange, PriceMessage};
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};

fn message(ts: i64) -> PriceMessage {
    PriceMessage::new(
        ts,
        Exchange::Coinbase,
        CurrencyPair::of(Currency::ETH, Currency::USD),
        Decimal::from(ts),
    )
}

async fn recv(rx: &mut mpsc::UnboundedReceiver<PriceMessage>) -> PriceMessage {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for message")
        .expect("sink closed")
}

/// Sink that blocks until its gate opens
struct GatedSink {
    gate: watch::Receiver<bool>,
    received: Mutex<Vec<i64>>,
}

#[async_trait]
impl Sink for GatedSink {
    async fn deliver(&self, message: PriceMessage) -> Result<(), SinkError> {
        let mut gate = self.gate.clone();
        gate.wait_for(|open| *open)
            .await
            .map_err(|_| SinkError::Unavailable("gate dropped".into()))?;
        self.received.lock().unwrap().push(message.timestamp);
        Ok(())
    }
}

#[tokio::test]
async fn test_subscribers_see_same_order() {
    let hub = FeedHub::default();
    let (tx_a, mut rx_a) = mpsc::unbounded_channel();
    let (tx_b, mut rx_b) = mpsc::unbounded_channel();
    hub.subscribe("alice", Arc::new(tx_a)).unwrap();
    hub.subscribe("bob", Arc::new(tx_b)).unwrap();

    for ts in 1..=10 {
        hub.publish(message(ts));
        tokio::task::yield_now().await;
    }

    for ts in 1..=10 {
        assert_eq!(recv(&mut rx_a).await.timestamp, ts);
        assert_eq!(recv(&mut rx_b).await.timestamp, ts);
    }
}

#[tokio::test]
async fn test_subscribe_before_and_after_publish() {
    let hub = FeedHub::default();

    let (early_tx, mut early_rx) = mpsc::unbounded_channel();
    hub.subscribe("early", Arc::new(early_tx)).unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(early_rx.try_recv().is_err());

    hub.publish(message(1));
    assert_eq!(recv(&mut early_rx).await, message(1));

    let (late_tx, mut late_rx) = mpsc::unbounded_channel();
    hub.subscribe("late", Arc::new(late_tx)).unwrap();
    assert_eq!(recv(&mut late_rx).await, message(1));
}

#[tokio::test]
async fn test_last_message_is_global_across_exchanges() {
    let hub = FeedHub::default();
    let pair = CurrencyPair::of(Currency::BTC, Currency::EUR);
    hub.publish(PriceMessage::new(1, Exchange::Kraken, pair, Decimal::ONE));
    hub.publish(PriceMessage::new(2, Exchange::Coinbase, pair, Decimal::TWO));

    let (tx, mut rx) = mpsc::unbounded_channel();
    hub.subscribe("late", Arc::new(tx)).unwrap();

    let replayed = recv(&mut rx).await;
    assert_eq!(replayed.exchange, Exchange::Coinbase);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_slow_sink_does_not_block_others() {
    let hub = FeedHub::new(HubConfig {
        subscriber_buffer: 4,
        overflow: OverflowPolicy::DropOldest,
    });

    let (open, gate) = watch::channel(false);
    let slow = Arc::new(GatedSink {
        gate,
        received: Mutex::new(Vec::new()),
    });
    hub.subscribe("slow", slow.clone()).unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    hub.subscribe("fast", Arc::new(tx)).unwrap();

    for ts in 0..100 {
        hub.publish(message(ts));
        tokio::task::yield_now().await;
    }

    for ts in 0..100 {
        assert_eq!(recv(&mut rx).await.timestamp, ts);
    }
    assert_eq!(hub.subscriber_count(), 2);

    open.send_replace(true);
    tokio::time::timeout(Duration::from_secs(1), async {
        while slow.received.lock().unwrap().len() < 5 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("slow sink should drain");

    assert_eq!(*slow.received.lock().unwrap(), vec![0, 96, 97, 98, 99]);
}

#[tokio::test]
async fn test_unsubscribe_last_sink_removes_id() {
    let hub = FeedHub::default();
    let (tx, _rx) = mpsc::unbounded_channel::<PriceMessage>();
    let sink: Arc<dyn Sink> = Arc::new(tx);

    hub.subscribe("only", sink.clone()).unwrap();
    assert_eq!(hub.sinks_for("only"), 1);

    assert!(hub.unsubscribe("only", &sink));
    assert_eq!(hub.sinks_for("only"), 0);
    assert_eq!(hub.subscriber_count(), 0);
}
