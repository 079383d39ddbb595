//! Connection supervisor
//!
//! Owns one exchange's socket lifecycle: connect, send the handshake,
//! stream frames through the adapter into the hub and reconnect after a
//! flat delay whenever the transport fails. Only cancellation stops it.

mod state;

pub use state::{SupervisorHealth, SupervisorState};

use crate::feed::ExchangeAdapter;
use crate::hub::FeedHub;
use crate::telemetry::{self, CounterMetric};
use crate::ws::{Connector, WsError, WsMessage};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Delay between a transport failure and the next connection attempt
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Per-exchange feed supervisor
pub struct Supervisor {
    adapter: Arc<dyn ExchangeAdapter>,
    connector: Arc<dyn Connector>,
    hub: Arc<FeedHub>,
    reconnect_delay: Duration,
    state: watch::Sender<SupervisorState>,
    reconnects: Arc<AtomicU64>,
}

impl Supervisor {
    pub fn new(
        adapter: Arc<dyn ExchangeAdapter>,
        connector: Arc<dyn Connector>,
        hub: Arc<FeedHub>,
    ) -> Self {
        let (state, _) = watch::channel(SupervisorState::Disconnected);
        Self {
            adapter,
            connector,
            hub,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            state,
            reconnects: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Override the reconnect delay
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Health handle that stays valid after [`Supervisor::run`] takes ownership
    pub fn health(&self) -> SupervisorHealth {
        SupervisorHealth::new(
            self.adapter.exchange(),
            self.state.subscribe(),
            self.reconnects.clone(),
        )
    }

    fn set_state(&self, state: SupervisorState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            tracing::debug!(
                exchange = %self.adapter.exchange(),
                from = %previous,
                to = %state,
                "Supervisor state change"
            );
        }
    }

    /// Run until `cancel` fires
    ///
    /// Transport failures never escape; each one leads to a cancellable
    /// backoff and a fresh connection attempt.
    pub async fn run(self, cancel: CancellationToken) {
        let exchange = self.adapter.exchange();
        let mut attempt: u64 = 0;

        tracing::info!(%exchange, url = self.adapter.feed_url(), "Starting feed supervisor");

        loop {
            if attempt > 0 {
                self.reconnects.fetch_add(1, Ordering::Relaxed);
                telemetry::increment_counter(CounterMetric::Reconnects, exchange);
            }
            attempt += 1;

            let outcome = tokio::select! {
                _ = cancel.cancelled() => break,
                result = self.session() => result,
            };

            if let Err(e) = outcome {
                tracing::warn!(
                    %exchange,
                    attempt,
                    error = %e,
                    delay_ms = self.reconnect_delay.as_millis() as u64,
                    "Feed connection lost, reconnecting"
                );
            }

            self.set_state(SupervisorState::Backoff);
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.reconnect_delay) => {}
            }
        }

        self.set_state(SupervisorState::Stopped);
        tracing::info!(%exchange, "Feed supervisor stopped");
    }

    /// One connection from open to failure
    async fn session(&self) -> Result<(), WsError> {
        let exchange = self.adapter.exchange();

        self.set_state(SupervisorState::Connecting);
        let mut connection = self.connector.connect(self.adapter.feed_url()).await?;

        let subscription = self
            .adapter
            .subscription_message()
            .map_err(|e| WsError::SendFailed(e.to_string()))?;
        connection.send_text(subscription).await?;
        self.set_state(SupervisorState::Subscribed);
        tracing::info!(%exchange, "Subscribed to feed");

        loop {
            let payload = connection.recv().await?;
            if !self.state.borrow().is_streaming() {
                self.set_state(SupervisorState::Streaming);
            }

            match payload {
                WsMessage::Text(text) => {
                    self.process_frame(&text);
                }
                WsMessage::Binary(data) => match std::str::from_utf8(&data) {
                    Ok(text) => {
                        self.process_frame(text);
                    }
                    Err(_) => {
                        telemetry::increment_counter(CounterMetric::FramesDropped, exchange);
                        tracing::trace!(
                            %exchange,
                            len = data.len(),
                            "Dropping non-UTF-8 binary frame"
                        );
                    }
                },
            }
        }
    }

    /// Validate, normalize and publish one raw frame
    ///
    /// Returns the number of messages published. Unparseable or invalid
    /// frames are dropped; a normalization error is logged and affects
    /// only this frame.
    pub fn process_frame(&self, text: &str) -> usize {
        let exchange = self.adapter.exchange();
        telemetry::increment_counter(CounterMetric::FramesReceived, exchange);

        let frame: Value = match serde_json::from_str(text) {
            Ok(frame) => frame,
            Err(e) => {
                telemetry::increment_counter(CounterMetric::FramesDropped, exchange);
                tracing::trace!(%exchange, error = %e, "Dropping unparseable frame");
                return 0;
            }
        };

        if !self.adapter.is_valid_frame(&frame) {
            self.adapter.inspect_control_frame(&frame);
            telemetry::increment_counter(CounterMetric::FramesDropped, exchange);
            return 0;
        }

        match self.adapter.normalize(&frame) {
            Ok(messages) => {
                let count = messages.len();
                for message in messages {
                    self.hub.publish(message);
                    telemetry::increment_counter(CounterMetric::MessagesPublished, exchange);
                }
                count
            }
            Err(e) => {
                telemetry::increment_counter(CounterMetric::NormalizeErrors, exchange);
                tracing::warn!(%exchange, error = %e, "Failed to normalize frame");
                0
            }
        }
    }
}
