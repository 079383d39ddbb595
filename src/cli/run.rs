//! Run command implementation

use crate::config::Config;
use crate::hub::{FeedHub, Sink, SinkError};
use crate::message::{PriceMessage, SocketMessage};
use crate::pipeline::Pipeline;
use anyhow::Context;
use async_trait::async_trait;
use clap::Args;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Subscriber id the stdout sink registers under
    #[arg(long, default_value = "stdout")]
    pub subscriber: String,

    /// Seconds between supervisor status log lines
    #[arg(long, default_value_t = 60)]
    pub status_interval: u64,
}

impl RunArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let hub = Arc::new(FeedHub::new(config.hub.clone()));
        let pipeline = Pipeline::start(config, hub.clone());

        let sink: Arc<dyn Sink> = Arc::new(JsonLinesSink::new(tokio::io::stdout()));
        hub.subscribe(self.subscriber.clone(), sink.clone())?;

        let mut status = tokio::time::interval(Duration::from_secs(self.status_interval.max(1)));
        status.tick().await;

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                result = &mut ctrl_c => {
                    result.context("Failed to listen for Ctrl-C")?;
                    break;
                }
                _ = status.tick() => {
                    for health in pipeline.health() {
                        tracing::info!(
                            exchange = %health.exchange(),
                            state = %health.state(),
                            reconnects = health.reconnects(),
                            "Supervisor status"
                        );
                    }
                }
            }
        }

        tracing::info!("Shutting down");
        hub.unsubscribe(&self.subscriber, &sink);
        pipeline.shutdown().await;

        Ok(())
    }
}

/// Sink writing each message as one JSON line tagged `PRICE_UPDATE`
pub struct JsonLinesSink<W> {
    out: Mutex<W>,
}

impl<W> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

#[async_trait]
impl<W> Sink for JsonLinesSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn deliver(&self, message: PriceMessage) -> Result<(), SinkError> {
        let mut line = serde_json::to_vec(&SocketMessage::from(message))
            .map_err(|e| SinkError::Unavailable(e.to_string()))?;
        line.push(b'\n');

        let mut out = self.out.lock().await;
        out.write_all(&line)
            .await
            .map_err(|e| SinkError::Unavailable(e.to_string()))?;
        out.flush()
            .await
            .map_err(|e| SinkError::Unavailable(e.to_string()))
    }
}
