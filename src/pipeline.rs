//! Feed pipeline
//!
//! Wires adapters, supervisors and the hub together: one supervisor task
//! per enabled exchange, all publishing into a shared [`FeedHub`].

use crate::config::Config;
use crate::feed::{CoinbaseAdapter, ExchangeAdapter, KrakenAdapter};
use crate::hub::FeedHub;
use crate::supervisor::{Supervisor, SupervisorHealth};
use crate::ws::{Connector, WsClient};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Running set of feed supervisors
pub struct Pipeline {
    hub: Arc<FeedHub>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
    health: Vec<SupervisorHealth>,
}

impl Pipeline {
    /// Start every exchange enabled in `config` over real WebSockets
    pub fn start(config: &Config, hub: Arc<FeedHub>) -> Self {
        let connector: Arc<dyn Connector> =
            Arc::new(WsClient::new(config.supervisor.ws_config()));
        Self::start_with(config, hub, connector)
    }

    /// Like [`Pipeline::start`] with a caller-supplied transport
    pub fn start_with(config: &Config, hub: Arc<FeedHub>, connector: Arc<dyn Connector>) -> Self {
        Self::spawn(
            adapters_from(config),
            connector,
            hub,
            config.supervisor.reconnect_delay(),
        )
    }

    /// Spawn one supervisor per adapter
    pub fn spawn(
        adapters: Vec<Arc<dyn ExchangeAdapter>>,
        connector: Arc<dyn Connector>,
        hub: Arc<FeedHub>,
        reconnect_delay: Duration,
    ) -> Self {
        let cancel = CancellationToken::new();
        let mut tasks = Vec::with_capacity(adapters.len());
        let mut health = Vec::with_capacity(adapters.len());

        for adapter in adapters {
            let supervisor = Supervisor::new(adapter, connector.clone(), hub.clone())
                .with_reconnect_delay(reconnect_delay);
            health.push(supervisor.health());
            tasks.push(tokio::spawn(supervisor.run(cancel.child_token())));
        }

        tracing::info!(supervisors = tasks.len(), "Pipeline started");

        Self {
            hub,
            cancel,
            tasks,
            health,
        }
    }

    pub fn hub(&self) -> &Arc<FeedHub> {
        &self.hub
    }

    /// Health handles, one per supervisor
    pub fn health(&self) -> &[SupervisorHealth] {
        &self.health
    }

    /// At least one exchange is streaming
    pub fn is_healthy(&self) -> bool {
        self.health.iter().any(|h| h.state().is_streaming())
    }

    /// Cancel all supervisors, wait for them and close the hub
    pub async fn shutdown(self) {
        self.cancel.cancel();

        for task in self.tasks {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Supervisor task ended abnormally");
            }
        }

        self.hub.close();
        tracing::info!("Pipeline stopped");
    }
}

/// Adapters for every enabled exchange
pub fn adapters_from(config: &Config) -> Vec<Arc<dyn ExchangeAdapter>> {
    let mut adapters: Vec<Arc<dyn ExchangeAdapter>> = Vec::new();

    if config.coinbase.enabled {
        adapters.push(Arc::new(CoinbaseAdapter::with_url(
            config.coinbase.ws_url.clone(),
            config.coinbase.credentials.clone(),
        )));
    }
    if config.kraken.enabled {
        adapters.push(Arc::new(KrakenAdapter::with_url(
            config.kraken.ws_url.clone(),
            config.kraken.pairs.clone(),
        )));
    }

    adapters
}
