//! Configuration types for rate-feed

use crate::currency::{Currency, CurrencyPair};
use crate::feed::{ExchangeCredentials, COINBASE_WS_URL, KRAKEN_WS_URL};
use crate::hub::{HubConfig, MAX_BUFFER};
use crate::telemetry::LogFormat;
use crate::ws::WsConfig;
use anyhow::{ensure, Context};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub hub: HubConfig,
    pub supervisor: SupervisorConfig,
    pub coinbase: CoinbaseConfig,
    pub kraken: KrakenConfig,
    pub telemetry: TelemetryConfig,
}

/// Reconnect and keepalive timing
#[derive(Debug, Clone, Deserialize)]
pub struct SupervisorConfig {
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,
    #[serde(default = "default_pong_timeout_secs")]
    pub pong_timeout_secs: u64,
}

fn default_reconnect_delay_secs() -> u64 {
    5
}
fn default_ping_interval_secs() -> u64 {
    30
}
fn default_pong_timeout_secs() -> u64 {
    10
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            reconnect_delay_secs: default_reconnect_delay_secs(),
            ping_interval_secs: default_ping_interval_secs(),
            pong_timeout_secs: default_pong_timeout_secs(),
        }
    }
}

impl SupervisorConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    /// Transport keepalive settings
    pub fn ws_config(&self) -> WsConfig {
        WsConfig::default()
            .ping_interval(Duration::from_secs(self.ping_interval_secs))
            .pong_timeout(Duration::from_secs(self.pong_timeout_secs))
    }
}

/// Coinbase ticker feed
#[derive(Debug, Clone, Deserialize)]
pub struct CoinbaseConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_coinbase_url")]
    pub ws_url: String,
    #[serde(flatten)]
    pub credentials: ExchangeCredentials,
}

fn default_true() -> bool {
    true
}
fn default_coinbase_url() -> String {
    COINBASE_WS_URL.to_string()
}

impl Default for CoinbaseConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ws_url: default_coinbase_url(),
            credentials: ExchangeCredentials::default(),
        }
    }
}

/// Kraken trade feed
#[derive(Debug, Clone, Deserialize)]
pub struct KrakenConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_kraken_url")]
    pub ws_url: String,
    /// Canonical pair strings such as `"BTC/EUR"`
    #[serde(default = "default_kraken_pairs")]
    pub pairs: Vec<CurrencyPair>,
}

fn default_kraken_url() -> String {
    KRAKEN_WS_URL.to_string()
}
fn default_kraken_pairs() -> Vec<CurrencyPair> {
    vec![
        CurrencyPair::of(Currency::BTC, Currency::EUR),
        CurrencyPair::of(Currency::BTC, Currency::USD),
        CurrencyPair::of(Currency::ETH, Currency::EUR),
        CurrencyPair::of(Currency::ETH, Currency::USD),
    ]
}

impl Default for KrakenConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ws_url: default_kraken_url(),
            pairs: default_kraken_pairs(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Prometheus listener port; no exporter when absent
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::Pretty,
            metrics_port: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Environment credentials are applied on top. Call [`Config::validate`]
    /// before starting the feeds.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config = Self::parse(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a TOML document without overrides or validation
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Replace Coinbase credentials with values from `lookup`
    ///
    /// Reads `COINBASE_API_KEY`, `COINBASE_PASSPHRASE` and `COINBASE_SECRET`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let credentials = &mut self.coinbase.credentials;
        if let Some(api_key) = lookup("COINBASE_API_KEY") {
            credentials.api_key = api_key;
        }
        if let Some(passphrase) = lookup("COINBASE_PASSPHRASE") {
            credentials.passphrase = passphrase;
        }
        if let Some(secret) = lookup("COINBASE_SECRET") {
            credentials.secret = secret;
        }
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.hub.subscriber_buffer > 0,
            "hub.subscriber_buffer must be positive"
        );
        ensure!(
            self.hub.subscriber_buffer <= MAX_BUFFER,
            "hub.subscriber_buffer must be at most {MAX_BUFFER}"
        );
        ensure!(
            self.supervisor.reconnect_delay_secs > 0,
            "supervisor.reconnect_delay_secs must be positive"
        );
        ensure!(
            self.supervisor.ping_interval_secs > 0,
            "supervisor.ping_interval_secs must be positive"
        );

        if self.coinbase.enabled {
            ensure!(!self.coinbase.ws_url.is_empty(), "coinbase.ws_url is empty");
            ensure!(
                !self.coinbase.credentials.is_empty(),
                "coinbase is enabled but no api_key is configured (set COINBASE_API_KEY)"
            );
        }
        if self.kraken.enabled {
            ensure!(!self.kraken.ws_url.is_empty(), "kraken.ws_url is empty");
            ensure!(!self.kraken.pairs.is_empty(), "kraken.pairs is empty");
        }

        Ok(())
    }
}
