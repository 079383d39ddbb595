//! Price feed types

use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Per-frame adapter errors
#[derive(Debug, Error)]
pub enum FeedError {
    /// Wire product or pair code missing from the adapter registry
    #[error("Unknown instrument: {0}")]
    UnknownInstrument(String),
    /// Frame passed validation but a field could not be decoded
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),
    /// Outbound message could not be encoded
    #[error("Encode failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// API credentials for an exchange account
///
/// Treated as opaque strings; only the key and passphrase go on the wire.
#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ExchangeCredentials {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub passphrase: String,
    #[serde(default)]
    pub secret: String,
}

impl ExchangeCredentials {
    pub fn new(
        api_key: impl Into<String>,
        passphrase: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            passphrase: passphrase.into(),
            secret: secret.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.api_key.is_empty()
    }
}

impl fmt::Debug for ExchangeCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeCredentials")
            .field("api_key", &self.api_key)
            .field("passphrase", &"<redacted>")
            .field("secret", &"<redacted>")
            .finish()
    }
}
