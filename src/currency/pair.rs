//! Currency pair value type

use super::{Currency, ExchangeDirection};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Currency pair errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PairError {
    /// Text is not `<BASE>/<TARGET>` with two known currencies
    #[error("Invalid currency pair format: {0}")]
    InvalidFormat(String),
}

/// Ordered (base, target) pair of currencies
///
/// The direction is derived once at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CurrencyPair {
    base: Currency,
    target: Currency,
    direction: ExchangeDirection,
}

impl CurrencyPair {
    /// Build a pair from two currencies
    pub fn of(base: Currency, target: Currency) -> Self {
        Self {
            base,
            target,
            direction: ExchangeDirection::classify(base, target),
        }
    }

    pub fn base(&self) -> Currency {
        self.base
    }

    pub fn target(&self) -> Currency {
        self.target
    }

    pub fn direction(&self) -> ExchangeDirection {
        self.direction
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.target)
    }
}

impl FromStr for CurrencyPair {
    type Err = PairError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = s.split('/').collect();
        let [base, target] = tokens.as_slice() else {
            return Err(PairError::InvalidFormat(format!(
                "expected BASE/TARGET, got '{s}'"
            )));
        };

        let base = base
            .parse::<Currency>()
            .map_err(|_| PairError::InvalidFormat(format!("unknown base currency in '{s}'")))?;
        let target = target
            .parse::<Currency>()
            .map_err(|_| PairError::InvalidFormat(format!("unknown target currency in '{s}'")))?;

        Ok(Self::of(base, target))
    }
}

impl Serialize for CurrencyPair {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CurrencyPair {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
