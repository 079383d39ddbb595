//! Currency module
//!
//! The fixed set of currencies the feed understands and the pairs built from them

mod pair;

pub use pair::{CurrencyPair, PairError};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whether a currency is issued by a state or lives on a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CurrencyKind {
    Fiat,
    Crypto,
}

/// Well-known currencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Currency {
    EUR,
    USD,
    BTC,
    ETH,
}

impl Currency {
    /// All supported currencies, fiat first
    pub const ALL: [Currency; 4] = [Currency::EUR, Currency::USD, Currency::BTC, Currency::ETH];

    /// Kind of this currency
    pub fn kind(self) -> CurrencyKind {
        match self {
            Currency::EUR | Currency::USD => CurrencyKind::Fiat,
            Currency::BTC | Currency::ETH => CurrencyKind::Crypto,
        }
    }

    pub fn is_crypto(self) -> bool {
        self.kind() == CurrencyKind::Crypto
    }

    pub fn is_fiat(self) -> bool {
        self.kind() == CurrencyKind::Fiat
    }

    /// Upper-case ticker symbol
    pub fn code(self) -> &'static str {
        match self {
            Currency::EUR => "EUR",
            Currency::USD => "USD",
            Currency::BTC => "BTC",
            Currency::ETH => "ETH",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = PairError;

    /// Case-insensitive lookup of a ticker symbol
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        Currency::ALL
            .into_iter()
            .find(|c| c.code() == upper)
            .ok_or_else(|| PairError::InvalidFormat(format!("unknown currency '{s}'")))
    }
}

/// Trade direction implied by a currency pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExchangeDirection {
    /// Fiat spent to acquire crypto
    BuyCrypto,
    /// Crypto sold for fiat
    SellCrypto,
    /// Crypto to crypto
    ConvertCrypto,
    /// Anything else (fiat to fiat)
    ConvertFiat,
}

impl ExchangeDirection {
    /// Classify a base/target combination
    pub fn classify(base: Currency, target: Currency) -> Self {
        match (base.kind(), target.kind()) {
            (CurrencyKind::Crypto, CurrencyKind::Crypto) => ExchangeDirection::ConvertCrypto,
            (CurrencyKind::Crypto, CurrencyKind::Fiat) => ExchangeDirection::SellCrypto,
            (CurrencyKind::Fiat, CurrencyKind::Crypto) => ExchangeDirection::BuyCrypto,
            (CurrencyKind::Fiat, CurrencyKind::Fiat) => ExchangeDirection::ConvertFiat,
        }
    }
}
