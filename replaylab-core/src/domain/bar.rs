//! PriceBar, the basic market data unit for replay.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV bar for a single symbol over one interval.
///
/// Bars are used as given: the engine performs no OHLC sanity validation.
/// An empty `symbol` marks a wildcard bar that applies to every order and
/// position, which keeps single-symbol simulations terse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    #[serde(default)]
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl PriceBar {
    /// True if this bar carries no symbol and therefore matches everything.
    pub fn is_wildcard(&self) -> bool {
        self.symbol.is_empty()
    }

    /// Whether an order or position on `symbol` is affected by this bar.
    pub fn applies_to(&self, symbol: &str) -> bool {
        self.is_wildcard() || self.symbol == symbol
    }
}
