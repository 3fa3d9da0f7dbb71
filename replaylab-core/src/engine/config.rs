//! Simulated broker configuration.

use serde::{Deserialize, Serialize};

use crate::domain::OrderSide;

/// Which open long a sell fill closes when several are open for one symbol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloseOrder {
    /// Oldest open position first.
    #[default]
    Fifo,
    /// Most recently opened position first.
    Lifo,
}

/// Cost structure and fill timing for the simulated broker.
///
/// Missing fields deserialize to their [`Default`] values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Slippage in basis points, applied to market orders only.
    pub slippage_bps: f64,
    /// Flat commission per unit traded.
    pub commission_per_unit: f64,
    /// Market orders fill at the bar open when true, at the bar close otherwise.
    pub fill_on_next_open: bool,
    pub close_order: CloseOrder,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            slippage_bps: 5.0,
            commission_per_unit: 0.005,
            fill_on_next_open: true,
            close_order: CloseOrder::Fifo,
        }
    }
}

impl BrokerConfig {
    /// No slippage, no commission. Useful for checking pure price logic.
    pub fn frictionless() -> Self {
        Self {
            slippage_bps: 0.0,
            commission_per_unit: 0.0,
            ..Self::default()
        }
    }

    /// Slippage as a fraction of price.
    pub fn slip_fraction(&self) -> f64 {
        self.slippage_bps / 10_000.0
    }

    /// Move `reference` against the trader by the configured slippage.
    ///
    /// Buyers pay more, sellers receive less.
    pub fn apply_slippage(&self, reference: f64, side: OrderSide) -> f64 {
        reference * (1.0 + side.sign() * self.slip_fraction())
    }

    pub fn commission(&self, quantity: f64) -> f64 {
        quantity * self.commission_per_unit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_cost_structure() {
        let cfg = BrokerConfig::default();
        assert_eq!(cfg.slippage_bps, 5.0);
        assert_eq!(cfg.commission_per_unit, 0.005);
        assert!(cfg.fill_on_next_open);
        assert_eq!(cfg.close_order, CloseOrder::Fifo);
    }

    #[test]
    fn buy_slips_up_sell_slips_down() {
        let cfg = BrokerConfig::default();
        assert!((cfg.apply_slippage(100.0, OrderSide::Buy) - 100.05).abs() < 1e-10);
        assert!((cfg.apply_slippage(100.0, OrderSide::Sell) - 99.95).abs() < 1e-10);
    }

    #[test]
    fn frictionless_is_identity() {
        let cfg = BrokerConfig::frictionless();
        assert_eq!(cfg.apply_slippage(123.45, OrderSide::Buy), 123.45);
        assert_eq!(cfg.commission(1000.0), 0.0);
    }

    #[test]
    fn close_order_defaults_when_missing() {
        let json = r#"{"slippage_bps":1.0,"commission_per_unit":0.0,"fill_on_next_open":false}"#;
        let cfg: BrokerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.close_order, CloseOrder::Fifo);
        assert!(!cfg.fill_on_next_open);
    }
}
