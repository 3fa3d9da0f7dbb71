//! Order side, order type, and the single-shot simulated order.

use super::ids::OrderId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// +1 for buys, -1 for sells. Used to push slippage against the trader.
    pub fn sign(self) -> f64 {
        match self {
            OrderSide::Buy => 1.0,
            OrderSide::Sell => -1.0,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "buy"),
            OrderSide::Sell => write!(f, "sell"),
        }
    }
}

/// How the order is matched against a bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    /// Fills on the first processed bar, at open or close depending on config.
    Market,
    /// Fills at the limit price or better once the bar reaches it.
    Limit,
    /// Fills once the bar trades through the stop price.
    Stop,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Market => write!(f, "market"),
            OrderType::Limit => write!(f, "limit"),
            OrderType::Stop => write!(f, "stop"),
        }
    }
}

/// An order submitted to the simulated broker.
///
/// Orders are single-shot: once filled they leave the pending set. There is
/// no partial-fill state. `limit_price` is only read for `Limit` orders and
/// `stop_price` only for `Stop` orders; a market order may still carry a
/// stop price as an informational value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    #[serde(default)]
    pub strategy_id: String,
    pub symbol: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: f64,
    #[serde(default)]
    pub limit_price: f64,
    #[serde(default)]
    pub stop_price: f64,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Market order with no limit/stop levels.
    pub fn market(
        id: impl Into<OrderId>,
        symbol: impl Into<String>,
        side: OrderSide,
        quantity: f64,
    ) -> Self {
        Self {
            id: id.into(),
            strategy_id: String::new(),
            symbol: symbol.into(),
            side,
            order_type: OrderType::Market,
            quantity,
            limit_price: 0.0,
            stop_price: 0.0,
            submitted_at: None,
        }
    }

    /// Limit order at `limit_price`.
    pub fn limit(
        id: impl Into<OrderId>,
        symbol: impl Into<String>,
        side: OrderSide,
        quantity: f64,
        limit_price: f64,
    ) -> Self {
        Self {
            order_type: OrderType::Limit,
            limit_price,
            ..Self::market(id, symbol, side, quantity)
        }
    }

    /// Stop order triggering at `stop_price`.
    pub fn stop(
        id: impl Into<OrderId>,
        symbol: impl Into<String>,
        side: OrderSide,
        quantity: f64,
        stop_price: f64,
    ) -> Self {
        Self {
            order_type: OrderType::Stop,
            stop_price,
            ..Self::market(id, symbol, side, quantity)
        }
    }

    pub fn with_strategy(mut self, strategy_id: impl Into<String>) -> Self {
        self.strategy_id = strategy_id.into();
        self
    }

    pub fn submitted_at(mut self, at: DateTime<Utc>) -> Self {
        self.submitted_at = Some(at);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_sign() {
        assert_eq!(OrderSide::Buy.sign(), 1.0);
        assert_eq!(OrderSide::Sell.sign(), -1.0);
    }

    #[test]
    fn constructors_set_type_and_levels() {
        let limit = Order::limit("o1", "AAPL", OrderSide::Buy, 10.0, 178.0);
        assert_eq!(limit.order_type, OrderType::Limit);
        assert_eq!(limit.limit_price, 178.0);
        assert_eq!(limit.stop_price, 0.0);

        let stop = Order::stop("o2", "AAPL", OrderSide::Sell, 10.0, 175.0).with_strategy("rsi_v1");
        assert_eq!(stop.order_type, OrderType::Stop);
        assert_eq!(stop.stop_price, 175.0);
        assert_eq!(stop.strategy_id, "rsi_v1");
    }

    #[test]
    fn side_and_type_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&OrderSide::Sell).unwrap(), "\"sell\"");
        assert_eq!(serde_json::to_string(&OrderType::Stop).unwrap(), "\"stop\"");
    }
}
