use crate::domain::ids::OrderId;
use crate::domain::order::OrderSide;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fill record. Append-only: the broker never mutates a fill after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub order_id: OrderId,
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: f64,
    pub fill_price: f64,
    pub filled_at: DateTime<Utc>,
    /// Distance from the bar open, in price units times quantity.
    pub slippage: f64,
    pub commission: f64,
}

impl Fill {
    /// Gross traded value, excluding commission.
    pub fn notional(&self) -> f64 {
        self.fill_price * self.quantity
    }

    /// Signed cash movement: negative for buys, positive for sells, net of commission.
    pub fn cash_delta(&self) -> f64 {
        match self.side {
            OrderSide::Buy => -(self.notional() + self.commission),
            OrderSide::Sell => self.notional() - self.commission,
        }
    }
}
