//! Recorded trading signals fed into a playback.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use replaylab_core::domain::{Order, OrderId, OrderSide};

/// A trading decision captured at `event_at`, replayed as a market order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSignal {
    pub order_id: OrderId,
    pub strategy_id: String,
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: f64,
    /// Recorded on the order for reference. No protective order is placed.
    #[serde(default)]
    pub stop_loss: f64,
    pub event_at: DateTime<Utc>,
}

impl PlaybackSignal {
    pub fn new(
        order_id: impl Into<OrderId>,
        strategy_id: impl Into<String>,
        symbol: impl Into<String>,
        side: OrderSide,
        quantity: f64,
        event_at: DateTime<Utc>,
    ) -> Self {
        Self {
            order_id: order_id.into(),
            strategy_id: strategy_id.into(),
            symbol: symbol.into(),
            side,
            quantity,
            stop_loss: 0.0,
            event_at,
        }
    }

    pub fn with_stop_loss(mut self, stop_loss: f64) -> Self {
        self.stop_loss = stop_loss;
        self
    }

    /// The market order this signal becomes when released on a bar at `at`.
    pub fn to_order(&self, at: DateTime<Utc>) -> Order {
        let mut order = Order::market(
            self.order_id.clone(),
            self.symbol.clone(),
            self.side,
            self.quantity,
        )
        .with_strategy(self.strategy_id.clone())
        .submitted_at(at);
        order.stop_price = self.stop_loss;
        order
    }
}
