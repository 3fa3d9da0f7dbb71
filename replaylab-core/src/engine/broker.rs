//! Simulated broker holding pending orders, open positions, cash and fills.
//!
//! The broker advances one bar at a time. Orders never fill on submission;
//! they are evaluated against the next bar passed to [`SimBroker::process_bar`].
//! Pending orders are visited in submission order, and open positions are
//! kept in the order they were opened, so identical inputs always produce
//! identical fills.
//!
//! All state sits behind one lock so a replay and an outside observer (for
//! example a dashboard polling equity) see consistent snapshots.

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::domain::{Fill, Order, OrderId, OrderSide, Position, PriceBar};

use super::config::{BrokerConfig, CloseOrder};
use super::matching;

#[derive(Debug)]
struct BrokerState {
    cash: f64,
    equity: f64,
    pending: Vec<Order>,
    positions: Vec<Position>,
    fills: Vec<Fill>,
}

impl BrokerState {
    fn apply_fill(&mut self, order: &Order, fill: &Fill, close_order: CloseOrder) {
        self.cash += fill.cash_delta();
        match fill.side {
            OrderSide::Buy => self.positions.push(Position {
                symbol: order.symbol.clone(),
                side: OrderSide::Buy,
                quantity: fill.quantity,
                entry_price: fill.fill_price,
                opened_at: fill.filled_at,
                order_id: order.id.clone(),
            }),
            OrderSide::Sell => {
                let is_match = |p: &Position| p.symbol == order.symbol && p.is_long();
                let idx = match close_order {
                    CloseOrder::Fifo => self.positions.iter().position(is_match),
                    CloseOrder::Lifo => self.positions.iter().rposition(is_match),
                };
                match idx {
                    Some(i) => {
                        let closed = self.positions.remove(i);
                        debug!(
                            symbol = %closed.symbol,
                            opened_by = %closed.order_id,
                            closed_by = %order.id,
                            "position closed"
                        );
                    }
                    None => warn!(
                        order_id = %order.id,
                        symbol = %order.symbol,
                        "sell filled with no open long position"
                    ),
                }
            }
        }
    }

    /// equity = cash + Σ open positions, marked at the bar close where the
    /// bar covers the symbol and at entry price otherwise.
    fn mark_to_market(&mut self, bar: &PriceBar) {
        let held: f64 = self
            .positions
            .iter()
            .map(|p| {
                let mark = if bar.applies_to(&p.symbol) {
                    bar.close
                } else {
                    p.entry_price
                };
                p.market_value(mark)
            })
            .sum();
        self.equity = self.cash + held;
    }
}

/// Deterministic simulated broker.
#[derive(Debug)]
pub struct SimBroker {
    config: BrokerConfig,
    state: Mutex<BrokerState>,
}

impl SimBroker {
    pub fn new(config: BrokerConfig, initial_capital: f64) -> Self {
        Self {
            config,
            state: Mutex::new(BrokerState {
                cash: initial_capital,
                equity: initial_capital,
                pending: Vec::new(),
                positions: Vec::new(),
                fills: Vec::new(),
            }),
        }
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    /// Queue an order for the next processed bar.
    ///
    /// Submitting an ID that is already pending replaces that order and keeps
    /// its place in the queue.
    pub fn submit_order(&self, order: Order) {
        let mut state = self.state.lock();
        debug!(
            order_id = %order.id,
            symbol = %order.symbol,
            side = %order.side,
            order_type = %order.order_type,
            quantity = order.quantity,
            "order submitted"
        );
        match state.pending.iter_mut().find(|o| o.id == order.id) {
            Some(existing) => *existing = order,
            None => state.pending.push(order),
        }
    }

    /// Remove a pending order. Returns it if it was still pending.
    pub fn cancel_order(&self, id: &OrderId) -> Option<Order> {
        let mut state = self.state.lock();
        let idx = state.pending.iter().position(|o| &o.id == id)?;
        Some(state.pending.remove(idx))
    }

    /// Match every pending order for the bar's symbol, then mark to market.
    ///
    /// Returns the fills produced by this bar only. Orders that do not
    /// trigger stay pending.
    pub fn process_bar(&self, bar: &PriceBar) -> Vec<Fill> {
        let mut state = self.state.lock();
        let mut new_fills = Vec::new();

        let pending = std::mem::take(&mut state.pending);
        let mut still_pending = Vec::with_capacity(pending.len());
        for order in pending {
            if !(order.symbol.is_empty() || bar.applies_to(&order.symbol)) {
                still_pending.push(order);
                continue;
            }
            let Some(fill) = matching::try_fill(&order, bar, &self.config) else {
                still_pending.push(order);
                continue;
            };
            debug!(
                order_id = %fill.order_id,
                symbol = %fill.symbol,
                side = %fill.side,
                quantity = fill.quantity,
                price = fill.fill_price,
                commission = fill.commission,
                "order filled"
            );
            state.apply_fill(&order, &fill, self.config.close_order);
            state.fills.push(fill.clone());
            new_fills.push(fill);
        }
        state.pending = still_pending;

        state.mark_to_market(bar);
        new_fills
    }

    /// Equity as of the last processed bar (initial capital before any bar).
    pub fn equity(&self) -> f64 {
        self.state.lock().equity
    }

    pub fn cash(&self) -> f64 {
        self.state.lock().cash
    }

    /// Every fill so far, in the order it happened.
    pub fn fills(&self) -> Vec<Fill> {
        self.state.lock().fills.clone()
    }

    /// Open positions in the order they were opened.
    pub fn open_positions(&self) -> Vec<Position> {
        self.state.lock().positions.clone()
    }

    /// Pending orders in submission order.
    pub fn pending_orders(&self) -> Vec<Order> {
        self.state.lock().pending.clone()
    }
}
