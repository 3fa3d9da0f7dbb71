//! Matching engine: a simulated broker that advances one bar at a time.
//!
//! Per bar:
//! 1. Match pending orders for the bar's symbol against the fill rules
//! 2. Apply fills to cash and open positions
//! 3. Mark open positions to market and recompute equity

pub mod broker;
pub mod config;
pub mod matching;

pub use broker::SimBroker;
pub use config::{BrokerConfig, CloseOrder};
pub use matching::{fill_price, try_fill};
