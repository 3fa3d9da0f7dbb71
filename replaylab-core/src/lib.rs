//! ReplayLab Core — domain types, decision ledger, simulated broker.
//!
//! This crate contains the deterministic heart of decision replay:
//! - Domain types (price bars, orders, fills, positions)
//! - Append-only decision ledger with per-line checksums
//! - Simulated broker with market/limit/stop fill rules, slippage and commission

pub mod domain;
pub mod engine;
pub mod ledger;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: types shared between a replay and outside callers
    /// are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::PriceBar>();
        require_sync::<domain::PriceBar>();
        require_send::<domain::Order>();
        require_sync::<domain::Order>();
        require_send::<domain::Fill>();
        require_sync::<domain::Fill>();
        require_send::<domain::Position>();
        require_sync::<domain::Position>();

        // Ledger
        require_send::<ledger::LedgerEntry>();
        require_sync::<ledger::LedgerEntry>();
        require_send::<ledger::DecisionLedger>();
        require_sync::<ledger::DecisionLedger>();

        // Engine
        require_send::<engine::BrokerConfig>();
        require_sync::<engine::BrokerConfig>();
        require_send::<engine::SimBroker>();
        require_sync::<engine::SimBroker>();
    }

    /// A broker shared across threads hands out consistent snapshots while
    /// another thread drives bars through it.
    #[test]
    fn broker_is_observable_from_another_thread() {
        use chrono::{Duration, TimeZone, Utc};
        use std::sync::Arc;

        let broker = Arc::new(engine::SimBroker::new(
            engine::BrokerConfig::frictionless(),
            10_000.0,
        ));
        let base = Utc.with_ymd_and_hms(2024, 1, 2, 14, 30, 0).unwrap();

        let driver = {
            let broker = Arc::clone(&broker);
            std::thread::spawn(move || {
                for i in 0..50 {
                    let side = if i % 2 == 0 {
                        domain::OrderSide::Buy
                    } else {
                        domain::OrderSide::Sell
                    };
                    broker.submit_order(domain::Order::market(format!("o{i}"), "AAPL", side, 1.0));
                    broker.process_bar(&domain::PriceBar {
                        symbol: "AAPL".into(),
                        timestamp: base + Duration::minutes(i),
                        open: 100.0,
                        high: 100.0,
                        low: 100.0,
                        close: 100.0,
                        volume: 0.0,
                    });
                }
            })
        };

        // Flat prices and no costs: equity can never drift from 10_000.
        for _ in 0..50 {
            assert!((broker.equity() - 10_000.0).abs() < 1e-9);
        }
        driver.join().unwrap();
        assert_eq!(broker.fills().len(), 50);
        assert!(broker.open_positions().is_empty());
    }
}
