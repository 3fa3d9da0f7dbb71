//! Fill rules: whether an order fills on a bar, and at what price.
//!
//! Pure functions over (order, bar, config). No broker state is touched here;
//! the broker applies the returned fill to cash and positions.
//!
//! | type   | side | triggers when        | price                    |
//! |--------|------|----------------------|--------------------------|
//! | market | buy  | always               | ref × (1 + slip)         |
//! | market | sell | always               | ref × (1 − slip)         |
//! | limit  | buy  | low ≤ limit          | min(limit, open)         |
//! | limit  | sell | high ≥ limit         | max(limit, open)         |
//! | stop   | buy  | high ≥ stop          | max(stop, open)          |
//! | stop   | sell | low ≤ stop           | min(stop, open)          |
//!
//! `ref` is the bar open when `fill_on_next_open` is set, the close otherwise.

use crate::domain::{Fill, Order, OrderSide, OrderType, PriceBar};

use super::config::BrokerConfig;

/// Raw fill price for `order` on `bar`, or `None` if it does not trigger.
pub fn fill_price(order: &Order, bar: &PriceBar, config: &BrokerConfig) -> Option<f64> {
    match (order.order_type, order.side) {
        (OrderType::Market, side) => {
            let reference = if config.fill_on_next_open {
                bar.open
            } else {
                bar.close
            };
            Some(config.apply_slippage(reference, side))
        }
        (OrderType::Limit, OrderSide::Buy) => {
            (bar.low <= order.limit_price).then(|| order.limit_price.min(bar.open))
        }
        (OrderType::Limit, OrderSide::Sell) => {
            (bar.high >= order.limit_price).then(|| order.limit_price.max(bar.open))
        }
        (OrderType::Stop, OrderSide::Buy) => {
            (bar.high >= order.stop_price).then(|| order.stop_price.max(bar.open))
        }
        (OrderType::Stop, OrderSide::Sell) => {
            (bar.low <= order.stop_price).then(|| order.stop_price.min(bar.open))
        }
    }
}

/// Build the fill for `order` on `bar`, if it triggers.
///
/// Slippage is reported as the distance between fill price and bar open,
/// times quantity, for every order type.
pub fn try_fill(order: &Order, bar: &PriceBar, config: &BrokerConfig) -> Option<Fill> {
    let price = fill_price(order, bar, config)?;
    Some(Fill {
        order_id: order.id.clone(),
        symbol: order.symbol.clone(),
        side: order.side,
        quantity: order.quantity,
        fill_price: price,
        filled_at: bar.timestamp,
        slippage: (price - bar.open).abs() * order.quantity,
        commission: config.commission(order.quantity),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn bar(open: f64, high: f64, low: f64, close: f64) -> PriceBar {
        PriceBar {
            symbol: "AAPL".into(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 5, 9, 31, 0).unwrap(),
            open,
            high,
            low,
            close,
            volume: 10_000.0,
        }
    }

    #[test]
    fn market_buy_at_open_with_slippage() {
        let cfg = BrokerConfig::default();
        let order = Order::market("o1", "AAPL", OrderSide::Buy, 10.0);
        let fill = try_fill(&order, &bar(180.0, 181.0, 179.0, 180.5), &cfg).unwrap();
        assert!((fill.fill_price - 180.09).abs() < 1e-9);
        assert!((fill.commission - 0.05).abs() < 1e-12);
        assert!((fill.slippage - 0.9).abs() < 1e-9);
    }

    #[test]
    fn market_sell_at_close_when_configured() {
        let cfg = BrokerConfig {
            fill_on_next_open: false,
            ..BrokerConfig::default()
        };
        let order = Order::market("o1", "AAPL", OrderSide::Sell, 10.0);
        let price = fill_price(&order, &bar(180.0, 181.0, 179.0, 180.5), &cfg).unwrap();
        assert!((price - 180.5 * (1.0 - 5.0 / 10_000.0)).abs() < 1e-9);
    }

    #[test]
    fn limit_buy_needs_low_at_or_below_limit() {
        let cfg = BrokerConfig::default();
        let order = Order::limit("o1", "AAPL", OrderSide::Buy, 10.0, 175.0);
        assert_eq!(fill_price(&order, &bar(180.0, 181.0, 179.0, 180.5), &cfg), None);

        let order = Order::limit("o1", "AAPL", OrderSide::Buy, 10.0, 178.0);
        assert_eq!(
            fill_price(&order, &bar(180.0, 181.0, 177.0, 180.5), &cfg),
            Some(178.0)
        );
        // Gap down through the limit fills at the better open.
        assert_eq!(
            fill_price(&order, &bar(176.0, 177.0, 175.0, 176.5), &cfg),
            Some(176.0)
        );
    }

    #[test]
    fn limit_sell_needs_high_at_or_above_limit() {
        let cfg = BrokerConfig::default();
        let order = Order::limit("o1", "AAPL", OrderSide::Sell, 10.0, 182.0);
        assert_eq!(fill_price(&order, &bar(180.0, 181.0, 179.0, 180.5), &cfg), None);
        assert_eq!(
            fill_price(&order, &bar(180.0, 183.0, 179.0, 182.5), &cfg),
            Some(182.0)
        );
        assert_eq!(
            fill_price(&order, &bar(184.0, 185.0, 183.0, 184.5), &cfg),
            Some(184.0)
        );
    }

    #[test]
    fn stop_buy_triggers_on_high() {
        let cfg = BrokerConfig::default();
        let order = Order::stop("o1", "AAPL", OrderSide::Buy, 10.0, 182.0);
        assert_eq!(fill_price(&order, &bar(180.0, 181.0, 179.0, 180.5), &cfg), None);
        assert_eq!(
            fill_price(&order, &bar(180.0, 183.0, 179.0, 182.5), &cfg),
            Some(182.0)
        );
        // Gap up through the stop fills at the worse open.
        assert_eq!(
            fill_price(&order, &bar(185.0, 186.0, 184.0, 185.5), &cfg),
            Some(185.0)
        );
    }

    #[test]
    fn stop_sell_triggers_on_low() {
        let cfg = BrokerConfig::default();
        let order = Order::stop("o1", "AAPL", OrderSide::Sell, 10.0, 178.0);
        assert_eq!(fill_price(&order, &bar(180.0, 181.0, 179.0, 180.5), &cfg), None);
        assert_eq!(
            fill_price(&order, &bar(180.0, 181.0, 177.0, 177.5), &cfg),
            Some(178.0)
        );
        assert_eq!(
            fill_price(&order, &bar(175.0, 176.0, 174.0, 175.5), &cfg),
            Some(175.0)
        );
    }

    #[test]
    fn limit_and_stop_ignore_slippage_setting() {
        let cfg = BrokerConfig {
            slippage_bps: 500.0,
            ..BrokerConfig::default()
        };
        let order = Order::limit("o1", "AAPL", OrderSide::Buy, 10.0, 178.0);
        assert_eq!(
            fill_price(&order, &bar(180.0, 181.0, 177.0, 180.5), &cfg),
            Some(178.0)
        );
    }
}
