//! Playback result and trade statistics.
//!
//! Reduces the fills of one playback plus initial/final equity into
//! summary figures. Buys and sells are paired per symbol to count wins and
//! losses; how they pair is chosen by [`TradePairing`].

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use replaylab_core::domain::{Fill, OrderId, OrderSide};

/// How sell fills are matched to earlier buys when counting wins and losses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradePairing {
    /// One slot per symbol holding the most recent buy price. A sell pairs
    /// with it and clears it; a later buy overwrites it.
    #[default]
    LastBuy,
    /// Per-symbol queue of open buys, oldest consumed first.
    Fifo,
    /// Per-symbol stack of open buys, newest consumed first.
    Lifo,
}

/// A sell matched to an entry price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub symbol: String,
    pub entry_price: f64,
    pub exit_price: f64,
    pub quantity: f64,
    pub pnl: f64,
    pub closed_by: OrderId,
}

impl ClosedTrade {
    /// Break-even counts as a win.
    pub fn is_win(&self) -> bool {
        self.pnl >= 0.0
    }
}

/// Complete result of a playback run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackResult {
    /// Every fill, in the order it happened.
    pub fills: Vec<Fill>,
    pub initial_equity: f64,
    pub final_equity: f64,
    /// (final − initial) / initial, 0 when initial ≤ 0.
    pub total_return: f64,
    /// Number of fills.
    pub total_trades: usize,
    pub win_trades: usize,
    pub loss_trades: usize,
    /// wins / (wins + losses), 0 with no paired trades.
    pub win_rate: f64,
    pub total_slippage: f64,
    pub total_commission: f64,
    pub closed_trades: Vec<ClosedTrade>,
    pub bars_processed: usize,
    /// BLAKE3 hex digest of the fill sequence. Equal runs share a fingerprint.
    pub fingerprint: String,
}

impl PlaybackResult {
    /// Aggregate `fills` into a result. `bars_processed` starts at 0 and is
    /// set by the caller that drove the bars.
    pub fn from_fills(
        fills: Vec<Fill>,
        initial_equity: f64,
        final_equity: f64,
        pairing: TradePairing,
    ) -> Self {
        let total_return = if initial_equity > 0.0 {
            (final_equity - initial_equity) / initial_equity
        } else {
            0.0
        };

        let closed_trades = pair_trades(&fills, pairing);
        let win_trades = closed_trades.iter().filter(|t| t.is_win()).count();
        let loss_trades = closed_trades.len() - win_trades;
        let win_rate = if closed_trades.is_empty() {
            0.0
        } else {
            win_trades as f64 / closed_trades.len() as f64
        };

        Self {
            total_trades: fills.len(),
            total_slippage: fills.iter().map(|f| f.slippage).sum(),
            total_commission: fills.iter().map(|f| f.commission).sum(),
            fingerprint: fingerprint_fills(&fills),
            fills,
            initial_equity,
            final_equity,
            total_return,
            win_trades,
            loss_trades,
            win_rate,
            closed_trades,
            bars_processed: 0,
        }
    }

    /// Sum of realized P&L over paired trades. Excludes commission.
    pub fn realized_pnl(&self) -> f64 {
        self.closed_trades.iter().map(|t| t.pnl).sum()
    }
}

/// Pair sells with earlier buys of the same symbol.
///
/// Sells with nothing to pair against are skipped.
pub fn pair_trades(fills: &[Fill], pairing: TradePairing) -> Vec<ClosedTrade> {
    let mut open: HashMap<&str, VecDeque<f64>> = HashMap::new();
    let mut closed = Vec::new();

    for fill in fills {
        let book = open.entry(fill.symbol.as_str()).or_default();
        match fill.side {
            OrderSide::Buy => {
                if pairing == TradePairing::LastBuy {
                    book.clear();
                }
                book.push_back(fill.fill_price);
            }
            OrderSide::Sell => {
                let entry = match pairing {
                    TradePairing::LastBuy | TradePairing::Lifo => book.pop_back(),
                    TradePairing::Fifo => book.pop_front(),
                };
                let Some(entry_price) = entry else {
                    continue;
                };
                closed.push(ClosedTrade {
                    symbol: fill.symbol.clone(),
                    entry_price,
                    exit_price: fill.fill_price,
                    quantity: fill.quantity,
                    pnl: (fill.fill_price - entry_price) * fill.quantity,
                    closed_by: fill.order_id.clone(),
                });
            }
        }
    }
    closed
}

/// Content hash of a fill sequence.
pub fn fingerprint_fills(fills: &[Fill]) -> String {
    let mut hasher = blake3::Hasher::new();
    for fill in fills {
        hasher.update(fill.order_id.as_str().as_bytes());
        hasher.update(&[0]);
        hasher.update(fill.symbol.as_bytes());
        hasher.update(&[0]);
        hasher.update(match fill.side {
            OrderSide::Buy => b"B",
            OrderSide::Sell => b"S",
        });
        for v in [fill.quantity, fill.fill_price, fill.slippage, fill.commission] {
            hasher.update(&v.to_bits().to_le_bytes());
        }
        hasher.update(&fill.filled_at.timestamp().to_le_bytes());
        hasher.update(&fill.filled_at.timestamp_subsec_nanos().to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}
