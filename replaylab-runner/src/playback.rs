//! Playback orchestrator. Replays recorded signals against historical bars.
//!
//! Bars are processed in timestamp order. Before each bar, every signal whose
//! event time is at or before the bar's timestamp and that has not been
//! released yet is submitted to the broker as a market order, so a signal
//! fills on the first bar at or after its event time. With a ledger attached,
//! each released signal is also recorded as an `Emit` decision.
//!
//! Playback is synchronous and single-threaded. The ledger only observes:
//! runs with and without one produce the same fills and equity.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use replaylab_core::domain::PriceBar;
use replaylab_core::engine::SimBroker;
use replaylab_core::ledger::{Decision, DecisionLedger, LedgerEntry};

use crate::config::PlaybackConfig;
use crate::error::RunError;
use crate::result::{PlaybackResult, TradePairing};
use crate::signal::PlaybackSignal;

/// Reason recorded on ledger entries written during playback.
pub const PLAYBACK_REASON: &str = "simulator playback";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("no bars to replay")]
    NoBars,
    #[error("playback cancelled after {bars_processed} bars")]
    Cancelled { bars_processed: usize },
}

/// Drives a [`SimBroker`] through bars, releasing signals as their time comes.
#[derive(Debug)]
pub struct Simulator {
    broker: SimBroker,
    ledger: Option<DecisionLedger>,
    pairing: TradePairing,
}

impl Simulator {
    pub fn new(broker: SimBroker, ledger: Option<DecisionLedger>) -> Self {
        Self {
            broker,
            ledger,
            pairing: TradePairing::default(),
        }
    }

    pub fn with_pairing(mut self, pairing: TradePairing) -> Self {
        self.pairing = pairing;
        self
    }

    pub fn broker(&self) -> &SimBroker {
        &self.broker
    }

    pub fn ledger(&self) -> Option<&DecisionLedger> {
        self.ledger.as_ref()
    }

    pub fn pairing(&self) -> TradePairing {
        self.pairing
    }

    /// Replay `signals` against `bars`.
    ///
    /// `bars` need not be sorted; a stable sort by timestamp is applied to a
    /// copy. Signals timed after the last bar are never submitted. The
    /// `cancel` flag is checked before every bar.
    ///
    /// The result covers the broker's whole fill history, including fills
    /// from before this call, so a sell here pairs with an earlier buy.
    pub fn run(
        &self,
        signals: &[PlaybackSignal],
        bars: &[PriceBar],
        cancel: Option<&AtomicBool>,
    ) -> Result<PlaybackResult, PlaybackError> {
        if bars.is_empty() {
            return Err(PlaybackError::NoBars);
        }

        let mut ordered: Vec<&PriceBar> = bars.iter().collect();
        ordered.sort_by_key(|b| b.timestamp);

        let mut by_time: BTreeMap<DateTime<Utc>, Vec<&PlaybackSignal>> = BTreeMap::new();
        for signal in signals {
            by_time.entry(signal.event_at).or_default().push(signal);
        }
        let mut queue = by_time.into_iter().peekable();

        let initial_equity = self.broker.equity();
        info!(
            bars = ordered.len(),
            signals = signals.len(),
            ledger = self.ledger.is_some(),
            initial_equity,
            "playback started"
        );

        let mut bars_processed = 0usize;

        for bar in ordered {
            if cancel.is_some_and(|f| f.load(Ordering::Relaxed)) {
                warn!(bars_processed, "playback cancelled");
                return Err(PlaybackError::Cancelled { bars_processed });
            }

            while let Some((_, due)) = queue.next_if(|(at, _)| *at <= bar.timestamp) {
                for signal in due {
                    self.release(signal, bar);
                }
            }

            self.broker.process_bar(bar);
            bars_processed += 1;
        }

        let unreleased: usize = queue.map(|(_, due)| due.len()).sum();
        if unreleased > 0 {
            debug!(unreleased, "signals timed after the last bar were not submitted");
        }

        let final_equity = self.broker.equity();
        let mut result = PlaybackResult::from_fills(
            self.broker.fills(),
            initial_equity,
            final_equity,
            self.pairing,
        );
        result.bars_processed = bars_processed;

        info!(
            bars_processed,
            fills = result.total_trades,
            final_equity,
            total_return = result.total_return,
            fingerprint = %result.fingerprint,
            "playback finished"
        );
        Ok(result)
    }

    fn release(&self, signal: &PlaybackSignal, bar: &PriceBar) {
        debug!(
            order_id = %signal.order_id,
            strategy_id = %signal.strategy_id,
            symbol = %signal.symbol,
            side = %signal.side,
            quantity = signal.quantity,
            at = %bar.timestamp,
            "signal released"
        );
        self.broker.submit_order(signal.to_order(bar.timestamp));

        let Some(ledger) = &self.ledger else {
            return;
        };
        let entry = LedgerEntry::new(
            signal.strategy_id.clone(),
            signal.symbol.clone(),
            Decision::Emit,
        )
        .with_prices(bar.open, signal.stop_loss, signal.quantity)
        .with_order_id(signal.order_id.clone())
        .with_reason(PLAYBACK_REASON);

        if let Err(e) = ledger.append(entry) {
            warn!(order_id = %signal.order_id, error = %e, "ledger append failed");
        }
    }
}

/// Build a simulator from `config` and replay in one call.
pub fn run_playback(
    config: &PlaybackConfig,
    signals: &[PlaybackSignal],
    bars: &[PriceBar],
    cancel: Option<&AtomicBool>,
) -> Result<PlaybackResult, RunError> {
    let simulator = config.build_simulator()?;
    Ok(simulator.run(signals, bars, cancel)?)
}
