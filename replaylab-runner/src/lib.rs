//! ReplayLab Runner — playback orchestration, result aggregation, configuration.
//!
//! This crate builds on `replaylab-core` to provide:
//! - Recorded signals and their conversion to market orders
//! - The playback orchestrator that drives the simulated broker bar by bar
//! - Result aggregation (returns, win/loss pairing, costs, fingerprint)
//! - TOML run configuration wiring broker and ledger together

pub mod config;
pub mod error;
pub mod playback;
pub mod result;
pub mod signal;

pub use config::{ConfigError, LedgerConfig, PlaybackConfig};
pub use error::RunError;
pub use playback::{run_playback, PlaybackError, Simulator, PLAYBACK_REASON};
pub use result::{pair_trades, ClosedTrade, PlaybackResult, TradePairing};
pub use signal::PlaybackSignal;

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn playback_result_is_send_sync() {
        assert_send::<PlaybackResult>();
        assert_sync::<PlaybackResult>();
    }

    #[test]
    fn simulator_is_send_sync() {
        assert_send::<Simulator>();
        assert_sync::<Simulator>();
    }

    #[test]
    fn config_is_send_sync() {
        assert_send::<PlaybackConfig>();
        assert_sync::<PlaybackConfig>();
        assert_send::<PlaybackSignal>();
        assert_sync::<PlaybackSignal>();
    }

    #[test]
    fn run_error_is_send_sync() {
        assert_send::<RunError>();
        assert_sync::<RunError>();
    }
}
