use thiserror::Error;

use replaylab_core::ledger::LedgerError;

use crate::config::ConfigError;
use crate::playback::PlaybackError;

/// Errors from building and running a playback.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
    #[error("playback error: {0}")]
    Playback(#[from] PlaybackError),
}
