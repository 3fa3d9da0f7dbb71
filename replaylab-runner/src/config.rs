//! Playback configuration, loaded from TOML.
//!
//! ```toml
//! initial_capital = 100000.0
//! trade_pairing = "last_buy"
//!
//! [broker]
//! slippage_bps = 5.0
//! commission_per_unit = 0.005
//! fill_on_next_open = true
//! close_order = "fifo"
//!
//! [ledger]
//! dir = "runs/ledger"
//! sync_on_append = false
//! ```
//!
//! `[broker]` fields fall back to their defaults when omitted. Without a
//! `[ledger]` table playback runs with no ledger attached.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use replaylab_core::engine::{BrokerConfig, SimBroker};
use replaylab_core::ledger::{DecisionLedger, LedgerOptions};

use crate::error::RunError;
use crate::playback::Simulator;
use crate::result::TradePairing;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Where and how the decision ledger is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub dir: PathBuf,
    #[serde(default)]
    pub sync_on_append: bool,
}

impl LedgerConfig {
    pub fn options(&self) -> LedgerOptions {
        LedgerOptions {
            sync_on_append: self.sync_on_append,
        }
    }
}

/// Everything needed to set up one playback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    pub initial_capital: f64,
    #[serde(default)]
    pub broker: BrokerConfig,
    #[serde(default)]
    pub trade_pairing: TradePairing,
    #[serde(default)]
    pub ledger: Option<LedgerConfig>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            initial_capital: 100_000.0,
            broker: BrokerConfig::default(),
            trade_pairing: TradePairing::default(),
            ledger: None,
        }
    }
}

impl PlaybackConfig {
    /// Parse and validate a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.initial_capital.is_finite() && self.initial_capital > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "initial_capital must be positive, got {}",
                self.initial_capital
            )));
        }
        let b = &self.broker;
        if !(b.slippage_bps.is_finite() && b.slippage_bps >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "broker.slippage_bps must be non-negative, got {}",
                b.slippage_bps
            )));
        }
        if !(b.commission_per_unit.is_finite() && b.commission_per_unit >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "broker.commission_per_unit must be non-negative, got {}",
                b.commission_per_unit
            )));
        }
        if let Some(ledger) = &self.ledger {
            if ledger.dir.as_os_str().is_empty() {
                return Err(ConfigError::Invalid("ledger.dir must not be empty".into()));
            }
        }
        Ok(())
    }

    /// Wire a broker and, when configured, an opened ledger.
    pub fn build_simulator(&self) -> Result<Simulator, RunError> {
        self.validate()?;
        let broker = SimBroker::new(self.broker, self.initial_capital);
        let ledger = match &self.ledger {
            Some(cfg) => Some(DecisionLedger::open_with(&cfg.dir, cfg.options())?),
            None => None,
        };
        Ok(Simulator::new(broker, ledger).with_pairing(self.trade_pairing))
    }
}
