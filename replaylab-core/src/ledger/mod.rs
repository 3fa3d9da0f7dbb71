//! Decision ledger: an append-only, checksummed JSONL record of every
//! signal-to-order decision.

pub mod entry;
pub mod store;

pub use entry::{Decision, LedgerEntry, LedgerQuery};
pub use store::{DecisionLedger, LedgerError, LedgerOptions, LEDGER_FILE};
