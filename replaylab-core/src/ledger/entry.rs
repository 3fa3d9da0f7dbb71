//! Ledger entry types and the query used to filter them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::OrderId;

/// Outcome of a signal-to-order evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// Signal accepted, order placed.
    Emit,
    /// Pre-event gate held the signal.
    Hold,
    /// Blackout gate blocked the signal.
    Block,
    /// Risk policy rejected the signal.
    Reject,
    /// Order cancelled after placement.
    Cancel,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Decision::Emit => "emit",
            Decision::Hold => "hold",
            Decision::Block => "block",
            Decision::Reject => "reject",
            Decision::Cancel => "cancel",
        };
        f.write_str(s)
    }
}

/// Immutable record of one trading decision.
///
/// `seq` and `recorded_at` belong to the ledger: whatever the caller puts
/// there is overwritten by [`DecisionLedger::append`](super::DecisionLedger::append).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub seq: u64,
    pub recorded_at: DateTime<Utc>,
    pub strategy_id: String,
    pub symbol: String,
    /// Event phase reported at decision time (pre-event, blackout, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_phase: Option<String>,
    pub signal_price: f64,
    pub stop_loss: f64,
    pub position_size: f64,
    pub decision: Decision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<OrderId>,
    /// Realized P&L, set once the associated order has been closed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pnl: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl LedgerEntry {
    pub fn new(
        strategy_id: impl Into<String>,
        symbol: impl Into<String>,
        decision: Decision,
    ) -> Self {
        Self {
            seq: 0,
            recorded_at: DateTime::<Utc>::default(),
            strategy_id: strategy_id.into(),
            symbol: symbol.into(),
            event_phase: None,
            signal_price: 0.0,
            stop_loss: 0.0,
            position_size: 0.0,
            decision,
            reason: None,
            order_id: None,
            pnl: None,
            notes: None,
        }
    }

    pub fn with_prices(mut self, signal_price: f64, stop_loss: f64, position_size: f64) -> Self {
        self.signal_price = signal_price;
        self.stop_loss = stop_loss;
        self.position_size = position_size;
        self
    }

    pub fn with_order_id(mut self, order_id: impl Into<OrderId>) -> Self {
        self.order_id = Some(order_id.into());
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_event_phase(mut self, phase: impl Into<String>) -> Self {
        self.event_phase = Some(phase.into());
        self
    }

    pub fn with_pnl(mut self, pnl: f64) -> Self {
        self.pnl = Some(pnl);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Name of the first numeric field that is NaN or infinite.
    ///
    /// JSON has no representation for these values, so such an entry could
    /// be written but never read back.
    pub(crate) fn non_finite_field(&self) -> Option<&'static str> {
        let fields = [
            ("signal_price", Some(self.signal_price)),
            ("stop_loss", Some(self.stop_loss)),
            ("position_size", Some(self.position_size)),
            ("pnl", self.pnl),
        ];
        fields
            .into_iter()
            .find(|(_, v)| v.is_some_and(|v| !v.is_finite()))
            .map(|(name, _)| name)
    }
}

/// Conjunctive filter over ledger entries. `None` matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerQuery {
    pub strategy_id: Option<String>,
    pub symbol: Option<String>,
    pub decision: Option<Decision>,
}

impl LedgerQuery {
    /// Build a query from possibly-empty predicates; empty strings match all.
    pub fn new(strategy_id: &str, symbol: &str, decision: Option<Decision>) -> Self {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        Self {
            strategy_id: non_empty(strategy_id),
            symbol: non_empty(symbol),
            decision,
        }
    }

    pub fn strategy(mut self, strategy_id: impl Into<String>) -> Self {
        self.strategy_id = Some(strategy_id.into());
        self
    }

    pub fn symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    pub fn decision(mut self, decision: Decision) -> Self {
        self.decision = Some(decision);
        self
    }

    pub fn matches(&self, entry: &LedgerEntry) -> bool {
        self.strategy_id
            .as_deref()
            .map_or(true, |s| entry.strategy_id == s)
            && self.symbol.as_deref().map_or(true, |s| entry.symbol == s)
            && self.decision.map_or(true, |d| entry.decision == d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Decision::Emit).unwrap(), "\"emit\"");
        assert_eq!(serde_json::to_string(&Decision::Cancel).unwrap(), "\"cancel\"");
        let d: Decision = serde_json::from_str("\"block\"").unwrap();
        assert_eq!(d, Decision::Block);
    }

    #[test]
    fn optional_fields_are_omitted() {
        let entry = LedgerEntry::new("rsi_v1", "AAPL", Decision::Hold);
        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("order_id"));
        assert!(!json.contains("pnl"));
        assert!(!json.contains("event_phase"));
        assert!(json.contains("\"seq\":0"));
    }

    #[test]
    fn non_finite_field_detection() {
        let entry = LedgerEntry::new("s", "X", Decision::Emit).with_prices(1.0, f64::NAN, 1.0);
        assert_eq!(entry.non_finite_field(), Some("stop_loss"));

        let entry = LedgerEntry::new("s", "X", Decision::Emit).with_pnl(f64::INFINITY);
        assert_eq!(entry.non_finite_field(), Some("pnl"));

        assert_eq!(LedgerEntry::new("s", "X", Decision::Emit).non_finite_field(), None);
    }

    #[test]
    fn empty_predicates_match_everything() {
        let q = LedgerQuery::new("", "", None);
        assert_eq!(q, LedgerQuery::default());
        assert!(q.matches(&LedgerEntry::new("a", "B", Decision::Reject)));
    }

    #[test]
    fn predicates_are_conjunctive() {
        let q = LedgerQuery::default().strategy("rsi_v1").decision(Decision::Emit);
        assert!(q.matches(&LedgerEntry::new("rsi_v1", "AAPL", Decision::Emit)));
        assert!(!q.matches(&LedgerEntry::new("rsi_v1", "AAPL", Decision::Block)));
        assert!(!q.matches(&LedgerEntry::new("macd", "AAPL", Decision::Emit)));
    }
}
