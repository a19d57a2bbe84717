//! Append-only audit log port.

use crate::domain::error::MarketScoreError;
use crate::domain::market_strength::HistoryLogEntry;

pub trait HistoryPort {
    /// Append one entry. Existing entries are never touched.
    fn append(&self, entry: &HistoryLogEntry) -> Result<(), MarketScoreError>;
}
