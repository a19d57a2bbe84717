//! Symbol data access port.

use crate::domain::error::MarketScoreError;
use crate::domain::series::RawTable;

/// A universe of per-symbol tables.
pub trait SymbolSource {
    /// All symbol ids currently available, sorted.
    fn list_symbols(&self) -> Result<Vec<String>, MarketScoreError>;

    /// The raw table for one symbol, headers and cells untouched.
    fn read_table(&self, symbol: &str) -> Result<RawTable, MarketScoreError>;

    /// Human-readable location, used in logs and errors.
    fn describe(&self) -> String {
        "symbol source".to_string()
    }
}
