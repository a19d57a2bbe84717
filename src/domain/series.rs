//! Raw tables as read from disk and the normalized per-symbol series built
//! from them.

use chrono::NaiveDate;

/// A table exactly as it came out of a source file: header names plus rows of
/// untouched cell text. Rows are padded to the header width by the reader.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cells of column `idx`; missing trailing cells read as empty.
    pub fn column(&self, idx: usize) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .map(move |row| row.get(idx).map(String::as_str).unwrap_or(""))
    }
}

/// Where the dates of a series came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSource {
    /// A date-like column was found and parsed.
    Observed,
    /// No date column; every row carries [`placeholder_date`] in file order.
    Placeholder,
}

/// Filler date (1970-01-01) for tables without a date column. It carries no
/// ordering information.
pub fn placeholder_date() -> NaiveDate {
    NaiveDate::default()
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesRow {
    pub date: NaiveDate,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct SymbolSeries {
    pub symbol: String,
    pub rows: Vec<SeriesRow>,
    pub date_source: DateSource,
    /// False when no volume column resolved; every `volume` is then `None`.
    pub has_volume: bool,
}

impl SymbolSeries {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn closes(&self) -> Vec<Option<f64>> {
        self.rows.iter().map(|r| r.close).collect()
    }

    pub fn volumes(&self) -> Vec<Option<f64>> {
        self.rows.iter().map(|r| r.volume).collect()
    }

    pub fn missing_closes(&self) -> usize {
        self.rows.iter().filter(|r| r.close.is_none()).count()
    }

    /// Copy of the series keeping only rows with a close value.
    pub fn with_closes_only(&self) -> SymbolSeries {
        SymbolSeries {
            symbol: self.symbol.clone(),
            rows: self
                .rows
                .iter()
                .filter(|r| r.close.is_some())
                .cloned()
                .collect(),
            date_source: self.date_source,
            has_volume: self.has_volume,
        }
    }
}
