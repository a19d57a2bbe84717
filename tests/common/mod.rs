#![allow(dead_code)]

use chrono::NaiveDate;
use marketscore::domain::error::MarketScoreError;
use marketscore::domain::market_strength::HistoryLogEntry;
use marketscore::domain::series::RawTable;
use marketscore::ports::history_port::HistoryPort;
use marketscore::ports::symbol_source::SymbolSource;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub struct MockSymbolSource {
    pub tables: BTreeMap<String, RawTable>,
    pub errors: BTreeMap<String, String>,
    pub list_error: Option<String>,
}

impl MockSymbolSource {
    pub fn new() -> Self {
        Self {
            tables: BTreeMap::new(),
            errors: BTreeMap::new(),
            list_error: None,
        }
    }

    pub fn with_table(mut self, symbol: &str, table: RawTable) -> Self {
        self.tables.insert(symbol.to_string(), table);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    pub fn failing_list(mut self, reason: &str) -> Self {
        self.list_error = Some(reason.to_string());
        self
    }
}

impl SymbolSource for MockSymbolSource {
    fn list_symbols(&self) -> Result<Vec<String>, MarketScoreError> {
        if let Some(reason) = &self.list_error {
            return Err(MarketScoreError::DataSource {
                path: "mock".into(),
                reason: reason.clone(),
            });
        }
        let mut symbols: Vec<String> = self
            .tables
            .keys()
            .chain(self.errors.keys())
            .cloned()
            .collect();
        symbols.sort();
        symbols.dedup();
        Ok(symbols)
    }

    fn read_table(&self, symbol: &str) -> Result<RawTable, MarketScoreError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(MarketScoreError::SymbolRead {
                symbol: symbol.to_string(),
                reason: reason.clone(),
            });
        }
        self.tables
            .get(symbol)
            .cloned()
            .ok_or_else(|| MarketScoreError::SymbolRead {
                symbol: symbol.to_string(),
                reason: "not found".into(),
            })
    }
}

/// In-memory history log. `failing()` rejects every append.
pub struct RecordingHistory {
    pub entries: RefCell<Vec<HistoryLogEntry>>,
    fail: bool,
}

impl RecordingHistory {
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
            fail: true,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }
}

impl HistoryPort for RecordingHistory {
    fn append(&self, entry: &HistoryLogEntry) -> Result<(), MarketScoreError> {
        if self.fail {
            return Err(MarketScoreError::HistoryWrite {
                path: "memory".into(),
                reason: "disk full".into(),
            });
        }
        self.entries.borrow_mut().push(entry.clone());
        Ok(())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn run_time() -> chrono::NaiveDateTime {
    date(2024, 6, 3).and_hms_opt(15, 0, 0).unwrap()
}

/// `date,close,volume` table with one row per day starting 2024-01-01.
pub fn price_table(closes: &[f64], volumes: &[f64]) -> RawTable {
    let start = date(2024, 1, 1);
    RawTable::new(
        vec!["date".into(), "close".into(), "volume".into()],
        closes
            .iter()
            .zip(volumes)
            .enumerate()
            .map(|(i, (c, v))| {
                vec![
                    (start + chrono::Duration::days(i as i64)).to_string(),
                    c.to_string(),
                    v.to_string(),
                ]
            })
            .collect(),
    )
}

/// `date,close` table without any volume column.
pub fn close_only_table(closes: &[f64]) -> RawTable {
    let start = date(2024, 1, 1);
    RawTable::new(
        vec!["date".into(), "close".into()],
        closes
            .iter()
            .enumerate()
            .map(|(i, c)| {
                vec![
                    (start + chrono::Duration::days(i as i64)).to_string(),
                    c.to_string(),
                ]
            })
            .collect(),
    )
}

pub fn ascending(count: usize, start: f64, step: f64) -> Vec<f64> {
    (0..count).map(|i| start + step * i as f64).collect()
}

pub fn flat(count: usize, value: f64) -> Vec<f64> {
    vec![value; count]
}

/// Write `SYMBOL.csv` with English headers.
pub fn write_series_csv(dir: &Path, symbol: &str, closes: &[f64], volumes: &[f64]) {
    let start = date(2024, 1, 1);
    let mut content = String::from("date,open,close,volume\n");
    for (i, (c, v)) in closes.iter().zip(volumes).enumerate() {
        let day = start + chrono::Duration::days(i as i64);
        content.push_str(&format!("{day},{c},{c},{v}\n"));
    }
    fs::write(dir.join(format!("{symbol}.csv")), content).unwrap();
}

/// Write `SYMBOL.csv` with Vietnamese headers, `dd/mm/yyyy` dates, grouped
/// thousands and semicolon delimiters.
pub fn write_vietnamese_csv(dir: &Path, symbol: &str, closes: &[f64], volumes: &[f64]) {
    let start = date(2024, 1, 1);
    let mut content = String::from("Ngày;Giá đóng cửa;Khối lượng\n");
    for (i, (c, v)) in closes.iter().zip(volumes).enumerate() {
        let day = start + chrono::Duration::days(i as i64);
        content.push_str(&format!(
            "{};{};{}\n",
            day.format("%d/%m/%Y"),
            group(*c as i64),
            group(*v as i64)
        ));
    }
    fs::write(dir.join(format!("{symbol}.csv")), content).unwrap();
}

fn group(value: i64) -> String {
    marketscore::cli::group_thousands(value)
}
