//! Append-only CSV history log.

use crate::domain::error::MarketScoreError;
use crate::domain::market_strength::{HISTORY_TIMESTAMP_FORMAT, HistoryLogEntry};
use crate::ports::history_port::HistoryPort;
use chrono::NaiveDateTime;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

pub struct CsvHistoryAdapter {
    path: PathBuf,
}

impl CsvHistoryAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_error(&self, reason: impl ToString) -> MarketScoreError {
        MarketScoreError::HistoryWrite {
            path: self.path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    /// Read every entry back. A missing file is an empty history.
    pub fn read_entries(&self) -> Result<Vec<HistoryLogEntry>, MarketScoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut rdr = csv::Reader::from_path(&self.path).map_err(|e| self.read_error(e))?;
        let mut entries = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| self.read_error(e))?;
            let field = |i: usize| record.get(i).unwrap_or("").trim().to_string();
            let number = |i: usize| {
                field(i)
                    .parse::<f64>()
                    .map_err(|e| self.read_error(format!("column {i}: {e}")))
            };
            let count = |i: usize| {
                field(i)
                    .parse::<usize>()
                    .map_err(|e| self.read_error(format!("column {i}: {e}")))
            };
            let timestamp = NaiveDateTime::parse_from_str(&field(0), HISTORY_TIMESTAMP_FORMAT)
                .map_err(|e| self.read_error(format!("timestamp: {e}")))?;
            entries.push(HistoryLogEntry {
                timestamp,
                score: number(1)?,
                breadth_pct: number(2)?,
                vol_pct: number(3)?,
                mom_pct: number(4)?,
                total_files: count(5)?,
                used: count(6)?,
            });
        }
        Ok(entries)
    }

    fn read_error(&self, reason: impl ToString) -> MarketScoreError {
        MarketScoreError::DataSource {
            path: self.path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

impl HistoryPort for CsvHistoryAdapter {
    fn append(&self, entry: &HistoryLogEntry) -> Result<(), MarketScoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.write_error(e))?;
        }
        let needs_header = fs::metadata(&self.path).map(|m| m.len() == 0).unwrap_or(true);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.write_error(e))?;
        let mut wtr = csv::Writer::from_writer(file);

        if needs_header {
            wtr.write_record(HistoryLogEntry::HEADER)
                .map_err(|e| self.write_error(e))?;
        }
        wtr.write_record(entry.to_record())
            .map_err(|e| self.write_error(e))?;
        wtr.flush().map_err(|e| self.write_error(e))?;
        Ok(())
    }
}
