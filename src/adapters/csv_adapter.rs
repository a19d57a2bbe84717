//! Directory-of-CSV-files symbol source.
//!
//! One file per symbol, the file stem being the symbol id. Files are read
//! as bytes and decoded leniently: UTF-8 when valid (BOM stripped), Latin-1
//! otherwise. The delimiter is sniffed from the header line.

use crate::domain::error::MarketScoreError;
use crate::domain::series::RawTable;
use crate::ports::symbol_source::SymbolSource;
use std::fs;
use std::path::{Path, PathBuf};

const CANDIDATE_DELIMITERS: [u8; 3] = [b',', b';', b'\t'];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    /// Path for `symbol`, falling back to a case-insensitive extension match
    /// (`VCB.CSV`).
    fn resolve_path(&self, symbol: &str) -> PathBuf {
        let path = self.csv_path(symbol);
        if path.exists() {
            return path;
        }
        let upper = self.base_path.join(format!("{}.CSV", symbol));
        if upper.exists() { upper } else { path }
    }
}

/// Decode file bytes to text without failing on legacy encodings.
pub fn decode_bytes(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Pick the candidate delimiter that occurs most often in the first line.
pub fn sniff_delimiter(content: &str) -> u8 {
    let header = content.lines().next().unwrap_or("");
    CANDIDATE_DELIMITERS
        .iter()
        .copied()
        .max_by_key(|d| {
            let count = header.bytes().filter(|b| b == d).count();
            // Prefer the comma on ties.
            (count, *d == b',')
        })
        .unwrap_or(b',')
}

/// Parse CSV text into a [`RawTable`]. Short rows are padded with empty
/// cells; fully blank lines are skipped.
pub fn parse_table(content: &str) -> Result<RawTable, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(sniff_delimiter(content))
        .flexible(true)
        .has_headers(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
    let width = headers.len();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        if record.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        let mut row: Vec<String> = record.iter().map(str::to_string).collect();
        if row.len() < width {
            row.resize(width, String::new());
        }
        rows.push(row);
    }

    Ok(RawTable::new(headers, rows))
}

impl SymbolSource for CsvAdapter {
    fn list_symbols(&self) -> Result<Vec<String>, MarketScoreError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| MarketScoreError::DataSource {
            path: self.base_path.display().to_string(),
            reason: e.to_string(),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| MarketScoreError::DataSource {
                path: self.base_path.display().to_string(),
                reason: format!("directory entry error: {}", e),
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let is_csv = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
            if !is_csv {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                symbols.push(stem.to_string());
            }
        }

        symbols.sort();
        symbols.dedup();
        Ok(symbols)
    }

    fn read_table(&self, symbol: &str) -> Result<RawTable, MarketScoreError> {
        let path = self.resolve_path(symbol);
        let bytes = fs::read(&path).map_err(|e| MarketScoreError::SymbolRead {
            symbol: symbol.to_string(),
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        let content = decode_bytes(&bytes);
        if content.trim().is_empty() {
            return Ok(RawTable::default());
        }
        parse_table(&content).map_err(|e| MarketScoreError::SymbolRead {
            symbol: symbol.to_string(),
            reason: format!("CSV parse error: {}", e),
        })
    }

    fn describe(&self) -> String {
        self.base_path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "date,open,high,low,close,volume\n\
            2024-01-15,100.0,110.0,90.0,105.0,50000\n\
            2024-01-16,105.0,115.0,100.0,110.0,60000\n\
            2024-01-17,110.0,120.0,105.0,115.0,55000\n";

        fs::write(path.join("VCB.csv"), csv_content).unwrap();
        fs::write(path.join("FPT.CSV"), "date,close\n").unwrap();
        fs::write(path.join("notes.txt"), "ignore me").unwrap();
        fs::create_dir(path.join("nested.csv")).unwrap();

        (dir, path)
    }

    #[test]
    fn list_symbols_returns_sorted_csv_stems() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        assert_eq!(adapter.list_symbols().unwrap(), vec!["FPT", "VCB"]);
    }

    #[test]
    fn list_symbols_fails_for_missing_directory() {
        let adapter = CsvAdapter::new(PathBuf::from("/nonexistent/marketscore/data"));
        assert!(matches!(
            adapter.list_symbols(),
            Err(MarketScoreError::DataSource { .. })
        ));
    }

    #[test]
    fn read_table_returns_headers_and_cells() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        let table = adapter.read_table("VCB").unwrap();
        assert_eq!(table.headers[4], "close");
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.rows[1][4], "110.0");
    }

    #[test]
    fn read_table_accepts_upper_case_extension_and_header_only() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        let table = adapter.read_table("FPT").unwrap();
        assert_eq!(table.headers, vec!["date", "close"]);
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn read_table_missing_file_is_symbol_error() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        assert!(matches!(
            adapter.read_table("XYZ"),
            Err(MarketScoreError::SymbolRead { .. })
        ));
    }

    #[test]
    fn latin1_bytes_are_decoded() {
        // "Giá" with á encoded as Latin-1 0xE1
        let bytes = b"Ng\xE0y,Gi\xE1\n2024-01-01,10\n";
        let text = decode_bytes(bytes);
        assert!(text.starts_with("Ngày,Giá"));
    }

    #[test]
    fn bom_is_stripped() {
        let text = decode_bytes(b"\xEF\xBB\xBFdate,close\n");
        assert!(text.starts_with("date"));
    }

    #[test]
    fn semicolon_files_are_sniffed() {
        let table = parse_table("Ngày;Giá đóng cửa;KL\n01/02/2024;23,450;1,200\n").unwrap();
        assert_eq!(table.headers, vec!["Ngày", "Giá đóng cửa", "KL"]);
        assert_eq!(table.rows[0], vec!["01/02/2024", "23,450", "1,200"]);
    }

    #[test]
    fn ragged_rows_are_padded_and_blank_lines_skipped() {
        let table = parse_table("a,b,c\n1,2\n,,\n4,5,6\n").unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0], vec!["1", "2", ""]);
    }
}
