//! Cell coercion and series construction.
//!
//! Nothing in here fails: a cell that cannot be read as a number becomes
//! `None`, a row whose date cannot be read is dropped from a dated series,
//! and a table without any date column gets [`placeholder_date`] on every
//! row.

use crate::domain::column_resolver::ColumnMapping;
use crate::domain::series::{DateSource, RawTable, SeriesRow, SymbolSeries, placeholder_date};
use chrono::{NaiveDate, NaiveDateTime};

/// Header keywords (lowercase, substring match) that mark a date column.
pub const DATE_KEYWORDS: &[&str] = &["date", "ngày", "ngay", "day", "time", "thời gian"];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y", "%Y%m%d", "%d.%m.%Y",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d/%m/%Y %H:%M:%S"];

const MISSING_MARKERS: &[&str] = &["", "-", "--", "nan", "na", "n/a", "null", "none"];

/// Parse a cell as a number after removing grouping separators and
/// whitespace. Non-finite results count as missing.
pub fn parse_number(cell: &str) -> Option<f64> {
    let cleaned: String = cell
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace() && *c != '\u{a0}')
        .collect();
    if MISSING_MARKERS.contains(&cleaned.to_lowercase().as_str()) {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a date cell in any of the accepted layouts. A trailing time part is
/// ignored.
pub fn parse_date(cell: &str) -> Option<NaiveDate> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt.date());
        }
    }
    let date_part = trimmed
        .split(|c: char| c.is_whitespace() || c == 'T')
        .next()
        .unwrap_or(trimmed);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

pub fn is_date_header(header: &str) -> bool {
    let lower = header.trim().to_lowercase();
    DATE_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// First column whose header looks like a date, in column order.
pub fn find_date_column(headers: &[String]) -> Option<usize> {
    headers.iter().position(|h| is_date_header(h))
}

/// Build a [`SymbolSeries`] from a raw table and a resolved mapping.
///
/// With a date column, rows are sorted ascending by date and, for repeated
/// dates, the row appearing last in the file wins. Without one, file order
/// is kept untouched.
pub fn normalize(symbol: &str, table: &RawTable, mapping: &ColumnMapping) -> SymbolSeries {
    let close_idx = mapping
        .close_column
        .as_deref()
        .and_then(|c| table.column_index(c));
    let volume_idx = mapping
        .volume_column
        .as_deref()
        .and_then(|c| table.column_index(c));
    let date_idx = find_date_column(&table.headers);

    let cell_number = |row: &Vec<String>, idx: Option<usize>| {
        idx.and_then(|i| row.get(i)).and_then(|c| parse_number(c))
    };

    let (rows, date_source) = match date_idx {
        Some(d) => {
            let mut dated: Vec<SeriesRow> = table
                .rows
                .iter()
                .filter_map(|row| {
                    let date = row.get(d).and_then(|c| parse_date(c))?;
                    Some(SeriesRow {
                        date,
                        close: cell_number(row, close_idx),
                        volume: cell_number(row, volume_idx),
                    })
                })
                .collect();
            // Stable sort keeps file order within a date; the dedup pass then
            // keeps the last of each run.
            dated.sort_by_key(|r| r.date);
            let mut deduped: Vec<SeriesRow> = Vec::with_capacity(dated.len());
            for row in dated {
                match deduped.last_mut() {
                    Some(prev) if prev.date == row.date => *prev = row,
                    _ => deduped.push(row),
                }
            }
            (deduped, DateSource::Observed)
        }
        None => {
            let rows = table
                .rows
                .iter()
                .map(|row| SeriesRow {
                    date: placeholder_date(),
                    close: cell_number(row, close_idx),
                    volume: cell_number(row, volume_idx),
                })
                .collect();
            (rows, DateSource::Placeholder)
        }
    };

    SymbolSeries {
        symbol: symbol.to_string(),
        rows,
        date_source,
        has_volume: volume_idx.is_some(),
    }
}
