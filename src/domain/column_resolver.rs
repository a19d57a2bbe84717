//! Close/volume column inference for tables with unpredictable headers.
//!
//! Resolution runs per target in three stages and stops at the first hit:
//! exact keyword match, substring keyword match, then a numeric-statistics
//! fallback over the cell contents. Both the market strength aggregator and
//! the pick selector go through [`resolve_columns`].

use crate::domain::normalizer::{is_date_header, parse_number};
use crate::domain::series::RawTable;

/// Close-price header keywords, highest priority first.
pub const CLOSE_KEYWORDS: &[&str] = &[
    "close",
    "closeprice",
    "close_price",
    "giá đóng cửa",
    "đóng cửa",
    "đóng",
    "dong",
    "last",
    "price",
    "giá",
    "gia",
];

/// Volume header keywords, highest priority first.
pub const VOLUME_KEYWORDS: &[&str] = &[
    "volume",
    "khối lượng",
    "khoi luong",
    "khối",
    "khoi",
    "vol",
    "k.l.",
    "kl",
    "qty",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    pub close_column: Option<String>,
    pub volume_column: Option<String>,
}

impl ColumnMapping {
    pub fn is_unusable(&self) -> bool {
        self.close_column.is_none() && self.volume_column.is_none()
    }
}

/// Validity statistics for one column under the numeric fallback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericProfile {
    pub index: usize,
    pub valid: usize,
    pub mean_abs: f64,
}

pub fn resolve_columns(table: &RawTable) -> ColumnMapping {
    let headers = &table.headers;

    let mut close = match_exact(headers, CLOSE_KEYWORDS, None)
        .or_else(|| match_substring(headers, CLOSE_KEYWORDS, None));
    let mut volume = match_exact(headers, VOLUME_KEYWORDS, close)
        .or_else(|| match_substring(headers, VOLUME_KEYWORDS, close));

    if close.is_none() || volume.is_none() {
        let profiles = numeric_profiles(table, &[close, volume]);
        if close.is_none() {
            close = pick_close(&profiles);
        }
        if volume.is_none() {
            volume = profiles
                .iter()
                .filter(|p| Some(p.index) != close)
                .max_by(|a, b| {
                    a.mean_abs
                        .total_cmp(&b.mean_abs)
                        .then(b.index.cmp(&a.index))
                })
                .map(|p| p.index);
        }
    }

    ColumnMapping {
        close_column: close.map(|i| headers[i].clone()),
        volume_column: volume.map(|i| headers[i].clone()),
    }
}

fn normalized(header: &str) -> String {
    header.trim().to_lowercase()
}

fn match_exact(headers: &[String], keywords: &[&str], taken: Option<usize>) -> Option<usize> {
    let lower: Vec<String> = headers.iter().map(|h| normalized(h)).collect();
    keywords.iter().find_map(|k| {
        lower
            .iter()
            .enumerate()
            .find(|(i, h)| Some(*i) != taken && h.as_str() == *k)
            .map(|(i, _)| i)
    })
}

fn match_substring(headers: &[String], keywords: &[&str], taken: Option<usize>) -> Option<usize> {
    let lower: Vec<String> = headers.iter().map(|h| normalized(h)).collect();
    keywords.iter().find_map(|k| {
        lower
            .iter()
            .enumerate()
            .find(|(i, h)| Some(*i) != taken && !is_date_header(h) && h.contains(k))
            .map(|(i, _)| i)
    })
}

/// Profiles of every column with at least one numeric cell, excluding date
/// columns and the columns already claimed.
pub fn numeric_profiles(table: &RawTable, claimed: &[Option<usize>]) -> Vec<NumericProfile> {
    table
        .headers
        .iter()
        .enumerate()
        .filter(|(i, h)| !claimed.contains(&Some(*i)) && !is_date_header(h))
        .filter_map(|(i, _)| {
            let values: Vec<f64> = table.column(i).filter_map(parse_number).collect();
            if values.is_empty() {
                return None;
            }
            let mean_abs = values.iter().map(|v| v.abs()).sum::<f64>() / values.len() as f64;
            Some(NumericProfile {
                index: i,
                valid: values.len(),
                mean_abs,
            })
        })
        .collect()
}

/// Most valid cells wins; ties go to the smaller magnitude (prices sit well
/// below volumes), then to the earlier column.
fn pick_close(profiles: &[NumericProfile]) -> Option<usize> {
    profiles
        .iter()
        .max_by(|a, b| {
            a.valid
                .cmp(&b.valid)
                .then(b.mean_abs.total_cmp(&a.mean_abs))
                .then(b.index.cmp(&a.index))
        })
        .map(|p| p.index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    fn resolved(t: &RawTable) -> (Option<&str>, Option<&str>) {
        let m = resolve_columns(t);
        let close = m.close_column.and_then(|c| t.headers.iter().find(|h| **h == c));
        let volume = m.volume_column.and_then(|c| t.headers.iter().find(|h| **h == c));
        (close.map(String::as_str), volume.map(String::as_str))
    }

    #[test]
    fn exact_english_headers() {
        let t = table(&["Date", "Open", "High", "Low", "Close", "Volume"], &[]);
        assert_eq!(resolved(&t), (Some("Close"), Some("Volume")));
    }

    #[test]
    fn exact_match_beats_earlier_substring() {
        // "Open price" contains "price" but "Close" is an exact keyword.
        let t = table(&["Open price", "Close", "Vol"], &[]);
        assert_eq!(resolved(&t), (Some("Close"), Some("Vol")));
    }

    #[test]
    fn vietnamese_headers_by_substring() {
        let t = table(
            &["Ngày", "Giá mở cửa", "Giá đóng cửa", "KL khớp lệnh"],
            &[],
        );
        assert_eq!(resolved(&t), (Some("Giá đóng cửa"), Some("KL khớp lệnh")));
    }

    #[test]
    fn uppercase_vietnamese_headers_match() {
        let t = table(&["NGÀY", "ĐÓNG CỬA", "KHỐI LƯỢNG"], &[]);
        assert_eq!(resolved(&t), (Some("ĐÓNG CỬA"), Some("KHỐI LƯỢNG")));
    }

    #[test]
    fn volume_never_reuses_close_column() {
        let t = table(&["price"], &[&["10"]]);
        assert_eq!(resolved(&t), (Some("price"), None));
    }

    #[test]
    fn numeric_fallback_separates_price_and_volume() {
        let t = table(
            &["d", "a", "b", "note"],
            &[
                &["x", "23,450", "1,200,000", "hello"],
                &["y", "23,500", "1,500,000", "world"],
                &["z", "23,300", "bad", "!"],
            ],
        );
        assert_eq!(resolved(&t), (Some("a"), Some("b")));
    }

    #[test]
    fn numeric_fallback_tie_prefers_smaller_magnitude_for_close() {
        let t = table(
            &["c1", "c2"],
            &[&["2000000", "25.5"], &["2100000", "26.0"]],
        );
        assert_eq!(resolved(&t), (Some("c2"), Some("c1")));
    }

    #[test]
    fn fallback_fills_only_the_missing_target() {
        let t = table(
            &["close", "x", "y"],
            &[&["10", "5", "900000"], &["11", "6", "800000"]],
        );
        assert_eq!(resolved(&t), (Some("close"), Some("y")));
    }

    #[test]
    fn fallback_skips_date_columns() {
        let t = table(
            &["date", "v"],
            &[&["20240101", "10"], &["20240102", "11"]],
        );
        assert_eq!(resolved(&t), (Some("v"), None));
    }

    #[test]
    fn no_numeric_columns_is_unusable() {
        let t = table(&["foo", "bar"], &[&["a", "b"], &["c", "d"]]);
        let m = resolve_columns(&t);
        assert!(m.is_unusable());
        assert_eq!(m, ColumnMapping::default());
    }

    #[test]
    fn numeric_profile_counts_and_means() {
        let t = table(&["a"], &[&["1"], &["-3"], &["x"]]);
        let profiles = numeric_profiles(&t, &[]);
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].valid, 2);
        assert!((profiles[0].mean_abs - 2.0).abs() < 1e-12);
    }
}
