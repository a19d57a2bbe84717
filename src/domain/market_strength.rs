//! Universe-wide market strength: breadth, volume and momentum signals per
//! symbol, folded into one composite score.
//!
//! All window statistics end at the second-to-last row so the latest row is
//! only ever compared against history that precedes it.

use crate::domain::column_resolver::resolve_columns;
use crate::domain::error::MarketScoreError;
use crate::domain::normalizer::normalize;
use crate::domain::series::{RawTable, SymbolSeries};
use crate::domain::window::{round2, trailing_mean};
use crate::ports::history_port::HistoryPort;
use crate::ports::symbol_source::SymbolSource;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};

pub const BREADTH_WEIGHT: f64 = 0.4;
pub const VOLUME_WEIGHT: f64 = 0.3;
pub const MOMENTUM_WEIGHT: f64 = 0.3;

pub const HISTORY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq)]
pub struct StrengthConfig {
    pub ma_days: usize,
    pub vol_window: usize,
    pub mom_days: usize,
    pub skipped_sample_cap: usize,
}

impl Default for StrengthConfig {
    fn default() -> Self {
        Self {
            ma_days: 50,
            vol_window: 20,
            mom_days: 20,
            skipped_sample_cap: 50,
        }
    }
}

impl StrengthConfig {
    pub fn min_rows(&self) -> usize {
        self.ma_days.max(self.vol_window).max(self.mom_days) + 1
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    ReadError(String),
    TooFewRows { rows: usize, minimum: usize },
    NoCloseColumn { columns: String },
    CloseMostlyMissing { column: String, missing: usize, rows: usize },
    MissingValues,
}

impl SkipReason {
    /// Stable short code, also used in the skipped sample.
    pub fn code(&self) -> &'static str {
        match self {
            SkipReason::ReadError(_) => "read_error",
            SkipReason::TooFewRows { .. } => "too_few_rows",
            SkipReason::NoCloseColumn { .. } => "no_close_col",
            SkipReason::CloseMostlyMissing { .. } => "close_mostly_nan",
            SkipReason::MissingValues => "nan_values_in_price_or_ma",
        }
    }

    fn detail(&self) -> String {
        match self {
            SkipReason::ReadError(reason) => reason.clone(),
            SkipReason::TooFewRows { rows, minimum } => format!("{rows} rows, need {minimum}"),
            SkipReason::NoCloseColumn { columns } => columns.clone(),
            SkipReason::CloseMostlyMissing {
                column,
                missing,
                rows,
            } => format!("{column}: {missing} of {rows} missing"),
            SkipReason::MissingValues => String::new(),
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let detail = self.detail();
        if detail.is_empty() {
            write!(f, "{}", self.code())
        } else {
            write!(f, "{} ({})", self.code(), detail)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SymbolSignals {
    pub breadth: bool,
    pub volume: bool,
    pub momentum: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SymbolOutcome {
    Used(SymbolSignals),
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: String,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StrengthCounts {
    pub total_files: usize,
    pub used: usize,
    pub breadth: usize,
    pub vol: usize,
    pub mom: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    pub score: f64,
    pub breadth_pct: f64,
    pub vol_pct: f64,
    pub mom_pct: f64,
    pub counts: StrengthCounts,
    pub skipped_sample: Vec<SkippedSymbol>,
}

impl AggregateResult {
    /// False for the "no data yet" result, as opposed to a computed zero.
    pub fn has_data(&self) -> bool {
        self.counts.used > 0
    }

    pub fn history_entry(&self, timestamp: NaiveDateTime) -> HistoryLogEntry {
        HistoryLogEntry {
            timestamp,
            score: self.score,
            breadth_pct: self.breadth_pct,
            vol_pct: self.vol_pct,
            mom_pct: self.mom_pct,
            total_files: self.counts.total_files,
            used: self.counts.used,
        }
    }
}

/// One row of the append-only history log.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryLogEntry {
    pub timestamp: NaiveDateTime,
    pub score: f64,
    pub breadth_pct: f64,
    pub vol_pct: f64,
    pub mom_pct: f64,
    pub total_files: usize,
    pub used: usize,
}

impl HistoryLogEntry {
    pub const HEADER: [&'static str; 7] = [
        "timestamp",
        "score",
        "breadth_pct",
        "vol_pct",
        "mom_pct",
        "total_files",
        "used",
    ];

    pub fn to_record(&self) -> [String; 7] {
        [
            self.timestamp.format(HISTORY_TIMESTAMP_FORMAT).to_string(),
            self.score.to_string(),
            self.breadth_pct.to_string(),
            self.vol_pct.to_string(),
            self.mom_pct.to_string(),
            self.total_files.to_string(),
            self.used.to_string(),
        ]
    }
}

/// `round(0.4·breadth + 0.3·volume + 0.3·momentum, 2)`.
pub fn composite_score(breadth_pct: f64, vol_pct: f64, mom_pct: f64) -> f64 {
    round2(BREADTH_WEIGHT * breadth_pct + VOLUME_WEIGHT * vol_pct + MOMENTUM_WEIGHT * mom_pct)
}

/// Evaluate one raw table.
pub fn evaluate_table(symbol: &str, table: &RawTable, config: &StrengthConfig) -> SymbolOutcome {
    let minimum = config.min_rows();
    if table.row_count() < minimum {
        return SymbolOutcome::Skipped(SkipReason::TooFewRows {
            rows: table.row_count(),
            minimum,
        });
    }

    let mapping = resolve_columns(table);
    let Some(close_column) = mapping.close_column.clone() else {
        let columns: String = table.headers.join(",").chars().take(200).collect();
        return SymbolOutcome::Skipped(SkipReason::NoCloseColumn { columns });
    };

    let series = normalize(symbol, table, &mapping);
    if series.len() < minimum {
        return SymbolOutcome::Skipped(SkipReason::TooFewRows {
            rows: series.len(),
            minimum,
        });
    }
    let missing = series.missing_closes();
    if missing * 2 > series.len() {
        return SymbolOutcome::Skipped(SkipReason::CloseMostlyMissing {
            column: close_column,
            missing,
            rows: series.len(),
        });
    }

    match compute_signals(&series, config) {
        Some(signals) => SymbolOutcome::Used(signals),
        None => SymbolOutcome::Skipped(SkipReason::MissingValues),
    }
}

/// Signals for a normalized series long enough for every window. `None` if
/// the last close or the close average is undefined.
pub fn compute_signals(series: &SymbolSeries, config: &StrengthConfig) -> Option<SymbolSignals> {
    let n = series.len();
    if n < 2 {
        return None;
    }
    let closes = series.closes();
    let last = n - 1;
    let prior = n - 2;

    let last_close = closes[last]?;
    let ma_close = trailing_mean(&closes, config.ma_days, prior)?;

    let volume = if series.has_volume {
        let volumes = series.volumes();
        let ma_vol = trailing_mean(&volumes, config.vol_window, prior);
        matches!((volumes[last], ma_vol), (Some(v), Some(avg)) if v > avg)
    } else {
        // Counted as a negative signal, not dropped from the denominator.
        false
    };

    let ref_close = if n > config.mom_days {
        closes[last - config.mom_days]
    } else {
        None
    };

    Some(SymbolSignals {
        breadth: last_close > ma_close,
        volume,
        momentum: ref_close.is_some_and(|r| last_close > r),
    })
}

/// Fold per-symbol outcomes into an [`AggregateResult`].
pub fn summarize(
    outcomes: &[(String, SymbolOutcome)],
    total_files: usize,
    sample_cap: usize,
) -> AggregateResult {
    let mut counts = StrengthCounts {
        total_files,
        ..Default::default()
    };
    let mut skipped_sample = Vec::new();

    for (symbol, outcome) in outcomes {
        match outcome {
            SymbolOutcome::Used(s) => {
                counts.used += 1;
                counts.breadth += usize::from(s.breadth);
                counts.vol += usize::from(s.volume);
                counts.mom += usize::from(s.momentum);
            }
            SymbolOutcome::Skipped(reason) => {
                if skipped_sample.len() < sample_cap {
                    skipped_sample.push(SkippedSymbol {
                        symbol: symbol.clone(),
                        reason: reason.code().to_string(),
                        detail: reason.detail(),
                    });
                }
            }
        }
    }

    if counts.used == 0 {
        return AggregateResult {
            score: 0.0,
            breadth_pct: 0.0,
            vol_pct: 0.0,
            mom_pct: 0.0,
            counts,
            skipped_sample,
        };
    }

    // The score is weighted from the exact shares; only reported values are rounded.
    let pct = |hits: usize| 100.0 * hits as f64 / counts.used as f64;
    let breadth_pct = pct(counts.breadth);
    let vol_pct = pct(counts.vol);
    let mom_pct = pct(counts.mom);

    AggregateResult {
        score: composite_score(breadth_pct, vol_pct, mom_pct),
        breadth_pct: round2(breadth_pct),
        vol_pct: round2(vol_pct),
        mom_pct: round2(mom_pct),
        counts,
        skipped_sample,
    }
}

/// Score every symbol in `source` and, when at least one symbol was usable,
/// append one history row stamped `now`.
///
/// Only a failure to list the universe is an error. A failed history append
/// is logged and the result is still returned.
pub fn compute_market_strength(
    source: &dyn SymbolSource,
    config: &StrengthConfig,
    history: Option<&dyn HistoryPort>,
    now: NaiveDateTime,
) -> Result<AggregateResult, MarketScoreError> {
    let symbols = source.list_symbols()?;
    let total_files = symbols.len();

    let outcomes: Vec<(String, SymbolOutcome)> = symbols
        .into_iter()
        .map(|symbol| {
            let outcome = match source.read_table(&symbol) {
                Ok(table) => evaluate_table(&symbol, &table, config),
                Err(e) => SymbolOutcome::Skipped(SkipReason::ReadError(e.to_string())),
            };
            if let SymbolOutcome::Skipped(reason) = &outcome {
                debug!(symbol = %symbol, %reason, "skipping symbol");
            }
            (symbol, outcome)
        })
        .collect();

    let result = summarize(&outcomes, total_files, config.skipped_sample_cap);

    if !result.has_data() {
        warn!(
            source = %source.describe(),
            total_files,
            skipped = outcomes.len(),
            "no usable symbols"
        );
        return Ok(result);
    }

    info!(
        score = result.score,
        used = result.counts.used,
        total_files,
        "market strength computed"
    );

    if let Some(history) = history {
        if let Err(e) = history.append(&result.history_entry(now)) {
            warn!(error = %e, "failed to write history");
        }
    }

    Ok(result)
}
