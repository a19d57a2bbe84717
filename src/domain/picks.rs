//! Buy/sell candidate selection.
//!
//! Each symbol is filtered (index/segment exclusions, history length,
//! liquidity), given raw buy/sell targets by the configured [`TargetMode`],
//! repaired so that `buy < last < sell`, rounded onto the price tick grid and
//! ranked. A symbol that fails any step is dropped; the batch never aborts
//! because of one symbol.

use crate::domain::column_resolver::resolve_columns;
use crate::domain::error::MarketScoreError;
use crate::domain::normalizer::normalize;
use crate::domain::series::RawTable;
use crate::domain::tick::{RoundDirection, round_to_tick, tick_size};
use crate::domain::window::{sma_last, tail_max, tail_min, trailing_mean_present};
use crate::ports::symbol_source::SymbolSource;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// How raw buy/sell targets are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum TargetMode {
    /// Buy at the short moving average, sell at the long one.
    #[default]
    #[serde(rename = "ma")]
    MovingAverageBand,
    /// Buy at the recent low, sell at the (longer) recent high.
    #[serde(rename = "recent")]
    RecentRange,
    /// Fixed discount/premium around the last close.
    #[serde(rename = "percent")]
    PercentOffset,
}

impl TargetMode {
    pub fn tag(&self) -> &'static str {
        match self {
            TargetMode::MovingAverageBand => "ma",
            TargetMode::RecentRange => "recent",
            TargetMode::PercentOffset => "percent",
        }
    }
}

impl fmt::Display for TargetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for TargetMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ma" | "moving-average-band" => Ok(TargetMode::MovingAverageBand),
            "recent" | "recent-range" => Ok(TargetMode::RecentRange),
            "percent" | "percent-offset" => Ok(TargetMode::PercentOffset),
            other => Err(format!(
                "unknown strategy '{other}' (expected ma, recent or percent)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PickConfig {
    pub count: usize,
    pub strategy: TargetMode,
    pub min_avg_vol: f64,
    pub vol_window: usize,
    pub ma_short: usize,
    pub ma_long: usize,
    pub recent_low_days: usize,
    pub recent_high_days: usize,
    pub discount: f64,
    pub premium: f64,
    pub momentum_bonus: f64,
    pub exclude_prefix: String,
    pub exclude_tokens: Vec<String>,
}

impl Default for PickConfig {
    fn default() -> Self {
        Self {
            count: 5,
            strategy: TargetMode::MovingAverageBand,
            min_avg_vol: 1_000_000.0,
            vol_window: 10,
            ma_short: 20,
            ma_long: 50,
            recent_low_days: 5,
            recent_high_days: 10,
            discount: 0.02,
            premium: 0.06,
            momentum_bonus: 5.0,
            exclude_prefix: "^".to_string(),
            exclude_tokens: vec!["UPCOM".to_string()],
        }
    }
}

impl PickConfig {
    /// Longest window plus the latest and the previous row, never below 10.
    pub fn min_rows(&self) -> usize {
        let longest = [
            self.ma_short,
            self.ma_long,
            self.recent_low_days,
            self.recent_high_days,
            self.vol_window,
        ]
        .into_iter()
        .max()
        .unwrap_or(0);
        (longest + 2).max(10)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pick {
    pub symbol: String,
    pub last: f64,
    pub buy: i64,
    pub sell: i64,
    pub avg_vol: f64,
    pub score: f64,
    pub reason: TargetMode,
}

/// Why a symbol did not become a pick.
#[derive(Debug, Clone, PartialEq)]
pub enum PickRejection {
    ExcludedSymbol,
    ReadError(String),
    MissingColumns,
    TooFewRows { rows: usize, minimum: usize },
    Illiquid { avg_vol: Option<f64> },
    NoPrice,
    /// Price too low for a positive buy target on the tick grid.
    NoBuyLevel { buy: i64 },
}

impl fmt::Display for PickRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PickRejection::ExcludedSymbol => write!(f, "excluded symbol"),
            PickRejection::ReadError(reason) => write!(f, "read error: {reason}"),
            PickRejection::MissingColumns => write!(f, "close or volume column not found"),
            PickRejection::TooFewRows { rows, minimum } => {
                write!(f, "too few rows: {rows}, need {minimum}")
            }
            PickRejection::Illiquid { avg_vol: Some(v) } => write!(f, "avg volume {v:.0} below threshold"),
            PickRejection::Illiquid { avg_vol: None } => write!(f, "no volume history"),
            PickRejection::NoPrice => write!(f, "no positive last price"),
            PickRejection::NoBuyLevel { buy } => write!(f, "buy target {buy} is not positive"),
        }
    }
}

/// Index symbols carry the reserved prefix; segment tokens match anywhere in
/// the upper-cased symbol.
pub fn is_excluded_symbol(symbol: &str, config: &PickConfig) -> bool {
    let upper = symbol.to_uppercase();
    (!config.exclude_prefix.is_empty() && upper.starts_with(&config.exclude_prefix.to_uppercase()))
        || config
            .exclude_tokens
            .iter()
            .filter(|t| !t.is_empty())
            .any(|t| upper.contains(&t.to_uppercase()))
}

/// Raw (unrounded) buy and sell targets for a dense close series.
pub fn raw_targets(closes: &[f64], config: &PickConfig) -> (f64, f64) {
    let last = closes.last().copied().unwrap_or(0.0);
    let offset_buy = last * (1.0 - config.discount);
    let offset_sell = last * (1.0 + config.premium);
    match config.strategy {
        TargetMode::PercentOffset => (offset_buy, offset_sell),
        TargetMode::RecentRange => (
            tail_min(closes, config.recent_low_days).unwrap_or(offset_buy),
            tail_max(closes, config.recent_high_days).unwrap_or(offset_sell),
        ),
        TargetMode::MovingAverageBand => (
            sma_last(closes, config.ma_short).unwrap_or(offset_buy),
            sma_last(closes, config.ma_long).unwrap_or(offset_sell),
        ),
    }
}

/// Push targets to the correct side of `last`, round buy down and sell up to
/// the tick of `last`'s band, then enforce `buy < sell`. Below one tick above
/// zero the buy can still come out non-positive; callers reject those.
pub fn settle_targets(last: f64, raw_buy: f64, raw_sell: f64) -> (i64, i64) {
    let tick = tick_size(last);
    let step = tick as f64;

    let raw_buy = if raw_buy >= last { last - step } else { raw_buy };
    let raw_sell = if raw_sell <= last { last + step } else { raw_sell };

    let mut buy = round_to_tick(raw_buy, tick, RoundDirection::Down);
    let mut sell = round_to_tick(raw_sell, tick, RoundDirection::Up);

    if buy <= 0 {
        buy = round_to_tick(last.trunc() - step, tick, RoundDirection::Down);
    }
    if sell <= buy {
        sell = buy + tick;
    }
    (buy, sell)
}

/// Turn one symbol's table into a pick, or say why not.
pub fn evaluate_symbol(
    symbol: &str,
    table: &RawTable,
    config: &PickConfig,
) -> Result<Pick, PickRejection> {
    if is_excluded_symbol(symbol, config) {
        return Err(PickRejection::ExcludedSymbol);
    }

    let mapping = resolve_columns(table);
    if mapping.close_column.is_none() || mapping.volume_column.is_none() {
        return Err(PickRejection::MissingColumns);
    }

    let series = normalize(symbol, table, &mapping).with_closes_only();
    let closes: Vec<f64> = series.rows.iter().filter_map(|r| r.close).collect();
    // A zero volume means no print, not a real observation.
    let volumes: Vec<Option<f64>> = series
        .rows
        .iter()
        .map(|r| r.volume.filter(|v| *v != 0.0))
        .collect();

    let n = closes.len();
    let minimum = config.min_rows();
    if n < minimum {
        return Err(PickRejection::TooFewRows { rows: n, minimum });
    }

    let avg_vol = trailing_mean_present(&volumes, config.vol_window, n - 2);
    let avg_vol = match avg_vol {
        Some(v) if v >= config.min_avg_vol => v,
        other => return Err(PickRejection::Illiquid { avg_vol: other }),
    };

    let last = closes[n - 1];
    if last <= 0.0 {
        return Err(PickRejection::NoPrice);
    }
    let prev = closes[n - 2];
    let pct_change = if prev != 0.0 {
        (last - prev) / prev * 100.0
    } else {
        0.0
    };

    let (raw_buy, raw_sell) = raw_targets(&closes, config);
    let (buy, sell) = settle_targets(last, raw_buy, raw_sell);
    if buy <= 0 {
        return Err(PickRejection::NoBuyLevel { buy });
    }

    let above_long = sma_last(&closes, config.ma_long).is_some_and(|ma| last > ma);
    let score = pct_change + if above_long { config.momentum_bonus } else { 0.0 };

    Ok(Pick {
        symbol: symbol.to_string(),
        last,
        buy,
        sell,
        avg_vol,
        score,
        reason: config.strategy,
    })
}

/// Order by score, then average volume, both descending; symbol breaks
/// remaining ties. Keeps the first `count`.
pub fn rank_picks(mut picks: Vec<Pick>, count: usize) -> Vec<Pick> {
    picks.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then(b.avg_vol.total_cmp(&a.avg_vol))
            .then(a.symbol.cmp(&b.symbol))
    });
    picks.truncate(count);
    picks
}

/// Top picks across every symbol in `source`. Fails only if the universe
/// itself cannot be listed.
pub fn select_picks(
    source: &dyn SymbolSource,
    config: &PickConfig,
) -> Result<Vec<Pick>, MarketScoreError> {
    let symbols = source.list_symbols()?;
    let considered = symbols.len();

    let candidates: Vec<Pick> = symbols
        .iter()
        .filter_map(|symbol| {
            let outcome = if is_excluded_symbol(symbol, config) {
                Err(PickRejection::ExcludedSymbol)
            } else {
                source
                    .read_table(symbol)
                    .map_err(|e| PickRejection::ReadError(e.to_string()))
                    .and_then(|table| evaluate_symbol(symbol, &table, config))
            };
            match outcome {
                Ok(pick) => Some(pick),
                Err(rejection) => {
                    debug!(symbol = %symbol, %rejection, "not a pick");
                    None
                }
            }
        })
        .collect();

    info!(
        considered,
        eligible = candidates.len(),
        strategy = %config.strategy,
        "pick selection done"
    );

    Ok(rank_picks(candidates, config.count))
}
