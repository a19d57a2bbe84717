//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_history_adapter::CsvHistoryAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::{validate_pick_config, validate_strength_config};
use crate::domain::error::MarketScoreError;
use crate::domain::market_strength::{AggregateResult, StrengthConfig, compute_market_strength};
use crate::domain::picks::{Pick, PickConfig, TargetMode, select_picks};
use crate::domain::strength_level::StrengthLevel;
use crate::logging::{LogConfig, LogFormat, init_logging};
use crate::ports::config_port::ConfigPort;
use crate::ports::history_port::HistoryPort;

pub const DEFAULT_DATA_DIR: &str = "data_hist";
pub const DEFAULT_HISTORY_FILE: &str = "history.csv";

#[derive(Parser, Debug)]
#[command(
    name = "marketscore",
    about = "Market strength score and buy/sell picks from per-symbol CSV files"
)]
pub struct Cli {
    /// INI configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    /// Directory holding one CSV file per symbol
    #[arg(long, global = true, env = "DATA_DIR")]
    pub data_dir: Option<PathBuf>,
    /// Append-only score history log
    #[arg(long, global = true, env = "HISTORY_FILE")]
    pub history_file: Option<PathBuf>,
    #[arg(long, global = true, default_value = "pretty")]
    pub log_format: LogFormat,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute the market strength score
    Score {
        #[arg(long)]
        json: bool,
        /// Do not append a row to the history log
        #[arg(long)]
        no_history: bool,
    },
    /// Select buy/sell candidates
    Picks {
        #[arg(short, long)]
        strategy: Option<TargetMode>,
        #[arg(short = 'n', long)]
        count: Option<usize>,
        #[arg(long, env = "MIN_AVG_VOL")]
        min_avg_vol: Option<f64>,
        #[arg(long)]
        json: bool,
    },
    /// Score header followed by the top picks
    Quick {
        #[arg(short, long)]
        strategy: Option<TargetMode>,
        #[arg(long)]
        no_history: bool,
        #[arg(long)]
        json: bool,
    },
    /// Validate a configuration file and print the effective settings
    Validate,
}

/// Command-line overrides for pick selection.
#[derive(Debug, Default, Clone)]
pub struct PickOverrides {
    pub strategy: Option<TargetMode>,
    pub count: Option<usize>,
    pub min_avg_vol: Option<f64>,
}

pub fn run(cli: Cli) -> ExitCode {
    if let Err(e) = init_logging(&LogConfig::default().with_format(cli.log_format)) {
        eprintln!("warning: logging disabled: {e}");
    }

    let config = match load_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let data_dir = resolve_data_dir(cli.data_dir.as_deref(), &config);
    let history_file = resolve_history_file(cli.history_file.as_deref(), &config);

    let outcome = match cli.command {
        Command::Score { json, no_history } => {
            let history = (!no_history).then_some(history_file.as_path());
            run_score(&config, &data_dir, history, json)
        }
        Command::Picks {
            strategy,
            count,
            min_avg_vol,
            json,
        } => {
            let overrides = PickOverrides {
                strategy,
                count,
                min_avg_vol,
            };
            run_picks(&config, &data_dir, &overrides, json)
        }
        Command::Quick {
            strategy,
            no_history,
            json,
        } => {
            let history = (!no_history).then_some(history_file.as_path());
            let overrides = PickOverrides {
                strategy,
                ..Default::default()
            };
            run_quick(&config, &data_dir, history, &overrides, json)
        }
        Command::Validate => match cli.config {
            Some(path) => run_validate(&path, &config, &data_dir, &history_file),
            None => {
                eprintln!("error: --config is required for validate");
                return ExitCode::from(2);
            }
        },
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Load the INI file at `path`, or an empty configuration when none is given.
pub fn load_config(path: Option<&Path>) -> Result<FileConfigAdapter, ExitCode> {
    let Some(path) = path else {
        return Ok(FileConfigAdapter::empty());
    };
    FileConfigAdapter::from_file(path).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

pub fn resolve_data_dir(flag: Option<&Path>, config: &dyn ConfigPort) -> PathBuf {
    flag.map(Path::to_path_buf)
        .or_else(|| config.get_string("data", "dir").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

pub fn resolve_history_file(flag: Option<&Path>, config: &dyn ConfigPort) -> PathBuf {
    flag.map(Path::to_path_buf)
        .or_else(|| config.get_string("data", "history_file").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_HISTORY_FILE))
}

pub fn build_strength_config(config: &dyn ConfigPort) -> Result<StrengthConfig, MarketScoreError> {
    validate_strength_config(config)?;
    let defaults = StrengthConfig::default();
    let window = |key: &str, default: usize| config.get_int("strength", key, default as i64) as usize;

    Ok(StrengthConfig {
        ma_days: window("ma_days", defaults.ma_days),
        vol_window: window("vol_window", defaults.vol_window),
        mom_days: window("mom_days", defaults.mom_days),
        skipped_sample_cap: window("skipped_sample_cap", defaults.skipped_sample_cap),
    })
}

pub fn build_pick_config(config: &dyn ConfigPort) -> Result<PickConfig, MarketScoreError> {
    validate_pick_config(config)?;
    let defaults = PickConfig::default();
    let window = |key: &str, default: usize| config.get_int("picks", key, default as i64) as usize;
    let number = |key: &str, default: f64| config.get_double("picks", key, default);

    let strategy = match config.get_string("picks", "strategy") {
        Some(raw) => raw.parse().map_err(|reason| MarketScoreError::ConfigInvalid {
            section: "picks".into(),
            key: "strategy".into(),
            reason,
        })?,
        None => defaults.strategy,
    };

    Ok(PickConfig {
        count: window("count", defaults.count),
        strategy,
        min_avg_vol: number("min_avg_vol", defaults.min_avg_vol),
        vol_window: window("vol_window", defaults.vol_window),
        ma_short: window("ma_short", defaults.ma_short),
        ma_long: window("ma_long", defaults.ma_long),
        recent_low_days: window("recent_low_days", defaults.recent_low_days),
        recent_high_days: window("recent_high_days", defaults.recent_high_days),
        discount: number("discount", defaults.discount),
        premium: number("premium", defaults.premium),
        momentum_bonus: number("momentum_bonus", defaults.momentum_bonus),
        exclude_prefix: config
            .get_string("picks", "exclude_prefix")
            .unwrap_or(defaults.exclude_prefix),
        exclude_tokens: config
            .get_list("picks", "exclude_tokens")
            .unwrap_or(defaults.exclude_tokens),
    })
}

/// Apply command-line overrides on top of the file configuration.
pub fn apply_overrides(
    mut config: PickConfig,
    overrides: &PickOverrides,
) -> Result<PickConfig, MarketScoreError> {
    if let Some(strategy) = overrides.strategy {
        config.strategy = strategy;
    }
    if let Some(count) = overrides.count {
        if count == 0 {
            return Err(MarketScoreError::ConfigInvalid {
                section: "picks".into(),
                key: "count".into(),
                reason: "count must be at least 1".into(),
            });
        }
        config.count = count;
    }
    if let Some(min_avg_vol) = overrides.min_avg_vol {
        if !min_avg_vol.is_finite() || min_avg_vol < 0.0 {
            return Err(MarketScoreError::ConfigInvalid {
                section: "picks".into(),
                key: "min_avg_vol".into(),
                reason: "min_avg_vol must be a non-negative number".into(),
            });
        }
        config.min_avg_vol = min_avg_vol;
    }
    Ok(config)
}

/// Run the aggregator over `data_dir`, appending history when enabled.
fn compute_strength(
    config: &dyn ConfigPort,
    data_dir: &Path,
    history_path: Option<&Path>,
) -> Result<AggregateResult, MarketScoreError> {
    let strength_config = build_strength_config(config)?;
    let source = CsvAdapter::new(data_dir.to_path_buf());
    let history_adapter = history_path
        .filter(|_| config.get_bool("strength", "append_history", true))
        .map(|p| CsvHistoryAdapter::new(p.to_path_buf()));
    let history = history_adapter.as_ref().map(|h| h as &dyn HistoryPort);

    info!(data_dir = %data_dir.display(), "computing market strength");
    let now = chrono::Local::now().naive_local();
    compute_market_strength(&source, &strength_config, history, now)
}

fn no_data(data_dir: &Path) -> MarketScoreError {
    MarketScoreError::NoData {
        path: data_dir.display().to_string(),
    }
}

fn run_score(
    config: &dyn ConfigPort,
    data_dir: &Path,
    history_path: Option<&Path>,
    json: bool,
) -> Result<(), MarketScoreError> {
    let result = compute_strength(config, data_dir, history_path)?;

    if json {
        print_json(&ScoreReport::new(&result))?;
    } else {
        print!("{}", render_score(&result));
    }
    // Zero result is printed before the no-data exit.
    if result.has_data() {
        Ok(())
    } else {
        Err(no_data(data_dir))
    }
}

fn run_picks(
    config: &dyn ConfigPort,
    data_dir: &Path,
    overrides: &PickOverrides,
    json: bool,
) -> Result<(), MarketScoreError> {
    let pick_config = apply_overrides(build_pick_config(config)?, overrides)?;
    let source = CsvAdapter::new(data_dir.to_path_buf());
    let picks = select_picks(&source, &pick_config)?;

    if json {
        print_json(&picks)
    } else {
        print!("{}", render_picks(&picks, &pick_config));
        Ok(())
    }
}

fn run_quick(
    config: &dyn ConfigPort,
    data_dir: &Path,
    history_path: Option<&Path>,
    overrides: &PickOverrides,
    json: bool,
) -> Result<(), MarketScoreError> {
    let pick_config = apply_overrides(build_pick_config(config)?, overrides)?;
    let result = compute_strength(config, data_dir, history_path)?;
    if !result.has_data() {
        if json {
            print_json(&QuickReport {
                strength: ScoreReport::new(&result),
                picks: &[],
            })?;
        } else {
            print!("{}", render_score(&result));
        }
        return Err(no_data(data_dir));
    }

    let source = CsvAdapter::new(data_dir.to_path_buf());
    let picks = match select_picks(&source, &pick_config) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "pick selection failed");
            Vec::new()
        }
    };

    if json {
        print_json(&QuickReport {
            strength: ScoreReport::new(&result),
            picks: &picks,
        })
    } else {
        print!("{}", render_score(&result));
        println!();
        print!("{}", render_picks(&picks, &pick_config));
        Ok(())
    }
}

fn run_validate(
    path: &Path,
    config: &dyn ConfigPort,
    data_dir: &Path,
    history_file: &Path,
) -> Result<(), MarketScoreError> {
    eprintln!("Validating config: {}", path.display());
    let strength = build_strength_config(config)?;
    let picks = build_pick_config(config)?;

    eprintln!("\n[data]");
    eprintln!("  dir:                {}", data_dir.display());
    eprintln!("  history_file:       {}", history_file.display());
    eprintln!("\n[strength]");
    eprintln!("  ma_days:            {}", strength.ma_days);
    eprintln!("  vol_window:         {}", strength.vol_window);
    eprintln!("  mom_days:           {}", strength.mom_days);
    eprintln!("  skipped_sample_cap: {}", strength.skipped_sample_cap);
    eprintln!(
        "  append_history:     {}",
        config.get_bool("strength", "append_history", true)
    );
    eprintln!("\n[picks]");
    eprintln!("  count:              {}", picks.count);
    eprintln!("  strategy:           {}", picks.strategy);
    eprintln!("  min_avg_vol:        {}", picks.min_avg_vol);
    eprintln!("  vol_window:         {}", picks.vol_window);
    eprintln!("  ma_short/ma_long:   {}/{}", picks.ma_short, picks.ma_long);
    eprintln!(
        "  recent low/high:    {}/{}",
        picks.recent_low_days, picks.recent_high_days
    );
    eprintln!("  discount/premium:   {}/{}", picks.discount, picks.premium);
    eprintln!("  momentum_bonus:     {}", picks.momentum_bonus);
    eprintln!("  exclude_prefix:     {}", picks.exclude_prefix);
    eprintln!("  exclude_tokens:     {}", picks.exclude_tokens.join(", "));

    eprintln!("\nConfiguration is valid.");
    Ok(())
}

#[derive(Serialize)]
struct ScoreReport<'a> {
    #[serde(flatten)]
    result: &'a AggregateResult,
    level: StrengthLevel,
}

impl<'a> ScoreReport<'a> {
    fn new(result: &'a AggregateResult) -> Self {
        Self {
            result,
            level: StrengthLevel::from_score(result.score),
        }
    }
}

#[derive(Serialize)]
struct QuickReport<'a> {
    strength: ScoreReport<'a>,
    picks: &'a [Pick],
}

fn print_json<T: Serialize>(value: &T) -> Result<(), MarketScoreError> {
    let text = serde_json::to_string_pretty(value).map_err(std::io::Error::other)?;
    println!("{text}");
    Ok(())
}

pub fn render_score(result: &AggregateResult) -> String {
    let level = StrengthLevel::from_score(result.score);
    let mut out = String::new();
    out.push_str("MARKET STRENGTH\n");
    out.push_str(&format!("Score: {:.1}/100 ({})\n", result.score, level));
    out.push_str(&format!(
        "Breadth {:.1}% | Volume {:.1}% | Momentum {:.1}%\n",
        result.breadth_pct, result.vol_pct, result.mom_pct
    ));
    out.push_str(&format!(
        "Used {} of {} files\n",
        result.counts.used, result.counts.total_files
    ));
    if !result.has_data() {
        out.push_str("No usable symbol files.\n");
    }
    let skipped = result.counts.total_files - result.counts.used;
    if skipped > 0 {
        out.push_str(&format!("Skipped {skipped}:\n"));
        for s in &result.skipped_sample {
            if s.detail.is_empty() {
                out.push_str(&format!("  {}: {}\n", s.symbol, s.reason));
            } else {
                out.push_str(&format!("  {}: {} ({})\n", s.symbol, s.reason, s.detail));
            }
        }
        if skipped > result.skipped_sample.len() {
            out.push_str(&format!(
                "  ... and {} more\n",
                skipped - result.skipped_sample.len()
            ));
        }
    }
    out.push_str(&format!("Advice: {}\n", level.advice()));
    out
}

pub fn render_picks(picks: &[Pick], config: &PickConfig) -> String {
    let mut out = format!("TOP {} PICKS ({})\n", config.count, config.strategy);
    if picks.is_empty() {
        out.push_str("No symbol passed the filters.\n");
        return out;
    }
    for p in picks {
        out.push_str(&format!(
            "{}: last {} | buy {} | sell {} | vol avg {}\n",
            p.symbol,
            format_price(p.last),
            group_thousands(p.buy),
            group_thousands(p.sell),
            group_thousands(p.avg_vol.round() as i64),
        ));
    }
    out
}

fn format_price(price: f64) -> String {
    if price.fract() == 0.0 {
        group_thousands(price as i64)
    } else {
        format!("{price:.2}")
    }
}

/// `1234567` -> `1,234,567`.
pub fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
