//! Configuration validation.
//!
//! Every key is optional. A key that is present must parse and be in range;
//! absent keys fall back to the defaults of [`StrengthConfig`] and
//! [`PickConfig`].

use crate::domain::error::MarketScoreError;
use crate::domain::picks::TargetMode;
use crate::ports::config_port::ConfigPort;

pub fn validate_strength_config(config: &dyn ConfigPort) -> Result<(), MarketScoreError> {
    for key in ["ma_days", "vol_window", "mom_days"] {
        validate_window(config, "strength", key)?;
    }
    validate_non_negative_int(config, "strength", "skipped_sample_cap")?;
    Ok(())
}

pub fn validate_pick_config(config: &dyn ConfigPort) -> Result<(), MarketScoreError> {
    for key in [
        "count",
        "vol_window",
        "ma_short",
        "ma_long",
        "recent_low_days",
        "recent_high_days",
    ] {
        validate_window(config, "picks", key)?;
    }
    validate_strategy(config)?;
    validate_min_avg_vol(config)?;
    validate_discount(config)?;
    validate_premium(config)?;
    validate_number(config, "picks", "momentum_bonus")?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> MarketScoreError {
    MarketScoreError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// Parse a present value as an integer; `Ok(None)` when absent.
fn present_int(config: &dyn ConfigPort, section: &str, key: &str) -> Result<Option<i64>, MarketScoreError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| invalid(section, key, format!("{key} must be an integer, got '{raw}'"))),
    }
}

/// Parse a present value as a finite number; `Ok(None)` when absent.
fn present_number(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<f64>, MarketScoreError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Some(v)),
            _ => Err(invalid(section, key, format!("{key} must be a number, got '{raw}'"))),
        },
    }
}

fn validate_window(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), MarketScoreError> {
    match present_int(config, section, key)? {
        Some(v) if v < 1 => Err(invalid(section, key, format!("{key} must be at least 1"))),
        _ => Ok(()),
    }
}

fn validate_non_negative_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<(), MarketScoreError> {
    match present_int(config, section, key)? {
        Some(v) if v < 0 => Err(invalid(section, key, format!("{key} must be non-negative"))),
        _ => Ok(()),
    }
}

fn validate_number(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), MarketScoreError> {
    present_number(config, section, key).map(|_| ())
}

fn validate_strategy(config: &dyn ConfigPort) -> Result<(), MarketScoreError> {
    match config.get_string("picks", "strategy") {
        Some(s) => s
            .parse::<TargetMode>()
            .map(|_| ())
            .map_err(|reason| invalid("picks", "strategy", reason)),
        None => Ok(()),
    }
}

fn validate_min_avg_vol(config: &dyn ConfigPort) -> Result<(), MarketScoreError> {
    match present_number(config, "picks", "min_avg_vol")? {
        Some(v) if v < 0.0 => Err(invalid("picks", "min_avg_vol", "min_avg_vol must be non-negative")),
        _ => Ok(()),
    }
}

fn validate_discount(config: &dyn ConfigPort) -> Result<(), MarketScoreError> {
    match present_number(config, "picks", "discount")? {
        Some(v) if !(0.0..1.0).contains(&v) => Err(invalid(
            "picks",
            "discount",
            "discount must be between 0 and 1",
        )),
        _ => Ok(()),
    }
}

fn validate_premium(config: &dyn ConfigPort) -> Result<(), MarketScoreError> {
    match present_number(config, "picks", "premium")? {
        Some(v) if v < 0.0 => Err(invalid("picks", "premium", "premium must be non-negative")),
        _ => Ok(()),
    }
}
