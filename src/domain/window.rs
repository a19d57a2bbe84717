//! Trailing-window statistics over series with missing values.
//!
//! Window positions are inclusive end indices. A strict window (moving
//! averages) is undefined if any value in it is missing; a lenient window
//! (liquidity average) averages whatever is present.

/// Mean of the `window` values ending at `end` (inclusive). `None` when the
/// window does not fit, is empty, or contains a missing value.
pub fn trailing_mean(values: &[Option<f64>], window: usize, end: usize) -> Option<f64> {
    if window == 0 || end >= values.len() || end + 1 < window {
        return None;
    }
    let slice = &values[end + 1 - window..=end];
    let mut sum = 0.0;
    for v in slice {
        sum += (*v)?;
    }
    Some(sum / window as f64)
}

/// Mean of the present values among the `window` values ending at `end`,
/// truncated at the start of the series. `None` when nothing is present.
pub fn trailing_mean_present(values: &[Option<f64>], window: usize, end: usize) -> Option<f64> {
    if window == 0 || end >= values.len() {
        return None;
    }
    let start = (end + 1).saturating_sub(window);
    let present: Vec<f64> = values[start..=end].iter().flatten().copied().collect();
    if present.is_empty() {
        None
    } else {
        Some(present.iter().sum::<f64>() / present.len() as f64)
    }
}

/// Simple moving average over the last `window` entries of a dense series.
pub fn sma_last(values: &[f64], window: usize) -> Option<f64> {
    if window == 0 || values.len() < window {
        return None;
    }
    let tail = &values[values.len() - window..];
    Some(tail.iter().sum::<f64>() / window as f64)
}

/// Minimum over the last `window` entries (or all, if shorter).
pub fn tail_min(values: &[f64], window: usize) -> Option<f64> {
    let start = values.len().saturating_sub(window);
    values[start..].iter().copied().reduce(f64::min)
}

/// Maximum over the last `window` entries (or all, if shorter).
pub fn tail_max(values: &[f64], window: usize) -> Option<f64> {
    let start = values.len().saturating_sub(window);
    values[start..].iter().copied().reduce(f64::max)
}

/// Round half away from zero to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dense(v: &[f64]) -> Vec<Option<f64>> {
        v.iter().copied().map(Some).collect()
    }

    #[test]
    fn trailing_mean_basic() {
        let v = dense(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(trailing_mean(&v, 3, 3), Some(3.0));
        assert_eq!(trailing_mean(&v, 5, 4), Some(3.0));
        assert_eq!(trailing_mean(&v, 1, 0), Some(1.0));
    }

    #[test]
    fn trailing_mean_window_too_large() {
        let v = dense(&[1.0, 2.0, 3.0]);
        assert_eq!(trailing_mean(&v, 4, 2), None);
        assert_eq!(trailing_mean(&v, 3, 1), None);
        assert_eq!(trailing_mean(&v, 2, 3), None);
        assert_eq!(trailing_mean(&v, 0, 2), None);
    }

    #[test]
    fn trailing_mean_missing_value_poisons_window() {
        let v = vec![Some(1.0), None, Some(3.0), Some(4.0)];
        assert_eq!(trailing_mean(&v, 2, 1), None);
        assert_eq!(trailing_mean(&v, 2, 3), Some(3.5));
    }

    #[test]
    fn trailing_mean_present_skips_missing() {
        let v = vec![Some(10.0), None, Some(30.0), None];
        assert_eq!(trailing_mean_present(&v, 4, 3), Some(20.0));
        assert_eq!(trailing_mean_present(&v, 10, 2), Some(20.0));
        assert_eq!(trailing_mean_present(&v, 1, 3), None);
        assert_eq!(trailing_mean_present(&[], 3, 0), None);
    }

    #[test]
    fn dense_helpers() {
        let v = [5.0, 3.0, 8.0, 6.0];
        assert_eq!(sma_last(&v, 2), Some(7.0));
        assert_eq!(sma_last(&v, 5), None);
        assert_eq!(tail_min(&v, 3), Some(3.0));
        assert_eq!(tail_max(&v, 2), Some(8.0));
        assert_eq!(tail_max(&v, 10), Some(8.0));
        assert_eq!(tail_min(&[], 3), None);
    }

    #[test]
    fn round2_rounds_half_away() {
        assert_eq!(round2(66.666_666), 66.67);
        assert_eq!(round2(33.333_333), 33.33);
        assert_eq!(round2(0.0), 0.0);
    }
}
