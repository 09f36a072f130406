//! Indicator engine.
//!
//! Indicators are pure functions: observation history in, one optional value
//! per observation out. Positions inside the warmup window get `None`.
//! Results are attached to the series as named derived columns; recomputing
//! an indicator replaces its column.

pub mod sma;

pub use sma::Sma;

use crate::domain::{DailySeries, Observation};
use tracing::warn;

/// Default moving average windows (MA20, MA50).
pub const DEFAULT_MA_WINDOWS: [usize; 2] = [20, 50];

/// Trait for indicators.
///
/// # Look-ahead guard
/// No value at position t may depend on observations after t.
pub trait Indicator {
    /// Column name (e.g., "MA20").
    fn name(&self) -> &str;

    /// Number of observations before the first value.
    fn lookback(&self) -> usize;

    /// Compute over the full history. Output length equals input length.
    fn compute(&self, observations: &[Observation]) -> Vec<Option<f64>>;
}

/// Compute `indicator` and store it as a column of `series`.
pub fn apply(series: &mut DailySeries, indicator: &dyn Indicator) {
    let values = indicator.compute(series.observations());
    series.set_column(indicator.name(), values);
}

/// Attach one `MA{window}` column per window.
///
/// Reads only `close`; other columns are left alone. A zero window has no
/// meaning and is skipped with a warning.
pub fn with_moving_averages(series: &mut DailySeries, windows: &[usize]) {
    for &window in windows {
        if window == 0 {
            warn!("skipping moving average with a zero-length window");
            continue;
        }
        apply(series, &Sma::new(window));
    }
}

/// Build a series from close prices for testing.
///
/// open = prev close (or close for the first day), high/low = ±1 around
/// open/close, volume = 1000, one calendar day apart from 2024-01-02.
#[cfg(test)]
pub fn make_observations(closes: &[f64]) -> Vec<Observation> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Observation {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

#[cfg(test)]
mod tests {
    use super::*;

    fn series(closes: &[f64]) -> DailySeries {
        DailySeries::from_sorted(make_observations(closes)).unwrap()
    }

    #[test]
    fn default_windows_attach_ma20_and_ma50() {
        let closes: Vec<f64> = (1..=60).map(f64::from).collect();
        let mut s = series(&closes);
        with_moving_averages(&mut s, &DEFAULT_MA_WINDOWS);

        let ma20 = s.column("MA20").unwrap();
        let ma50 = s.column("MA50").unwrap();
        assert!(ma20[..19].iter().all(Option::is_none));
        // mean(1..=20) = 10.5
        assert_approx(ma20[19].unwrap(), 10.5, DEFAULT_EPSILON);
        assert!(ma50[..49].iter().all(Option::is_none));
        // mean(11..=60) = 35.5
        assert_approx(ma50[59].unwrap(), 35.5, DEFAULT_EPSILON);
    }

    #[test]
    fn reapplying_is_idempotent() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + (i as f64).sin()).collect();
        let mut s = series(&closes);
        with_moving_averages(&mut s, &[20]);
        let once = s.clone();
        with_moving_averages(&mut s, &[20]);
        assert_eq!(s, once);
    }

    #[test]
    fn zero_window_is_skipped() {
        let mut s = series(&[5.0, 6.0, 7.0]);
        with_moving_averages(&mut s, &[0, 2]);
        assert!(s.column("MA0").is_none());
        assert_eq!(s.column("MA2").unwrap(), &[None, Some(5.5), Some(6.5)]);
    }

    #[test]
    fn observations_untouched() {
        let mut s = series(&[5.0, 6.0, 7.0]);
        let before = s.observations().to_vec();
        with_moving_averages(&mut s, &[2]);
        assert_eq!(s.observations(), before.as_slice());
    }
}
