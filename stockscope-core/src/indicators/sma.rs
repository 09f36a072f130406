//! Simple Moving Average (SMA).
//!
//! Rolling mean of close prices over a trailing window that includes the
//! current observation. Lookback: period - 1 (first value at index period-1).

use super::Indicator;
use crate::domain::Observation;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    /// # Panics
    /// If `period` is zero. Configured windows are validated before reaching here.
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            name: column_name(period),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

/// Column name for a moving average window, e.g. `MA20`.
pub fn column_name(period: usize) -> String {
    format!("MA{period}")
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, observations: &[Observation]) -> Vec<Option<f64>> {
        let n = observations.len();
        let mut result = vec![None; n];

        if n < self.period {
            return result;
        }

        let period = self.period as f64;
        let mut sum: f64 = observations[..self.period].iter().map(|o| o.close).sum();
        result[self.period - 1] = Some(sum / period);

        // Roll the window forward
        for i in self.period..n {
            sum += observations[i].close - observations[i - self.period].close;
            result[i] = Some(sum / period);
        }

        result
    }
}
