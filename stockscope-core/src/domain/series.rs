//! Canonical daily series — the typed, date-ordered price/volume table.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One trading day of a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Observation {
    /// True when the day closed at or above its open.
    pub fn is_up(&self) -> bool {
        self.close >= self.open
    }
}

/// Daily observations sorted strictly ascending by date, plus derived columns.
///
/// Derived columns (`MA20`, `MA50`, `Normalized`, ...) are aligned with the
/// observations by position. `None` marks a position with no value, which is
/// distinct from a computed value of zero.
///
/// The observation order is fixed at construction; derived columns are the
/// only thing that can change afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailySeries {
    observations: Vec<Observation>,
    columns: BTreeMap<String, Vec<Option<f64>>>,
}

impl DailySeries {
    /// Build a series from observations already sorted ascending with unique dates.
    ///
    /// Returns `None` if the ordering invariant does not hold.
    pub fn from_sorted(observations: Vec<Observation>) -> Option<Self> {
        if observations.windows(2).any(|w| w[0].date >= w[1].date) {
            return None;
        }
        Some(Self {
            observations,
            columns: BTreeMap::new(),
        })
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn first(&self) -> Option<&Observation> {
        self.observations.first()
    }

    pub fn last(&self) -> Option<&Observation> {
        self.observations.last()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.observations.iter().map(|o| o.date).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.close).collect()
    }

    /// Attach (or replace) a derived column.
    ///
    /// # Panics
    /// If `values` is not the same length as the series. Column producers in
    /// this crate always compute one value per observation.
    pub fn set_column(&mut self, name: impl Into<String>, values: Vec<Option<f64>>) {
        assert_eq!(
            values.len(),
            self.observations.len(),
            "derived column length must match series length"
        );
        self.columns.insert(name.into(), values);
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// Derived column names in sorted order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Value of a derived column at a position, `None` if absent or unset.
    pub fn value_at(&self, name: &str, index: usize) -> Option<f64> {
        self.columns.get(name)?.get(index).copied().flatten()
    }
}

/// Close prices rescaled so the first observation is exactly 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSeries {
    pub symbol: String,
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

impl ComparisonSeries {
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn last_value(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// (min, max) of the normalized values, `None` for an empty series.
    pub fn range(&self) -> Option<(f64, f64)> {
        let mut iter = self.values.iter().copied();
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }
}
