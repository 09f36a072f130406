//! Domain types: the canonical daily series and its comparison view.

pub mod series;

pub use series::{ComparisonSeries, DailySeries, Observation};
