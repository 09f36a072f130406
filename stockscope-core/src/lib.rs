//! Stockscope Core — daily stock history: lookup, caching, indicators, comparison.
//!
//! This crate contains everything behind the `stockscope` command:
//! - Symbol resolution against the upstream search endpoint
//! - Cache-first fetching of full daily history, one JSON file per symbol
//! - Canonicalization of the provider payload into a typed, date-ordered series
//! - Moving average indicators as derived columns
//! - Normalization to a common base for multi-symbol comparison
//! - Text rendering and CSV/XLSX export of the results

pub mod compare;
pub mod config;
pub mod data;
pub mod domain;
pub mod export;
pub mod indicators;
pub mod pipeline;
pub mod render;

pub use config::AppConfig;
pub use pipeline::{deliver, Pipeline, PipelineError, PipelineOutcome};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: results can move across threads.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::DailySeries>();
        require_sync::<domain::DailySeries>();
        require_send::<domain::ComparisonSeries>();
        require_sync::<domain::ComparisonSeries>();
        require_send::<PipelineOutcome>();
        require_sync::<PipelineOutcome>();
        require_send::<data::DataError>();
        require_sync::<data::DataError>();
        require_send::<data::CacheStore>();
        require_sync::<data::CacheStore>();
        require_send::<AppConfig>();
        require_sync::<AppConfig>();
    }
}
