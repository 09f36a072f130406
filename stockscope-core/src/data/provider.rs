//! Data provider traits and structured error types.
//!
//! The `SymbolSearch` and `DailySeriesSource` traits abstract over the market
//! data service so the pipeline can be driven by the Alpha Vantage client in
//! production and by in-memory fakes in tests.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// One day of raw fields as returned by the daily-series endpoint,
/// keyed by the provider's numbered labels (`"1. open"`, `"4. close"`, ...).
pub type RawDailyRecord = BTreeMap<String, String>;

/// Raw daily payload: date string → record. This is exactly what gets cached.
pub type RawSeries = BTreeMap<String, RawDailyRecord>;

/// Structured error types for data operations.
///
/// These are designed to be displayable in CLI contexts.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("no symbol found for company '{company}'")]
    SymbolNotFound { company: String },

    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("HTTP {status} from {endpoint}")]
    HttpStatus { endpoint: String, status: u16 },

    #[error("rate limited by provider: {0}")]
    RateLimited(String),

    #[error("provider returned an error: {0}")]
    ApiError(String),

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("malformed data: {0}")]
    MalformedData(String),

    #[error("cannot normalize an empty series")]
    EmptySeries,

    #[error("invalid baseline: first close is {close}")]
    InvalidBaseline { close: f64 },

    #[error("cache error: {0}")]
    CacheIo(String),

    #[error("'{0}' is not a usable ticker symbol")]
    InvalidSymbol(String),
}

impl DataError {
    /// True for failures of the remote service or the transport to it.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            DataError::NetworkUnreachable(_)
                | DataError::HttpStatus { .. }
                | DataError::RateLimited(_)
                | DataError::ApiError(_)
                | DataError::ResponseFormatChanged(_)
        )
    }
}

/// A ranked match from the symbol search endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolMatch {
    pub symbol: String,
    pub name: Option<String>,
    pub region: Option<String>,
    pub currency: Option<String>,
    pub match_score: Option<f64>,
}

impl SymbolMatch {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            name: None,
            region: None,
            currency: None,
            match_score: None,
        }
    }
}

/// Where a payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    Network,
    Cache,
}

/// Result of a successful fetch for a single symbol.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub symbol: String,
    pub payload: RawSeries,
    pub source: DataSource,
}

/// Free-text company search.
///
/// Implementations return matches best-first and must pass `keywords`
/// through unchanged (no trimming or case folding).
pub trait SymbolSearch {
    fn search(&self, keywords: &str) -> Result<Vec<SymbolMatch>, DataError>;
}

/// Full daily history for a ticker.
///
/// The cache layer sits above this trait; sources know nothing about it.
pub trait DailySeriesSource {
    fn fetch_daily(&self, symbol: &str) -> Result<RawSeries, DataError>;
}

impl<T: SymbolSearch + ?Sized> SymbolSearch for &T {
    fn search(&self, keywords: &str) -> Result<Vec<SymbolMatch>, DataError> {
        (**self).search(keywords)
    }
}

impl<T: DailySeriesSource + ?Sized> DailySeriesSource for &T {
    fn fetch_daily(&self, symbol: &str) -> Result<RawSeries, DataError> {
        (**self).fetch_daily(symbol)
    }
}
