//! Data acquisition: symbol resolution, cached daily history, canonicalization.

pub mod alphavantage;
pub mod cache;
pub mod canonicalize;
pub mod fetcher;
pub mod provider;
pub mod resolver;

pub use alphavantage::AlphaVantageClient;
pub use cache::{CacheEntry, CacheStatus, CacheStore};
pub use canonicalize::canonicalize;
pub use fetcher::TimeSeriesFetcher;
pub use provider::{
    DailySeriesSource, DataError, DataSource, FetchResult, RawDailyRecord, RawSeries, SymbolMatch,
    SymbolSearch,
};
pub use resolver::SymbolResolver;
