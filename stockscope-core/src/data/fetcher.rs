//! Cache-first retrieval of raw daily payloads.
//!
//! 1. Fresh cache entry for the symbol → return it, no network call.
//! 2. Otherwise fetch full history from the source.
//! 3. Write the payload back to the cache, then return it.
//!
//! The cache is keyed by resolved symbol, so two company names that resolve
//! to the same ticker share one entry. Cache write failures are logged and
//! swallowed.

use super::cache::CacheStore;
use super::provider::{DailySeriesSource, DataError, DataSource, FetchResult};
use tracing::{info, warn};

pub struct TimeSeriesFetcher<S> {
    source: S,
    cache: CacheStore,
    force_refresh: bool,
}

impl<S: DailySeriesSource> TimeSeriesFetcher<S> {
    pub fn new(source: S, cache: CacheStore) -> Self {
        Self {
            source,
            cache,
            force_refresh: false,
        }
    }

    /// Skip cache reads; results are still written back.
    pub fn force_refresh(mut self, force: bool) -> Self {
        self.force_refresh = force;
        self
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn fetch(&self, symbol: &str) -> Result<FetchResult, DataError> {
        if !self.force_refresh {
            if let Some(payload) = self.cache.get(symbol) {
                return Ok(FetchResult {
                    symbol: symbol.to_string(),
                    payload,
                    source: DataSource::Cache,
                });
            }
        }

        let payload = self.source.fetch_daily(symbol)?;
        info!(symbol, rows = payload.len(), "fetched daily series");

        if let Err(e) = self.cache.put(symbol, &payload) {
            warn!(symbol, error = %e, "could not write cache entry");
        }

        Ok(FetchResult {
            symbol: symbol.to_string(),
            payload,
            source: DataSource::Network,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::provider::{RawDailyRecord, RawSeries};
    use std::cell::Cell;

    struct CountingSource {
        calls: Cell<usize>,
    }

    impl DailySeriesSource for CountingSource {
        fn fetch_daily(&self, _symbol: &str) -> Result<RawSeries, DataError> {
            self.calls.set(self.calls.get() + 1);
            let record: RawDailyRecord = [
                ("1. open", "1"),
                ("2. high", "2"),
                ("3. low", "0.5"),
                ("4. close", "1.5"),
                ("5. volume", "10"),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
            Ok(RawSeries::from([("2024-01-02".to_string(), record)]))
        }
    }

    struct ErrorSource;

    impl DailySeriesSource for ErrorSource {
        fn fetch_daily(&self, _symbol: &str) -> Result<RawSeries, DataError> {
            Err(DataError::ApiError("Invalid API call".into()))
        }
    }

    #[test]
    fn miss_then_hit() {
        let dir = tempfile::tempdir().unwrap();
        let source = CountingSource { calls: Cell::new(0) };
        let fetcher = TimeSeriesFetcher::new(&source, CacheStore::new(dir.path()));

        let first = fetcher.fetch("IBM").unwrap();
        assert_eq!(first.source, DataSource::Network);
        let second = fetcher.fetch("IBM").unwrap();
        assert_eq!(second.source, DataSource::Cache);
        assert_eq!(first.payload, second.payload);
        assert_eq!(source.calls.get(), 1);
    }

    #[test]
    fn force_refresh_bypasses_read() {
        let dir = tempfile::tempdir().unwrap();
        let source = CountingSource { calls: Cell::new(0) };
        let fetcher =
            TimeSeriesFetcher::new(&source, CacheStore::new(dir.path())).force_refresh(true);

        fetcher.fetch("IBM").unwrap();
        fetcher.fetch("IBM").unwrap();
        assert_eq!(source.calls.get(), 2);
        assert!(fetcher.cache().entry_path("IBM").exists());
    }

    #[test]
    fn upstream_error_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = TimeSeriesFetcher::new(ErrorSource, CacheStore::new(dir.path()));

        let err = fetcher.fetch("BAD").unwrap_err();
        assert!(err.is_upstream());
        assert!(!fetcher.cache().entry_path("BAD").exists());
    }

    #[test]
    fn unwritable_cache_still_returns_data() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the cache directory should be.
        let blocker = dir.path().join("cache");
        std::fs::write(&blocker, b"").unwrap();
        let source = CountingSource { calls: Cell::new(0) };
        let fetcher = TimeSeriesFetcher::new(&source, CacheStore::new(&blocker));

        let result = fetcher.fetch("IBM").unwrap();
        assert_eq!(result.source, DataSource::Network);
        assert_eq!(result.payload.len(), 1);
    }
}
