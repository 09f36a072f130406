//! Freshness-bounded JSON cache of raw daily payloads.
//!
//! Layout: `{cache_dir}/{SYMBOL}_data.json`, one file per symbol:
//!
//! ```json
//! { "last_updated": "2024-05-01T14:03:11Z", "data": { ... }, "checksum": "<blake3 hex>" }
//! ```
//!
//! - Entries are usable only while `now - last_updated < freshness`.
//! - Stale entries are ignored, not deleted; the next `put` overwrites them.
//! - Any read problem (missing, unreadable, unparsable, checksum mismatch)
//!   is a miss. The cache is an optimisation and never fails a request.
//! - Writes are atomic: write to `.tmp` then rename into place.

use super::provider::{DataError, RawSeries};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default freshness window.
pub const DEFAULT_FRESHNESS_HOURS: i64 = 24;

/// On-disk record for one symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub last_updated: DateTime<Utc>,
    pub data: RawSeries,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

impl CacheEntry {
    fn is_fresh(&self, now: DateTime<Utc>, freshness: Duration) -> bool {
        let age = now - self.last_updated;
        // A timestamp from the future (clock skew) only counts within the window.
        age < freshness && age > -freshness
    }
}

/// Cache status for a single symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStatus {
    pub symbol: String,
    pub cached: bool,
    pub fresh: bool,
    pub last_updated: Option<DateTime<Utc>>,
    pub row_count: Option<usize>,
}

/// The symbol-keyed payload cache.
///
/// Not internally synchronised. Callers sharing one store across threads must
/// serialise `get`/`put` for the same symbol.
#[derive(Debug, Clone)]
pub struct CacheStore {
    cache_dir: PathBuf,
    freshness: Duration,
}

impl CacheStore {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self::with_freshness(cache_dir, Duration::hours(DEFAULT_FRESHNESS_HOURS))
    }

    pub fn with_freshness(cache_dir: impl Into<PathBuf>, freshness: Duration) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            freshness,
        }
    }

    /// Root directory of the cache.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn freshness(&self) -> Duration {
        self.freshness
    }

    /// Path of the cache file for a symbol: `{cache_dir}/{SYMBOL}_data.json`
    pub fn entry_path(&self, symbol: &str) -> PathBuf {
        self.cache_dir.join(format!("{symbol}_data.json"))
    }

    /// Cached payload for `symbol` if present and fresh.
    pub fn get(&self, symbol: &str) -> Option<RawSeries> {
        self.get_at(symbol, Utc::now())
    }

    /// Like [`get`](Self::get) with an explicit clock.
    pub fn get_at(&self, symbol: &str, now: DateTime<Utc>) -> Option<RawSeries> {
        let entry = match self.read_entry(symbol) {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                debug!(symbol, "cache miss: no entry");
                return None;
            }
            Err(e) => {
                warn!(symbol, error = %e, "ignoring unreadable cache entry");
                return None;
            }
        };

        if now - entry.last_updated <= -self.freshness {
            warn!(
                symbol,
                last_updated = %entry.last_updated,
                "ignoring cache entry stamped in the future"
            );
            return None;
        }
        if !entry.is_fresh(now, self.freshness) {
            debug!(symbol, last_updated = %entry.last_updated, "cache miss: stale entry");
            return None;
        }

        debug!(symbol, rows = entry.data.len(), "cache hit");
        Some(entry.data)
    }

    /// Persist `payload` for `symbol`, stamped now, replacing any prior entry.
    pub fn put(&self, symbol: &str, payload: &RawSeries) -> Result<(), DataError> {
        self.put_at(symbol, payload, Utc::now())
    }

    /// Like [`put`](Self::put) with an explicit clock.
    pub fn put_at(
        &self,
        symbol: &str,
        payload: &RawSeries,
        now: DateTime<Utc>,
    ) -> Result<(), DataError> {
        fs::create_dir_all(&self.cache_dir)
            .map_err(|e| DataError::CacheIo(format!("failed to create cache dir: {e}")))?;

        let entry = CacheEntry {
            last_updated: now,
            data: payload.clone(),
            checksum: Some(payload_checksum(payload)?),
        };
        let json = serde_json::to_vec(&entry)
            .map_err(|e| DataError::CacheIo(format!("entry serialization: {e}")))?;

        let path = self.checked_path(symbol)?;
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, json)
            .map_err(|e| DataError::CacheIo(format!("write {}: {e}", tmp_path.display())))?;

        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            DataError::CacheIo(format!("atomic rename failed: {e}"))
        })?;

        debug!(symbol, path = %path.display(), rows = payload.len(), "cache write");
        Ok(())
    }

    /// Remove the entry for `symbol`. Missing entries are not an error.
    pub fn clear(&self, symbol: &str) -> Result<(), DataError> {
        match fs::remove_file(self.checked_path(symbol)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DataError::CacheIo(format!("remove entry for {symbol}: {e}"))),
        }
    }

    /// What the cache currently holds for `symbol`.
    pub fn status(&self, symbol: &str, now: DateTime<Utc>) -> CacheStatus {
        match self.read_entry(symbol) {
            Ok(Some(entry)) => CacheStatus {
                symbol: symbol.to_string(),
                cached: true,
                fresh: entry.is_fresh(now, self.freshness),
                last_updated: Some(entry.last_updated),
                row_count: Some(entry.data.len()),
            },
            _ => CacheStatus {
                symbol: symbol.to_string(),
                cached: false,
                fresh: false,
                last_updated: None,
                row_count: None,
            },
        }
    }

    /// Entry path, refusing symbols that could name a file outside the cache dir.
    fn checked_path(&self, symbol: &str) -> Result<PathBuf, DataError> {
        let unsafe_symbol = symbol.is_empty()
            || symbol.contains(['/', '\\'])
            || symbol.contains("..")
            || Path::new(symbol).is_absolute();
        if unsafe_symbol {
            return Err(DataError::InvalidSymbol(symbol.to_string()));
        }
        Ok(self.entry_path(symbol))
    }

    /// Read and verify the entry. `Ok(None)` when there is no file.
    fn read_entry(&self, symbol: &str) -> Result<Option<CacheEntry>, DataError> {
        let path = self.checked_path(symbol)?;
        let content = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(DataError::CacheIo(format!("read {}: {e}", path.display()))),
        };

        let entry: CacheEntry = serde_json::from_slice(&content)
            .map_err(|e| DataError::CacheIo(format!("parse {}: {e}", path.display())))?;

        if let Some(expected) = &entry.checksum {
            let actual = payload_checksum(&entry.data)?;
            if &actual != expected {
                return Err(DataError::CacheIo(format!(
                    "checksum mismatch in {}",
                    path.display()
                )));
            }
        }

        Ok(Some(entry))
    }
}

/// BLAKE3 hex digest of the canonical JSON encoding of a payload.
fn payload_checksum(payload: &RawSeries) -> Result<String, DataError> {
    let bytes = serde_json::to_vec(payload)
        .map_err(|e| DataError::CacheIo(format!("hash serialization: {e}")))?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}
