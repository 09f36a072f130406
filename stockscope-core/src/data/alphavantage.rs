//! Alpha Vantage data provider.
//!
//! Implements symbol search (`SYMBOL_SEARCH`) and full daily history
//! (`TIME_SERIES_DAILY`, `outputsize=full`) over a blocking HTTP client.
//!
//! Alpha Vantage reports most failures with HTTP 200 and a JSON body carrying
//! `"Error Message"`, or `"Note"` / `"Information"` when throttled, so the body
//! is classified before the payload is trusted. No retries happen here.

use super::provider::{DailySeriesSource, DataError, RawSeries, SymbolMatch, SymbolSearch};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";

const SEARCH_FUNCTION: &str = "SYMBOL_SEARCH";
const DAILY_FUNCTION: &str = "TIME_SERIES_DAILY";
const DAILY_SERIES_KEY: &str = "Time Series (Daily)";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "bestMatches")]
    best_matches: Option<Vec<BTreeMap<String, Value>>>,

    #[serde(flatten)]
    notice: ProviderNotice,
}

#[derive(Debug, Deserialize)]
struct DailyResponse {
    #[serde(rename = "Time Series (Daily)")]
    time_series: Option<RawSeries>,

    #[serde(flatten)]
    notice: ProviderNotice,
}

/// Error and throttle fields that can replace any payload.
#[derive(Debug, Default, Deserialize)]
struct ProviderNotice {
    #[serde(rename = "Error Message")]
    error_message: Option<String>,

    #[serde(rename = "Note")]
    note: Option<String>,

    #[serde(rename = "Information")]
    information: Option<String>,
}

impl ProviderNotice {
    fn into_error(self) -> Option<DataError> {
        if let Some(msg) = self.error_message {
            return Some(DataError::ApiError(msg));
        }
        self.note.or(self.information).map(DataError::RateLimited)
    }
}

/// Alpha Vantage client.
pub struct AlphaVantageClient {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
}

impl AlphaVantageClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("stockscope/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DataError::NetworkUnreachable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    /// Issue one GET and return the body text of a 2xx response.
    fn get(&self, function: &str, params: &[(&str, &str)]) -> Result<String, DataError> {
        debug!(function, ?params, "alpha vantage request");

        let resp = self
            .client
            .get(&self.base_url)
            .query(&[("function", function)])
            .query(params)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DataError::HttpStatus {
                endpoint: function.to_string(),
                status: status.as_u16(),
            });
        }

        resp.text()
            .map_err(|e| DataError::NetworkUnreachable(format!("reading {function} body: {e}")))
    }
}

impl SymbolSearch for AlphaVantageClient {
    fn search(&self, keywords: &str) -> Result<Vec<SymbolMatch>, DataError> {
        let body = self.get(SEARCH_FUNCTION, &[("keywords", keywords)])?;
        parse_search_response(&body)
    }
}

impl DailySeriesSource for AlphaVantageClient {
    fn fetch_daily(&self, symbol: &str) -> Result<RawSeries, DataError> {
        let body = self.get(DAILY_FUNCTION, &[("symbol", symbol), ("outputsize", "full")])?;
        parse_daily_response(&body)
    }
}

/// Parse a `SYMBOL_SEARCH` body into ranked matches.
///
/// An empty `bestMatches` array is a valid answer (no matches); a missing one
/// means the response is not what we expect.
pub fn parse_search_response(body: &str) -> Result<Vec<SymbolMatch>, DataError> {
    let resp: SearchResponse = serde_json::from_str(body).map_err(|e| {
        DataError::ResponseFormatChanged(format!("symbol search body is not valid JSON: {e}"))
    })?;

    let matches = match resp.best_matches {
        Some(m) => m,
        None => {
            return Err(resp.notice.into_error().unwrap_or_else(|| {
                DataError::ResponseFormatChanged("symbol search response has no 'bestMatches'".into())
            }))
        }
    };

    matches
        .into_iter()
        .enumerate()
        .map(|(rank, fields)| {
            let symbol = text_field(&fields, "1. symbol").ok_or_else(|| {
                DataError::ResponseFormatChanged(format!("match #{rank} has no '1. symbol'"))
            })?;
            Ok(SymbolMatch {
                symbol,
                name: text_field(&fields, "2. name"),
                region: text_field(&fields, "4. region"),
                currency: text_field(&fields, "8. currency"),
                match_score: text_field(&fields, "9. matchScore").and_then(|s| s.parse().ok()),
            })
        })
        .collect()
}

/// Parse a `TIME_SERIES_DAILY` body into the raw per-date payload.
pub fn parse_daily_response(body: &str) -> Result<RawSeries, DataError> {
    let resp: DailyResponse = serde_json::from_str(body).map_err(|e| {
        DataError::ResponseFormatChanged(format!("daily series body is not valid JSON: {e}"))
    })?;

    if let Some(err) = resp.notice.into_error() {
        return Err(err);
    }

    resp.time_series.ok_or_else(|| {
        DataError::ResponseFormatChanged(format!("daily series response has no '{DAILY_SERIES_KEY}'"))
    })
}

fn text_field(fields: &BTreeMap<String, Value>, key: &str) -> Option<String> {
    fields.get(key).and_then(Value::as_str).map(str::to_string)
}
