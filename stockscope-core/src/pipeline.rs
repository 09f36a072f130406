//! Request orchestration: company names → presented results.
//!
//! ```text
//! Start → ResolveSymbols ─┬─ one name:  Fetch → Normalize → Indicators          → Handoff
//!                         └─ 2+ names:  (Fetch → Normalize → Compare) per name  → Handoff
//! ```
//!
//! One pass, in name order, no retries. The first failure aborts the whole
//! request; there are no partial results.

use crate::compare::normalize_for_comparison;
use crate::data::{
    canonicalize, DailySeriesSource, DataError, SymbolResolver, SymbolSearch, TimeSeriesFetcher,
};
use crate::domain::{ComparisonSeries, DailySeries};
use crate::export::{ExportError, ExportFormat, Exporter};
use crate::indicators::with_moving_averages;
use crate::render::Renderer;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Step of a request, used to label failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ResolveSymbols,
    Fetch,
    Normalize,
    Indicators,
    CompareNormalize,
    Handoff,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no company names provided")]
    NoCompanies,

    #[error("could not resolve a symbol for '{company}'")]
    Resolve {
        company: String,
        #[source]
        source: DataError,
    },

    #[error("could not fetch daily data for {symbol}")]
    Fetch {
        symbol: String,
        #[source]
        source: DataError,
    },

    #[error("could not process daily data for {symbol}")]
    Normalize {
        symbol: String,
        #[source]
        source: DataError,
    },

    #[error("could not normalize {symbol} for comparison")]
    Compare {
        symbol: String,
        #[source]
        source: DataError,
    },
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::NoCompanies | PipelineError::Resolve { .. } => Stage::ResolveSymbols,
            PipelineError::Fetch { .. } => Stage::Fetch,
            PipelineError::Normalize { .. } => Stage::Normalize,
            PipelineError::Compare { .. } => Stage::CompareNormalize,
        }
    }

    /// Underlying data error, if any.
    pub fn data_error(&self) -> Option<&DataError> {
        match self {
            PipelineError::NoCompanies => None,
            PipelineError::Resolve { source, .. }
            | PipelineError::Fetch { source, .. }
            | PipelineError::Normalize { source, .. }
            | PipelineError::Compare { source, .. } => Some(source),
        }
    }
}

#[derive(Debug, Error)]
pub enum HandoffError {
    #[error("rendering failed: {0}")]
    Render(#[from] std::io::Error),

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// What a successful request produced.
#[derive(Debug, Clone)]
pub enum PipelineOutcome {
    /// One company: full series with moving average columns.
    Detail { symbol: String, series: DailySeries },
    /// Several companies: normalized closes, in request order.
    Comparison { series: Vec<ComparisonSeries> },
}

pub struct Pipeline<S, D> {
    resolver: SymbolResolver<S>,
    fetcher: TimeSeriesFetcher<D>,
    ma_windows: Vec<usize>,
}

impl<S: SymbolSearch, D: DailySeriesSource> Pipeline<S, D> {
    pub fn new(resolver: SymbolResolver<S>, fetcher: TimeSeriesFetcher<D>, ma_windows: Vec<usize>) -> Self {
        Self {
            resolver,
            fetcher,
            ma_windows,
        }
    }

    pub fn run(&self, companies: &[String]) -> Result<PipelineOutcome, PipelineError> {
        if companies.is_empty() {
            return Err(PipelineError::NoCompanies);
        }

        debug!(stage = ?Stage::ResolveSymbols, count = companies.len());
        let symbols = companies
            .iter()
            .map(|company| {
                self.resolver
                    .resolve(company)
                    .map_err(|source| PipelineError::Resolve {
                        company: company.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        match symbols.as_slice() {
            [symbol] => self.detail(symbol),
            _ => self.comparison(&symbols),
        }
    }

    fn detail(&self, symbol: &str) -> Result<PipelineOutcome, PipelineError> {
        let mut series = self.load(symbol)?;
        debug!(stage = ?Stage::Indicators, symbol, windows = ?self.ma_windows);
        with_moving_averages(&mut series, &self.ma_windows);

        Ok(PipelineOutcome::Detail {
            symbol: symbol.to_string(),
            series,
        })
    }

    fn comparison(&self, symbols: &[String]) -> Result<PipelineOutcome, PipelineError> {
        let mut compared = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let mut series = self.load(symbol)?;
            debug!(stage = ?Stage::CompareNormalize, symbol = %symbol);
            let normalized = normalize_for_comparison(symbol, &mut series).map_err(|source| {
                PipelineError::Compare {
                    symbol: symbol.clone(),
                    source,
                }
            })?;
            compared.push(normalized);
        }
        Ok(PipelineOutcome::Comparison { series: compared })
    }

    /// Fetch (cache-first) and canonicalize one symbol.
    fn load(&self, symbol: &str) -> Result<DailySeries, PipelineError> {
        debug!(stage = ?Stage::Fetch, symbol);
        let fetched = self
            .fetcher
            .fetch(symbol)
            .map_err(|source| PipelineError::Fetch {
                symbol: symbol.to_string(),
                source,
            })?;

        debug!(stage = ?Stage::Normalize, symbol, source = ?fetched.source);
        let series = canonicalize(&fetched.payload).map_err(|source| PipelineError::Normalize {
            symbol: symbol.to_string(),
            source,
        })?;

        info!(symbol, rows = series.len(), source = ?fetched.source, "series ready");
        Ok(series)
    }
}

/// Hand results to the renderer and, for a single company, the exporter.
///
/// Returns the export path when a file was written. An export request on the
/// comparison path is ignored with a warning.
pub fn deliver(
    outcome: &PipelineOutcome,
    renderer: &mut dyn Renderer,
    export: Option<(&Exporter, ExportFormat)>,
) -> Result<Option<PathBuf>, HandoffError> {
    debug!(stage = ?Stage::Handoff);
    match outcome {
        PipelineOutcome::Detail { symbol, series } => {
            renderer.render_detail(symbol, series)?;
            renderer.render_candlestick(symbol, series)?;
            match export {
                Some((exporter, format)) => Ok(Some(exporter.export(symbol, series, format)?)),
                None => Ok(None),
            }
        }
        PipelineOutcome::Comparison { series } => {
            renderer.render_comparison(series)?;
            if let Some((_, format)) = export {
                warn!(%format, "export is only available for a single company; skipping");
            }
            Ok(None)
        }
    }
}
