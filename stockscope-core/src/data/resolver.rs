//! Company name → ticker symbol.

use super::provider::{DataError, SymbolMatch, SymbolSearch};
use tracing::info;

/// Resolves free-text company names to the provider's top-ranked ticker.
pub struct SymbolResolver<S> {
    search: S,
}

impl<S: SymbolSearch> SymbolResolver<S> {
    pub fn new(search: S) -> Self {
        Self { search }
    }

    /// Best match for `company_name`.
    ///
    /// The name is sent verbatim. The first match wins; there is no
    /// re-ranking. Zero matches is `SymbolNotFound`.
    pub fn resolve_match(&self, company_name: &str) -> Result<SymbolMatch, DataError> {
        let best = self
            .search
            .search(company_name)?
            .into_iter()
            .next()
            .ok_or_else(|| DataError::SymbolNotFound {
                company: company_name.to_string(),
            })?;

        info!(
            company = company_name,
            symbol = %best.symbol,
            name = best.name.as_deref().unwrap_or(""),
            "resolved symbol"
        );
        Ok(best)
    }

    pub fn resolve(&self, company_name: &str) -> Result<String, DataError> {
        self.resolve_match(company_name).map(|m| m.symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct RecordingSearch {
        results: Vec<SymbolMatch>,
        queries: RefCell<Vec<String>>,
    }

    impl SymbolSearch for RecordingSearch {
        fn search(&self, keywords: &str) -> Result<Vec<SymbolMatch>, DataError> {
            self.queries.borrow_mut().push(keywords.to_string());
            Ok(self.results.clone())
        }
    }

    struct FailingSearch;

    impl SymbolSearch for FailingSearch {
        fn search(&self, _keywords: &str) -> Result<Vec<SymbolMatch>, DataError> {
            Err(DataError::NetworkUnreachable("connection refused".into()))
        }
    }

    #[test]
    fn takes_first_match() {
        let search = RecordingSearch {
            results: vec![SymbolMatch::new("AAPL"), SymbolMatch::new("APLE")],
            queries: RefCell::new(Vec::new()),
        };
        let resolver = SymbolResolver::new(&search);
        assert_eq!(resolver.resolve("Apple Inc").unwrap(), "AAPL");
    }

    #[test]
    fn query_is_passed_verbatim() {
        let search = RecordingSearch {
            results: vec![SymbolMatch::new("MSFT")],
            queries: RefCell::new(Vec::new()),
        };
        let resolver = SymbolResolver::new(&search);
        resolver.resolve("  microsoft  CORPORATION ").unwrap();
        assert_eq!(search.queries.borrow().as_slice(), ["  microsoft  CORPORATION "]);
    }

    #[test]
    fn zero_matches_is_not_found() {
        let search = RecordingSearch {
            results: vec![],
            queries: RefCell::new(Vec::new()),
        };
        let resolver = SymbolResolver::new(&search);
        match resolver.resolve("Nonexistent Corp") {
            Err(DataError::SymbolNotFound { company }) => assert_eq!(company, "Nonexistent Corp"),
            other => panic!("expected SymbolNotFound, got {other:?}"),
        }
    }

    #[test]
    fn transport_failure_propagates_as_upstream() {
        let resolver = SymbolResolver::new(FailingSearch);
        let err = resolver.resolve("Apple Inc").unwrap_err();
        assert!(err.is_upstream());
    }
}
