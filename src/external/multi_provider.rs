use crate::external::price_provider::{ExternalPricePoint, ExternalTickerMatch, PriceProvider, PriceProviderError};
use async_trait::async_trait;
use tracing::{info, warn};

/// MultiProvider tries a primary provider and falls back to a secondary one.
///
/// Strategy:
/// 1. Ask the primary provider (FMP when configured)
/// 2. On any error, ask the fallback (Yahoo Finance)
/// 3. If both fail and either one reported the symbol as unknown, report NotFound
///    so callers can tell "no such ticker" from "providers down"
pub struct MultiProvider {
    primary: Box<dyn PriceProvider>,
    fallback: Box<dyn PriceProvider>,
}

impl MultiProvider {
    pub fn new(primary: Box<dyn PriceProvider>, fallback: Box<dyn PriceProvider>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl PriceProvider for MultiProvider {
    fn name(&self) -> &'static str {
        "multi"
    }

    async fn fetch_daily_history(
        &self,
        ticker: &str,
        days: u32,
    ) -> Result<Vec<ExternalPricePoint>, PriceProviderError> {
        let primary_err = match self.primary.fetch_daily_history(ticker, days).await {
            Ok(data) => {
                info!("✓ Fetched {} from {}", ticker, self.primary.name());
                return Ok(data);
            }
            Err(PriceProviderError::RateLimited) => {
                info!("⚠️ {} rate limited, trying {}", self.primary.name(), self.fallback.name());
                PriceProviderError::RateLimited
            }
            Err(e) => {
                warn!("{} error for {}: {}", self.primary.name(), ticker, e);
                e
            }
        };

        match self.fallback.fetch_daily_history(ticker, days).await {
            Ok(data) => {
                info!("✓ Fetched {} from fallback {}", ticker, self.fallback.name());
                Ok(data)
            }
            Err(e) => {
                warn!("Fallback {} failed for {}: {}", self.fallback.name(), ticker, e);
                match (primary_err, e) {
                    (PriceProviderError::NotFound(msg), _) | (_, PriceProviderError::NotFound(msg)) => {
                        Err(PriceProviderError::NotFound(msg))
                    }
                    (_, last) => Err(last),
                }
            }
        }
    }

    async fn search_ticker_by_keyword(
        &self,
        keyword: &str,
    ) -> Result<Vec<ExternalTickerMatch>, PriceProviderError> {
        match self.primary.search_ticker_by_keyword(keyword).await {
            Ok(matches) if !matches.is_empty() => {
                return Ok(matches);
            }
            Ok(_) => {
                info!("No results from {} for '{}', trying fallback", self.primary.name(), keyword);
            }
            Err(e) => {
                warn!("{} search failed for '{}': {}", self.primary.name(), keyword, e);
            }
        }

        self.fallback.search_ticker_by_keyword(keyword).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    enum Canned {
        Points(Vec<ExternalPricePoint>),
        NotFound,
        Down,
    }

    struct CannedProvider(Canned);

    #[async_trait]
    impl PriceProvider for CannedProvider {
        fn name(&self) -> &'static str {
            "canned"
        }

        async fn fetch_daily_history(
            &self,
            ticker: &str,
            _days: u32,
        ) -> Result<Vec<ExternalPricePoint>, PriceProviderError> {
            match &self.0 {
                Canned::Points(p) => Ok(p.clone()),
                Canned::NotFound => Err(PriceProviderError::NotFound(ticker.to_string())),
                Canned::Down => Err(PriceProviderError::Network("connection refused".into())),
            }
        }

        async fn search_ticker_by_keyword(
            &self,
            _keyword: &str,
        ) -> Result<Vec<ExternalTickerMatch>, PriceProviderError> {
            match &self.0 {
                Canned::Points(_) => Ok(vec![ExternalTickerMatch {
                    symbol: "AAPL".into(),
                    name: "Apple Inc.".into(),
                    exchange: "NASDAQ".into(),
                }]),
                _ => Err(PriceProviderError::Network("connection refused".into())),
            }
        }
    }

    fn point() -> ExternalPricePoint {
        ExternalPricePoint {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            close: 10.0,
        }
    }

    fn multi(primary: Canned, fallback: Canned) -> MultiProvider {
        MultiProvider::new(Box::new(CannedProvider(primary)), Box::new(CannedProvider(fallback)))
    }

    #[tokio::test]
    async fn test_falls_back_when_primary_down() {
        let provider = multi(Canned::Down, Canned::Points(vec![point()]));
        let points = provider.fetch_daily_history("AAPL", 365).await.unwrap();
        assert_eq!(points, vec![point()]);
    }

    #[tokio::test]
    async fn test_not_found_wins_over_transport_error() {
        let provider = multi(Canned::NotFound, Canned::Down);
        let err = provider.fetch_daily_history("ZZZZ", 365).await.unwrap_err();
        assert!(matches!(err, PriceProviderError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_both_down_surfaces_last_error() {
        let provider = multi(Canned::Down, Canned::Down);
        let err = provider.fetch_daily_history("AAPL", 365).await.unwrap_err();
        assert!(matches!(err, PriceProviderError::Network(_)));
    }

    #[tokio::test]
    async fn test_search_uses_fallback_on_error() {
        let provider = multi(Canned::Down, Canned::Points(Vec::new()));
        let matches = provider.search_ticker_by_keyword("AA").await.unwrap();
        assert_eq!(matches.len(), 1);
    }
}
