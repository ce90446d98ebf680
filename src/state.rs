use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::{AppConfig, PriceProviderKind, SearchProviderKind};
use crate::external::fmp::FmpProvider;
use crate::external::multi_provider::MultiProvider;
use crate::external::price_provider::PriceProvider;
use crate::external::yahoo::YahooProvider;
use crate::services::analysis_service::AnalysisSettings;
use crate::services::news_service::{NewsConfig, NewsService};
use crate::services::symbol_search::{SearchBackend, SymbolSearchService, SymbolTable};

#[derive(Clone)]
pub struct AppState {
    pub price_provider: Arc<dyn PriceProvider>,
    pub news: Arc<NewsService>,
    pub symbols: Arc<SymbolSearchService>,
    pub analysis: AnalysisSettings,
}

impl AppState {
    /// Wires providers and services from configuration. Provider handles are
    /// created once here and shared by every request.
    pub fn from_config(config: &AppConfig, news_config: NewsConfig) -> Result<Self> {
        let price_provider = build_price_provider(config)?;

        let backend = match config.search_provider {
            SearchProviderKind::Static => {
                let table = SymbolTable::load(&config.symbols_csv_path)?;
                SearchBackend::Static(Arc::new(table))
            }
            SearchProviderKind::Remote => {
                let remote: Option<Arc<dyn PriceProvider>> = match &config.fmp_api_key {
                    Some(key) => Some(Arc::new(
                        FmpProvider::new(key.clone(), config.http_timeout_secs)
                            .context("Failed to create FMP search provider")?,
                    )),
                    None => {
                        warn!("SEARCH_PROVIDER=remote but FMP_API_KEY is not set; search will be unavailable");
                        None
                    }
                };
                SearchBackend::Remote(remote)
            }
        };

        Ok(Self {
            price_provider,
            news: Arc::new(NewsService::new(news_config)),
            symbols: Arc::new(SymbolSearchService::new(backend)),
            analysis: AnalysisSettings {
                history_days: config.history_days,
                ticker_suffix: config.ticker_suffix.clone(),
            },
        })
    }
}

fn build_price_provider(config: &AppConfig) -> Result<Arc<dyn PriceProvider>> {
    let timeout = config.http_timeout_secs;
    let fmp = || -> Result<FmpProvider> {
        let key = config
            .fmp_api_key
            .clone()
            .context("FMP_API_KEY must be set for the fmp and multi price providers")?;
        FmpProvider::new(key, timeout).context("Failed to create FmpProvider")
    };
    let yahoo = || YahooProvider::new(timeout).context("Failed to create YahooProvider");

    let provider: Arc<dyn PriceProvider> = match config.price_provider {
        PriceProviderKind::Yahoo => {
            info!("📊 Using price provider: Yahoo Finance");
            Arc::new(yahoo()?)
        }
        PriceProviderKind::Fmp => {
            info!("📊 Using price provider: Financial Modeling Prep");
            Arc::new(fmp()?)
        }
        PriceProviderKind::Multi => {
            info!("📊 Using price provider: Multi-provider (FMP + Yahoo Finance fallback)");
            Arc::new(MultiProvider::new(Box::new(fmp()?), Box::new(yahoo()?)))
        }
    };

    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmp_without_key_fails() {
        let config = AppConfig {
            price_provider: PriceProviderKind::Fmp,
            ..AppConfig::default()
        };
        assert!(build_price_provider(&config).is_err());
    }

    #[test]
    fn test_remote_search_without_key_still_starts() {
        let config = AppConfig {
            search_provider: SearchProviderKind::Remote,
            ..AppConfig::default()
        };
        let state = AppState::from_config(&config, NewsConfig::default()).unwrap();
        assert_eq!(state.price_provider.name(), "yahoo");
        assert!(!state.news.is_enabled());
    }

    #[test]
    fn test_missing_symbol_file_fails() {
        let config = AppConfig {
            symbols_csv_path: "does/not/exist.csv".into(),
            ..AppConfig::default()
        };
        assert!(AppState::from_config(&config, NewsConfig::default()).is_err());
    }
}
