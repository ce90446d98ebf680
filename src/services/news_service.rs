use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::models::NewsArticle;

const NEWSAPI_BASE_URL: &str = "https://newsapi.org";

/// Configuration for news service
#[derive(Debug, Clone)]
pub struct NewsConfig {
    pub enabled: bool,
    pub provider: String,
    pub api_key: Option<String>,
    pub lookback_days: i64,
    pub timeout_secs: u64,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: "newsapi".to_string(),
            api_key: None,
            lookback_days: 14,
            timeout_secs: 30,
        }
    }
}

impl NewsConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: std::env::var("NEWS_ENABLED")
                .ok()
                .and_then(|s| s.parse::<bool>().ok())
                .unwrap_or(defaults.enabled),
            provider: std::env::var("NEWS_PROVIDER").unwrap_or(defaults.provider),
            api_key: std::env::var("NEWS_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            lookback_days: std::env::var("NEWS_LOOKBACK_DAYS")
                .ok()
                .and_then(|s| s.parse::<i64>().ok())
                .unwrap_or(defaults.lookback_days),
            timeout_secs: std::env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(defaults.timeout_secs),
        }
    }
}

#[derive(Debug, Error)]
pub enum NewsError {
    #[error("network error: {0}")]
    Network(String),
    #[error("bad response: {0}")]
    BadResponse(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("rate limited")]
    RateLimited,
}

/// Trait for news providers
#[async_trait]
pub trait NewsProvider: Send + Sync {
    /// Articles about `query` published on or after `since`, most relevant first.
    async fn fetch_news(&self, query: &str, since: NaiveDate) -> Result<Vec<NewsArticle>, NewsError>;
}

/// NewsAPI.org `/v2/everything` provider
pub struct NewsApiProvider {
    api_key: String,
    client: Client,
    base_url: String,
}

impl NewsApiProvider {
    pub fn new(api_key: String, timeout_secs: u64) -> Result<Self, NewsError> {
        Self::with_base_url(NEWSAPI_BASE_URL, api_key, timeout_secs)
    }

    pub fn with_base_url(base_url: &str, api_key: String, timeout_secs: u64) -> Result<Self, NewsError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .user_agent("stockspro/0.1")
            .build()
            .map_err(|e| NewsError::Network(e.to_string()))?;

        Ok(Self {
            api_key,
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsApiResponse {
    status: String,
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsApiArticle {
    source: Option<NewsApiSource>,
    title: Option<String>,
    url: Option<String>,
    published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct NewsApiSource {
    name: Option<String>,
}

#[async_trait]
impl NewsProvider for NewsApiProvider {
    async fn fetch_news(&self, query: &str, since: NaiveDate) -> Result<Vec<NewsArticle>, NewsError> {
        let from = since.format("%Y-%m-%d").to_string();

        let response = self
            .client
            .get(format!("{}/v2/everything", self.base_url))
            .query(&[
                ("q", query),
                ("language", "en"),
                ("sortBy", "relevancy"),
                ("from", from.as_str()),
                ("apiKey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| NewsError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(NewsError::RateLimited);
        }

        let body: NewsApiResponse = response
            .json()
            .await
            .map_err(|e| NewsError::Parse(e.to_string()))?;

        if !status.is_success() || body.status != "ok" {
            return Err(NewsError::BadResponse(format!(
                "HTTP {}: {}",
                status,
                body.message.unwrap_or(body.status)
            )));
        }

        Ok(body
            .articles
            .into_iter()
            .filter_map(|a| {
                // NewsAPI marks takedowns with a "[Removed]" title
                let title = a.title.filter(|t| !t.trim().is_empty() && t != "[Removed]")?;
                Some(NewsArticle {
                    title,
                    url: a.url.unwrap_or_default(),
                    source: a.source.and_then(|s| s.name).unwrap_or_default(),
                    published_at: a.published_at,
                })
            })
            .collect())
    }
}

/// Reduces a news lookup to the top headline for a ticker.
///
/// Never fails: provider errors are logged and read as "no headline".
pub struct NewsService {
    provider: Option<Arc<dyn NewsProvider>>,
    lookback_days: i64,
}

impl NewsService {
    pub fn new(config: NewsConfig) -> Self {
        let provider: Option<Arc<dyn NewsProvider>> = if config.enabled {
            match (&config.api_key, config.provider.as_str()) {
                (Some(api_key), "newsapi") => match NewsApiProvider::new(api_key.clone(), config.timeout_secs) {
                    Ok(p) => {
                        info!("Initializing NewsAPI news provider");
                        Some(Arc::new(p))
                    }
                    Err(e) => {
                        error!("Failed to initialize NewsAPI provider: {}", e);
                        None
                    }
                },
                (Some(_), other) => {
                    warn!("Unknown news provider: {}", other);
                    None
                }
                (None, _) => {
                    warn!("News enabled but no API key provided");
                    None
                }
            }
        } else {
            info!("News service disabled");
            None
        };

        Self {
            provider,
            lookback_days: config.lookback_days,
        }
    }

    pub fn with_provider(provider: Arc<dyn NewsProvider>, lookback_days: i64) -> Self {
        Self {
            provider: Some(provider),
            lookback_days,
        }
    }

    pub fn disabled() -> Self {
        Self {
            provider: None,
            lookback_days: NewsConfig::default().lookback_days,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    pub async fn top_headline(&self, ticker: &str) -> Option<String> {
        let provider = self.provider.as_ref()?;
        let since = Utc::now().date_naive() - Duration::days(self.lookback_days);

        match provider.fetch_news(ticker, since).await {
            Ok(articles) => {
                info!("Fetched {} news articles for {}", articles.len(), ticker);
                articles.into_iter().next().map(|a| a.title)
            }
            Err(e) => {
                warn!("Error fetching news for {}: {}", ticker, e);
                None
            }
        }
    }
}
