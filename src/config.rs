use anyhow::{bail, Context, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceProviderKind {
    Yahoo,
    Fmp,
    Multi,
}

impl PriceProviderKind {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "yahoo" => Ok(Self::Yahoo),
            "fmp" => Ok(Self::Fmp),
            "multi" => Ok(Self::Multi),
            other => bail!(
                "Invalid PRICE_PROVIDER: {}. Must be 'yahoo', 'fmp', or 'multi'",
                other
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchProviderKind {
    Static,
    Remote,
}

impl SearchProviderKind {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "static" => Ok(Self::Static),
            "remote" => Ok(Self::Remote),
            other => bail!(
                "Invalid SEARCH_PROVIDER: {}. Must be 'static' or 'remote'",
                other
            ),
        }
    }
}

/// Server-wide settings, read once at start-up.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub price_provider: PriceProviderKind,
    pub search_provider: SearchProviderKind,
    pub fmp_api_key: Option<String>,
    pub symbols_csv_path: String,
    pub ticker_suffix: Option<String>,
    pub history_days: u32,
    pub http_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            price_provider: PriceProviderKind::Yahoo,
            search_provider: SearchProviderKind::Static,
            fmp_api_key: None,
            symbols_csv_path: "data/sp500.csv".to_string(),
            ticker_suffix: None,
            history_days: 365,
            http_timeout_secs: 30,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: parse_env("PORT", defaults.port)?,
            price_provider: match non_empty_env("PRICE_PROVIDER") {
                Some(v) => PriceProviderKind::parse(&v)?,
                None => defaults.price_provider,
            },
            search_provider: match non_empty_env("SEARCH_PROVIDER") {
                Some(v) => SearchProviderKind::parse(&v)?,
                None => defaults.search_provider,
            },
            fmp_api_key: non_empty_env("FMP_API_KEY"),
            symbols_csv_path: non_empty_env("SYMBOLS_CSV_PATH")
                .unwrap_or(defaults.symbols_csv_path),
            ticker_suffix: non_empty_env("TICKER_SUFFIX").map(|s| s.trim().to_uppercase()),
            history_days: parse_env("HISTORY_DAYS", defaults.history_days)?,
            http_timeout_secs: parse_env("HTTP_TIMEOUT_SECS", defaults.http_timeout_secs)?,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

pub(crate) fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

pub(crate) fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match non_empty_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{} has an invalid value: {}", key, raw)),
        None => Ok(default),
    }
}
