use crate::external::price_provider::{
    build_client, ExternalPricePoint, ExternalTickerMatch, PriceProvider, PriceProviderError,
};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use serde::Deserialize;

const FMP_BASE_URL: &str = "https://financialmodelingprep.com";

/// Financial Modeling Prep client. Requires `FMP_API_KEY`.
pub struct FmpProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl FmpProvider {
    pub fn new(api_key: String, timeout_secs: u64) -> Result<Self, PriceProviderError> {
        Self::with_base_url(FMP_BASE_URL, api_key, timeout_secs)
    }

    pub fn with_base_url(
        base_url: &str,
        api_key: String,
        timeout_secs: u64,
    ) -> Result<Self, PriceProviderError> {
        if api_key.trim().is_empty() {
            return Err(PriceProviderError::BadResponse("FMP_API_KEY not set".into()));
        }

        Ok(Self {
            client: build_client(timeout_secs)?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn check_status(status: reqwest::StatusCode) -> Result<(), PriceProviderError> {
        match status {
            reqwest::StatusCode::TOO_MANY_REQUESTS => Err(PriceProviderError::RateLimited),
            s if !s.is_success() => Err(PriceProviderError::BadResponse(format!("HTTP {}", s))),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FmpHistoricalResponse {
    historical: Option<Vec<FmpHistoricalValue>>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FmpHistoricalValue {
    date: String,
    close: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FmpSearchMatch {
    symbol: String,
    name: Option<String>,
    #[serde(default)]
    exchange_short_name: Option<String>,
    #[serde(default)]
    stock_exchange: Option<String>,
}

#[async_trait]
impl PriceProvider for FmpProvider {
    fn name(&self) -> &'static str {
        "fmp"
    }

    async fn fetch_daily_history(
        &self,
        ticker: &str,
        days: u32,
    ) -> Result<Vec<ExternalPricePoint>, PriceProviderError> {
        let url = format!("{}/api/v3/historical-price-full/{}", self.base_url, ticker);

        let to = Utc::now().date_naive();
        let from = to - Duration::days(days as i64);

        let resp = self
            .client
            .get(url)
            .query(&[
                ("from", from.format("%Y-%m-%d").to_string()),
                ("to", to.format("%Y-%m-%d").to_string()),
                ("apikey", self.api_key.clone()),
            ])
            .send()
            .await
            .map_err(|e| PriceProviderError::Network(e.to_string()))?;

        Self::check_status(resp.status())?;

        let body: FmpHistoricalResponse = resp
            .json()
            .await
            .map_err(|e| PriceProviderError::Parse(e.to_string()))?;

        if let Some(msg) = body.error_message {
            if msg.contains("Limit Reach") {
                return Err(PriceProviderError::RateLimited);
            }
            return Err(PriceProviderError::BadResponse(msg));
        }

        // FMP answers `{}` for symbols it does not know
        let values = body
            .historical
            .ok_or_else(|| PriceProviderError::NotFound(ticker.to_string()))?;

        let mut points = values
            .into_iter()
            .map(|v| -> Result<ExternalPricePoint, PriceProviderError> {
                // "YYYY-MM-DD" or "YYYY-MM-DD HH:MM:SS"
                let date_part = v.date.split(' ').next().unwrap_or_default();
                let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
                    .map_err(|e| PriceProviderError::Parse(e.to_string()))?;
                Ok(ExternalPricePoint { date, close: v.close })
            })
            .collect::<Result<Vec<_>, _>>()?;

        // FMP returns newest first, we need oldest first
        points.reverse();

        Ok(points)
    }

    async fn search_ticker_by_keyword(
        &self,
        keyword: &str,
    ) -> Result<Vec<ExternalTickerMatch>, PriceProviderError> {
        let url = format!("{}/api/v3/search", self.base_url);

        let resp = self
            .client
            .get(url)
            .query(&[
                ("query", keyword),
                ("limit", "10"),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| PriceProviderError::Network(e.to_string()))?;

        Self::check_status(resp.status())?;

        let body: Vec<FmpSearchMatch> = resp
            .json()
            .await
            .map_err(|e| PriceProviderError::Parse(e.to_string()))?;

        Ok(body
            .into_iter()
            .map(|m| ExternalTickerMatch {
                name: m.name.unwrap_or_else(|| m.symbol.clone()),
                exchange: m
                    .exchange_short_name
                    .or(m.stock_exchange)
                    .unwrap_or_default(),
                symbol: m.symbol,
            })
            .collect())
    }
}
