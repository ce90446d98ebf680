use crate::external::price_provider::{
    build_client, ExternalPricePoint, ExternalTickerMatch, PriceProvider, PriceProviderError,
};
use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;

const YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";

pub struct YahooProvider {
    client: reqwest::Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new(timeout_secs: u64) -> Result<Self, PriceProviderError> {
        Self::with_base_url(YAHOO_BASE_URL, timeout_secs)
    }

    pub fn with_base_url(base_url: &str, timeout_secs: u64) -> Result<Self, PriceProviderError> {
        Ok(Self {
            client: build_client(timeout_secs)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

// Minimal response structs (only what we need)
#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: YahooIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    quote: Vec<YahooQuote>,
}

#[derive(Debug, Deserialize)]
struct YahooQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct YahooSearchResponse {
    #[serde(default)]
    quotes: Vec<YahooSearchQuote>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooSearchQuote {
    symbol: String,
    #[serde(default)]
    shortname: Option<String>,
    #[serde(default)]
    longname: Option<String>,
    #[serde(default)]
    exch_disp: Option<String>,
}

/// Maps a day count onto Yahoo's coarse `range` parameter.
fn range_for_days(days: u32) -> &'static str {
    if days <= 30 {
        "1mo"
    } else if days <= 180 {
        "6mo"
    } else if days <= 365 {
        "1y"
    } else {
        "2y"
    }
}

#[async_trait]
impl PriceProvider for YahooProvider {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn fetch_daily_history(
        &self,
        ticker: &str,
        days: u32,
    ) -> Result<Vec<ExternalPricePoint>, PriceProviderError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, ticker);

        let resp = self
            .client
            .get(url)
            .query(&[("range", range_for_days(days)), ("interval", "1d")])
            .send()
            .await
            .map_err(|e| PriceProviderError::Network(e.to_string()))?;

        match resp.status() {
            reqwest::StatusCode::TOO_MANY_REQUESTS => return Err(PriceProviderError::RateLimited),
            reqwest::StatusCode::NOT_FOUND => return Err(PriceProviderError::NotFound(ticker.to_string())),
            status if !status.is_success() => {
                return Err(PriceProviderError::BadResponse(format!("HTTP {}", status)))
            }
            _ => {}
        }

        let body = resp
            .json::<YahooChartResponse>()
            .await
            .map_err(|e| PriceProviderError::Parse(e.to_string()))?;

        if let Some(err) = body.chart.error {
            if !err.is_null() {
                return Err(PriceProviderError::NotFound(format!("{}: {}", ticker, err)));
            }
        }

        let Some(result) = body.chart.result.and_then(|mut r| r.pop()) else {
            return Ok(Vec::new());
        };

        // timestamp aligns with close list by index
        let closes = result
            .indicators
            .quote
            .into_iter()
            .next()
            .map(|q| q.close)
            .unwrap_or_default();

        let mut out = Vec::with_capacity(result.timestamp.len());

        for (i, ts) in result.timestamp.iter().enumerate() {
            // skip missing closes
            let Some(close) = closes.get(i).copied().flatten() else {
                continue;
            };

            let dt = DateTime::from_timestamp(*ts, 0)
                .ok_or_else(|| PriceProviderError::Parse(format!("bad timestamp {}", ts)))?;

            out.push(ExternalPricePoint {
                date: dt.date_naive(),
                close,
            });
        }

        out.sort_by_key(|p| p.date);

        Ok(out)
    }

    async fn search_ticker_by_keyword(
        &self,
        keyword: &str,
    ) -> Result<Vec<ExternalTickerMatch>, PriceProviderError> {
        let url = format!("{}/v1/finance/search", self.base_url);

        let resp = self
            .client
            .get(url)
            .query(&[("q", keyword), ("quotesCount", "10"), ("newsCount", "0")])
            .send()
            .await
            .map_err(|e| PriceProviderError::Network(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(PriceProviderError::RateLimited);
        }
        if !resp.status().is_success() {
            return Err(PriceProviderError::BadResponse(format!("HTTP {}", resp.status())));
        }

        let body: YahooSearchResponse = resp
            .json()
            .await
            .map_err(|e| PriceProviderError::Parse(e.to_string()))?;

        Ok(body
            .quotes
            .into_iter()
            .map(|q| ExternalTickerMatch {
                name: q.longname.or(q.shortname).unwrap_or_else(|| q.symbol.clone()),
                exchange: q.exch_disp.unwrap_or_default(),
                symbol: q.symbol,
            })
            .collect())
    }
}
