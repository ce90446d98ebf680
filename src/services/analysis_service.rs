use chrono::{Local, NaiveDateTime};
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::external::price_provider::{PriceProvider, PriceProviderError};
use crate::models::{
    AnalysisRequest, AnalysisResult, IndicatorSnapshot, Position, PricePoint, PriceSeries,
    Recommendation, DISCLAIMER,
};
use crate::services::indicators::{self, RsiZone};
use crate::services::news_service::NewsService;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const MAX_TICKER_LEN: usize = 15;

/// Request-independent knobs for the analysis pipeline.
#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    pub history_days: u32,
    pub ticker_suffix: Option<String>,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            history_days: 365,
            ticker_suffix: None,
        }
    }
}

/// Trims and uppercases a ticker, rejecting anything that is not a plausible symbol.
pub fn normalize_ticker(raw: &str) -> Result<String, AppError> {
    let ticker = raw.trim().to_uppercase();
    if ticker.is_empty() {
        return Err(AppError::Validation("Ticker cannot be empty".into()));
    }
    if ticker.len() > MAX_TICKER_LEN
        || !ticker
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '^' | '=' | '-'))
    {
        return Err(AppError::Validation(format!("Invalid ticker: {}", raw.trim())));
    }
    Ok(ticker)
}

/// Symbol sent to the price provider, e.g. `RELIANCE` -> `RELIANCE.NS`.
pub fn provider_symbol(ticker: &str, suffix: Option<&str>) -> String {
    match suffix {
        Some(s) if !s.is_empty() && !ticker.ends_with(s) => format!("{}{}", ticker, s),
        _ => ticker.to_string(),
    }
}

/// Recommendation table. RSI below 30 only matters for losing positions and
/// RSI above 70 only for positions at or above break-even.
pub fn recommend(pnl: f64, rsi14: Option<f64>) -> Recommendation {
    let zone = RsiZone::classify(rsi14);
    if pnl < 0.0 {
        match zone {
            RsiZone::Oversold => Recommendation::AverageDown,
            _ => Recommendation::HoldOrStopLoss,
        }
    } else {
        match zone {
            RsiZone::Overbought => Recommendation::TakeProfits,
            _ => Recommendation::HoldForGains,
        }
    }
}

pub fn key_drivers(
    current_price: f64,
    snapshot: &IndicatorSnapshot,
    headline: Option<&str>,
) -> Vec<String> {
    let mut drivers = Vec::new();

    match RsiZone::classify(snapshot.rsi14) {
        RsiZone::Oversold => drivers.push("RSI indicates oversold conditions".to_string()),
        RsiZone::Overbought => drivers.push("RSI indicates overbought conditions".to_string()),
        RsiZone::Neutral | RsiZone::Unavailable => {}
    }

    if let Some(ma50) = snapshot.ma50 {
        if current_price > ma50 {
            drivers.push("Price is above 50-day moving average".to_string());
        } else {
            drivers.push("Price is below 50-day moving average".to_string());
        }
    }

    if let Some(title) = headline {
        drivers.push(format!("Recent news: {}", title));
    }

    drivers
}

/// Builds the assessment for one position. Pure given its inputs.
pub fn compose(
    ticker: &str,
    current_price: f64,
    snapshot: &IndicatorSnapshot,
    position: &Position,
    headline: Option<&str>,
    now: NaiveDateTime,
) -> AnalysisResult {
    let pnl = position.pnl_at(current_price);

    let mut summary = format!("{} is currently trading at ${:.2}. ", ticker, current_price);
    if current_price > position.average_price {
        summary.push_str("The stock is trading above your average price.");
    } else {
        summary.push_str("The stock is trading below your average price.");
    }

    let recommendation = recommend(pnl, snapshot.rsi14);

    let rationale = format!(
        "Based on technical analysis and current market conditions, {}. \
         Your position shows a {} of ${:.2}.",
        recommendation.as_str().to_lowercase(),
        if pnl > 0.0 { "profit" } else { "loss" },
        pnl.abs()
    );

    AnalysisResult {
        summary,
        key_drivers: key_drivers(current_price, snapshot, headline),
        recommendation,
        rationale,
        disclaimer: DISCLAIMER.to_string(),
        data_timestamp: now.format(TIMESTAMP_FORMAT).to_string(),
    }
}

/// Full pipeline: validate, fetch history and news concurrently, derive
/// indicators and compose the result.
pub async fn analyze(
    price_provider: &dyn PriceProvider,
    news: &NewsService,
    settings: &AnalysisSettings,
    request: AnalysisRequest,
) -> Result<AnalysisResult, AppError> {
    analyze_at(price_provider, news, settings, request, || Local::now().naive_local()).await
}

pub async fn analyze_at<F>(
    price_provider: &dyn PriceProvider,
    news: &NewsService,
    settings: &AnalysisSettings,
    request: AnalysisRequest,
    clock: F,
) -> Result<AnalysisResult, AppError>
where
    F: FnOnce() -> NaiveDateTime,
{
    let ticker = normalize_ticker(&request.ticker)?;
    let position = Position::new(request.shares, request.average_price)?;
    let symbol = provider_symbol(&ticker, settings.ticker_suffix.as_deref());

    info!(
        "Analyzing {} ({} shares @ {:.2}) via {}",
        symbol,
        position.shares,
        position.average_price,
        price_provider.name()
    );

    let (history, headline) = tokio::join!(
        price_provider.fetch_daily_history(&symbol, settings.history_days),
        news.top_headline(&ticker),
    );

    let points = history.map_err(|e| match e {
        PriceProviderError::NotFound(_) => {
            warn!("No price history for {}: {}", symbol, e);
            AppError::NotFound(format!("Stock data not found for {}", ticker))
        }
        other => {
            error!("Price history fetch failed for {}: {}", symbol, other);
            AppError::from(other)
        }
    })?;

    let series = PriceSeries::from_points(
        points
            .into_iter()
            .map(|p| PricePoint::new(p.date, p.close))
            .collect(),
    );

    let Some(latest) = series.latest().copied() else {
        warn!("Provider returned an empty series for {}", symbol);
        return Err(AppError::NotFound(format!("Stock data not found for {}", ticker)));
    };

    let snapshot = indicators::latest_snapshot(&series.closes());

    info!(
        "{}: {} closes, last {:.2} on {}, rsi14={:?} ma50={:?} ma200={:?}",
        ticker,
        series.len(),
        latest.close,
        latest.date,
        snapshot.rsi14,
        snapshot.ma50,
        snapshot.ma200
    );

    Ok(compose(
        &ticker,
        latest.close,
        &snapshot,
        &position,
        headline.as_deref(),
        clock(),
    ))
}
