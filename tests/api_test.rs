//! HTTP-level tests for the search and analysis endpoints.
//!
//! Providers are replaced by in-memory fakes so the router, services and
//! error mapping are exercised end to end without network access.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration, NaiveDate};
use serde_json::{json, Value};
use tower::ServiceExt;

use stockspro_backend::app::create_app;
use stockspro_backend::external::price_provider::{
    ExternalPricePoint, ExternalTickerMatch, PriceProvider, PriceProviderError,
};
use stockspro_backend::models::NewsArticle;
use stockspro_backend::services::analysis_service::AnalysisSettings;
use stockspro_backend::services::news_service::{NewsError, NewsProvider, NewsService};
use stockspro_backend::services::symbol_search::{
    SearchBackend, SymbolEntry, SymbolSearchService, SymbolTable,
};
use stockspro_backend::state::AppState;

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

enum History {
    Closes(Vec<f64>),
    NotFound,
    Down,
}

struct FakePriceProvider {
    history: History,
    calls: AtomicUsize,
}

impl FakePriceProvider {
    fn new(history: History) -> Arc<Self> {
        Arc::new(Self {
            history,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl PriceProvider for FakePriceProvider {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn fetch_daily_history(
        &self,
        ticker: &str,
        _days: u32,
    ) -> Result<Vec<ExternalPricePoint>, PriceProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.history {
            History::Closes(closes) => {
                let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
                Ok(closes
                    .iter()
                    .enumerate()
                    .map(|(i, &close)| ExternalPricePoint {
                        date: start + Duration::days(i as i64),
                        close,
                    })
                    .collect())
            }
            History::NotFound => Err(PriceProviderError::NotFound(ticker.to_string())),
            History::Down => Err(PriceProviderError::Network("connection refused".into())),
        }
    }

    async fn search_ticker_by_keyword(
        &self,
        _keyword: &str,
    ) -> Result<Vec<ExternalTickerMatch>, PriceProviderError> {
        Ok((0..15)
            .map(|i| ExternalTickerMatch {
                symbol: format!("AA{}", i),
                name: format!("Remote Corp {}", i),
                exchange: "NYSE".into(),
            })
            .collect())
    }
}

struct FakeNews(Option<&'static str>);

#[async_trait]
impl NewsProvider for FakeNews {
    async fn fetch_news(&self, _query: &str, _since: NaiveDate) -> Result<Vec<NewsArticle>, NewsError> {
        match self.0 {
            Some(title) => Ok(vec![NewsArticle {
                title: title.to_string(),
                url: "https://example.com/news".into(),
                source: "Example Wire".into(),
                published_at: None,
            }]),
            None => Err(NewsError::Network("timeout".into())),
        }
    }
}

fn symbol_table() -> SymbolTable {
    SymbolTable::new(vec![
        SymbolEntry::new("AAPL", "Apple Inc."),
        SymbolEntry::new("AAP", "Advance Auto Parts"),
        SymbolEntry::new("MSFT", "Microsoft"),
    ])
}

fn app_with(provider: Arc<FakePriceProvider>, news: Option<&'static str>) -> Router {
    create_app(AppState {
        price_provider: provider,
        news: Arc::new(NewsService::with_provider(Arc::new(FakeNews(news)), 14)),
        symbols: Arc::new(SymbolSearchService::from_table(symbol_table())),
        analysis: AnalysisSettings::default(),
    })
}

/// [100, 102, 99, 105] followed by a steady climb, 60 closes in total.
fn uptrend_closes() -> Vec<f64> {
    let mut closes = vec![100.0, 102.0, 99.0, 105.0];
    closes.extend((1..=56).map(|i| 105.0 + i as f64 * 0.5));
    closes
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn analyze_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/analyze")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_health() {
    let app = app_with(FakePriceProvider::new(History::Down), None);
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"OK");
}

// ---------------------------------------------------------------------------
// Symbol search
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_search_prefix_in_table_order() {
    let app = app_with(FakePriceProvider::new(History::Down), None);
    let (status, body) = send(app, get("/search_stocks?query=AAP")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {"symbol": "AAPL", "name": "Apple Inc.", "exchange": "S&P 500"},
            {"symbol": "AAP", "name": "Advance Auto Parts", "exchange": "S&P 500"}
        ])
    );
}

#[tokio::test]
async fn test_search_is_case_insensitive() {
    let app = app_with(FakePriceProvider::new(History::Down), None);
    let (status, body) = send(app, get("/search_stocks?query=micro")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["symbol"], "MSFT");
}

#[tokio::test]
async fn test_search_rejects_short_query() {
    let app = app_with(FakePriceProvider::new(History::Down), None);
    let (status, body) = send(app, get("/search_stocks?query=A")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("at least 2"));
}

#[tokio::test]
async fn test_remote_search_is_capped_at_ten() {
    let provider: Arc<dyn PriceProvider> = FakePriceProvider::new(History::Down);
    let app = create_app(AppState {
        price_provider: provider.clone(),
        news: Arc::new(NewsService::disabled()),
        symbols: Arc::new(SymbolSearchService::new(SearchBackend::Remote(Some(provider)))),
        analysis: AnalysisSettings::default(),
    });

    let (status, body) = send(app, get("/search_stocks?query=AA")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 10);
    assert_eq!(body[0]["exchange"], "NYSE");
}

#[tokio::test]
async fn test_unconfigured_remote_search_is_503() {
    let app = create_app(AppState {
        price_provider: FakePriceProvider::new(History::Down),
        news: Arc::new(NewsService::disabled()),
        symbols: Arc::new(SymbolSearchService::new(SearchBackend::Remote(None))),
        analysis: AnalysisSettings::default(),
    });

    let (status, _) = send(app, get("/search_stocks?query=AAPL")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

// ---------------------------------------------------------------------------
// Position analysis
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_analyze_uptrend_in_profit() {
    let app = app_with(
        FakePriceProvider::new(History::Closes(uptrend_closes())),
        Some("Apple unveils new iPhone"),
    );
    let (status, body) = send(
        app,
        analyze_request(json!({"ticker": "aapl", "shares": 10, "average_price": 95.0})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["summary"],
        "AAPL is currently trading at $133.00. The stock is trading above your average price."
    );
    assert_eq!(
        body["key_drivers"],
        json!([
            "RSI indicates overbought conditions",
            "Price is above 50-day moving average",
            "Recent news: Apple unveils new iPhone"
        ])
    );
    assert_eq!(body["recommendation"], "Consider taking profits");
    assert_eq!(
        body["rationale"],
        "Based on technical analysis and current market conditions, consider taking profits. \
         Your position shows a profit of $380.00."
    );
    assert_eq!(
        body["disclaimer"],
        "This analysis is for informational purposes only and should not be considered as financial advice."
    );

    let ts = body["data_timestamp"].as_str().unwrap();
    assert!(chrono::NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S").is_ok());
}

#[tokio::test]
async fn test_analyze_short_history_has_no_indicator_drivers() {
    let app = app_with(
        FakePriceProvider::new(History::Closes(vec![50.0, 49.0, 48.0, 47.5, 47.0])),
        None,
    );
    let (status, body) = send(
        app,
        analyze_request(json!({"ticker": "MSFT", "shares": 4, "average_price": 60.0})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["key_drivers"], json!([]));
    assert_eq!(body["recommendation"], "Consider holding or setting a stop loss");
    assert!(body["rationale"].as_str().unwrap().ends_with("a loss of $52.00."));
}

#[tokio::test]
async fn test_analyze_news_failure_is_not_fatal() {
    let app = app_with(FakePriceProvider::new(History::Closes(uptrend_closes())), None);
    let (status, body) = send(
        app,
        analyze_request(json!({"ticker": "AAPL", "shares": 1, "average_price": 200.0})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let drivers = body["key_drivers"].as_array().unwrap();
    assert!(drivers.iter().all(|d| !d.as_str().unwrap().starts_with("Recent news")));
}

#[tokio::test]
async fn test_analyze_unknown_ticker_is_404() {
    let app = app_with(FakePriceProvider::new(History::NotFound), None);
    let (status, body) = send(
        app,
        analyze_request(json!({"ticker": "ZZZZ", "shares": 1, "average_price": 1.0})),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Stock data not found for ZZZZ");
}

#[tokio::test]
async fn test_analyze_empty_history_is_404() {
    let app = app_with(FakePriceProvider::new(History::Closes(Vec::new())), None);
    let (status, _) = send(
        app,
        analyze_request(json!({"ticker": "AAPL", "shares": 1, "average_price": 1.0})),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_analyze_provider_down_is_502() {
    let app = app_with(FakePriceProvider::new(History::Down), Some("ignored"));
    let (status, _) = send(
        app,
        analyze_request(json!({"ticker": "AAPL", "shares": 1, "average_price": 1.0})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_invalid_input_rejected_before_fetch() {
    let provider = FakePriceProvider::new(History::Closes(uptrend_closes()));

    for body in [
        json!({"ticker": "AAPL", "shares": 0, "average_price": 10.0}),
        json!({"ticker": "AAPL", "shares": -5, "average_price": 10.0}),
        json!({"ticker": "AAPL", "shares": 5, "average_price": 0.0}),
        json!({"ticker": "   ", "shares": 5, "average_price": 10.0}),
    ] {
        let app = app_with(provider.clone(), None);
        let (status, _) = send(app, analyze_request(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_fourteen_falling_closes_are_oversold() {
    let falling: Vec<f64> = (0..14).map(|i| 100.0 - i as f64).collect();
    let app = app_with(FakePriceProvider::new(History::Closes(falling)), None);
    let (status, body) = send(
        app,
        analyze_request(json!({"ticker": "INTC", "shares": 2, "average_price": 110.0})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["key_drivers"], json!(["RSI indicates oversold conditions"]));
    assert_eq!(body["recommendation"], "Consider averaging down your position");
}

// ---------------------------------------------------------------------------
// Malformed requests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_analyze_non_integer_shares_is_400_with_detail() {
    let provider = FakePriceProvider::new(History::Closes(uptrend_closes()));
    let app = app_with(provider.clone(), None);
    let (status, body) = send(
        app,
        analyze_request(json!({"ticker": "AAPL", "shares": 1.5, "average_price": 10.0})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_analyze_missing_field_is_400_with_detail() {
    let app = app_with(FakePriceProvider::new(History::Down), None);
    let (status, body) = send(
        app,
        analyze_request(json!({"ticker": "AAPL", "average_price": 10.0})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("shares"));
}

#[tokio::test]
async fn test_search_without_query_is_400_with_detail() {
    let app = app_with(FakePriceProvider::new(History::Down), None);
    let (status, body) = send(app, get("/search_stocks")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}
