use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::models::{SearchParams, StockSuggestion};
use crate::routes::extract::AppQuery;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/search_stocks", get(search_stocks))
}

pub async fn search_stocks(
    AppQuery(params): AppQuery<SearchParams>,
    State(state): State<AppState>,
) -> Result<Json<Vec<StockSuggestion>>, AppError> {
    info!("GET /search_stocks?query={} - Searching symbols", params.query);
    let suggestions = state.symbols.search(&params.query).await.map_err(|e| {
        match &e {
            AppError::Validation(_) => warn!("Rejected search query '{}': {}", params.query, e),
            _ => error!("Symbol search failed for '{}': {}", params.query, e),
        }
        e
    })?;
    Ok(Json(suggestions))
}
