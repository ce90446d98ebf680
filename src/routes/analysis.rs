use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::models::{AnalysisRequest, AnalysisResult};
use crate::routes::extract::AppJson;
use crate::services;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/analyze", post(analyze_stock))
}

pub async fn analyze_stock(
    State(state): State<AppState>,
    AppJson(input): AppJson<AnalysisRequest>,
) -> Result<Json<AnalysisResult>, AppError> {
    let ticker = input.ticker.clone();
    info!("POST /analyze - Analyzing position in {}", ticker);

    let result = services::analysis_service::analyze(
        state.price_provider.as_ref(),
        &state.news,
        &state.analysis,
        input,
    )
    .await
    .map_err(|e| {
        match &e {
            AppError::Validation(_) | AppError::NotFound(_) => {
                warn!("Analysis of {} rejected: {}", ticker, e)
            }
            AppError::RateLimited => warn!("Rate limited when analyzing {}", ticker),
            _ => error!("Failed to analyze {}: {}", ticker, e),
        }
        e
    })?;

    Ok(Json(result))
}
