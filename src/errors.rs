use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::external::price_provider::PriceProviderError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Rate limited by external provider")]
    RateLimited,
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::SourceUnavailable(_) => StatusCode::BAD_GATEWAY,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        match self {
            AppError::RateLimited => {
                let mut headers = HeaderMap::new();
                headers.insert("Retry-After", HeaderValue::from_static("60"));
                (status, headers, Json(json!({ "detail": "Rate limited" }))).into_response()
            }
            // Internal details stay in the logs
            AppError::Internal(_) => {
                (status, Json(json!({ "detail": "Internal server error" }))).into_response()
            }
            AppError::Validation(msg)
            | AppError::NotFound(msg)
            | AppError::SourceUnavailable(msg)
            | AppError::ServiceUnavailable(msg) => {
                (status, Json(json!({ "detail": msg }))).into_response()
            }
        }
    }
}

impl From<PriceProviderError> for AppError {
    fn from(value: PriceProviderError) -> Self {
        match value {
            PriceProviderError::NotFound(msg) => AppError::NotFound(msg),
            PriceProviderError::RateLimited => AppError::RateLimited,
            other => AppError::SourceUnavailable(other.to_string()),
        }
    }
}

// Malformed bodies and query strings are client errors with the usual detail body
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_not_found_maps_to_not_found() {
        let err: AppError = PriceProviderError::NotFound("ZZZZ".into()).into();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_provider_transport_errors_map_to_source_unavailable() {
        for e in [
            PriceProviderError::Network("connection refused".into()),
            PriceProviderError::BadResponse("HTTP 500".into()),
            PriceProviderError::Parse("expected value".into()),
        ] {
            let err: AppError = e.into();
            assert!(matches!(err, AppError::SourceUnavailable(_)));
            assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        }
    }

    #[test]
    fn test_rate_limited_sets_retry_after() {
        let response = AppError::RateLimited.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get("Retry-After").unwrap(), "60");
    }
}
