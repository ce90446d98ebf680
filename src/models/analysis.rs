use serde::{Deserialize, Serialize};

pub const DISCLAIMER: &str = "This analysis is for informational purposes only and should not be considered as financial advice.";

/// Body of `POST /analyze`.
///
/// Older clients also send `position_type` and `position_amount`; both are
/// derived server-side, so unknown fields are simply ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisRequest {
    pub ticker: String,
    pub shares: i64,
    pub average_price: f64,
}

/// Indicator values at one point of the series. `None` until the
/// corresponding window is filled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct IndicatorSnapshot {
    pub rsi14: Option<f64>,
    pub ma50: Option<f64>,
    pub ma200: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum Recommendation {
    AverageDown,
    HoldOrStopLoss,
    HoldForGains,
    TakeProfits,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::AverageDown => "Consider averaging down your position",
            Recommendation::HoldOrStopLoss => "Consider holding or setting a stop loss",
            Recommendation::HoldForGains => "Consider holding for further gains",
            Recommendation::TakeProfits => "Consider taking profits",
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Recommendation> for String {
    fn from(value: Recommendation) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub summary: String,
    pub key_drivers: Vec<String>,
    pub recommendation: Recommendation,
    pub rationale: String,
    pub disclaimer: String,
    pub data_timestamp: String,
}
