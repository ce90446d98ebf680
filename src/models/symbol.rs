use serde::{Deserialize, Serialize};

pub const STATIC_MARKET_LABEL: &str = "S&P 500";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSuggestion {
    pub symbol: String,
    pub name: String,
    pub exchange: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchParams {
    pub query: String,
}
