mod analysis;
mod news;
mod position;
mod price_point;
mod symbol;

pub use analysis::{AnalysisRequest, AnalysisResult, IndicatorSnapshot, Recommendation, DISCLAIMER};
pub use news::NewsArticle;
pub use position::Position;
pub use price_point::{PricePoint, PriceSeries};
pub use symbol::{SearchParams, StockSuggestion, STATIC_MARKET_LABEL};
