pub mod fmp;
pub mod multi_provider;
pub mod price_provider;
pub mod yahoo;
