pub mod analysis_service;
pub mod indicators;
pub mod news_service;
pub mod symbol_search;
