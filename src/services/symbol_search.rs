use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use serde::Deserialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::external::price_provider::PriceProvider;
use crate::models::{StockSuggestion, STATIC_MARKET_LABEL};

pub const MIN_QUERY_LEN: usize = 2;
pub const MAX_RESULTS: usize = 10;

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Symbol")]
    symbol: String,
    #[serde(rename = "Security")]
    security: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolEntry {
    pub symbol: String,
    pub name: String,
}

impl SymbolEntry {
    pub fn new(symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
        }
    }
}

/// Read-only symbol list, loaded once at start-up.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    entries: Vec<SymbolEntry>,
}

impl SymbolTable {
    pub fn new(entries: Vec<SymbolEntry>) -> Self {
        Self { entries }
    }

    /// Loads a CSV with `Symbol` and `Security` columns; other columns are ignored.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open symbol table {}", path.display()))?;
        let table = Self::from_reader(file)
            .with_context(|| format!("Failed to parse symbol table {}", path.display()))?;

        info!("Loaded {} symbols from {}", table.len(), path.display());
        Ok(table)
    }

    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self> {
        let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

        let mut entries = Vec::new();
        for row in rdr.deserialize::<CsvRow>() {
            let row = row?;
            if row.symbol.is_empty() {
                warn!("Skipping symbol table row without a symbol: {:?}", row);
                continue;
            }
            entries.push(SymbolEntry::new(row.symbol, row.security));
        }

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Case-insensitive prefix match on symbol or name, in table order.
    pub fn search(&self, query: &str, limit: usize) -> Vec<StockSuggestion> {
        let needle = query.to_lowercase();

        self.entries
            .iter()
            .filter(|e| {
                e.symbol.to_lowercase().starts_with(&needle)
                    || e.name.to_lowercase().starts_with(&needle)
            })
            .take(limit)
            .map(|e| StockSuggestion {
                symbol: e.symbol.clone(),
                name: e.name.clone(),
                exchange: STATIC_MARKET_LABEL.to_string(),
            })
            .collect()
    }
}

pub enum SearchBackend {
    Static(Arc<SymbolTable>),
    /// `None` when the remote provider is selected but has no credentials.
    Remote(Option<Arc<dyn PriceProvider>>),
}

pub struct SymbolSearchService {
    backend: SearchBackend,
}

impl SymbolSearchService {
    pub fn new(backend: SearchBackend) -> Self {
        Self { backend }
    }

    pub fn from_table(table: SymbolTable) -> Self {
        Self::new(SearchBackend::Static(Arc::new(table)))
    }

    pub async fn search(&self, raw_query: &str) -> Result<Vec<StockSuggestion>, AppError> {
        let query = raw_query.trim();
        if query.chars().count() < MIN_QUERY_LEN {
            return Err(AppError::Validation(format!(
                "Query must be at least {} characters",
                MIN_QUERY_LEN
            )));
        }

        match &self.backend {
            SearchBackend::Static(table) => Ok(table.search(query, MAX_RESULTS)),
            SearchBackend::Remote(None) => Err(AppError::ServiceUnavailable(
                "Stock search provider is not configured".into(),
            )),
            SearchBackend::Remote(Some(provider)) => {
                let matches = provider.search_ticker_by_keyword(query).await?;
                Ok(matches
                    .into_iter()
                    .take(MAX_RESULTS)
                    .map(|m| StockSuggestion {
                        symbol: m.symbol,
                        name: m.name,
                        exchange: m.exchange,
                    })
                    .collect())
            }
        }
    }
}
