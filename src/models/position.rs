use serde::{Deserialize, Serialize};

use crate::errors::AppError;

// The caller's holding in one ticker. Immutable for the duration of an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub shares: u64,
    pub average_price: f64,
}

impl Position {
    /// Validates raw request values. Shares must be a positive integer and
    /// the average price a finite positive number.
    pub fn new(shares: i64, average_price: f64) -> Result<Self, AppError> {
        if shares <= 0 {
            return Err(AppError::Validation("Shares must be > 0".into()));
        }
        if !average_price.is_finite() || average_price <= 0.0 {
            return Err(AppError::Validation("Average price must be > 0".into()));
        }

        Ok(Self {
            shares: shares as u64,
            average_price,
        })
    }

    pub fn investment(&self) -> f64 {
        self.shares as f64 * self.average_price
    }

    pub fn value_at(&self, price: f64) -> f64 {
        self.shares as f64 * price
    }

    /// Profit (positive) or loss (negative) at the given market price.
    pub fn pnl_at(&self, price: f64) -> f64 {
        self.value_at(price) - self.investment()
    }
}
