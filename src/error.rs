//! Error types for the budget engine
//!
//! Defines the error taxonomy shared by the period resolver, aggregator,
//! statistics reducer and storage adapters, using thiserror for ergonomic
//! definitions.

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{BudgetId, Money};

/// The main error type for engine operations
#[derive(Error, Debug)]
pub enum EngineError {
    /// A date precedes the anchor date of a budget's cycle
    #[error("Date {date} precedes the anchor date {anchor} of budget {budget_id}")]
    OutOfRange {
        budget_id: BudgetId,
        date: NaiveDate,
        anchor: NaiveDate,
    },

    /// Category allocations add up to more than the budget amount
    #[error("Category allocations total {allocated} but budget {budget_id} only has {amount}")]
    AllocationExceeded {
        budget_id: BudgetId,
        allocated: Money,
        amount: Money,
    },

    /// The ledger could not be read, even after retrying
    #[error("Ledger unavailable after {attempts} attempt(s): {reason}")]
    LedgerUnavailable { attempts: u32, reason: String },

    /// Validation errors for budget definitions and query arguments
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Storage adapter errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl EngineError {
    /// Create a "not found" error for budgets
    pub fn budget_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Budget",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for transactions
    pub fn transaction_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Transaction",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation failure the caller caused
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::OutOfRange { .. } | Self::AllocationExceeded { .. }
        )
    }

    /// Only ledger outages may succeed when the same call is repeated
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::LedgerUnavailable { .. })
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
