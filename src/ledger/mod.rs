//! Ledger access for the engine
//!
//! The ledger is owned by the host application. The engine reads it only
//! through [`LedgerAccessor`], which returns fully materialized, timestamp
//! ordered transactions for a query window.

pub mod memory;
pub mod retry;

pub use memory::MemoryLedger;
pub use retry::{fetch_with_retry, RetryPolicy};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{AccountBookId, CategoryId, DateRange, MemberId, Transaction};

/// Failure reported by a ledger implementation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Transient failure (I/O, timeout); the same query may succeed later
    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    /// The ledger refused the query; retrying will not help
    #[error("ledger rejected query: {0}")]
    Rejected(String),
}

impl LedgerError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Filter for one range fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LedgerQuery {
    pub account_book_id: AccountBookId,
    pub category_id: Option<CategoryId>,
    pub member_id: Option<MemberId>,
    pub range: DateRange,
}

impl LedgerQuery {
    /// Every transaction of a book in a window
    pub fn book(account_book_id: AccountBookId, range: DateRange) -> Self {
        Self {
            account_book_id,
            category_id: None,
            member_id: None,
            range,
        }
    }

    pub fn category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn member(mut self, member_id: Option<MemberId>) -> Self {
        self.member_id = member_id;
        self
    }

    /// Check if a transaction satisfies every filter of the query
    pub fn matches(&self, txn: &Transaction) -> bool {
        txn.account_book_id == self.account_book_id
            && self.range.contains(txn.date())
            && self
                .category_id
                .map_or(true, |id| txn.category_id == Some(id))
            && self.member_id.map_or(true, |id| txn.member_id == Some(id))
    }
}

/// Read-only view of the transaction ledger
///
/// Implementations must return transactions in ascending timestamp order and
/// must either return the complete result or an error, never a partial one.
pub trait LedgerAccessor: Send + Sync {
    fn transactions_in_range(&self, query: &LedgerQuery) -> Result<Vec<Transaction>, LedgerError>;
}

impl<T: LedgerAccessor + ?Sized> LedgerAccessor for std::sync::Arc<T> {
    fn transactions_in_range(&self, query: &LedgerQuery) -> Result<Vec<Transaction>, LedgerError> {
        (**self).transactions_in_range(query)
    }
}

/// What a committed ledger mutation touched
///
/// Produced by the mutation pathway and handed to
/// [`BudgetEngine::invalidate`](crate::engine::BudgetEngine::invalidate).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerChange {
    pub account_book_id: AccountBookId,
    pub range: DateRange,
    /// Categories of the transaction before and after the mutation
    pub categories: Vec<CategoryId>,
}

impl LedgerChange {
    /// Change caused by a single transaction
    pub fn for_transaction(txn: &Transaction) -> Self {
        Self {
            account_book_id: txn.account_book_id,
            range: DateRange::single_day(txn.date()),
            categories: txn.category_id.into_iter().collect(),
        }
    }

    /// Widen this change to also cover another transaction of the same book
    pub fn merge(mut self, txn: &Transaction) -> Self {
        self.range = self.range.union(&DateRange::single_day(txn.date()));
        if let Some(category_id) = txn.category_id {
            if !self.categories.contains(&category_id) {
                self.categories.push(category_id);
            }
        }
        self
    }
}
