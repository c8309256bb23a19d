//! Transaction model
//!
//! Transactions belong to the ledger, which the engine reads but never writes.
//! Amounts are signed: positive for income, negative for expenses. A
//! non-negative amount can still be flagged as an expense by the ledger.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{AccountBookId, CategoryId, MemberId, TransactionId};
use super::money::Money;

/// Direction of money flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flow {
    Income,
    Expense,
}

/// A committed ledger entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,

    pub account_book_id: AccountBookId,

    /// Category (None if uncategorized)
    #[serde(default)]
    pub category_id: Option<CategoryId>,

    /// Signed amount (positive for income, negative for expense)
    pub amount: Money,

    /// Marks a non-negative amount as an expense
    #[serde(default)]
    pub flagged_expense: bool,

    pub timestamp: DateTime<Utc>,

    /// Family member who made the transaction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_id: Option<MemberId>,
}

impl Transaction {
    /// Create a new transaction
    pub fn new(account_book_id: AccountBookId, timestamp: DateTime<Utc>, amount: Money) -> Self {
        Self {
            id: TransactionId::new(),
            account_book_id,
            category_id: None,
            amount,
            flagged_expense: false,
            timestamp,
            member_id: None,
        }
    }

    /// Builder-style category
    pub fn with_category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    /// Builder-style member
    pub fn with_member(mut self, member_id: MemberId) -> Self {
        self.member_id = Some(member_id);
        self
    }

    /// Calendar day the transaction falls on
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    pub fn flow(&self) -> Flow {
        if self.amount.is_negative() || self.flagged_expense {
            Flow::Expense
        } else {
            Flow::Income
        }
    }

    pub fn is_expense(&self) -> bool {
        self.flow() == Flow::Expense
    }

    pub fn is_income(&self) -> bool {
        self.flow() == Flow::Income
    }

    /// Amount consumed from a budget (zero for income)
    pub fn spend(&self) -> Money {
        if self.is_expense() {
            self.amount.abs()
        } else {
            Money::zero()
        }
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.date(), self.id, self.amount)
    }
}
