//! Statistics snapshot model
//!
//! Breakdowns of an account book's transactions over an arbitrary window,
//! grouped by category, day or family member. Percentages are relative to
//! the snapshot's own same-sign totals, never to a budget.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::{AccountBookId, CategoryId, MemberId};
use super::money::Money;
use super::period::DateRange;

/// Dimension a snapshot is grouped by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    #[default]
    Category,
    Day,
    Member,
}

impl FromStr for GroupBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "category" | "categories" => Ok(Self::Category),
            "day" | "daily" => Ok(Self::Day),
            "member" | "members" => Ok(Self::Member),
            other => Err(format!("Unknown grouping: {}", other)),
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Category => write!(f, "category"),
            Self::Day => write!(f, "day"),
            Self::Member => write!(f, "member"),
        }
    }
}

/// Identity of one breakdown row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum GroupKey {
    /// None collects uncategorized transactions
    Category(Option<CategoryId>),
    Day(NaiveDate),
    /// None collects transactions without a member
    Member(Option<MemberId>),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Category(Some(id)) => write!(f, "{}", id),
            Self::Category(None) => write!(f, "Uncategorized"),
            Self::Day(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Self::Member(Some(id)) => write!(f, "{}", id),
            Self::Member(None) => write!(f, "Unassigned"),
        }
    }
}

/// One row of a breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownEntry {
    pub key: GroupKey,
    /// Signed total (negative for expense rows)
    pub amount: Money,
    pub transaction_count: usize,
    /// Share of the same-sign total
    pub percentage: f64,
}

/// Window totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatisticsTotals {
    /// Sum of income (positive)
    pub income: Money,
    /// Sum of expenses (negative)
    pub expense: Money,
    /// income + expense
    pub net: Money,
    pub transaction_count: usize,
}

/// Statistics over `[window.start, window.end)` for one account book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsSnapshot {
    pub account_book_id: AccountBookId,
    pub window: DateRange,
    pub group_by: GroupBy,
    pub totals: StatisticsTotals,
    pub income: Vec<BreakdownEntry>,
    pub expense: Vec<BreakdownEntry>,
}

impl StatisticsSnapshot {
    /// A snapshot with zero totals and no rows
    pub fn empty(account_book_id: AccountBookId, window: DateRange, group_by: GroupBy) -> Self {
        Self {
            account_book_id,
            window,
            group_by,
            totals: StatisticsTotals::default(),
            income: Vec::new(),
            expense: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.totals.transaction_count == 0
    }

    /// The largest expense groups
    ///
    /// Category and member breakdowns are already ordered by magnitude; daily
    /// breakdowns are chronological and get sorted here.
    pub fn top_expenses(&self, limit: usize) -> Vec<&BreakdownEntry> {
        let mut rows: Vec<_> = self.expense.iter().collect();
        rows.sort_by(|a, b| b.amount.abs().cmp(&a.amount.abs()));
        rows.into_iter().take(limit).collect()
    }

    /// Find an expense row by key
    pub fn expense_for(&self, key: &GroupKey) -> Option<&BreakdownEntry> {
        self.expense.iter().find(|row| &row.key == key)
    }

    pub fn income_for(&self, key: &GroupKey) -> Option<&BreakdownEntry> {
        self.income.iter().find(|row| &row.key == key)
    }
}

/// All three breakdowns of one window, reduced from a single fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsOverview {
    pub by_category: StatisticsSnapshot,
    pub by_day: StatisticsSnapshot,
    pub by_member: StatisticsSnapshot,
}

impl StatisticsOverview {
    pub fn totals(&self) -> &StatisticsTotals {
        &self.by_category.totals
    }
}
