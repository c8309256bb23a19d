//! Budget usage views
//!
//! Usage is computed from a budget definition and ledger data; it is never
//! stored by the engine and can always be recomputed.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{BudgetId, CategoryId};
use super::money::Money;
use super::period::Period;

/// Consumption of a budget (or one of its category allocations) in a period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetUsage {
    pub budget_id: BudgetId,

    /// None for the whole-budget aggregate
    pub category_id: Option<CategoryId>,

    pub period: Period,

    /// Base amount for the period
    pub amount: Money,

    /// Amount carried in from the previous period (may be negative)
    pub carried_amount: Money,

    /// Sum of expense magnitudes in the period
    pub spent: Money,

    /// amount + carried_amount - spent
    pub remaining: Money,

    /// spent / (amount + carried_amount) * 100, or 0 without a positive base
    pub percentage: f64,

    /// spent > amount + carried_amount
    pub is_overspent: bool,

    /// Number of expense transactions counted
    pub transaction_count: usize,
}

impl BudgetUsage {
    /// Derive remaining, percentage and overspend from the raw figures
    pub fn new(
        budget_id: BudgetId,
        category_id: Option<CategoryId>,
        period: Period,
        amount: Money,
        carried_amount: Money,
        spent: Money,
        transaction_count: usize,
    ) -> Self {
        let effective = amount + carried_amount;
        Self {
            budget_id,
            category_id,
            period,
            amount,
            carried_amount,
            spent,
            remaining: effective - spent,
            percentage: spent.percent_of(effective),
            is_overspent: spent > effective,
            transaction_count,
        }
    }

    /// Amount available this period before spending (base + carried)
    pub fn effective_amount(&self) -> Money {
        self.amount + self.carried_amount
    }

    /// Amount a carrying policy would consider for the next period
    pub fn rollover_amount(&self) -> Money {
        self.remaining
    }
}

impl fmt::Display for BudgetUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Spent: {} of {} | Remaining: {} | {:.2}%",
            self.spent,
            self.effective_amount(),
            self.remaining,
            self.percentage
        )
    }
}

/// Result of one usage computation: the aggregate plus one entry per allocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetUsageReport {
    pub total: BudgetUsage,
    pub categories: Vec<BudgetUsage>,
}

impl BudgetUsageReport {
    pub fn period(&self) -> &Period {
        &self.total.period
    }

    /// Usage for a single category allocation
    pub fn category(&self, category_id: CategoryId) -> Option<&BudgetUsage> {
        self.categories
            .iter()
            .find(|usage| usage.category_id == Some(category_id))
    }

    /// Category allocations spent beyond their effective amount
    pub fn overspent_categories(&self) -> Vec<&BudgetUsage> {
        self.categories.iter().filter(|u| u.is_overspent).collect()
    }
}
