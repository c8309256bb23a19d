//! Budget definition model
//!
//! A budget is a spending limit owned by an account book that repeats over a
//! cycle, optionally split into per-category allocations. Budgets are never
//! physically deleted while transactions may still reference them; they are
//! retired instead.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use super::ids::{AccountBookId, BudgetId, CategoryId, MemberId};
use super::money::Money;
use super::period::Cycle;
use crate::error::{EngineError, EngineResult};

/// Whose spending a budget tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BudgetScope {
    /// Only the owning member's transactions count
    Personal,
    /// Every transaction in the account book counts
    #[default]
    General,
}

impl fmt::Display for BudgetScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Personal => write!(f, "personal"),
            Self::General => write!(f, "general"),
        }
    }
}

/// What happens to a period's leftover (or overdrawn) amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RolloverPolicy {
    /// Every period starts from the base amount
    #[default]
    None,
    /// Positive remainders carry into the next period, deficits are forgiven
    CarryUnspent,
    /// Remainders carry unclamped, so overspending shrinks the next period
    CarryDeficit,
}

impl RolloverPolicy {
    pub fn carries(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl FromStr for RolloverPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "none" => Ok(Self::None),
            "carry_unspent" | "unspent" => Ok(Self::CarryUnspent),
            "carry_deficit" | "deficit" => Ok(Self::CarryDeficit),
            other => Err(format!("Unknown rollover policy: {}", other)),
        }
    }
}

impl fmt::Display for RolloverPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::CarryUnspent => write!(f, "carry unspent"),
            Self::CarryDeficit => write!(f, "carry deficit"),
        }
    }
}

/// A sub-allocation of a budget for one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryBudget {
    pub category_id: CategoryId,
    pub amount: Money,
    /// Set when the category was deleted; kept for history
    #[serde(default)]
    pub retired: bool,
}

impl CategoryBudget {
    pub fn new(category_id: CategoryId, amount: Money) -> Self {
        Self {
            category_id,
            amount,
            retired: false,
        }
    }
}

/// A recurring spending limit
///
/// Cached usage is keyed on `updated_at`. Change the amount, allocations,
/// rollover or retirement through the methods below, which advance it; a
/// direct field write leaves cached results looking current until the
/// budget is invalidated on the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: BudgetId,

    /// Display name
    #[serde(default)]
    pub name: String,

    pub scope: BudgetScope,

    /// The account book that owns this budget
    pub account_book_id: AccountBookId,

    /// Member whose spending a personal budget tracks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_member_id: Option<MemberId>,

    /// Base amount available each period
    pub amount: Money,

    /// Optional per-category allocations
    #[serde(default)]
    pub category_budgets: Vec<CategoryBudget>,

    pub cycle: Cycle,

    #[serde(default)]
    pub rollover: RolloverPolicy,

    /// When the budget was soft-retired
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retired_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    /// Bumped on every edit; cached usage from older edits is ignored
    pub updated_at: DateTime<Utc>,
}

impl Budget {
    /// Create a general budget with no category allocations and no rollover
    pub fn new(
        name: impl Into<String>,
        account_book_id: AccountBookId,
        amount: Money,
        cycle: Cycle,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: BudgetId::new(),
            name: name.into(),
            scope: BudgetScope::General,
            account_book_id,
            owner_member_id: None,
            amount,
            category_budgets: Vec::new(),
            cycle,
            rollover: RolloverPolicy::None,
            retired_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a personal budget tracking a single member's spending
    pub fn personal(
        name: impl Into<String>,
        account_book_id: AccountBookId,
        owner: MemberId,
        amount: Money,
        cycle: Cycle,
    ) -> Self {
        let mut budget = Self::new(name, account_book_id, amount, cycle);
        budget.scope = BudgetScope::Personal;
        budget.owner_member_id = Some(owner);
        budget
    }

    /// Builder-style rollover policy
    pub fn with_rollover(mut self, policy: RolloverPolicy) -> Self {
        self.rollover = policy;
        self.touch();
        self
    }

    fn touch(&mut self) {
        // Strictly increasing even when edits land within the clock's resolution
        let now = Utc::now();
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + chrono::Duration::microseconds(1)
        };
    }

    /// Change the base amount, rejecting amounts below the allocated total
    pub fn set_amount(&mut self, amount: Money) -> EngineResult<()> {
        let before = self.amount;
        self.amount = amount;
        if let Err(e) = self.validate() {
            self.amount = before;
            return Err(e);
        }
        self.touch();
        Ok(())
    }

    /// Set (or replace) the allocation for a category
    ///
    /// The edit is rolled back if the allocations would exceed the budget.
    pub fn allocate(&mut self, category_id: CategoryId, amount: Money) -> EngineResult<()> {
        let before = self.category_budgets.clone();
        match self
            .category_budgets
            .iter_mut()
            .find(|cb| cb.category_id == category_id)
        {
            Some(existing) => {
                existing.amount = amount;
                existing.retired = false;
            }
            None => self
                .category_budgets
                .push(CategoryBudget::new(category_id, amount)),
        }

        if let Err(e) = self.validate() {
            self.category_budgets = before;
            return Err(e);
        }
        self.touch();
        Ok(())
    }

    /// Retire the budget (e.g. when its account book is deleted)
    pub fn retire(&mut self) {
        if self.retired_at.is_none() {
            self.retired_at = Some(Utc::now());
            self.touch();
        }
    }

    /// Retire a category's allocation (e.g. when the category is deleted)
    pub fn retire_category(&mut self, category_id: CategoryId) -> bool {
        let found = self
            .category_budgets
            .iter_mut()
            .find(|cb| cb.category_id == category_id && !cb.retired)
            .map(|cb| cb.retired = true)
            .is_some();
        if found {
            self.touch();
        }
        found
    }

    pub fn is_retired(&self) -> bool {
        self.retired_at.is_some()
    }

    /// Allocations that still apply
    pub fn active_allocations(&self) -> impl Iterator<Item = &CategoryBudget> {
        self.category_budgets.iter().filter(|cb| !cb.retired)
    }

    /// Sum of active category allocations
    pub fn allocated_total(&self) -> Money {
        self.active_allocations().map(|cb| cb.amount).sum()
    }

    /// Whether the budget is split into category allocations
    pub fn is_category_constrained(&self) -> bool {
        self.active_allocations().next().is_some()
    }

    /// Member filter implied by the scope
    pub fn member_filter(&self) -> Option<MemberId> {
        match self.scope {
            BudgetScope::Personal => self.owner_member_id,
            BudgetScope::General => None,
        }
    }

    /// Validate the budget definition
    pub fn validate(&self) -> EngineResult<()> {
        if self.amount.is_negative() {
            return Err(EngineError::Validation(
                "Budget amount cannot be negative".into(),
            ));
        }

        if self.cycle.length.is_degenerate() {
            return Err(EngineError::Validation(
                "Budget cycle must be at least one day or month long".into(),
            ));
        }

        if self.scope == BudgetScope::Personal && self.owner_member_id.is_none() {
            return Err(EngineError::Validation(
                "Personal budgets need an owning member".into(),
            ));
        }

        let mut seen = HashSet::new();
        for allocation in self.active_allocations() {
            if allocation.amount.is_negative() {
                return Err(EngineError::Validation(format!(
                    "Allocation for {} cannot be negative",
                    allocation.category_id
                )));
            }
            if !seen.insert(allocation.category_id) {
                return Err(EngineError::Validation(format!(
                    "Category {} is allocated more than once",
                    allocation.category_id
                )));
            }
        }

        let allocated = self.allocated_total();
        if allocated > self.amount {
            return Err(EngineError::AllocationExceeded {
                budget_id: self.id,
                allocated,
                amount: self.amount,
            });
        }

        Ok(())
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} per {} period (rollover: {})",
            self.name, self.amount, self.cycle.length, self.rollover
        )
    }
}
