//! Budget aggregator
//!
//! Computes spent, remaining, percentage and overspend for a budget period
//! from a full scan of the ledger. Nothing is counted incrementally, so edits
//! and deletions are reflected on the next computation and repeated calls
//! over an unchanged ledger return identical results.
//!
//! With a carrying rollover policy, period N depends on period N-1. The chain
//! is walked forward from the latest usage the caller already knows (see
//! [`UsageLookup`]) or from the first period, memoizing each link.

use crate::error::EngineResult;
use crate::ledger::{fetch_with_retry, LedgerAccessor, LedgerQuery, RetryPolicy};
use crate::models::{Budget, BudgetUsage, BudgetUsageReport, CategoryBudget, CategoryId, Money, Period};
use crate::services::period::PeriodResolver;
use crate::services::rollover::carry_forward;

/// Source of previously computed usage for a budget line
///
/// A line is the whole-budget aggregate (`category_id == None`) or one
/// category allocation.
pub trait UsageLookup {
    fn lookup(&self, budget: &Budget, category_id: Option<CategoryId>, index: u64) -> Option<BudgetUsage>;
}

/// Lookup that knows nothing; every chain starts at the first period
pub struct NoLookup;

impl UsageLookup for NoLookup {
    fn lookup(&self, _: &Budget, _: Option<CategoryId>, _: u64) -> Option<BudgetUsage> {
        None
    }
}

/// Result of a usage computation
#[derive(Debug, Clone)]
pub struct UsageComputation {
    pub report: BudgetUsageReport,
    /// Every usage computed along the way, including chain predecessors
    pub computed: Vec<BudgetUsage>,
}

/// Service computing budget usage from ledger data
pub struct BudgetAggregator<'a, L: LedgerAccessor + ?Sized> {
    ledger: &'a L,
    retry: RetryPolicy,
}

impl<'a, L: LedgerAccessor + ?Sized> BudgetAggregator<'a, L> {
    /// Create a new aggregator over a ledger
    pub fn new(ledger: &'a L, retry: RetryPolicy) -> Self {
        Self { ledger, retry }
    }

    /// Compute usage for a period with no prior knowledge
    pub fn compute_usage(&self, budget: &Budget, period: &Period) -> EngineResult<BudgetUsageReport> {
        self.compute_with(budget, period, &NoLookup)
            .map(|computation| computation.report)
    }

    /// Compute usage for a period, reusing chain links from `lookup`
    pub fn compute_with(
        &self,
        budget: &Budget,
        period: &Period,
        lookup: &dyn UsageLookup,
    ) -> EngineResult<UsageComputation> {
        let mut computed = Vec::new();

        let total = self.line_usage(budget, None, period, lookup, &mut computed)?;

        let mut categories = Vec::new();
        for allocation in budget.active_allocations() {
            let usage = self.line_usage(budget, Some(allocation), period, lookup, &mut computed)?;
            categories.push(usage);
        }

        Ok(UsageComputation {
            report: BudgetUsageReport { total, categories },
            computed,
        })
    }

    /// Usage of one line in the target period, resolving its rollover chain
    fn line_usage(
        &self,
        budget: &Budget,
        allocation: Option<&CategoryBudget>,
        target: &Period,
        lookup: &dyn UsageLookup,
        computed: &mut Vec<BudgetUsage>,
    ) -> EngineResult<BudgetUsage> {
        let category_id = allocation.map(|a| a.category_id);

        if !budget.rollover.carries() || target.is_first() {
            let usage = self.scan(budget, allocation, target, Money::zero())?;
            computed.push(usage.clone());
            return Ok(usage);
        }

        // Latest known predecessor, if any
        let mut prior = None;
        let mut next_index = 0;
        for index in (0..target.sequence_index).rev() {
            if let Some(known) = lookup.lookup(budget, category_id, index) {
                prior = Some(known);
                next_index = index + 1;
                break;
            }
        }

        if next_index < target.sequence_index {
            tracing::debug!(
                budget = %budget.id,
                category = ?category_id,
                from = next_index,
                to = target.sequence_index,
                "walking rollover chain"
            );
        }

        for index in next_index..=target.sequence_index {
            let period = if index == target.sequence_index {
                *target
            } else {
                PeriodResolver::period_at(budget, index)?
            };
            let carried = prior
                .as_ref()
                .map(|p| carry_forward(budget.rollover, p))
                .unwrap_or_else(Money::zero);
            let usage = self.scan(budget, allocation, &period, carried)?;
            computed.push(usage.clone());
            prior = Some(usage);
        }

        // The loop runs at least once because next_index <= target index
        Ok(prior.unwrap_or_else(|| {
            BudgetUsage::new(budget.id, category_id, *target, budget.amount, Money::zero(), Money::zero(), 0)
        }))
    }

    /// Full re-scan of one line in one period
    fn scan(
        &self,
        budget: &Budget,
        allocation: Option<&CategoryBudget>,
        period: &Period,
        carried: Money,
    ) -> EngineResult<BudgetUsage> {
        let mut query =
            LedgerQuery::book(budget.account_book_id, period.range()).member(budget.member_filter());
        if let Some(allocation) = allocation {
            query = query.category(allocation.category_id);
        }

        let transactions = fetch_with_retry(self.ledger, &query, &self.retry)?;

        let mut spent = Money::zero();
        let mut count = 0;
        for txn in transactions.iter().filter(|t| t.is_expense()) {
            spent += txn.spend();
            count += 1;
        }

        let amount = allocation.map_or(budget.amount, |a| a.amount);
        Ok(BudgetUsage::new(
            budget.id,
            allocation.map(|a| a.category_id),
            *period,
            amount,
            carried,
            spent,
            count,
        ))
    }
}
