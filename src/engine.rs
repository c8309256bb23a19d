//! Budget engine facade
//!
//! Ties the aggregator, the statistics reducer and the consistency layer
//! together. Results are computed lazily on request, cached per budget line
//! and per statistics window, and invalidated by the host's mutation pathway
//! after a ledger write commits.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::clock::{Clock, SystemClock};
use crate::consistency::{
    ConsistencyGuard, Epoch, StatisticsCache, StatisticsKey, UsageCache, UsageKey,
    DEFAULT_CACHE_CAPACITY,
};
use crate::error::EngineResult;
use crate::ledger::{LedgerAccessor, LedgerChange, RetryPolicy};
use crate::models::{
    AccountBookId, Budget, BudgetId, BudgetUsageReport, CategoryId, DateRange, GroupBy, Period,
    StatisticsOverview, StatisticsSnapshot,
};
use crate::services::aggregator::{BudgetAggregator, NoLookup, UsageLookup};
use crate::services::period::PeriodResolver;
use crate::services::statistics::StatisticsReducer;

/// Which period of a budget to compute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodRef {
    /// The period containing today's date
    Current,
    /// The period containing a date
    Containing(NaiveDate),
    /// The period with a sequence index
    Index(u64),
}

/// Tunables for a [`BudgetEngine`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub retry: RetryPolicy,
    pub cache_enabled: bool,
    /// Keys held by each of the usage and statistics caches
    pub cache_capacity: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            cache_enabled: true,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// Engine computing budget usage and statistics over a ledger
///
/// All operations take `&self`; share the engine between threads with `Arc`.
pub struct BudgetEngine<L: LedgerAccessor> {
    ledger: L,
    clock: Arc<dyn Clock>,
    options: EngineOptions,
    usage_cache: UsageCache,
    statistics_cache: StatisticsCache,
    usage_guard: ConsistencyGuard<(BudgetId, u64)>,
    statistics_guard: ConsistencyGuard<StatisticsKey>,
    epoch: Epoch,
}

impl<L: LedgerAccessor> BudgetEngine<L> {
    pub fn new(ledger: L) -> Self {
        Self::with_options(ledger, EngineOptions::default())
    }

    pub fn with_options(ledger: L, options: EngineOptions) -> Self {
        Self {
            ledger,
            clock: Arc::new(SystemClock),
            options,
            usage_cache: UsageCache::with_capacity(options.cache_capacity),
            statistics_cache: StatisticsCache::with_capacity(options.cache_capacity),
            usage_guard: ConsistencyGuard::new(),
            statistics_guard: ConsistencyGuard::new(),
            epoch: Epoch::new(),
        }
    }

    /// Replace the clock used to resolve [`PeriodRef::Current`]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Resolve a period reference against a budget's cycle
    pub fn resolve(&self, budget: &Budget, period: PeriodRef) -> EngineResult<Period> {
        match period {
            PeriodRef::Current => PeriodResolver::resolve_period(budget, self.clock.today()),
            PeriodRef::Containing(date) => PeriodResolver::resolve_period(budget, date),
            PeriodRef::Index(index) => PeriodResolver::period_at(budget, index),
        }
    }

    /// Compute usage of a budget and its category allocations in a period
    pub fn compute_usage(&self, budget: &Budget, period: PeriodRef) -> EngineResult<BudgetUsageReport> {
        budget.validate()?;
        let period = self.resolve(budget, period)?;

        if let Some(report) = self.cached_report(budget, &period) {
            tracing::debug!(budget = %budget.id, period = %period, "usage cache hit");
            return Ok(report);
        }

        self.usage_guard
            .with_computation((budget.id, period.sequence_index), || {
                // A computation we waited on may have just published
                if let Some(report) = self.cached_report(budget, &period) {
                    return Ok(report);
                }

                tracing::debug!(budget = %budget.id, period = %period, "computing usage");
                let seen = self.epoch.current();
                let aggregator = BudgetAggregator::new(&self.ledger, self.options.retry);
                let lookup: &dyn UsageLookup = if self.options.cache_enabled {
                    &self.usage_cache
                } else {
                    &NoLookup
                };
                let computation = aggregator.compute_with(budget, &period, lookup)?;

                if self.options.cache_enabled {
                    let published = self.epoch.publish_if_current(seen, || {
                        self.usage_cache.publish(budget, &computation.computed)
                    });
                    if !published {
                        tracing::debug!(budget = %budget.id, "ledger changed during computation, result not cached");
                    }
                }
                Ok(computation.report)
            })
    }

    /// Compute a statistics snapshot of an account book
    pub fn compute_statistics(
        &self,
        account_book_id: AccountBookId,
        window: DateRange,
        group_by: GroupBy,
    ) -> EngineResult<StatisticsSnapshot> {
        let key = StatisticsKey {
            account_book_id,
            window,
            group_by,
        };
        if self.options.cache_enabled {
            if let Some(snapshot) = self.statistics_cache.get(&key) {
                tracing::debug!(book = %account_book_id, window = %window, "statistics cache hit");
                return Ok(snapshot);
            }
        }

        self.statistics_guard.with_computation(key, || {
            if self.options.cache_enabled {
                if let Some(snapshot) = self.statistics_cache.get(&key) {
                    return Ok(snapshot);
                }
            }

            let seen = self.epoch.current();
            let reducer = StatisticsReducer::new(&self.ledger, self.options.retry);
            let snapshot = reducer.compute_statistics(account_book_id, window, group_by)?;

            if self.options.cache_enabled {
                self.epoch
                    .publish_if_current(seen, || self.statistics_cache.publish(&snapshot));
            }
            Ok(snapshot)
        })
    }

    /// Compute every breakdown of a window from one ledger fetch
    ///
    /// Holds the guard of all three statistics keys, taken in a fixed order,
    /// so it never runs alongside `compute_statistics` for any of them.
    pub fn compute_overview(
        &self,
        account_book_id: AccountBookId,
        window: DateRange,
    ) -> EngineResult<StatisticsOverview> {
        let key = |group_by| StatisticsKey {
            account_book_id,
            window,
            group_by,
        };
        let guard = &self.statistics_guard;

        guard.with_computation(key(GroupBy::Category), || {
            guard.with_computation(key(GroupBy::Day), || {
                guard.with_computation(key(GroupBy::Member), || {
                    if let Some(overview) = self.cached_overview(account_book_id, window) {
                        tracing::debug!(book = %account_book_id, window = %window, "overview cache hit");
                        return Ok(overview);
                    }

                    let seen = self.epoch.current();
                    let reducer = StatisticsReducer::new(&self.ledger, self.options.retry);
                    let overview = reducer.compute_overview(account_book_id, window)?;

                    if self.options.cache_enabled {
                        self.epoch.publish_if_current(seen, || {
                            self.statistics_cache.publish(&overview.by_category);
                            self.statistics_cache.publish(&overview.by_day);
                            self.statistics_cache.publish(&overview.by_member);
                        });
                    }
                    Ok(overview)
                })
            })
        })
    }

    /// Mark results depending on a slice of the ledger as stale
    ///
    /// Call after a transaction mutation commits. `categories` lists every
    /// category the mutation touched, before and after an edit. Aggregate
    /// usage is always invalidated for overlapping periods.
    pub fn invalidate(&self, account_book_id: AccountBookId, range: DateRange, categories: &[CategoryId]) {
        let (usage, statistics) = self.epoch.advance(|| {
            (
                self.usage_cache.invalidate(account_book_id, &range, categories),
                self.statistics_cache.invalidate(account_book_id, &range),
            )
        });
        tracing::info!(
            book = %account_book_id,
            range = %range,
            categories = categories.len(),
            usage,
            statistics,
            "invalidated cached results"
        );
    }

    /// Invalidate what a [`LedgerChange`] touched
    pub fn apply_change(&self, change: &LedgerChange) {
        self.invalidate(change.account_book_id, change.range, &change.categories);
    }

    /// Drop all cached usage of a budget after its definition changed
    pub fn invalidate_budget(&self, budget_id: BudgetId) {
        let removed = self
            .epoch
            .advance(|| self.usage_cache.remove_budget(budget_id));
        tracing::info!(budget = %budget_id, removed, "invalidated budget");
    }

    /// Last successfully computed usage of a period, even if since invalidated
    ///
    /// Returns None unless the aggregate and every active category line have
    /// been computed before.
    pub fn last_known_usage(&self, budget: &Budget, period: PeriodRef) -> EngineResult<Option<BudgetUsageReport>> {
        let period = self.resolve(budget, period)?;
        let key = |category_id| UsageKey {
            budget_id: budget.id,
            category_id,
            sequence_index: period.sequence_index,
        };

        let Some(total) = self.usage_cache.last_known(&key(None)) else {
            return Ok(None);
        };
        let categories = budget
            .active_allocations()
            .map(|allocation| self.usage_cache.last_known(&key(Some(allocation.category_id))))
            .collect::<Option<Vec<_>>>();

        Ok(categories.map(|categories| BudgetUsageReport { total, categories }))
    }

    /// Last computed statistics snapshot, even if since invalidated
    pub fn last_known_statistics(
        &self,
        account_book_id: AccountBookId,
        window: DateRange,
        group_by: GroupBy,
    ) -> Option<StatisticsSnapshot> {
        self.statistics_cache.last_known(&StatisticsKey {
            account_book_id,
            window,
            group_by,
        })
    }

    /// Drop every cached result
    pub fn clear_cache(&self) {
        self.epoch.advance(|| {
            self.usage_cache.clear();
            self.statistics_cache.clear();
        });
    }

    fn cached_overview(&self, account_book_id: AccountBookId, window: DateRange) -> Option<StatisticsOverview> {
        if !self.options.cache_enabled {
            return None;
        }
        let get = |group_by| {
            self.statistics_cache.get(&StatisticsKey {
                account_book_id,
                window,
                group_by,
            })
        };
        Some(StatisticsOverview {
            by_category: get(GroupBy::Category)?,
            by_day: get(GroupBy::Day)?,
            by_member: get(GroupBy::Member)?,
        })
    }

    fn cached_report(&self, budget: &Budget, period: &Period) -> Option<BudgetUsageReport> {
        if !self.options.cache_enabled {
            return None;
        }
        let index = period.sequence_index;
        let total = self.usage_cache.lookup(budget, None, index)?;
        let categories = budget
            .active_allocations()
            .map(|allocation| self.usage_cache.lookup(budget, Some(allocation.category_id), index))
            .collect::<Option<Vec<_>>>()?;
        Some(BudgetUsageReport { total, categories })
    }
}
