//! Usage and statistics caches
//!
//! Entries are marked stale on invalidation instead of being removed, so the
//! last value that was computed successfully stays readable. Each cache holds
//! at most `capacity` keys; publishing a new key past that evicts stale
//! entries first, then the least recently published.

use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::models::{
    AccountBookId, Budget, BudgetId, BudgetUsage, CategoryId, DateRange, GroupBy,
    StatisticsSnapshot,
};
use crate::services::aggregator::UsageLookup;

/// Keys held per cache unless configured otherwise
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Evict entries until one more key fits
///
/// `rank` orders eviction candidates: lowest first.
fn make_room<K, V>(entries: &DashMap<K, V>, capacity: usize, incoming: &K, rank: impl Fn(&V) -> (bool, u64)) -> usize
where
    K: Eq + Hash + Clone,
{
    if entries.contains_key(incoming) {
        return 0;
    }
    let mut evicted = 0;
    while entries.len() >= capacity.max(1) {
        let victim = entries
            .iter()
            .min_by_key(|entry| rank(entry.value()))
            .map(|entry| entry.key().clone());
        match victim {
            Some(key) => {
                entries.remove(&key);
                evicted += 1;
            }
            None => break,
        }
    }
    evicted
}

/// Cache key for one usage line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UsageKey {
    pub budget_id: BudgetId,
    /// None for the whole-budget aggregate
    pub category_id: Option<CategoryId>,
    pub sequence_index: u64,
}

impl UsageKey {
    pub fn of(usage: &BudgetUsage) -> Self {
        Self {
            budget_id: usage.budget_id,
            category_id: usage.category_id,
            sequence_index: usage.period.sequence_index,
        }
    }
}

#[derive(Debug, Clone)]
struct UsageEntry {
    usage: BudgetUsage,
    account_book_id: AccountBookId,
    /// `updated_at` of the budget the usage was computed from
    revision: DateTime<Utc>,
    carries: bool,
    stale: bool,
    published: u64,
}

impl UsageEntry {
    fn affected_by(&self, account_book_id: AccountBookId, range: &DateRange, categories: &[CategoryId]) -> bool {
        if self.account_book_id != account_book_id {
            return false;
        }
        let category_matches = self
            .usage
            .category_id
            .map_or(true, |id| categories.contains(&id));
        if !category_matches {
            return false;
        }
        let period = self.usage.period.range();
        period.overlaps(range) || (self.carries && period.start >= range.start)
    }
}

/// Computed usage keyed by budget line and period
#[derive(Debug)]
pub struct UsageCache {
    entries: DashMap<UsageKey, UsageEntry>,
    capacity: usize,
    sequence: AtomicU64,
}

impl Default for UsageCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

impl UsageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            capacity,
            sequence: AtomicU64::new(0),
        }
    }

    /// Fresh usage computed from this exact budget revision
    pub fn get(&self, key: &UsageKey, revision: DateTime<Utc>) -> Option<BudgetUsage> {
        self.entries
            .get(key)
            .filter(|entry| !entry.stale && entry.revision == revision)
            .map(|entry| entry.usage.clone())
    }

    /// Last computed usage, stale or not
    pub fn last_known(&self, key: &UsageKey) -> Option<BudgetUsage> {
        self.entries.get(key).map(|entry| entry.usage.clone())
    }

    /// Store usage computed from `budget`
    pub fn publish(&self, budget: &Budget, usages: &[BudgetUsage]) {
        for usage in usages {
            let key = UsageKey::of(usage);
            let evicted = make_room(&self.entries, self.capacity, &key, |entry| {
                (!entry.stale, entry.published)
            });
            if evicted > 0 {
                tracing::debug!(evicted, capacity = self.capacity, "usage cache full");
            }
            self.entries.insert(
                key,
                UsageEntry {
                    usage: usage.clone(),
                    account_book_id: budget.account_book_id,
                    revision: budget.updated_at,
                    carries: budget.rollover.carries(),
                    stale: false,
                    published: self.sequence.fetch_add(1, Ordering::Relaxed),
                },
            );
        }
    }

    /// Mark entries depending on the given ledger slice as stale
    ///
    /// Aggregate lines always depend on every category of their book.
    /// Returns the number of entries newly marked.
    pub fn invalidate(&self, account_book_id: AccountBookId, range: &DateRange, categories: &[CategoryId]) -> usize {
        let mut marked = 0;
        for mut entry in self.entries.iter_mut() {
            if !entry.stale && entry.affected_by(account_book_id, range, categories) {
                entry.stale = true;
                marked += 1;
            }
        }
        marked
    }

    /// Drop every entry of a budget
    pub fn remove_budget(&self, budget_id: BudgetId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.budget_id != budget_id);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl UsageLookup for UsageCache {
    fn lookup(&self, budget: &Budget, category_id: Option<CategoryId>, index: u64) -> Option<BudgetUsage> {
        let key = UsageKey {
            budget_id: budget.id,
            category_id,
            sequence_index: index,
        };
        self.get(&key, budget.updated_at)
    }
}

/// Cache key for one statistics snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatisticsKey {
    pub account_book_id: AccountBookId,
    pub window: DateRange,
    pub group_by: GroupBy,
}

#[derive(Debug, Clone)]
struct StatisticsEntry {
    snapshot: StatisticsSnapshot,
    stale: bool,
    published: u64,
}

/// Computed statistics keyed by book, window and grouping
#[derive(Debug)]
pub struct StatisticsCache {
    entries: DashMap<StatisticsKey, StatisticsEntry>,
    capacity: usize,
    sequence: AtomicU64,
}

impl Default for StatisticsCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

impl StatisticsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            capacity,
            sequence: AtomicU64::new(0),
        }
    }

    pub fn get(&self, key: &StatisticsKey) -> Option<StatisticsSnapshot> {
        self.entries
            .get(key)
            .filter(|entry| !entry.stale)
            .map(|entry| entry.snapshot.clone())
    }

    pub fn last_known(&self, key: &StatisticsKey) -> Option<StatisticsSnapshot> {
        self.entries.get(key).map(|entry| entry.snapshot.clone())
    }

    pub fn publish(&self, snapshot: &StatisticsSnapshot) {
        let key = StatisticsKey {
            account_book_id: snapshot.account_book_id,
            window: snapshot.window,
            group_by: snapshot.group_by,
        };
        let evicted = make_room(&self.entries, self.capacity, &key, |entry| {
            (!entry.stale, entry.published)
        });
        if evicted > 0 {
            tracing::debug!(evicted, capacity = self.capacity, "statistics cache full");
        }
        self.entries.insert(
            key,
            StatisticsEntry {
                snapshot: snapshot.clone(),
                stale: false,
                published: self.sequence.fetch_add(1, Ordering::Relaxed),
            },
        );
    }

    /// Mark snapshots whose window overlaps `range` as stale
    pub fn invalidate(&self, account_book_id: AccountBookId, range: &DateRange) -> usize {
        let mut marked = 0;
        for mut entry in self.entries.iter_mut() {
            let key = *entry.key();
            if !entry.stale && key.account_book_id == account_book_id && key.window.overlaps(range) {
                entry.stale = true;
                marked += 1;
            }
        }
        marked
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}
