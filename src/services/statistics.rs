//! Statistics reducer
//!
//! Reduces an account book's transactions over a window into income and
//! expense breakdowns in one linear pass. Expense rows carry negative
//! amounts; percentages are taken against the same-sign total.

use std::collections::HashMap;

use crate::error::{EngineError, EngineResult};
use crate::ledger::{fetch_with_retry, LedgerAccessor, LedgerQuery, RetryPolicy};
use crate::models::{
    AccountBookId, BreakdownEntry, DateRange, GroupBy, GroupKey, Money, StatisticsOverview,
    StatisticsSnapshot, StatisticsTotals, Transaction,
};

/// Service computing statistics snapshots from ledger data
pub struct StatisticsReducer<'a, L: LedgerAccessor + ?Sized> {
    ledger: &'a L,
    retry: RetryPolicy,
}

impl<'a, L: LedgerAccessor + ?Sized> StatisticsReducer<'a, L> {
    pub fn new(ledger: &'a L, retry: RetryPolicy) -> Self {
        Self { ledger, retry }
    }

    /// Compute a snapshot of `[window.start, window.end)` grouped one way
    pub fn compute_statistics(
        &self,
        account_book_id: AccountBookId,
        window: DateRange,
        group_by: GroupBy,
    ) -> EngineResult<StatisticsSnapshot> {
        validate_window(&window)?;
        if window.is_empty() {
            return Ok(StatisticsSnapshot::empty(account_book_id, window, group_by));
        }

        let transactions = self.fetch(account_book_id, window)?;
        Ok(reduce(account_book_id, window, group_by, &transactions))
    }

    /// Compute all three breakdowns from a single fetch
    pub fn compute_overview(
        &self,
        account_book_id: AccountBookId,
        window: DateRange,
    ) -> EngineResult<StatisticsOverview> {
        validate_window(&window)?;
        let transactions = if window.is_empty() {
            Vec::new()
        } else {
            self.fetch(account_book_id, window)?
        };

        Ok(StatisticsOverview {
            by_category: reduce(account_book_id, window, GroupBy::Category, &transactions),
            by_day: reduce(account_book_id, window, GroupBy::Day, &transactions),
            by_member: reduce(account_book_id, window, GroupBy::Member, &transactions),
        })
    }

    fn fetch(&self, account_book_id: AccountBookId, window: DateRange) -> EngineResult<Vec<Transaction>> {
        let query = LedgerQuery::book(account_book_id, window);
        let transactions = fetch_with_retry(self.ledger, &query, &self.retry)?;
        tracing::debug!(
            book = %account_book_id,
            window = %window,
            count = transactions.len(),
            "reducing statistics"
        );
        Ok(transactions)
    }
}

fn validate_window(window: &DateRange) -> EngineResult<()> {
    if window.start > window.end {
        return Err(EngineError::Validation(format!(
            "Statistics window starts after it ends: {} > {}",
            window.start, window.end
        )));
    }
    Ok(())
}

fn group_key(txn: &Transaction, group_by: GroupBy) -> GroupKey {
    match group_by {
        GroupBy::Category => GroupKey::Category(txn.category_id),
        GroupBy::Day => GroupKey::Day(txn.date()),
        GroupBy::Member => GroupKey::Member(txn.member_id),
    }
}

/// Rows in first-seen order
#[derive(Default)]
struct Groups {
    index: HashMap<GroupKey, usize>,
    rows: Vec<(GroupKey, Money, usize)>,
}

impl Groups {
    fn add(&mut self, key: GroupKey, amount: Money) {
        let slot = *self.index.entry(key).or_insert_with(|| {
            self.rows.push((key, Money::zero(), 0));
            self.rows.len() - 1
        });
        let row = &mut self.rows[slot];
        row.1 += amount;
        row.2 += 1;
    }

    fn into_entries(self, total: Money, group_by: GroupBy) -> Vec<BreakdownEntry> {
        let mut entries: Vec<BreakdownEntry> = self
            .rows
            .into_iter()
            .map(|(key, amount, transaction_count)| BreakdownEntry {
                key,
                amount,
                transaction_count,
                percentage: amount.abs().percent_of(total.abs()),
            })
            .collect();

        // Stable sorts keep first-seen order among ties
        match group_by {
            GroupBy::Day => entries.sort_by_key(|entry| match entry.key {
                GroupKey::Day(date) => Some(date),
                _ => None,
            }),
            GroupBy::Category | GroupBy::Member => {
                entries.sort_by(|a, b| b.amount.abs().cmp(&a.amount.abs()))
            }
        }
        entries
    }
}

/// Reduce fetched transactions into a snapshot
///
/// Transactions dated outside `window` are ignored.
pub fn reduce(
    account_book_id: AccountBookId,
    window: DateRange,
    group_by: GroupBy,
    transactions: &[Transaction],
) -> StatisticsSnapshot {
    let mut totals = StatisticsTotals::default();
    let mut income = Groups::default();
    let mut expense = Groups::default();

    for txn in transactions.iter().filter(|t| window.contains(t.date())) {
        let key = group_key(txn, group_by);
        if txn.is_expense() {
            let signed = -txn.spend();
            totals.expense += signed;
            expense.add(key, signed);
        } else {
            totals.income += txn.amount;
            income.add(key, txn.amount);
        }
        totals.transaction_count += 1;
    }
    totals.net = totals.income + totals.expense;

    StatisticsSnapshot {
        account_book_id,
        window,
        group_by,
        totals,
        income: income.into_entries(totals.income, group_by),
        expense: expense.into_entries(totals.expense, group_by),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryLedger;
    use crate::models::{CategoryId, MemberId};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn txn(book: AccountBookId, day: u32, units: i64) -> Transaction {
        Transaction::new(
            book,
            Utc.with_ymd_and_hms(2025, 3, day, 9, 30, 0).unwrap(),
            Money::from_units(units),
        )
    }

    fn march() -> DateRange {
        DateRange::new(date(2025, 3, 1), date(2025, 4, 1))
    }

    #[test]
    fn test_category_breakdown() {
        let book = AccountBookId::new();
        let food = CategoryId::new();
        let rent = CategoryId::new();
        let ledger = MemoryLedger::from_transactions(vec![
            txn(book, 2, -50).with_category(food),
            txn(book, 3, -150).with_category(rent),
            txn(book, 4, 2000),
        ])
        .unwrap();

        let reducer = StatisticsReducer::new(&ledger, RetryPolicy::no_retry());
        let snapshot = reducer
            .compute_statistics(book, march(), GroupBy::Category)
            .unwrap();

        assert_eq!(snapshot.totals.income, Money::from_units(2000));
        assert_eq!(snapshot.totals.expense, Money::from_units(-200));
        assert_eq!(snapshot.totals.net, Money::from_units(1800));
        assert_eq!(snapshot.totals.transaction_count, 3);

        assert_eq!(snapshot.expense[0].key, GroupKey::Category(Some(rent)));
        assert_eq!(snapshot.expense[0].percentage, 75.0);
        assert_eq!(snapshot.expense[1].key, GroupKey::Category(Some(food)));
        assert_eq!(snapshot.expense[1].amount, Money::from_units(-50));
        assert_eq!(snapshot.expense[1].percentage, 25.0);

        assert_eq!(snapshot.income.len(), 1);
        assert_eq!(snapshot.income[0].key, GroupKey::Category(None));
        assert_eq!(snapshot.income[0].percentage, 100.0);
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let book = AccountBookId::new();
        let first = CategoryId::new();
        let second = CategoryId::new();
        let txns = vec![
            txn(book, 2, -10).with_category(first),
            txn(book, 3, -10).with_category(second),
        ];
        let snapshot = reduce(book, march(), GroupBy::Category, &txns);
        assert_eq!(snapshot.expense[0].key, GroupKey::Category(Some(first)));
        assert_eq!(snapshot.expense[1].key, GroupKey::Category(Some(second)));
    }

    #[test]
    fn test_daily_breakdown_is_chronological() {
        let book = AccountBookId::new();
        let txns = vec![
            txn(book, 20, -5),
            txn(book, 2, -500),
            txn(book, 20, -15),
        ];
        let snapshot = reduce(book, march(), GroupBy::Day, &txns);
        assert_eq!(snapshot.expense.len(), 2);
        assert_eq!(snapshot.expense[0].key, GroupKey::Day(date(2025, 3, 2)));
        assert_eq!(snapshot.expense[1].amount, Money::from_units(-20));
        assert_eq!(snapshot.expense[1].transaction_count, 2);
    }

    #[test]
    fn test_member_breakdown() {
        let book = AccountBookId::new();
        let alice = MemberId::new();
        let txns = vec![
            txn(book, 2, -30).with_member(alice),
            txn(book, 3, -10),
        ];
        let snapshot = reduce(book, march(), GroupBy::Member, &txns);
        assert_eq!(snapshot.expense[0].key, GroupKey::Member(Some(alice)));
        assert_eq!(snapshot.expense[1].key, GroupKey::Member(None));
        assert_eq!(snapshot.expense[1].key.to_string(), "Unassigned");
    }

    #[test]
    fn test_flagged_expense_counts_as_expense() {
        let book = AccountBookId::new();
        let mut refund_like = txn(book, 5, 40);
        refund_like.flagged_expense = true;
        let snapshot = reduce(book, march(), GroupBy::Category, &[refund_like]);
        assert_eq!(snapshot.totals.expense, Money::from_units(-40));
        assert_eq!(snapshot.totals.income, Money::zero());
    }

    #[test]
    fn test_empty_window() {
        let ledger = MemoryLedger::new();
        let reducer = StatisticsReducer::new(&ledger, RetryPolicy::no_retry());
        let day = date(2025, 3, 1);
        let snapshot = reducer
            .compute_statistics(AccountBookId::new(), DateRange::new(day, day), GroupBy::Day)
            .unwrap();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.totals, StatisticsTotals::default());
    }

    #[test]
    fn test_inverted_window_is_rejected() {
        let ledger = MemoryLedger::new();
        let reducer = StatisticsReducer::new(&ledger, RetryPolicy::no_retry());
        let err = reducer
            .compute_statistics(
                AccountBookId::new(),
                DateRange::new(date(2025, 3, 2), date(2025, 3, 1)),
                GroupBy::Category,
            )
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_overview_shares_totals() {
        let book = AccountBookId::new();
        let ledger =
            MemoryLedger::from_transactions(vec![txn(book, 2, -50), txn(book, 9, 75)]).unwrap();
        let reducer = StatisticsReducer::new(&ledger, RetryPolicy::no_retry());
        let overview = reducer.compute_overview(book, march()).unwrap();
        assert_eq!(overview.by_day.totals, overview.by_member.totals);
        assert_eq!(overview.totals().net, Money::from_units(25));
        assert_eq!(overview.by_day.income.len(), 1);
    }
}
