use budget_engine::engine::{BudgetEngine, EngineOptions, PeriodRef};
use budget_engine::ledger::{MemoryLedger, RetryPolicy};
use budget_engine::models::{
    AccountBookId, Budget, CategoryId, Cycle, CycleLength, DateRange, GroupBy, Money,
    RolloverPolicy, Transaction,
};
use budget_engine::services::PeriodResolver;
use chrono::{Days, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use proptest::test_runner::Config;

fn anchor() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
}

/// (days after the anchor, cents, income?)
fn entries() -> impl Strategy<Value = Vec<(u64, i64, bool)>> {
    prop::collection::vec((0_u64..150, 1_i64..200_000, prop::bool::weighted(0.2)), 0..40)
}

fn policy() -> impl Strategy<Value = RolloverPolicy> {
    prop_oneof![
        Just(RolloverPolicy::None),
        Just(RolloverPolicy::CarryUnspent),
        Just(RolloverPolicy::CarryDeficit),
    ]
}

fn cycle_length() -> impl Strategy<Value = CycleLength> {
    prop_oneof![
        Just(CycleLength::Weekly),
        Just(CycleLength::BiWeekly),
        Just(CycleLength::Monthly),
        Just(CycleLength::Quarterly),
        (1_u32..45).prop_map(CycleLength::Days),
        (1_u32..5).prop_map(CycleLength::Months),
    ]
}

fn build_ledger(book: AccountBookId, entries: &[(u64, i64, bool)], category: Option<CategoryId>) -> MemoryLedger {
    MemoryLedger::from_transactions(entries.iter().map(|&(offset, cents, income)| {
        let date = anchor() + Days::new(offset);
        let timestamp = Utc.from_utc_datetime(&date.and_hms_opt(9, 0, 0).unwrap());
        let amount = if income { cents } else { -cents };
        let txn = Transaction::new(book, timestamp, Money::from_cents(amount));
        match category {
            Some(category) => txn.with_category(category),
            None => txn,
        }
    }))
    .unwrap()
}

fn uncached() -> EngineOptions {
    EngineOptions {
        retry: RetryPolicy::no_retry(),
        cache_enabled: false,
        ..EngineOptions::default()
    }
}

proptest! {
    #![proptest_config(Config::with_cases(64))]

    #[test]
    fn usage_fields_are_consistent(
        entries in entries(),
        amount in 0_i64..500_000,
        policy in policy(),
        index in 0_u64..5,
    ) {
        let book = AccountBookId::new();
        let budget = Budget::new("Prop", book, Money::from_cents(amount), Cycle::monthly(anchor()))
            .with_rollover(policy);
        let engine = BudgetEngine::with_options(build_ledger(book, &entries, None), uncached());

        let usage = engine.compute_usage(&budget, PeriodRef::Index(index)).unwrap().total;
        let effective = usage.amount + usage.carried_amount;

        prop_assert_eq!(usage.remaining, effective - usage.spent);
        prop_assert_eq!(usage.is_overspent, usage.spent > effective);
        prop_assert!(!usage.spent.is_negative());
        if effective.is_positive() {
            prop_assert_eq!(usage.percentage, usage.spent.percent_of(effective));
        } else {
            prop_assert_eq!(usage.percentage, 0.0);
        }
        match policy {
            RolloverPolicy::None => prop_assert_eq!(usage.carried_amount, Money::zero()),
            RolloverPolicy::CarryUnspent => prop_assert!(!usage.carried_amount.is_negative()),
            RolloverPolicy::CarryDeficit => {}
        }
        if index == 0 {
            prop_assert_eq!(usage.carried_amount, Money::zero());
        }
    }

    #[test]
    fn recomputation_is_idempotent(entries in entries(), policy in policy(), index in 0_u64..5) {
        let book = AccountBookId::new();
        let budget = Budget::new("Prop", book, Money::from_units(1000), Cycle::monthly(anchor()))
            .with_rollover(policy);

        let cached = BudgetEngine::new(build_ledger(book, &entries, None));
        let first = cached.compute_usage(&budget, PeriodRef::Index(index)).unwrap();
        let second = cached.compute_usage(&budget, PeriodRef::Index(index)).unwrap();
        prop_assert_eq!(&first, &second);

        let fresh = BudgetEngine::with_options(build_ledger(book, &entries, None), uncached());
        prop_assert_eq!(first, fresh.compute_usage(&budget, PeriodRef::Index(index)).unwrap());
    }

    #[test]
    fn an_extra_expense_never_lowers_spent(
        entries in entries(),
        offset in 0_u64..31,
        cents in 1_i64..100_000,
    ) {
        let book = AccountBookId::new();
        let budget = Budget::new("Prop", book, Money::from_units(1000), Cycle::monthly(anchor()));
        let engine = BudgetEngine::new(build_ledger(book, &entries, None));
        let before = engine.compute_usage(&budget, PeriodRef::Index(0)).unwrap().total;

        let date = anchor() + Days::new(offset);
        let timestamp = Utc.from_utc_datetime(&date.and_hms_opt(20, 0, 0).unwrap());
        let change = engine
            .ledger()
            .insert(Transaction::new(book, timestamp, Money::from_cents(-cents)))
            .unwrap();
        engine.apply_change(&change);

        let after = engine.compute_usage(&budget, PeriodRef::Index(0)).unwrap().total;
        prop_assert_eq!(after.spent, before.spent + Money::from_cents(cents));
        prop_assert!(after.percentage >= before.percentage);
        prop_assert!(after.remaining < before.remaining);
    }

    #[test]
    fn category_lines_match_category_filtered_ledger(entries in entries(), index in 0_u64..4) {
        let book = AccountBookId::new();
        let category = CategoryId::new();
        let mut budget = Budget::new("Prop", book, Money::from_units(2000), Cycle::monthly(anchor()))
            .with_rollover(RolloverPolicy::CarryDeficit);
        budget.allocate(category, Money::from_units(500)).unwrap();

        let engine = BudgetEngine::new(build_ledger(book, &entries, Some(category)));
        let report = engine.compute_usage(&budget, PeriodRef::Index(index)).unwrap();
        let line = report.category(category).unwrap();

        // Every transaction is in the category, so both lines see the same spend
        prop_assert_eq!(line.spent, report.total.spent);
        prop_assert_eq!(line.remaining, line.amount + line.carried_amount - line.spent);
    }

    #[test]
    fn periods_tile_the_timeline(length in cycle_length(), day in 1_u32..29, offset in 0_u64..800) {
        let anchor = NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        let budget = Budget::new("Prop", AccountBookId::new(), Money::from_units(1), Cycle::new(anchor, length));
        let date = anchor + Days::new(offset);

        let period = PeriodResolver::resolve_period(&budget, date).unwrap();
        prop_assert!(period.contains(date));
        prop_assert!(period.start < period.end);

        if let Some(previous) = PeriodResolver::previous(&budget, &period).unwrap() {
            prop_assert_eq!(previous.end, period.start);
        } else {
            prop_assert_eq!(period.start, anchor);
        }
        let next = PeriodResolver::period_at(&budget, period.sequence_index + 1).unwrap();
        prop_assert_eq!(next.start, period.end);
    }

    #[test]
    fn breakdowns_sum_to_totals(entries in entries()) {
        let book = AccountBookId::new();
        let engine = BudgetEngine::new(build_ledger(book, &entries, None));
        let window = DateRange::new(anchor(), anchor() + Days::new(150));

        for group_by in [GroupBy::Category, GroupBy::Day, GroupBy::Member] {
            let snapshot = engine.compute_statistics(book, window, group_by).unwrap();
            let expense: Money = snapshot.expense.iter().map(|row| row.amount).sum();
            let income: Money = snapshot.income.iter().map(|row| row.amount).sum();
            let count: usize = snapshot
                .expense
                .iter()
                .chain(snapshot.income.iter())
                .map(|row| row.transaction_count)
                .sum();

            prop_assert_eq!(expense, snapshot.totals.expense);
            prop_assert_eq!(income, snapshot.totals.income);
            prop_assert_eq!(count, snapshot.totals.transaction_count);
            prop_assert_eq!(snapshot.totals.net, income + expense);
            prop_assert_eq!(count, entries.len());
        }
    }
}
