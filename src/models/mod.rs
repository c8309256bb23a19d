//! Core data models for the budget engine
//!
//! Budget definitions, ledger transactions, derived periods and the computed
//! usage and statistics views.

pub mod budget;
pub mod ids;
pub mod money;
pub mod period;
pub mod statistics;
pub mod transaction;
pub mod usage;

pub use budget::{Budget, BudgetScope, CategoryBudget, RolloverPolicy};
pub use ids::{AccountBookId, BudgetId, CategoryId, MemberId, TransactionId};
pub use money::Money;
pub use period::{Cycle, CycleLength, DateRange, Period};
pub use statistics::{
    BreakdownEntry, GroupBy, GroupKey, StatisticsOverview, StatisticsSnapshot, StatisticsTotals,
};
pub use transaction::{Flow, Transaction};
pub use usage::{BudgetUsage, BudgetUsageReport};
