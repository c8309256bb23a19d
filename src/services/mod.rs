//! Service layer for the budget engine
//!
//! Pure computations over budget definitions and ledger data: period
//! arithmetic, usage aggregation, rollover and statistics reduction.

pub mod aggregator;
pub mod period;
pub mod rollover;
pub mod statistics;

pub use aggregator::{BudgetAggregator, NoLookup, UsageComputation, UsageLookup};
pub use period::PeriodResolver;
pub use rollover::carry_forward;
pub use statistics::StatisticsReducer;
