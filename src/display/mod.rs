//! Display formatting for terminal output
//!
//! Formats budgets, usage reports and statistics snapshots as plain text
//! tables.

pub mod budget;
pub mod report;
pub mod statistics;
pub mod usage;

pub use budget::format_budget_list;
pub use statistics::format_statistics;
pub use usage::format_usage_report;
