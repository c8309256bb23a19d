//! budget-engine - budget tracking and statistics aggregation
//!
//! This library turns a household ledger into live budget consumption
//! (spent, remaining, percentage, overspend) per budget and per category
//! across repeating periods, and into income and expense breakdowns by
//! category, day and family member.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `models`: Budgets, transactions, periods and the computed views
//! - `ledger`: Read access to the host's transaction store
//! - `services`: Period arithmetic, usage aggregation, rollover and statistics
//! - `consistency`: Per-key computation guard and result caches
//! - `engine`: The facade combining the above
//! - `config`, `storage`, `display`, `cli`: The file-backed command line tool
//!
//! # Example
//!
//! ```
//! use budget_engine::engine::{BudgetEngine, PeriodRef};
//! use budget_engine::ledger::MemoryLedger;
//! use budget_engine::models::{AccountBookId, Budget, Cycle, Money, Transaction};
//! use chrono::{NaiveDate, TimeZone, Utc};
//!
//! let book = AccountBookId::new();
//! let budget = Budget::new(
//!     "Groceries",
//!     book,
//!     Money::from_units(400),
//!     Cycle::monthly(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()),
//! );
//!
//! let engine = BudgetEngine::new(MemoryLedger::new());
//! let spent = Transaction::new(
//!     book,
//!     Utc.with_ymd_and_hms(2025, 1, 12, 18, 0, 0).unwrap(),
//!     Money::from_units(-100),
//! );
//! let change = engine.ledger().insert(spent).unwrap();
//! engine.apply_change(&change);
//!
//! let date = NaiveDate::from_ymd_opt(2025, 1, 20).unwrap();
//! let report = engine.compute_usage(&budget, PeriodRef::Containing(date)).unwrap();
//! assert_eq!(report.total.remaining, Money::from_units(300));
//! assert_eq!(report.total.percentage, 25.0);
//! ```

pub mod cli;
pub mod clock;
pub mod config;
pub mod consistency;
pub mod display;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod models;
pub mod services;
pub mod storage;

pub use engine::{BudgetEngine, EngineOptions, PeriodRef};
pub use error::{EngineError, EngineResult};
