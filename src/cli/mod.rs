//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the engine.

pub mod budget;
pub mod stats;
pub mod usage;

pub use budget::{handle_budget_command, BudgetCommands};
pub use stats::{handle_stats_command, StatsArgs};
pub use usage::{handle_usage_command, UsageArgs};

use chrono::NaiveDate;

use crate::config::settings::Settings;
use crate::engine::BudgetEngine;
use crate::error::{EngineError, EngineResult};
use crate::ledger::MemoryLedger;
use crate::models::Budget;
use crate::storage::{BudgetStore, Storage};

/// Parse a YYYY-MM-DD date argument
pub fn parse_date(value: &str) -> EngineResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        EngineError::Validation(format!("Invalid date '{}', expected YYYY-MM-DD", value))
    })
}

/// Parse an ID argument, mapping failures to a validation error
pub fn parse_id<T: std::str::FromStr>(kind: &str, value: &str) -> EngineResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| EngineError::Validation(format!("Invalid {} ID: {}", kind, value)))
}

/// Look up a budget by ID or name
pub fn find_budget(storage: &Storage, identifier: &str) -> EngineResult<Budget> {
    storage
        .budgets
        .find(identifier)?
        .ok_or_else(|| EngineError::budget_not_found(identifier))
}

/// Engine over the storage's ledger, configured from settings
pub fn build_engine(storage: &Storage, settings: &Settings) -> BudgetEngine<std::sync::Arc<MemoryLedger>> {
    BudgetEngine::with_options(std::sync::Arc::clone(&storage.ledger), settings.engine_options())
}
