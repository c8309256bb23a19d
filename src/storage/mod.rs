//! Storage layer for the budget engine
//!
//! JSON file adapters for budget definitions and the transaction ledger,
//! with atomic writes and automatic directory creation.

pub mod budgets;
pub mod file_io;
pub mod transactions;

pub use budgets::{BudgetRepository, BudgetStore, MemoryBudgetStore};
pub use file_io::{read_json, write_json_atomic};
pub use transactions::{load_ledger, save_ledger};

use std::sync::Arc;

use crate::config::paths::EnginePaths;
use crate::error::EngineResult;
use crate::ledger::MemoryLedger;

/// Main storage coordinator for the file-backed data set
pub struct Storage {
    paths: EnginePaths,
    pub budgets: BudgetRepository,
    pub ledger: Arc<MemoryLedger>,
}

impl Storage {
    /// Create an empty storage rooted at `paths`
    pub fn new(paths: EnginePaths) -> EngineResult<Self> {
        paths.ensure_directories()?;
        Ok(Self {
            budgets: BudgetRepository::new(paths.budgets_file()),
            ledger: Arc::new(MemoryLedger::new()),
            paths,
        })
    }

    pub fn paths(&self) -> &EnginePaths {
        &self.paths
    }

    /// Load budgets and transactions from disk
    pub fn load_all(&mut self) -> EngineResult<()> {
        self.budgets.load()?;
        self.ledger = Arc::new(load_ledger(self.paths.transactions_file())?);
        Ok(())
    }

    /// Save budgets and transactions to disk
    pub fn save_all(&self) -> EngineResult<()> {
        self.budgets.save()?;
        save_ledger(self.paths.transactions_file(), &self.ledger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccountBookId, Budget, Cycle, Money, Transaction};
    use chrono::{NaiveDate, Utc};
    use tempfile::TempDir;

    #[test]
    fn test_round_trip_through_disk() {
        let temp_dir = TempDir::new().unwrap();
        let paths = EnginePaths::with_base_dir(temp_dir.path().to_path_buf());
        let book = AccountBookId::new();

        let storage = Storage::new(paths.clone()).unwrap();
        storage
            .budgets
            .upsert(Budget::new(
                "Household",
                book,
                Money::from_units(800),
                Cycle::monthly(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()),
            ))
            .unwrap();
        storage
            .ledger
            .insert(Transaction::new(book, Utc::now(), Money::from_units(-12)))
            .unwrap();
        storage.save_all().unwrap();

        let mut reloaded = Storage::new(paths).unwrap();
        reloaded.load_all().unwrap();
        assert_eq!(reloaded.budgets.len(), 1);
        assert_eq!(reloaded.ledger.len(), 1);
    }
}
