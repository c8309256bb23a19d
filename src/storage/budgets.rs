//! Budget definition persistence
//!
//! The engine only needs budget definitions by value; where they live is up
//! to the host. [`BudgetStore`] is the seam, with an in-memory store and a
//! JSON file repository provided.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::{EngineError, EngineResult};
use crate::models::{AccountBookId, Budget, BudgetId};

use super::file_io::{read_json, write_json_atomic};

/// Source of budget definitions
pub trait BudgetStore: Send + Sync {
    fn get(&self, id: BudgetId) -> EngineResult<Option<Budget>>;

    /// All budgets ordered by name
    fn list(&self) -> EngineResult<Vec<Budget>>;

    /// Insert or replace a budget after validating it
    fn upsert(&self, budget: Budget) -> EngineResult<()>;

    fn delete(&self, id: BudgetId) -> EngineResult<bool>;

    /// Find a budget by full ID, short display ID or case-insensitive name
    fn find(&self, identifier: &str) -> EngineResult<Option<Budget>> {
        let identifier = identifier.trim();
        if let Ok(id) = identifier.parse::<BudgetId>() {
            if let Some(budget) = self.get(id)? {
                return Ok(Some(budget));
            }
        }
        let wanted = identifier.to_lowercase();
        Ok(self.list()?.into_iter().find(|budget| {
            budget.id.to_string() == wanted || budget.name.to_lowercase() == wanted
        }))
    }

    /// Budgets of one account book that are not retired
    fn active_in_book(&self, account_book_id: AccountBookId) -> EngineResult<Vec<Budget>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|budget| budget.account_book_id == account_book_id && !budget.is_retired())
            .collect())
    }
}

/// Budgets held in memory
#[derive(Debug, Default)]
pub struct MemoryBudgetStore {
    data: RwLock<HashMap<BudgetId, Budget>>,
}

impl MemoryBudgetStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn replace_all(&self, budgets: Vec<Budget>) -> EngineResult<()> {
        let mut data = self.data.write().map_err(|e| {
            EngineError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        data.clear();
        for budget in budgets {
            data.insert(budget.id, budget);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.data.read().map(|data| data.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BudgetStore for MemoryBudgetStore {
    fn get(&self, id: BudgetId) -> EngineResult<Option<Budget>> {
        let data = self.data.read().map_err(|e| {
            EngineError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(data.get(&id).cloned())
    }

    fn list(&self) -> EngineResult<Vec<Budget>> {
        let data = self.data.read().map_err(|e| {
            EngineError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;
        let mut budgets: Vec<_> = data.values().cloned().collect();
        budgets.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(budgets)
    }

    fn upsert(&self, budget: Budget) -> EngineResult<()> {
        budget.validate()?;
        let mut data = self.data.write().map_err(|e| {
            EngineError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        data.insert(budget.id, budget);
        Ok(())
    }

    fn delete(&self, id: BudgetId) -> EngineResult<bool> {
        let mut data = self.data.write().map_err(|e| {
            EngineError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        Ok(data.remove(&id).is_some())
    }
}

/// Serializable budget file structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct BudgetData {
    budgets: Vec<Budget>,
}

/// Budgets persisted to budgets.json
pub struct BudgetRepository {
    path: PathBuf,
    store: MemoryBudgetStore,
}

impl BudgetRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            store: MemoryBudgetStore::new(),
        }
    }

    /// Load budgets from disk, rejecting invalid definitions
    pub fn load(&self) -> EngineResult<()> {
        let file_data: BudgetData = read_json(&self.path)?;
        for budget in &file_data.budgets {
            budget.validate().map_err(|e| {
                EngineError::Storage(format!("Invalid budget {} in {}: {}", budget.id, self.path.display(), e))
            })?;
        }
        tracing::debug!(count = file_data.budgets.len(), path = %self.path.display(), "loaded budgets");
        self.store.replace_all(file_data.budgets)
    }

    /// Save budgets to disk
    pub fn save(&self) -> EngineResult<()> {
        let file_data = BudgetData {
            budgets: self.store.list()?,
        };
        write_json_atomic(&self.path, &file_data)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl BudgetStore for BudgetRepository {
    fn get(&self, id: BudgetId) -> EngineResult<Option<Budget>> {
        self.store.get(id)
    }

    fn list(&self) -> EngineResult<Vec<Budget>> {
        self.store.list()
    }

    fn upsert(&self, budget: Budget) -> EngineResult<()> {
        self.store.upsert(budget)
    }

    fn delete(&self, id: BudgetId) -> EngineResult<bool> {
        self.store.delete(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryId, Cycle, Money};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn budget(name: &str) -> Budget {
        Budget::new(
            name,
            AccountBookId::new(),
            Money::from_units(500),
            Cycle::monthly(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()),
        )
    }

    #[test]
    fn test_upsert_validates() {
        let store = MemoryBudgetStore::new();
        let mut invalid = budget("Broken");
        invalid.amount = Money::from_units(-1);

        assert!(store.upsert(invalid).unwrap_err().is_validation());
        assert!(store.is_empty());
    }

    #[test]
    fn test_find_by_id_or_name() {
        let store = MemoryBudgetStore::new();
        let groceries = budget("Groceries");
        store.upsert(groceries.clone()).unwrap();
        store.upsert(budget("Fuel")).unwrap();

        assert_eq!(store.find("groceries").unwrap().unwrap().id, groceries.id);
        let full_id = groceries.id.as_uuid().to_string();
        assert_eq!(store.find(&full_id).unwrap().unwrap().id, groceries.id);
        assert_eq!(store.find(&groceries.id.to_string()).unwrap().unwrap().id, groceries.id);
        assert!(store.find("Travel").unwrap().is_none());
    }

    #[test]
    fn test_list_sorted_by_name() {
        let store = MemoryBudgetStore::new();
        store.upsert(budget("Zoo")).unwrap();
        store.upsert(budget("Apples")).unwrap();

        let names: Vec<_> = store.list().unwrap().into_iter().map(|b| b.name).collect();
        assert_eq!(names, vec!["Apples", "Zoo"]);
    }

    #[test]
    fn test_active_in_book_skips_retired() {
        let store = MemoryBudgetStore::new();
        let mut retired = budget("Old");
        let book = retired.account_book_id;
        retired.retire();
        let mut current = budget("Current");
        current.account_book_id = book;
        store.upsert(retired).unwrap();
        store.upsert(current.clone()).unwrap();

        let active = store.active_in_book(book).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, current.id);
    }

    #[test]
    fn test_repository_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("budgets.json");

        let mut household = budget("Household");
        household.allocate(CategoryId::new(), Money::from_units(200)).unwrap();

        let repo = BudgetRepository::new(path.clone());
        repo.upsert(household.clone()).unwrap();
        repo.save().unwrap();

        let reloaded = BudgetRepository::new(path);
        reloaded.load().unwrap();
        assert_eq!(reloaded.len(), 1);
        let loaded = reloaded.get(household.id).unwrap().unwrap();
        assert_eq!(loaded.category_budgets, household.category_budgets);
        assert_eq!(loaded.updated_at, household.updated_at);
    }

    #[test]
    fn test_load_rejects_over_allocated_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("budgets.json");

        let mut bad = budget("Bad");
        bad.category_budgets
            .push(crate::models::CategoryBudget::new(CategoryId::new(), Money::from_units(900)));
        write_json_atomic(&path, &BudgetData { budgets: vec![bad] }).unwrap();

        let repo = BudgetRepository::new(path);
        assert!(matches!(repo.load(), Err(EngineError::Storage(_))));
    }

    #[test]
    fn test_delete() {
        let store = MemoryBudgetStore::new();
        let b = budget("Gone");
        store.upsert(b.clone()).unwrap();
        assert!(store.delete(b.id).unwrap());
        assert!(!store.delete(b.id).unwrap());
    }
}
