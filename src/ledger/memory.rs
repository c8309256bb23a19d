//! In-memory ledger
//!
//! A thread-safe [`LedgerAccessor`] holding transactions in memory with an
//! index by account book. Mutations report the [`LedgerChange`] they caused so
//! the caller can invalidate derived views.

use std::collections::HashMap;
use std::sync::RwLock;

use super::{LedgerAccessor, LedgerChange, LedgerError, LedgerQuery};
use crate::error::{EngineError, EngineResult};
use crate::models::{AccountBookId, Transaction, TransactionId};

/// Ledger backed by a map of transactions
#[derive(Debug, Default)]
pub struct MemoryLedger {
    data: RwLock<HashMap<TransactionId, Transaction>>,
    /// Index: account_book_id -> transaction_ids
    by_book: RwLock<HashMap<AccountBookId, Vec<TransactionId>>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger from existing transactions
    ///
    /// Fails on a repeated transaction id, like [`MemoryLedger::insert`].
    pub fn from_transactions(transactions: impl IntoIterator<Item = Transaction>) -> EngineResult<Self> {
        let ledger = Self::new();
        {
            // Freshly created locks cannot be poisoned
            let mut data = ledger.data.write().unwrap_or_else(|e| e.into_inner());
            let mut by_book = ledger.by_book.write().unwrap_or_else(|e| e.into_inner());
            for txn in transactions {
                if data.contains_key(&txn.id) {
                    return Err(duplicate(txn.id));
                }
                by_book.entry(txn.account_book_id).or_default().push(txn.id);
                data.insert(txn.id, txn);
            }
        }
        Ok(ledger)
    }

    /// Commit a new transaction
    pub fn insert(&self, txn: Transaction) -> EngineResult<LedgerChange> {
        let change = LedgerChange::for_transaction(&txn);
        let mut data = self.data.write().map_err(|e| {
            EngineError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        let mut by_book = self.by_book.write().map_err(|e| {
            EngineError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        if data.contains_key(&txn.id) {
            return Err(duplicate(txn.id));
        }
        by_book.entry(txn.account_book_id).or_default().push(txn.id);
        data.insert(txn.id, txn);
        Ok(change)
    }

    /// Replace a committed transaction
    ///
    /// Returns one change per affected account book: both the old and new
    /// date and category are covered so derived views for either get
    /// invalidated.
    pub fn update(&self, txn: Transaction) -> EngineResult<Vec<LedgerChange>> {
        let mut data = self.data.write().map_err(|e| {
            EngineError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        let mut by_book = self.by_book.write().map_err(|e| {
            EngineError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        let previous = data
            .get(&txn.id)
            .cloned()
            .ok_or_else(|| EngineError::transaction_not_found(txn.id.to_string()))?;

        let changes = if previous.account_book_id == txn.account_book_id {
            vec![LedgerChange::for_transaction(&previous).merge(&txn)]
        } else {
            if let Some(ids) = by_book.get_mut(&previous.account_book_id) {
                ids.retain(|id| *id != txn.id);
            }
            by_book.entry(txn.account_book_id).or_default().push(txn.id);
            vec![
                LedgerChange::for_transaction(&previous),
                LedgerChange::for_transaction(&txn),
            ]
        };

        data.insert(txn.id, txn);
        Ok(changes)
    }

    /// Delete a committed transaction
    pub fn remove(&self, id: TransactionId) -> EngineResult<LedgerChange> {
        let mut data = self.data.write().map_err(|e| {
            EngineError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        let mut by_book = self.by_book.write().map_err(|e| {
            EngineError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        let removed = data
            .remove(&id)
            .ok_or_else(|| EngineError::transaction_not_found(id.to_string()))?;
        if let Some(ids) = by_book.get_mut(&removed.account_book_id) {
            ids.retain(|existing| *existing != id);
        }
        Ok(LedgerChange::for_transaction(&removed))
    }

    /// Get a transaction by ID
    pub fn get(&self, id: TransactionId) -> EngineResult<Option<Transaction>> {
        let data = self.data.read().map_err(|e| {
            EngineError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(data.get(&id).cloned())
    }

    /// Number of transactions held
    pub fn len(&self) -> usize {
        self.data.read().map(|data| data.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All transactions, ordered by timestamp
    pub fn all(&self) -> EngineResult<Vec<Transaction>> {
        let data = self.data.read().map_err(|e| {
            EngineError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;
        let mut transactions: Vec<_> = data.values().cloned().collect();
        transactions.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
        Ok(transactions)
    }
}

fn duplicate(id: TransactionId) -> EngineError {
    EngineError::Validation(format!("Transaction {} already exists", id))
}

impl LedgerAccessor for MemoryLedger {
    fn transactions_in_range(&self, query: &LedgerQuery) -> Result<Vec<Transaction>, LedgerError> {
        let data = self
            .data
            .read()
            .map_err(|e| LedgerError::Unavailable(format!("Failed to acquire read lock: {}", e)))?;
        let by_book = self
            .by_book
            .read()
            .map_err(|e| LedgerError::Unavailable(format!("Failed to acquire read lock: {}", e)))?;

        let ids = by_book
            .get(&query.account_book_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[]);
        let mut transactions: Vec<_> = ids
            .iter()
            .filter_map(|id| data.get(id))
            .filter(|txn| query.matches(txn))
            .cloned()
            .collect();
        transactions.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
        Ok(transactions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryId, DateRange, Money};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn jan() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
        )
    }

    fn txn(book: AccountBookId, day: u32, cents: i64) -> Transaction {
        Transaction::new(
            book,
            Utc.with_ymd_and_hms(2025, 1, day, 10, 0, 0).unwrap(),
            Money::from_cents(cents),
        )
    }

    #[test]
    fn test_insert_and_query_in_order() {
        let ledger = MemoryLedger::new();
        let book = AccountBookId::new();
        ledger.insert(txn(book, 20, -300)).unwrap();
        ledger.insert(txn(book, 5, -100)).unwrap();
        ledger.insert(txn(AccountBookId::new(), 6, -999)).unwrap();

        let found = ledger
            .transactions_in_range(&LedgerQuery::book(book, jan()))
            .unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].amount.cents(), -100);
        assert_eq!(found[1].amount.cents(), -300);
    }

    #[test]
    fn test_insert_duplicate_rejected() {
        let ledger = MemoryLedger::new();
        let t = txn(AccountBookId::new(), 1, -100);
        ledger.insert(t.clone()).unwrap();
        assert!(matches!(ledger.insert(t), Err(EngineError::Validation(_))));
    }

    #[test]
    fn test_from_transactions_rejects_repeated_id() {
        let book = AccountBookId::new();
        let t = txn(book, 5, -10_000);
        let err = MemoryLedger::from_transactions(vec![t.clone(), t]).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_from_transactions_counts_each_once() {
        let book = AccountBookId::new();
        let ledger =
            MemoryLedger::from_transactions(vec![txn(book, 5, -10_000), txn(book, 6, -500)]).unwrap();

        let found = ledger
            .transactions_in_range(&LedgerQuery::book(book, jan()))
            .unwrap();
        assert_eq!(ledger.len(), 2);
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_update_reports_old_and_new_category() {
        let ledger = MemoryLedger::new();
        let book = AccountBookId::new();
        let food = CategoryId::new();
        let fun = CategoryId::new();
        let original = txn(book, 3, -100).with_category(food);
        ledger.insert(original.clone()).unwrap();

        let mut edited = original.clone();
        edited.category_id = Some(fun);
        edited.amount = Money::from_cents(-250);
        let changes = ledger.update(edited).unwrap();

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].categories, vec![food, fun]);
        assert_eq!(ledger.get(original.id).unwrap().unwrap().amount.cents(), -250);
    }

    #[test]
    fn test_update_moves_between_books() {
        let ledger = MemoryLedger::new();
        let old_book = AccountBookId::new();
        let new_book = AccountBookId::new();
        let original = txn(old_book, 3, -100);
        ledger.insert(original.clone()).unwrap();

        let mut moved = original;
        moved.account_book_id = new_book;
        let changes = ledger.update(moved).unwrap();
        assert_eq!(changes.len(), 2);

        assert!(ledger
            .transactions_in_range(&LedgerQuery::book(old_book, jan()))
            .unwrap()
            .is_empty());
        assert_eq!(
            ledger
                .transactions_in_range(&LedgerQuery::book(new_book, jan()))
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_remove() {
        let ledger = MemoryLedger::new();
        let book = AccountBookId::new();
        let t = txn(book, 9, -100);
        ledger.insert(t.clone()).unwrap();

        let change = ledger.remove(t.id).unwrap();
        assert_eq!(change.account_book_id, book);
        assert!(ledger.is_empty());
        assert!(ledger.remove(t.id).unwrap_err().is_not_found());
    }
}
