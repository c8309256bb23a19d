//! Transaction file adapter
//!
//! Loads transactions.json into a [`MemoryLedger`] and writes it back.

use std::path::Path;

use crate::error::EngineResult;
use crate::ledger::MemoryLedger;
use crate::models::Transaction;

use super::file_io::{read_json, write_json_atomic};

/// Serializable transaction data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct TransactionData {
    transactions: Vec<Transaction>,
}

/// Load a ledger from a JSON file (empty if the file doesn't exist)
pub fn load_ledger(path: impl AsRef<Path>) -> EngineResult<MemoryLedger> {
    let path = path.as_ref();
    let file_data: TransactionData = read_json(path)?;
    tracing::debug!(
        count = file_data.transactions.len(),
        path = %path.display(),
        "loaded transactions"
    );
    MemoryLedger::from_transactions(file_data.transactions)
}

/// Write every transaction of a ledger to a JSON file, oldest first
pub fn save_ledger(path: impl AsRef<Path>, ledger: &MemoryLedger) -> EngineResult<()> {
    let file_data = TransactionData {
        transactions: ledger.all()?,
    };
    write_json_atomic(path, &file_data)
}
