//! Retrying ledger fetches
//!
//! Only transient ledger failures are retried, with exponential backoff. A
//! fetch is all or nothing: results from a failed attempt are never used.

use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{LedgerAccessor, LedgerError, LedgerQuery};
use crate::error::{EngineError, EngineResult};
use crate::models::Transaction;

/// Backoff settings for ledger fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the second attempt
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Upper bound for any single delay
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    50
}

fn default_max_backoff_ms() -> u64 {
    1000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl RetryPolicy {
    /// Fail on the first error
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
        }
    }

    /// Delay after the given failed attempt (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let delay = self
            .initial_backoff_ms
            .saturating_mul(1u64 << exponent)
            .min(self.max_backoff_ms);
        Duration::from_millis(delay)
    }
}

/// Fetch a query, retrying transient failures per the policy
pub fn fetch_with_retry<L>(
    ledger: &L,
    query: &LedgerQuery,
    policy: &RetryPolicy,
) -> EngineResult<Vec<Transaction>>
where
    L: LedgerAccessor + ?Sized,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match ledger.transactions_in_range(query) {
            Ok(transactions) => return Ok(transactions),
            Err(LedgerError::Unavailable(reason)) if attempt < max_attempts => {
                let delay = policy.backoff(attempt);
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    book = %query.account_book_id,
                    range = %query.range,
                    "ledger fetch failed, retrying: {}",
                    reason
                );
                thread::sleep(delay);
            }
            Err(err) => {
                tracing::error!(attempt, book = %query.account_book_id, "ledger fetch failed: {}", err);
                return Err(EngineError::LedgerUnavailable {
                    attempts: attempt,
                    reason: err.to_string(),
                });
            }
        }
    }
}
