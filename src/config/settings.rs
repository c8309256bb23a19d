//! User settings for the budget engine
//!
//! Ledger retry and result caching preferences.

use serde::{Deserialize, Serialize};

use super::paths::EnginePaths;
use crate::consistency::DEFAULT_CACHE_CAPACITY;
use crate::engine::EngineOptions;
use crate::error::{EngineError, EngineResult};
use crate::ledger::RetryPolicy;
use crate::models::AccountBookId;

/// User settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Backoff for transient ledger failures
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Cache computed usage and statistics between calls
    #[serde(default = "default_cache_enabled")]
    pub cache_enabled: bool,

    /// Most results each cache keeps
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// tracing filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Book used by `stats` when none is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_account_book: Option<AccountBookId>,
}

fn default_schema_version() -> u32 {
    1
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

fn default_log_filter() -> String {
    "budget_engine=info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            retry: RetryPolicy::default(),
            cache_enabled: default_cache_enabled(),
            cache_capacity: default_cache_capacity(),
            log_filter: default_log_filter(),
            default_account_book: None,
        }
    }
}

impl Settings {
    /// Load settings from disk, or fall back to defaults if the file doesn't exist
    pub fn load_or_create(paths: &EnginePaths) -> EngineResult<Self> {
        let settings_path = paths.settings_file();
        if !settings_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&settings_path)
            .map_err(|e| EngineError::Io(format!("Failed to read settings file: {}", e)))?;
        serde_json::from_str(&contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse settings file: {}", e)))
    }

    /// Save settings to disk
    pub fn save(&self, paths: &EnginePaths) -> EngineResult<()> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| EngineError::Config(format!("Failed to serialize settings: {}", e)))?;
        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| EngineError::Io(format!("Failed to write settings file: {}", e)))
    }

    /// Engine tunables derived from these settings
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            retry: self.retry,
            cache_enabled: self.cache_enabled,
            cache_capacity: self.cache_capacity,
        }
    }
}
