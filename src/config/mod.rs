//! Configuration module for the budget engine
//!
//! This module provides configuration management including:
//! - XDG-compliant path resolution
//! - User settings persistence

pub mod paths;
pub mod settings;

pub use paths::EnginePaths;
pub use settings::Settings;
