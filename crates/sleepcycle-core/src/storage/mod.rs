//! Durable key/value backends.
//!
//! The stores treat the backend as a write-through mirror: they read it once
//! at initialization and write the full collection after every mutation.

mod config;
pub mod database;
pub mod memory;

pub use config::{ClockConfig, Config, LocaleConfig, LogConfig, StorageConfig};
pub use database::Database;
pub use memory::MemoryKv;

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StorageError;

/// Keys under which the stores persist their state.
pub mod keys {
    pub const SETTINGS: &str = "settings";
    pub const SLEEPS: &str = "sleeps";
    pub const LANGUAGE: &str = "language";
}

/// The durable key/value collaborator.
///
/// Values are JSON documents. There is no schema versioning: a value whose
/// shape the reader does not expect is treated as absent by the caller.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError>;
}

/// Returns `~/.config/sleepcycle[-dev]/` based on SLEEPCYCLE_ENV.
///
/// Set SLEEPCYCLE_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("SLEEPCYCLE_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("sleepcycle-dev")
    } else {
        base_dir.join("sleepcycle")
    };

    std::fs::create_dir_all(&dir).map_err(|e| StorageError::DataDir(e.to_string()))?;
    Ok(dir)
}
