//! Hydrated, write-through state containers.
//!
//! Each store is constructed explicitly around a shared [`KvStore`] and
//! starts empty; nothing is readable until `initialize()` has run.
//!
//! ## Concurrency
//!
//! Mutations take the in-memory lock only long enough to compute the new
//! list, then release it and await the durable write. Two overlapping
//! mutations therefore race at the read-compute-write step: whichever
//! finishes its in-memory update last also issues the last durable write
//! of *its* snapshot. A single-threaded caller never overlaps them; callers
//! that do must serialize mutations themselves.
//!
//! [`KvStore`]: crate::storage::KvStore

mod settings;
mod sleeps;

pub use settings::{
    Setting, SettingValue, SettingsStore, SettingsType, LATENCY_STEP_MINUTES,
};
pub use sleeps::{SleepEvent, SleepEventStore, SleepFilter, SleepType};

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

// Lists are only replaced or edited element-wise, so a poisoned guard
// still holds a consistent list.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
