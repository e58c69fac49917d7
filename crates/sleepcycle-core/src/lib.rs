//! # Sleepcycle Core Library
//!
//! This library provides the core logic for the Sleepcycle sleep-cycle
//! calculator. Given a bedtime or a wake time it proposes alarm times that
//! line up with whole 90-minute cycles, hands the chosen one to the device
//! alarm, and keeps a history of every alarm for the reports screen.
//! The CLI binary is a thin layer over the same library.
//!
//! ## Architecture
//!
//! - **Cycle scheduler**: pure arithmetic over `chrono` instants in any time zone
//! - **Stores**: settings and sleep history, hydrated once from a key/value
//!   backend and written through on every change
//! - **Storage**: SQLite key/value persistence and TOML-based configuration
//! - **Alarm gateway**: platform registration plus the history record
//!
//! ## Key Components
//!
//! - [`CycleScheduler`]: Candidate bed and wake times
//! - [`SettingsStore`]: Fall-asleep latency, language, welcome flag
//! - [`SleepEventStore`]: Scheduled sleeps and naps
//! - [`AlarmGateway`]: Device alarm hand-off
//! - [`Database`]: SQLite-backed [`KvStore`]
//! - [`Config`]: Application configuration management

pub mod alarm;
pub mod cycle;
pub mod error;
pub mod events;
pub mod i18n;
pub mod report;
pub mod storage;
pub mod store;
pub mod time;

pub use alarm::{AlarmGateway, AlarmPlatform, AlarmReceipt, AlarmRequest, Notifier, Toast};
pub use cycle::{Anchor, Candidate, CycleParams, CycleScheduler};
pub use error::{AlarmError, ConfigError, CoreError, Result, StorageError};
pub use events::StoreEvent;
pub use i18n::{EnglishCatalog, Language, Localizer};
pub use report::SleepReport;
pub use storage::{Config, Database, KvStore, MemoryKv};
pub use store::{
    Setting, SettingValue, SettingsStore, SettingsType, SleepEvent, SleepEventStore, SleepFilter,
    SleepType,
};
