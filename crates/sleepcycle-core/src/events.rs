use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::i18n::Language;
use crate::store::{SettingsType, SleepType};

/// Capacity of each store's broadcast channel. Slow subscribers that fall
/// further behind than this see `RecvError::Lagged` and should re-read the
/// store.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Every state change in a store produces a StoreEvent.
/// Presentation layers subscribe and re-read what they display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StoreEvent {
    /// Settings hydrated (or reset to defaults).
    SettingsLoaded {
        count: usize,
        language: Language,
        at: DateTime<Utc>,
    },
    SettingChanged {
        setting_type: SettingsType,
        at: DateTime<Utc>,
    },
    LanguageChanged {
        language: Language,
        at: DateTime<Utc>,
    },
    /// Sleep history hydrated (or reset to empty).
    SleepsLoaded {
        count: usize,
        at: DateTime<Utc>,
    },
    SleepAdded {
        id: i64,
        sleep_type: SleepType,
        at: DateTime<Utc>,
    },
    /// `removed` is zero when the id was not present.
    SleepDeleted {
        id: i64,
        removed: usize,
        at: DateTime<Utc>,
    },
}
