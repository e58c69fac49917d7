//! Sleep history: every alarm the user scheduled.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use super::{read, write};
use crate::events::{StoreEvent, EVENT_CHANNEL_CAPACITY};
use crate::storage::{keys, KvStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SleepType {
    Sleep,
    #[serde(rename = "powernap")]
    PowerNap,
}

impl std::fmt::Display for SleepType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SleepType::Sleep => write!(f, "sleep"),
            SleepType::PowerNap => write!(f, "powernap"),
        }
    }
}

/// One scheduled sleep or nap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepEvent {
    #[serde(rename = "type")]
    pub sleep_type: SleepType,
    /// When the alarm was scheduled.
    pub start: DateTime<Utc>,
    /// When the alarm rings.
    pub end: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle: Option<u32>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_id"
    )]
    pub id: Option<i64>,
}

impl SleepEvent {
    pub fn new(sleep_type: SleepType, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            sleep_type,
            start,
            end,
            cycle: None,
            id: None,
        }
    }

    pub fn with_cycle(mut self, cycle: Option<u32>) -> Self {
        self.cycle = cycle;
        self
    }
}

/// Older histories carry fractional ids; keep their integer part.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<f64>::deserialize(deserializer)?;
    Ok(raw.filter(|v| v.is_finite()).map(|v| v.trunc() as i64))
}

/// Inclusive bounds on [`SleepEvent::start`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SleepFilter {
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
}

impl SleepFilter {
    pub fn matches(&self, event: &SleepEvent) -> bool {
        self.start.map_or(true, |start| event.start >= start)
            && self.end.map_or(true, |end| event.start <= end)
    }
}

/// Ids handed to the first event of an empty history.
const FIRST_ID_RANGE: std::ops::Range<i64> = 1_000..1_000_000;

/// Parse a stored history element by element.
///
/// Returns `None` when the stored value is not an array at all.
fn decode_history(value: Value) -> Option<Vec<SleepEvent>> {
    let Value::Array(items) = value else {
        return None;
    };
    let total = items.len();
    let events: Vec<SleepEvent> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(event) => Some(event),
            Err(e) => {
                warn!(index, error = %e, "dropping unreadable sleep record");
                None
            }
        })
        .collect();
    if events.len() < total {
        warn!(kept = events.len(), total, "sleep history partially recovered");
    }
    Some(events)
}

/// Persisted, append-only log of [`SleepEvent`]s.
///
/// See the [module docs](super) for the write race.
pub struct SleepEventStore {
    kv: Arc<dyn KvStore>,
    sleeps: RwLock<Option<Vec<SleepEvent>>>,
    events: broadcast::Sender<StoreEvent>,
}

impl SleepEventStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            kv,
            sleeps: RwLock::new(None),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Load the stored history and write the canonical form back.
    pub async fn initialize(&self) {
        let history = match self.kv.get(keys::SLEEPS).await {
            Ok(Some(value)) => decode_history(value).unwrap_or_else(|| {
                error!("stored sleeps are not a list, resetting to empty");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                error!(error = %e, "failed to read sleeps, starting empty");
                Vec::new()
            }
        };

        let count = history.len();
        *write(&self.sleeps) = Some(history.clone());
        info!(count, "sleep history hydrated");

        self.persist(&history).await;
        self.emit(StoreEvent::SleepsLoaded {
            count,
            at: Utc::now(),
        });
    }

    /// Events of `sleep_type` whose start lies within `filter`.
    ///
    /// `None` before initialization.
    pub fn get_sleeps(
        &self,
        sleep_type: Option<SleepType>,
        filter: Option<&SleepFilter>,
    ) -> Option<Vec<SleepEvent>> {
        let guard = read(&self.sleeps);
        let sleeps = guard.as_ref()?;
        Some(
            sleeps
                .iter()
                .filter(|s| sleep_type.map_or(true, |t| s.sleep_type == t))
                .filter(|s| filter.map_or(true, |f| f.matches(s)))
                .cloned()
                .collect(),
        )
    }

    /// Number of held events; zero before initialization.
    pub fn len(&self) -> usize {
        read(&self.sleeps).as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append `event` and persist, returning its id.
    ///
    /// A missing or zero id becomes the current length, or a random id when
    /// the history is empty. Ids are only unique among held events. Adding
    /// before initialization starts a fresh history.
    pub async fn add_sleep(&self, mut event: SleepEvent) -> i64 {
        let (id, snapshot) = {
            let mut guard = write(&self.sleeps);
            let sleeps = guard.get_or_insert_with(Vec::new);
            let id = match event.id {
                Some(id) if id != 0 => id,
                _ if sleeps.is_empty() => rand::thread_rng().gen_range(FIRST_ID_RANGE),
                _ => sleeps.len() as i64,
            };
            event.id = Some(id);
            sleeps.push(event.clone());
            (id, sleeps.clone())
        };

        debug!(id, sleep_type = %event.sleep_type, "sleep recorded");
        self.persist(&snapshot).await;
        self.emit(StoreEvent::SleepAdded {
            id,
            sleep_type: event.sleep_type,
            at: Utc::now(),
        });
        id
    }

    /// Remove every event with `id` and persist. Returns how many went.
    pub async fn delete_sleep(&self, id: i64) -> usize {
        let outcome = {
            let mut guard = write(&self.sleeps);
            guard.as_mut().map(|sleeps| {
                let before = sleeps.len();
                sleeps.retain(|s| s.id != Some(id));
                (before - sleeps.len(), sleeps.clone())
            })
        };
        let Some((removed, snapshot)) = outcome else {
            error!(id, "delete before sleeps were loaded, nothing to delete");
            return 0;
        };

        debug!(id, removed, "sleep deleted");
        self.persist(&snapshot).await;
        self.emit(StoreEvent::SleepDeleted {
            id,
            removed,
            at: Utc::now(),
        });
        removed
    }

    async fn persist(&self, sleeps: &[SleepEvent]) {
        let value = match serde_json::to_value(sleeps) {
            Ok(value) => value,
            Err(e) => {
                error!(error = %e, "failed to encode sleeps");
                return;
            }
        };
        if let Err(e) = self.kv.set(keys::SLEEPS, value).await {
            error!(error = %e, "failed to persist sleeps");
        }
    }

    fn emit(&self, event: StoreEvent) {
        let _ = self.events.send(event);
    }
}
