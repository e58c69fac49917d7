//! Wiring shared by the commands that touch the stores.

use std::sync::Arc;

use chrono::{DateTime, Local, NaiveTime, TimeDelta, TimeZone};
use sleepcycle_core::{
    AlarmGateway, Config, CoreError, CycleScheduler, Database, EnglishCatalog, KvStore, Localizer,
    Result, SettingsStore, SleepEventStore,
};

use crate::console::{ConsoleAlarm, ConsoleNotifier};

pub struct App {
    pub config: Config,
    pub settings: SettingsStore,
    pub sleeps: Arc<SleepEventStore>,
    localizer: Arc<EnglishCatalog>,
}

impl App {
    /// Open the configured database and hydrate both stores.
    pub async fn open(config: &Config) -> Result<Self> {
        tracing::debug!(database = %config.storage.database, "opening stores");
        let kv: Arc<dyn KvStore> = Arc::new(Database::open(&config.storage.database)?);
        let localizer = Arc::new(EnglishCatalog::new());

        let mut settings = SettingsStore::new(kv.clone()).with_localizer(localizer.clone());
        if let Some(locale) = config.device_locale() {
            settings = settings.with_device_locale(locale);
        }
        let sleeps = Arc::new(SleepEventStore::new(kv));

        tokio::join!(settings.initialize(), sleeps.initialize());

        Ok(Self {
            config: config.clone(),
            settings,
            sleeps,
            localizer,
        })
    }

    /// Scheduler using the stored latency and the configured clock.
    pub fn scheduler(&self) -> CycleScheduler {
        CycleScheduler::new(self.settings.fall_asleep_latency()).with_clock(
            self.config.clock.use_24_hour,
            Some(self.settings.language().code().to_string()),
        )
    }

    pub fn translate(&self, key: &str) -> String {
        self.localizer.translate(key, &[])
    }

    pub fn gateway(&self) -> AlarmGateway {
        AlarmGateway::new(
            Arc::new(ConsoleAlarm),
            Arc::new(ConsoleNotifier),
            self.localizer.clone(),
            self.sleeps.clone(),
        )
    }
}

/// The next local occurrence of `HH:MM`, today if still ahead, else tomorrow.
pub fn next_occurrence(hhmm: &str, now: &DateTime<Local>) -> Result<DateTime<Local>> {
    let time = NaiveTime::parse_from_str(hhmm, "%H:%M")
        .map_err(|e| CoreError::Custom(format!("invalid time '{hhmm}': {e}")))?;
    let today = now.date_naive().and_time(time);
    let candidate = Local
        .from_local_datetime(&today)
        .earliest()
        .ok_or_else(|| CoreError::Custom(format!("{hhmm} does not exist today")))?;
    if candidate >= *now {
        return Ok(candidate);
    }
    Ok(candidate + TimeDelta::days(1))
}
