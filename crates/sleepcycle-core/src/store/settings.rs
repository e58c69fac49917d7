//! User settings: fall-asleep latency, language, onboarding flag.

use std::sync::{Arc, RwLock};

use chrono::{TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};

use super::{read, write};
use crate::events::{StoreEvent, EVENT_CHANNEL_CAPACITY};
use crate::i18n::{Language, Localizer};
use crate::storage::{keys, KvStore};

/// Minutes added or removed by one latency step in the settings surface.
pub const LATENCY_STEP_MINUTES: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SettingsType {
    /// Minutes between getting into bed and falling asleep.
    #[serde(rename = "Fall Asleep")]
    FallAsleepLatency,
    /// ISO 639-1 code of the selected language.
    #[serde(rename = "Language")]
    Language,
    /// Whether to show the welcome screen; `false` once dismissed.
    #[serde(rename = "Welcome")]
    WelcomeSeen,
}

impl SettingsType {
    pub const ALL: [SettingsType; 3] = [
        SettingsType::FallAsleepLatency,
        SettingsType::Language,
        SettingsType::WelcomeSeen,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl SettingValue {
    /// Numeric reading; text is parsed, booleans are not numbers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SettingValue::Number(n) => Some(*n),
            SettingValue::Text(s) => s.trim().parse().ok(),
            SettingValue::Bool(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    #[serde(rename = "type")]
    pub setting_type: SettingsType,
    /// `None` means unset and is stored as `null`.
    #[serde(default)]
    pub value: Option<SettingValue>,
    #[serde(default)]
    pub id: i64,
}

/// One unset record per type, ids in declaration order.
fn initial_settings() -> Vec<Setting> {
    SettingsType::ALL
        .iter()
        .zip(0..)
        .map(|(t, id)| Setting {
            setting_type: *t,
            value: None,
            id,
        })
        .collect()
}

/// Append an unset record for every type missing from `settings`.
fn reconcile(mut settings: Vec<Setting>) -> Vec<Setting> {
    let mut next_id = settings.iter().map(|s| s.id.saturating_add(1)).max().unwrap_or(0);
    for t in SettingsType::ALL {
        if !settings.iter().any(|s| s.setting_type == t) {
            settings.push(Setting {
                setting_type: t,
                value: None,
                id: next_id,
            });
            next_id = next_id.saturating_add(1);
        }
    }
    settings
}

/// First record of each type, in stored order.
fn first_per_type(settings: &[Setting], only: Option<SettingsType>) -> Vec<Setting> {
    let mut seen = Vec::with_capacity(SettingsType::ALL.len());
    settings
        .iter()
        .filter(|s| only.map_or(true, |t| s.setting_type == t))
        .filter(|s| {
            if seen.contains(&s.setting_type) {
                return false;
            }
            seen.push(s.setting_type);
            true
        })
        .cloned()
        .collect()
}

/// Flips `loading` to false when hydration ends, however it ends.
struct LoadingGuard<'a>(&'a watch::Sender<bool>);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.send_replace(false);
    }
}

/// Persisted user preferences with async hydration.
///
/// Reads are synchronous and return `None` until [`SettingsStore::initialize`]
/// completes. See the [module docs](super) for the write race.
pub struct SettingsStore {
    kv: Arc<dyn KvStore>,
    settings: RwLock<Option<Vec<Setting>>>,
    language: RwLock<Language>,
    loading: watch::Sender<bool>,
    device_locale: Option<String>,
    localizer: Option<Arc<dyn Localizer>>,
    events: broadcast::Sender<StoreEvent>,
}

impl SettingsStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        let (loading, _) = watch::channel(true);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            kv,
            settings: RwLock::new(None),
            language: RwLock::new(Language::DEFAULT),
            loading,
            device_locale: None,
            localizer: None,
            events,
        }
    }

    /// Locale reported by the device, consulted when no language is saved.
    pub fn with_device_locale(mut self, locale: impl Into<String>) -> Self {
        self.device_locale = Some(locale.into());
        self
    }

    /// Localization subsystem to notify on language changes.
    pub fn with_localizer(mut self, localizer: Arc<dyn Localizer>) -> Self {
        self.localizer = Some(localizer);
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// True until the first `initialize()` finishes.
    pub fn loading(&self) -> bool {
        *self.loading.borrow()
    }

    /// Load, reconcile and persist settings, then resolve the active language.
    ///
    /// Never fails: unreadable storage yields the default set, and `loading`
    /// is cleared on every exit path, including cancellation.
    pub async fn initialize(&self) {
        let guard = LoadingGuard(&self.loading);

        let stored = self.load_settings().await;
        let language = self.resolve_language().await;

        let mut settings = reconcile(stored);
        for s in settings
            .iter_mut()
            .filter(|s| s.setting_type == SettingsType::Language)
        {
            s.value = Some(SettingValue::Text(language.code().to_string()));
        }

        *write(&self.settings) = Some(settings.clone());
        *write(&self.language) = language;
        drop(guard);

        info!(count = settings.len(), %language, "settings hydrated");
        self.persist_settings(&settings).await;
        self.persist_language(language).await;
        self.notify_localizer(language);
        self.emit(StoreEvent::SettingsLoaded {
            count: settings.len(),
            language,
            at: Utc::now(),
        });
    }

    async fn load_settings(&self) -> Vec<Setting> {
        match self.kv.get(keys::SETTINGS).await {
            Ok(Some(value)) => match serde_json::from_value::<Vec<Setting>>(value) {
                Ok(settings) => settings,
                Err(e) => {
                    warn!(error = %e, "stored settings have an unexpected shape, seeding defaults");
                    initial_settings()
                }
            },
            Ok(None) => {
                debug!("no stored settings, seeding defaults");
                initial_settings()
            }
            Err(e) => {
                error!(error = %e, "failed to read settings, seeding defaults");
                initial_settings()
            }
        }
    }

    /// Saved preference, else a supported device locale, else the default.
    async fn resolve_language(&self) -> Language {
        match self.kv.get(keys::LANGUAGE).await {
            Ok(Some(Value::String(code))) => {
                if let Some(language) = Language::from_code(&code) {
                    return language;
                }
                warn!(%code, "saved language is not supported");
            }
            Ok(Some(other)) => warn!(value = %other, "saved language is not a string"),
            Ok(None) => {}
            Err(e) => error!(error = %e, "failed to read saved language"),
        }
        self.device_locale
            .as_deref()
            .and_then(Language::from_device_locale)
            .unwrap_or(Language::DEFAULT)
    }

    /// Settings, or only those of `setting_type`; `None` while loading.
    ///
    /// Duplicate records of a type are hidden behind the first one.
    pub fn get_settings(&self, setting_type: Option<SettingsType>) -> Option<Vec<Setting>> {
        if self.loading() {
            return None;
        }
        read(&self.settings)
            .as_deref()
            .map(|settings| first_per_type(settings, setting_type))
    }

    /// Wait for hydration, then [`SettingsStore::get_settings`].
    ///
    /// Dropping the returned future abandons the wait.
    pub async fn get_settings_async(
        &self,
        setting_type: Option<SettingsType>,
    ) -> Option<Vec<Setting>> {
        let mut rx = self.loading.subscribe();
        // The sender lives as long as `self`, so this only returns once loaded.
        let _ = rx.wait_for(|loading| !*loading).await;
        self.get_settings(setting_type)
    }

    /// The first record of `setting_type`.
    pub fn get_setting(&self, setting_type: SettingsType) -> Option<Setting> {
        self.get_settings(Some(setting_type))
            .and_then(|found| found.into_iter().next())
    }

    /// Replace the value of every record of `setting_type` and persist.
    ///
    /// Ignored before initialization. Record ids are left unchanged.
    pub async fn edit_setting(&self, setting_type: SettingsType, value: Option<SettingValue>) {
        let Some(snapshot) = self.apply_edit(setting_type, value) else {
            warn!(?setting_type, "edit before settings were loaded, ignoring");
            return;
        };
        debug!(?setting_type, "setting edited");
        self.persist_settings(&snapshot).await;
        self.emit(StoreEvent::SettingChanged {
            setting_type,
            at: Utc::now(),
        });
    }

    fn apply_edit(
        &self,
        setting_type: SettingsType,
        value: Option<SettingValue>,
    ) -> Option<Vec<Setting>> {
        let mut guard = write(&self.settings);
        let settings = guard.as_mut()?;
        for s in settings.iter_mut().filter(|s| s.setting_type == setting_type) {
            s.value = value.clone();
        }
        Some(settings.clone())
    }

    /// Currently active language.
    pub fn language(&self) -> Language {
        *read(&self.language)
    }

    /// Switch the active language.
    ///
    /// Unsupported codes are logged and leave all state untouched.
    pub async fn set_language(&self, code: &str) {
        let Some(language) = Language::from_code(code) else {
            warn!(code, "rejecting unsupported language");
            return;
        };
        *write(&self.language) = language;
        let snapshot = self.apply_edit(
            SettingsType::Language,
            Some(SettingValue::Text(language.code().to_string())),
        );

        info!(%language, "language changed");
        self.persist_language(language).await;
        if let Some(snapshot) = snapshot {
            self.persist_settings(&snapshot).await;
        }
        self.notify_localizer(language);
        self.emit(StoreEvent::LanguageChanged {
            language,
            at: Utc::now(),
        });
    }

    /// Push the active language to the localizer if it is ready.
    ///
    /// Call once the localization subsystem finishes its own startup when it
    /// was not ready at hydration time.
    pub fn sync_localizer(&self) {
        self.notify_localizer(self.language());
    }

    fn notify_localizer(&self, language: Language) {
        let Some(localizer) = &self.localizer else {
            return;
        };
        if localizer.is_initialized() {
            localizer.change_language(language);
        } else {
            debug!(%language, "localizer not initialized, deferring language switch");
        }
    }

    /// Fall-asleep latency; unset, non-numeric and negative values count as zero.
    pub fn fall_asleep_latency(&self) -> TimeDelta {
        let minutes = self
            .get_setting(SettingsType::FallAsleepLatency)
            .and_then(|s| s.value)
            .and_then(|v| v.as_f64())
            .filter(|m| m.is_finite() && *m > 0.0)
            .unwrap_or(0.0);
        TimeDelta::try_milliseconds((minutes * 60_000.0).round() as i64).unwrap_or(TimeDelta::zero())
    }

    /// Latency in whole minutes as shown in the settings surface.
    pub fn fall_asleep_minutes(&self) -> f64 {
        self.fall_asleep_latency().num_seconds() as f64 / 60.0
    }

    /// Move the latency by `delta_minutes`, never below zero.
    pub async fn adjust_fall_asleep_latency(&self, delta_minutes: f64) {
        let next = (self.fall_asleep_minutes() + delta_minutes).max(0.0);
        self.edit_setting(SettingsType::FallAsleepLatency, Some(SettingValue::Number(next)))
            .await;
    }

    /// The stored flag means "show the welcome screen"; only an explicit
    /// `false` counts as seen.
    pub fn welcome_seen(&self) -> bool {
        matches!(
            self.get_setting(SettingsType::WelcomeSeen).and_then(|s| s.value),
            Some(SettingValue::Bool(false))
        )
    }

    pub async fn mark_welcome_seen(&self) {
        self.edit_setting(SettingsType::WelcomeSeen, Some(SettingValue::Bool(false)))
            .await;
    }

    /// Ask for the welcome screen again on the next start.
    pub async fn request_welcome(&self) {
        self.edit_setting(SettingsType::WelcomeSeen, Some(SettingValue::Bool(true)))
            .await;
    }

    async fn persist_settings(&self, settings: &[Setting]) {
        let value = match serde_json::to_value(settings) {
            Ok(value) => value,
            Err(e) => {
                error!(error = %e, "failed to encode settings");
                return;
            }
        };
        if let Err(e) = self.kv.set(keys::SETTINGS, value).await {
            error!(error = %e, "failed to persist settings");
        }
    }

    async fn persist_language(&self, language: Language) {
        let value = Value::String(language.code().to_string());
        if let Err(e) = self.kv.set(keys::LANGUAGE, value).await {
            error!(error = %e, "failed to persist language");
        }
    }

    fn emit(&self, event: StoreEvent) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }
}
