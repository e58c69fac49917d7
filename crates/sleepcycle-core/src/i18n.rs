//! Supported languages and the localization seam.
//!
//! Message catalogs live outside the core. The core only knows which
//! language codes are selectable, which locales render right-to-left, and
//! the handful of message keys it asks a [`Localizer`] for.

use std::fmt;
use std::str::FromStr;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

/// Locales whose surrounding text runs right-to-left.
pub const RTL_LOCALES: [&str; 3] = ["ar", "he", "ur"];

/// Message keys requested by the core.
pub mod keys {
    pub const ALARM_SLEEP: &str = "alarm.sleep";
    pub const ALARM_POWERNAP: &str = "alarm.powernap";
    pub const ALARM_SET: &str = "alarm.set";
    pub const ALARM_SET_FOR: &str = "alarm.setFor";
    pub const CYCLE_WAKE_UP_AT: &str = "cycle.wakeUpAt";
    pub const CYCLE_GO_TO_BED_AT: &str = "cycle.goToBedAt";
}

/// A selectable UI language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Tr,
    De,
    Fr,
    Az,
    Uz,
    Hi,
    Ur,
    Ar,
    Es,
    Ru,
}

impl Language {
    pub const ALL: [Language; 11] = [
        Language::En,
        Language::Tr,
        Language::De,
        Language::Fr,
        Language::Az,
        Language::Uz,
        Language::Hi,
        Language::Ur,
        Language::Ar,
        Language::Es,
        Language::Ru,
    ];

    /// Used when neither a saved preference nor a supported device locale exists.
    pub const DEFAULT: Language = Language::En;

    /// ISO 639-1 code.
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Tr => "tr",
            Language::De => "de",
            Language::Fr => "fr",
            Language::Az => "az",
            Language::Uz => "uz",
            Language::Hi => "hi",
            Language::Ur => "ur",
            Language::Ar => "ar",
            Language::Es => "es",
            Language::Ru => "ru",
        }
    }

    /// Name of the language in itself, for pickers.
    pub fn native_name(self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Tr => "Türkçe",
            Language::De => "Deutsch",
            Language::Fr => "Français",
            Language::Az => "Azərbaycan dili",
            Language::Uz => "O'zbek tili",
            Language::Hi => "हिंदी",
            Language::Ur => "اردو",
            Language::Ar => "العربية",
            Language::Es => "Español",
            Language::Ru => "Русский",
        }
    }

    /// Exact match against the supported codes.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.code() == code)
    }

    /// Resolve a device locale such as `de_DE.UTF-8` or `pt-BR`.
    pub fn from_device_locale(locale: &str) -> Option<Self> {
        language_code_of(locale).and_then(|code| Self::from_code(&code))
    }

    pub fn is_rtl(self) -> bool {
        is_rtl(self.code())
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| format!("unsupported language: {s}"))
    }
}

/// Whether `locale` (a bare language code) renders right-to-left.
pub fn is_rtl(locale: &str) -> bool {
    RTL_LOCALES.contains(&locale)
}

/// Extract the lowercase language subtag from a POSIX or BCP 47 locale.
pub fn language_code_of(locale: &str) -> Option<String> {
    let tag = locale
        .split(['.', '@'])
        .next()
        .unwrap_or_default()
        .split(['_', '-'])
        .next()
        .unwrap_or_default()
        .trim();
    if tag.is_empty() || tag == "C" || tag == "POSIX" {
        return None;
    }
    Some(tag.to_ascii_lowercase())
}

/// The external localization subsystem.
pub trait Localizer: Send + Sync {
    /// Whether the catalogs are loaded and `change_language` may be called.
    fn is_initialized(&self) -> bool;

    /// Switch the active catalog.
    fn change_language(&self, language: Language);

    /// Look up `key`, substituting `{{name}}` placeholders from `args`.
    fn translate(&self, key: &str, args: &[(&str, &str)]) -> String;
}

/// Built-in English strings for the keys the core requests.
///
/// Tracks the requested language so callers can observe switches, but
/// always answers in English.
#[derive(Debug)]
pub struct EnglishCatalog {
    active: RwLock<Language>,
}

impl EnglishCatalog {
    pub fn new() -> Self {
        Self {
            active: RwLock::new(Language::DEFAULT),
        }
    }

    pub fn active_language(&self) -> Language {
        *self.active.read().unwrap_or_else(|e| e.into_inner())
    }

    fn template(key: &str) -> Option<&'static str> {
        let text = match key {
            keys::ALARM_SLEEP => "Time to wake up!",
            keys::ALARM_POWERNAP => "Power nap is over!",
            keys::ALARM_SET => "Alarm set",
            keys::ALARM_SET_FOR => "Alarm set for {{time}}",
            keys::CYCLE_WAKE_UP_AT => "Wake up at",
            keys::CYCLE_GO_TO_BED_AT => "Go to bed at",
            _ => return None,
        };
        Some(text)
    }
}

impl Default for EnglishCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Localizer for EnglishCatalog {
    fn is_initialized(&self) -> bool {
        true
    }

    fn change_language(&self, language: Language) {
        *self.active.write().unwrap_or_else(|e| e.into_inner()) = language;
    }

    fn translate(&self, key: &str, args: &[(&str, &str)]) -> String {
        let Some(template) = Self::template(key) else {
            return key.to_string();
        };
        interpolate(template, args)
    }
}

/// Replace every `{{name}}` in `template` with its value from `args`.
pub fn interpolate(template: &str, args: &[(&str, &str)]) -> String {
    args.iter().fold(template.to_string(), |acc, (name, value)| {
        acc.replace(&format!("{{{{{name}}}}}"), value)
    })
}
