use clap::Subcommand;
use serde_json::json;
use sleepcycle_core::store::LATENCY_STEP_MINUTES;
use sleepcycle_core::{Config, CoreError, Language, Result, SettingValue, SettingsType};

use crate::app::App;

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Show all settings
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show or change the fall-asleep latency in minutes
    Latency {
        /// New latency in minutes
        minutes: Option<f64>,
        /// Add one step
        #[arg(long, conflicts_with_all = ["minutes", "down"])]
        up: bool,
        /// Remove one step
        #[arg(long, conflicts_with = "minutes")]
        down: bool,
    },
    /// Show or change the language
    Language {
        /// ISO 639-1 code
        code: Option<String>,
    },
    /// Show or reset the welcome screen flag
    Welcome {
        /// Show the welcome screen again
        #[arg(long)]
        reset: bool,
    },
}

pub async fn run(action: SettingsAction, config: &Config) -> Result<()> {
    let app = App::open(config).await?;
    let settings = &app.settings;

    match action {
        SettingsAction::List { json } => {
            let all = settings.get_settings(None).unwrap_or_default();
            if json {
                println!("{}", serde_json::to_string_pretty(&all)?);
                return Ok(());
            }
            println!("latency:  {} min", settings.fall_asleep_minutes());
            println!("language: {}", settings.language().native_name());
            println!("welcome:  {}", if settings.welcome_seen() { "seen" } else { "pending" });
        }
        SettingsAction::Latency { minutes, up, down } => {
            if let Some(minutes) = minutes {
                if !minutes.is_finite() || minutes < 0.0 {
                    return Err(CoreError::Custom(format!("latency must be >= 0, got {minutes}")));
                }
                settings
                    .edit_setting(SettingsType::FallAsleepLatency, Some(SettingValue::Number(minutes)))
                    .await;
            } else if up {
                settings.adjust_fall_asleep_latency(LATENCY_STEP_MINUTES).await;
            } else if down {
                settings.adjust_fall_asleep_latency(-LATENCY_STEP_MINUTES).await;
            }
            println!("{} min", settings.fall_asleep_minutes());
        }
        SettingsAction::Language { code: Some(code) } => {
            let language: Language = code.parse().map_err(CoreError::Custom)?;
            settings.set_language(language.code()).await;
            println!("{}", settings.language().native_name());
        }
        SettingsAction::Language { code: None } => {
            let active = settings.language();
            for language in Language::ALL {
                let marker = if language == active { "*" } else { " " };
                println!("{marker} {:<3} {}", language.code(), language.native_name());
            }
        }
        SettingsAction::Welcome { reset } => {
            if reset {
                settings.request_welcome().await;
            }
            println!("{}", json!({ "welcome_seen": settings.welcome_seen() }));
        }
    }
    Ok(())
}
