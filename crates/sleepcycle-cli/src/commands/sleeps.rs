use chrono::{DateTime, Local};
use clap::{Subcommand, ValueEnum};
use sleepcycle_core::time::{current_month_range, default_report_filter};
use sleepcycle_core::{Config, Result, SleepFilter, SleepReport, SleepType};

use crate::app::App;

#[derive(Clone, Copy, ValueEnum)]
pub enum KindArg {
    Sleep,
    Nap,
}

impl From<KindArg> for SleepType {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Sleep => SleepType::Sleep,
            KindArg::Nap => SleepType::PowerNap,
        }
    }
}

#[derive(Clone, Copy, Default, ValueEnum)]
pub enum WindowArg {
    /// First of last month up to the first of this month
    #[default]
    Previous,
    /// First of this month up to now
    Current,
    /// Whole history
    All,
}

impl WindowArg {
    fn filter(self, now: &DateTime<Local>) -> SleepFilter {
        match self {
            WindowArg::Previous => default_report_filter(now),
            WindowArg::Current => current_month_range(now),
            WindowArg::All => SleepFilter::default(),
        }
    }
}

#[derive(Subcommand)]
pub enum SleepsAction {
    /// List recorded sleeps and naps
    List {
        /// Only this kind
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
        /// Only sleeps started in this window; whole history when omitted
        #[arg(long, value_enum)]
        window: Option<WindowArg>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete every record with the given id
    Delete {
        id: i64,
    },
    /// Cycle statistics over a window
    Report {
        #[arg(long, value_enum, default_value_t)]
        window: WindowArg,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub async fn run(action: SleepsAction, config: &Config) -> Result<()> {
    let app = App::open(config).await?;

    match action {
        SleepsAction::List { kind, window, json } => {
            let filter = window.map(|w| w.filter(&Local::now()));
            let sleeps = app
                .sleeps
                .get_sleeps(kind.map(SleepType::from), filter.as_ref())
                .unwrap_or_default();
            if json {
                println!("{}", serde_json::to_string_pretty(&sleeps)?);
                return Ok(());
            }
            if sleeps.is_empty() {
                println!("no sleeps recorded");
            }
            for s in &sleeps {
                let end = s.end.with_timezone(&Local);
                let cycles = s.cycle.map(|c| format!("{c} cycles")).unwrap_or_default();
                println!(
                    "#{:<8} {:<8} {}  {}",
                    s.id.map(|id| id.to_string()).unwrap_or_default(),
                    s.sleep_type,
                    end.format("%Y-%m-%d %H:%M"),
                    cycles
                );
            }
        }
        SleepsAction::Delete { id } => {
            let removed = app.sleeps.delete_sleep(id).await;
            println!("deleted {removed} record(s)");
        }
        SleepsAction::Report { window, json } => {
            let filter = window.filter(&Local::now());
            let selected = app
                .sleeps
                .get_sleeps(Some(SleepType::Sleep), Some(&filter))
                .unwrap_or_default();
            let report = SleepReport::from_events(&selected);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }
            let locale = app.settings.language().code();
            println!("sleeps:  {}", report.counted);
            println!("average: {}", SleepReport::localized(report.average, Some(locale)));
            println!("median:  {}", SleepReport::localized(report.median, Some(locale)));
        }
    }
    Ok(())
}
