use chrono::{DateTime, Local};
use clap::Subcommand;
use serde_json::json;
use sleepcycle_core::cycle::MAX_CYCLES;
use sleepcycle_core::{Anchor, Candidate, Config, CoreError, CycleParams, Result};

use crate::app::{next_occurrence, App};

#[derive(Subcommand)]
pub enum CycleAction {
    /// Wake times for going to bed at a given time
    Wake {
        /// Bedtime as HH:MM (default: now)
        #[arg(long)]
        at: Option<String>,
        /// Schedule the candidate with this many cycles
        #[arg(long)]
        pick: Option<u32>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Bed times for waking up at a given time
    Bed {
        /// Wake time as HH:MM
        #[arg(long)]
        at: String,
        /// Schedule the candidate with this many cycles
        #[arg(long)]
        pick: Option<u32>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Sleep one cycle starting now
    Now,
    /// Take a power nap starting now
    Nap,
}

pub async fn run(action: CycleAction, config: &Config) -> Result<()> {
    let app = App::open(config).await?;
    let now = Local::now();

    match action {
        CycleAction::Wake { at, pick, json } => {
            let reference = match at {
                Some(hhmm) => next_occurrence(&hhmm, &now)?,
                None => now,
            };
            plan(&app, &reference, Anchor::Bedtime, pick, json).await?;
        }
        CycleAction::Bed { at, pick, json } => {
            let reference = next_occurrence(&at, &now)?;
            plan(&app, &reference, Anchor::WakeTime, pick, json).await?;
        }
        CycleAction::Now => {
            let receipt = app.gateway().sleep_now(&app.scheduler(), &now).await;
            println!("recorded sleep #{}", receipt.sleep_id);
        }
        CycleAction::Nap => {
            let receipt = app.gateway().power_nap(&app.scheduler(), &now).await;
            println!("recorded nap #{}", receipt.sleep_id);
        }
    }
    Ok(())
}

async fn plan(
    app: &App,
    reference: &DateTime<Local>,
    anchor: Anchor,
    pick: Option<u32>,
    json: bool,
) -> Result<()> {
    let scheduler = app.scheduler();
    let params = CycleParams::new(reference, anchor);
    let candidates = scheduler.plan(Some(&params), &Local);

    if let Some(cycles) = pick {
        let chosen = candidates
            .iter()
            .find(|c| c.cycles == cycles)
            .ok_or_else(|| {
                CoreError::Custom(format!("--pick must be between 1 and {MAX_CYCLES}, got {cycles}"))
            })?;
        let receipt = app.gateway().schedule(chosen).await;
        println!("recorded sleep #{}", receipt.sleep_id);
        return Ok(());
    }

    if json {
        let rows: Vec<_> = candidates.iter().map(candidate_json).collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("{}", app.translate(anchor.header_key()));
    for c in &candidates {
        println!("  {} cycles ({:.1} h)  {}", c.cycles, c.hours(), c.display);
    }
    Ok(())
}

fn candidate_json(c: &Candidate<Local>) -> serde_json::Value {
    json!({
        "cycles": c.cycles,
        "hours": c.hours(),
        "at": c.at.to_rfc3339(),
        "display": c.display,
    })
}
