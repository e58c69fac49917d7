//! Sleep-cycle arithmetic: which bed or wake times line up with whole cycles.

mod scheduler;

pub use scheduler::{Anchor, Candidate, CycleParams, CycleScheduler};

/// Length of one sleep cycle in hours.
pub const CYCLE_HOURS: f64 = 1.5;

/// Candidates offered per request, from this many cycles down to one.
pub const MAX_CYCLES: u32 = 6;

/// Length of a power nap in hours.
pub const POWER_NAP_HOURS: f64 = 0.5;

/// Total sleep represented by `cycles` cycles, in hours.
pub fn hours_for(cycles: u32) -> f64 {
    f64::from(cycles) * CYCLE_HOURS
}
