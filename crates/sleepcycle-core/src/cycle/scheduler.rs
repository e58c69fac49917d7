use std::fmt::Display;

use chrono::{DateTime, TimeDelta, TimeZone};
use serde::{Deserialize, Serialize};

use super::{hours_for, CYCLE_HOURS, MAX_CYCLES, POWER_NAP_HOURS};
use crate::i18n::keys;
use crate::time::{add_hours, format_time};

/// Which end of the night the reference instant pins down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    /// Reference is when the user goes to bed; candidates are wake times.
    Bedtime,
    /// Reference is when the user must wake; candidates are bed times.
    WakeTime,
}

impl Anchor {
    pub fn from_is_start(is_start: bool) -> Self {
        if is_start {
            Anchor::Bedtime
        } else {
            Anchor::WakeTime
        }
    }

    fn sign(self) -> i32 {
        match self {
            Anchor::Bedtime => 1,
            Anchor::WakeTime => -1,
        }
    }

    /// Localization key for the list header.
    pub fn header_key(self) -> &'static str {
        match self {
            Anchor::Bedtime => keys::CYCLE_WAKE_UP_AT,
            Anchor::WakeTime => keys::CYCLE_GO_TO_BED_AT,
        }
    }
}

/// One selectable time.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<Tz: TimeZone> {
    pub cycles: u32,
    pub at: DateTime<Tz>,
    /// `at` rendered for the configured clock.
    pub display: String,
}

impl<Tz: TimeZone> Candidate<Tz> {
    /// Sleep this candidate represents, for the "equals N hours" label.
    pub fn hours(&self) -> f64 {
        hours_for(self.cycles)
    }
}

/// Navigation parameters of a cycle request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleParams {
    /// Reference instant in epoch milliseconds.
    #[serde(default)]
    pub time: Option<i64>,
    /// `true` when `time` is a bedtime.
    #[serde(default)]
    pub is_start: Option<bool>,
}

impl CycleParams {
    pub fn new<Tz: TimeZone>(reference: &DateTime<Tz>, anchor: Anchor) -> Self {
        Self {
            time: Some(reference.timestamp_millis()),
            is_start: Some(anchor == Anchor::Bedtime),
        }
    }
}

/// Computes cycle-aligned bed and wake times.
#[derive(Debug, Clone)]
pub struct CycleScheduler {
    latency: TimeDelta,
    use_24_hour: bool,
    locale: Option<String>,
}

impl CycleScheduler {
    /// A scheduler adding `latency` to fall asleep; negative values count as zero.
    pub fn new(latency: TimeDelta) -> Self {
        Self {
            latency: latency.max(TimeDelta::zero()),
            use_24_hour: false,
            locale: None,
        }
    }

    /// Clock style and locale used for [`Candidate::display`].
    pub fn with_clock(mut self, use_24_hour: bool, locale: Option<String>) -> Self {
        self.use_24_hour = use_24_hour;
        self.locale = locale;
        self
    }

    pub fn latency(&self) -> TimeDelta {
        self.latency
    }

    fn candidate<Tz>(&self, cycles: u32, at: DateTime<Tz>) -> Candidate<Tz>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let display = format_time(&at, self.use_24_hour, self.locale.as_deref());
        Candidate { cycles, at, display }
    }

    /// The instant `cycles` cycles plus latency away from `reference`.
    pub fn candidate_at<Tz>(&self, reference: &DateTime<Tz>, cycles: u32, anchor: Anchor) -> DateTime<Tz>
    where
        Tz: TimeZone,
    {
        let sign = anchor.sign();
        let shifted = add_hours(reference, f64::from(sign) * hours_for(cycles));
        let latency = if sign < 0 { -self.latency } else { self.latency };
        shifted.clone().checked_add_signed(latency).unwrap_or_else(|| {
            tracing::warn!(cycles, "latency offset out of range, ignoring it");
            shifted
        })
    }

    /// Candidates for [`MAX_CYCLES`] down to one cycle.
    pub fn candidates<Tz>(&self, reference: &DateTime<Tz>, anchor: Anchor) -> Vec<Candidate<Tz>>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        (1..=MAX_CYCLES)
            .rev()
            .map(|cycles| self.candidate(cycles, self.candidate_at(reference, cycles, anchor)))
            .collect()
    }

    /// Candidates for a navigation request, rendered in `tz`.
    ///
    /// Missing parameters or reference time yield an empty list; a missing
    /// `is_start` means the reference is a wake time.
    pub fn plan<Tz>(&self, params: Option<&CycleParams>, tz: &Tz) -> Vec<Candidate<Tz>>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let Some(params) = params else {
            tracing::error!("cycle request without parameters");
            return Vec::new();
        };
        let Some(ms) = params.time else {
            tracing::error!("cycle request without a reference time");
            return Vec::new();
        };
        let Some(reference) = tz.timestamp_millis_opt(ms).single() else {
            tracing::error!(ms, "cycle reference time out of range");
            return Vec::new();
        };
        let anchor = Anchor::from_is_start(params.is_start.unwrap_or(false));
        self.candidates(&reference, anchor)
    }

    /// Wake time for a single cycle starting right now, without latency.
    pub fn sleep_now<Tz>(&self, now: &DateTime<Tz>) -> Candidate<Tz>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        self.candidate(1, add_hours(now, CYCLE_HOURS))
    }

    /// When a power nap started `now` ends.
    pub fn power_nap<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DateTime<Tz> {
        add_hours(now, POWER_NAP_HOURS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Timelike, Utc};
    use proptest::prelude::*;

    fn tz() -> FixedOffset {
        FixedOffset::east_opt(3 * 3600).unwrap()
    }

    fn local(h: u32, m: u32) -> DateTime<FixedOffset> {
        tz().with_ymd_and_hms(2024, 3, 1, h, m, 0).unwrap()
    }

    fn scheduler(latency_min: i64) -> CycleScheduler {
        CycleScheduler::new(TimeDelta::minutes(latency_min)).with_clock(true, None)
    }

    #[test]
    fn bedtime_anchor_adds_cycles_and_latency() {
        let list = scheduler(15).candidates(&local(23, 0), Anchor::Bedtime);
        assert_eq!(list.len(), 6);
        assert_eq!(list[0].cycles, 6);
        assert_eq!(list[0].display, "08:15");
        assert_eq!(list[5].cycles, 1);
        assert_eq!(list[5].display, "00:45");
        assert_eq!(list[0].hours(), 9.0);
    }

    #[test]
    fn wake_anchor_subtracts_cycles_and_latency() {
        let list = scheduler(15).candidates(&local(7, 0), Anchor::WakeTime);
        let shown: Vec<_> = list.iter().map(|c| c.display.as_str()).collect();
        assert_eq!(shown, ["21:45", "23:15", "00:45", "02:15", "03:45", "05:15"]);
    }

    #[test]
    fn twelve_hour_display_has_no_suffix() {
        let s = CycleScheduler::new(TimeDelta::zero()).with_clock(false, Some("en".into()));
        let list = s.candidates(&local(23, 15), Anchor::Bedtime);
        assert_eq!(list[5].display, "12:45");
        assert_eq!(list[0].display, "08:15");
    }

    #[test]
    fn rtl_display_is_marked() {
        let s = CycleScheduler::new(TimeDelta::zero()).with_clock(true, Some("ar".into()));
        let list = s.candidates(&local(22, 0), Anchor::Bedtime);
        assert_eq!(list[5].display, "\u{200E}23:30");
    }

    #[test]
    fn negative_latency_counts_as_zero() {
        let s = CycleScheduler::new(TimeDelta::minutes(-30));
        assert_eq!(s.latency(), TimeDelta::zero());
    }

    #[test]
    fn plan_requires_reference_time() {
        let s = scheduler(0);
        assert!(s.plan::<FixedOffset>(None, &tz()).is_empty());
        assert!(s.plan(Some(&CycleParams::default()), &tz()).is_empty());
    }

    #[test]
    fn plan_defaults_to_wake_anchor() {
        let s = scheduler(0);
        let params = CycleParams {
            time: Some(local(7, 0).timestamp_millis()),
            is_start: None,
        };
        let list = s.plan(Some(&params), &tz());
        assert_eq!(list[5].at, local(5, 30));

        let bed = CycleParams::new(&local(23, 0), Anchor::Bedtime);
        assert_eq!(s.plan(Some(&bed), &tz())[5].at.hour(), 0);
    }

    #[test]
    fn params_use_camel_case() {
        let params: CycleParams = serde_json::from_str(r#"{"time": 0, "isStart": true}"#).unwrap();
        assert_eq!(params.is_start, Some(true));
    }

    #[test]
    fn quick_paths_ignore_latency() {
        let s = scheduler(20);
        let now = local(13, 10);
        let wake = s.sleep_now(&now);
        assert_eq!(wake.cycles, 1);
        assert_eq!(wake.at, local(14, 40));
        assert_eq!(s.power_nap(&now), local(13, 40));
    }

    #[test]
    fn header_key_follows_anchor() {
        assert_eq!(Anchor::Bedtime.header_key(), keys::CYCLE_WAKE_UP_AT);
        assert_eq!(Anchor::WakeTime.header_key(), keys::CYCLE_GO_TO_BED_AT);
    }

    proptest! {
        #[test]
        fn candidates_are_evenly_spaced(
            secs in 0i64..4_000_000_000,
            latency in 0i64..120,
            bedtime in any::<bool>(),
        ) {
            let reference = Utc.timestamp_opt(secs, 0).unwrap();
            let anchor = Anchor::from_is_start(bedtime);
            let list = scheduler(latency).candidates(&reference, anchor);
            prop_assert_eq!(list.len(), 6);
            for pair in list.windows(2) {
                let gap = (pair[0].at - pair[1].at).num_minutes().abs();
                prop_assert_eq!(gap, 90);
                prop_assert_eq!(pair[0].cycles, pair[1].cycles + 1);
            }
            let one = &list[5];
            let offset = (one.at - reference).num_minutes();
            let expected = 90 + latency;
            prop_assert_eq!(offset, if bedtime { expected } else { -expected });
        }
    }
}
