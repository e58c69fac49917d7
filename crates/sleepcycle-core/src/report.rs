//! Cycle statistics over a slice of sleep history
//!
//! Only events that carry a cycle count contribute. An empty selection
//! reports a single zero so charts always have a point to draw.

use serde::{Deserialize, Serialize};

use crate::store::SleepEvent;
use crate::time::{format_number, NumberFormatOptions};

/// Summary shown on the reports screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepReport {
    /// Events in the selection, with or without a cycle count.
    pub events: usize,
    /// Events that contributed a cycle count.
    pub counted: usize,
    /// Cycle counts in history order; `[0.0]` when none were found.
    pub series: Vec<f64>,
    pub average: f64,
    pub median: f64,
}

impl SleepReport {
    pub fn from_events(events: &[SleepEvent]) -> Self {
        let mut series: Vec<f64> = events
            .iter()
            .filter_map(|e| e.cycle)
            .map(f64::from)
            .collect();
        let counted = series.len();
        if series.is_empty() {
            series.push(0.0);
        }
        Self {
            events: events.len(),
            counted,
            average: average(&series),
            median: median(&series),
            series,
        }
    }

    pub fn average_label(&self) -> String {
        format!("{:.2}", self.average)
    }

    pub fn median_label(&self) -> String {
        format!("{:.2}", self.median)
    }

    /// Two-decimal rendering of `value` with the separators of `locale`.
    pub fn localized(value: f64, locale: Option<&str>) -> String {
        format_number(
            value,
            locale,
            NumberFormatOptions {
                minimum_fraction_digits: Some(2),
                maximum_fraction_digits: Some(2),
            },
        )
    }
}

fn average(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SleepType;
    use chrono::{TimeZone, Utc};

    fn events(cycles: &[Option<u32>]) -> Vec<SleepEvent> {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 22, 0, 0).unwrap();
        cycles
            .iter()
            .map(|c| {
                let kind = if c.is_some() { SleepType::Sleep } else { SleepType::PowerNap };
                SleepEvent::new(kind, start, start).with_cycle(*c)
            })
            .collect()
    }

    #[test]
    fn empty_selection_reports_zero() {
        let report = SleepReport::from_events(&[]);
        assert_eq!(report.series, vec![0.0]);
        assert_eq!(report.average_label(), "0.00");
        assert_eq!(report.median_label(), "0.00");
        assert_eq!(report.counted, 0);

        let naps_only = SleepReport::from_events(&events(&[None, None]));
        assert_eq!(naps_only.series, vec![0.0]);
        assert_eq!(naps_only.counted, 0);
    }

    #[test]
    fn naps_without_cycles_are_skipped() {
        let report = SleepReport::from_events(&events(&[Some(5), None, Some(6), Some(4)]));
        assert_eq!(report.events, 4);
        assert_eq!(report.series, vec![5.0, 6.0, 4.0]);
        assert_eq!(report.average, 5.0);
        assert_eq!(report.median, 5.0);
        assert_eq!(report.counted, 3);
    }

    #[test]
    fn even_series_median_is_midpoint() {
        let report = SleepReport::from_events(&events(&[Some(6), Some(1), Some(4), Some(5)]));
        assert_eq!(report.median, 4.5);
        assert_eq!(report.average_label(), "4.00");
    }

    #[test]
    fn localized_uses_locale_separators() {
        assert_eq!(SleepReport::localized(4.5, Some("de")), "4,50");
        assert_eq!(SleepReport::localized(4.5, Some("en")), "4.50");
    }
}
