use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};

use crate::store::SleepFilter;

pub const MS_PER_HOUR: f64 = 3_600_000.0;

/// Month count used by [`months_before_now`] when none is given.
pub const DEFAULT_MONTH_COUNT: i32 = 1;

/// Offset `instant` by a possibly fractional, possibly negative number of hours.
///
/// Sub-millisecond remainders are truncated. An offset that leaves chrono's
/// representable range returns `instant` unchanged.
pub fn add_hours<Tz: TimeZone>(instant: &DateTime<Tz>, hours: f64) -> DateTime<Tz> {
    let ms = (hours * MS_PER_HOUR).trunc() as i64;
    TimeDelta::try_milliseconds(ms)
        .and_then(|delta| instant.clone().checked_add_signed(delta))
        .unwrap_or_else(|| {
            tracing::warn!(hours, "hour offset out of range, keeping instant");
            instant.clone()
        })
}

/// Local midnight on the first day of the month `month_count` months before
/// `instant`'s month.
///
/// `month_count = 0` is the first of the current month; negative counts move
/// forward. Year boundaries roll over in both directions.
pub fn months_before<Tz: TimeZone>(instant: &DateTime<Tz>, month_count: i32) -> DateTime<Tz> {
    let local = instant.naive_local();
    let total = i64::from(local.year()) * 12 + i64::from(local.month0()) - i64::from(month_count);
    let year = i32::try_from(total.div_euclid(12)).ok();
    let month = total.rem_euclid(12) as u32 + 1;

    let Some(first) = year.and_then(|y| NaiveDate::from_ymd_opt(y, month, 1)) else {
        tracing::warn!(month_count, "month offset out of range, keeping instant");
        return instant.clone();
    };
    let midnight = first.and_time(NaiveTime::MIN);
    let tz = instant.timezone();
    // Midnight can fall in a DST gap; take the earliest valid mapping.
    tz.from_local_datetime(&midnight)
        .earliest()
        .unwrap_or_else(|| tz.from_utc_datetime(&midnight))
}

/// [`months_before`] against the local clock, defaulting to one month.
pub fn months_before_now(month_count: Option<i32>) -> DateTime<Local> {
    months_before(&Local::now(), month_count.unwrap_or(DEFAULT_MONTH_COUNT))
}

/// From the first of `now`'s month up to `now`.
pub fn current_month_range<Tz: TimeZone>(now: &DateTime<Tz>) -> SleepFilter {
    SleepFilter {
        start: Some(months_before(now, 0).with_timezone(&Utc)),
        end: Some(now.with_timezone(&Utc)),
    }
}

/// The report window used when the user has not picked one: the first of
/// last month up to the first of this month.
pub fn default_report_filter<Tz: TimeZone>(now: &DateTime<Tz>) -> SleepFilter {
    SleepFilter {
        start: Some(months_before(now, DEFAULT_MONTH_COUNT).with_timezone(&Utc)),
        end: Some(months_before(now, 0).with_timezone(&Utc)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Timelike};
    use proptest::prelude::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(3 * 3600)
            .unwrap()
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .unwrap()
    }

    #[test]
    fn add_hours_handles_fractions_and_negatives() {
        let t = at(2024, 1, 15, 23, 0);
        assert_eq!(add_hours(&t, 1.5), at(2024, 1, 16, 0, 30));
        assert_eq!(add_hours(&t, -0.25), at(2024, 1, 15, 22, 45));
        assert_eq!(add_hours(&t, 0.0), t);
    }

    #[test]
    fn add_hours_out_of_range_keeps_instant() {
        let t = at(2024, 1, 15, 23, 0);
        assert_eq!(add_hours(&t, 1e15), t);
        assert_eq!(add_hours(&t, f64::NAN), t);
    }

    #[test]
    fn months_before_rolls_over_january() {
        let first = months_before(&at(2024, 1, 20, 10, 30), 1);
        assert_eq!((first.year(), first.month(), first.day()), (2023, 12, 1));
        assert_eq!((first.hour(), first.minute()), (0, 0));
    }

    #[test]
    fn months_before_zero_is_current_month() {
        let first = months_before(&at(2024, 3, 31, 23, 59), 0);
        assert_eq!((first.year(), first.month(), first.day()), (2024, 3, 1));
    }

    #[test]
    fn months_before_negative_moves_forward() {
        let first = months_before(&at(2024, 11, 5, 8, 0), -3);
        assert_eq!((first.year(), first.month(), first.day()), (2025, 2, 1));
    }

    #[test]
    fn months_before_spans_multiple_years() {
        let first = months_before(&at(2024, 2, 10, 8, 0), 26);
        assert_eq!((first.year(), first.month()), (2021, 12));
    }

    #[test]
    fn months_before_keeps_timezone() {
        let first = months_before(&at(2024, 5, 10, 1, 0), 1);
        assert_eq!(first.offset().local_minus_utc(), 3 * 3600);
    }

    #[test]
    fn months_before_now_defaults_to_last_month() {
        let before = Local::now();
        let first = months_before_now(None);
        let after = Local::now();

        assert_eq!(first.day(), 1);
        assert!(first < before);
        assert!(first == months_before(&before, 1) || first == months_before(&after, 1));

        let current = months_before_now(Some(0));
        assert_eq!(current.day(), 1);
        assert!(current == months_before(&before, 0) || current == months_before(&Local::now(), 0));
    }

    #[test]
    fn current_month_range_starts_on_the_first() {
        let now = at(2024, 6, 18, 12, 0);
        let range = current_month_range(&now);
        assert_eq!(range.start, Some(at(2024, 6, 1, 0, 0).with_timezone(&Utc)));
        assert_eq!(range.end, Some(now.with_timezone(&Utc)));
    }

    #[test]
    fn default_report_filter_covers_last_month() {
        let range = default_report_filter(&at(2024, 1, 18, 12, 0));
        assert_eq!(range.start, Some(at(2023, 12, 1, 0, 0).with_timezone(&Utc)));
        assert_eq!(range.end, Some(at(2024, 1, 1, 0, 0).with_timezone(&Utc)));
    }

    proptest! {
        #[test]
        fn one_month_before_is_previous_month_first(
            year in 1900i32..2200,
            month in 1u32..=12,
            day in 1u32..=28,
            hour in 0u32..24,
        ) {
            let first = months_before(&at(year, month, day, hour, 0), 1);
            let (want_year, want_month) = if month == 1 { (year - 1, 12) } else { (year, month - 1) };
            prop_assert_eq!(first.day(), 1);
            prop_assert_eq!(first.month(), want_month);
            prop_assert_eq!(first.year(), want_year);
        }

        #[test]
        fn add_hours_tracks_whole_minutes(minutes in -100_000i64..100_000) {
            let t = at(2024, 1, 15, 23, 0);
            let shifted = add_hours(&t, minutes as f64 / 60.0);
            let drift = (shifted - t).num_milliseconds() - minutes * 60_000;
            prop_assert!(drift.abs() <= 1, "drift {}ms", drift);
        }
    }
}
