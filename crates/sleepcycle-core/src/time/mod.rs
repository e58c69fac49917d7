//! Date arithmetic and locale-aware rendering.
//!
//! Everything here is pure: no clock reads except in the `*_now` helpers,
//! no I/O, and no panics on out-of-range input.

mod format;
mod math;

pub use format::{
    alarm_time_label, format_hour, format_number, format_time, NumberFormatOptions, LRM,
};
pub use math::{
    add_hours, current_month_range, default_report_filter, months_before, months_before_now,
    DEFAULT_MONTH_COUNT, MS_PER_HOUR,
};
