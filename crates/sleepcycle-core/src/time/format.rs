use std::fmt::Display;

use chrono::{DateTime, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

use crate::i18n::{is_rtl, language_code_of};

/// U+200E LEFT-TO-RIGHT MARK.
pub const LRM: char = '\u{200E}';

/// Render the wall-clock time of `instant` as `HH:mm` or `hh:mm`.
///
/// The 12-hour form has no AM/PM suffix. In right-to-left locales the
/// string is prefixed with [`LRM`] so the digit pair is not reordered.
pub fn format_time<Tz>(instant: &DateTime<Tz>, use_24_hour: bool, locale: Option<&str>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let pattern = if use_24_hour { "%H:%M" } else { "%I:%M" };
    let time = instant.format(pattern).to_string();
    match locale.and_then(language_code_of) {
        Some(code) if is_rtl(&code) => format!("{LRM}{time}"),
        _ => time,
    }
}

/// Two-digit hour, converted to the 12-hour clock unless `use_24_hour`.
pub fn format_hour(hour: u32, use_24_hour: bool) -> String {
    if use_24_hour {
        return format!("{hour:02}");
    }
    let twelve = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{twelve:02}")
}

/// `H:MM` with an unpadded hour, as shown in the alarm confirmation.
pub fn alarm_time_label<Tz: TimeZone>(instant: &DateTime<Tz>) -> String {
    format!("{}:{:02}", instant.hour(), instant.minute())
}

/// Fraction digit bounds for [`format_number`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberFormatOptions {
    pub minimum_fraction_digits: Option<u8>,
    pub maximum_fraction_digits: Option<u8>,
}

const DEFAULT_MAX_FRACTION_DIGITS: usize = 3;
const FRACTION_DIGIT_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Grouping {
    /// Groups of three.
    Thousands,
    /// Three, then twos (lakh/crore).
    Indian,
}

#[derive(Debug, Clone, Copy)]
struct NumberSymbols {
    group: &'static str,
    decimal: &'static str,
    grouping: Grouping,
    /// Integer digits required before grouping kicks in is this plus three.
    min_grouping_digits: usize,
    digits: Option<[char; 10]>,
}

const ARABIC_INDIC: [char; 10] = ['٠', '١', '٢', '٣', '٤', '٥', '٦', '٧', '٨', '٩'];

impl NumberSymbols {
    const fn new(group: &'static str, decimal: &'static str) -> Self {
        Self {
            group,
            decimal,
            grouping: Grouping::Thousands,
            min_grouping_digits: 1,
            digits: None,
        }
    }

    fn for_locale(locale: &str) -> Option<Self> {
        let code = language_code_of(locale)?;
        let symbols = match code.as_str() {
            "en" | "ur" | "he" => Self::new(",", "."),
            "tr" | "de" | "az" => Self::new(".", ","),
            "fr" => Self::new("\u{202F}", ","),
            "uz" | "ru" => Self::new("\u{A0}", ","),
            "es" => Self {
                min_grouping_digits: 2,
                ..Self::new(".", ",")
            },
            "hi" => Self {
                grouping: Grouping::Indian,
                ..Self::new(",", ".")
            },
            "ar" => Self {
                digits: Some(ARABIC_INDIC),
                ..Self::new("\u{66C}", "\u{66B}")
            },
            _ => return None,
        };
        Some(symbols)
    }

    fn group_integer(&self, int: &str) -> String {
        if int.len() < 3 + self.min_grouping_digits {
            return int.to_string();
        }
        let (head, tail) = int.split_at(int.len() - 3);
        let mut groups: Vec<&str> = Vec::new();
        let step = match self.grouping {
            Grouping::Thousands => 3,
            Grouping::Indian => 2,
        };
        let mut end = head.len();
        while end > 0 {
            let start = end.saturating_sub(step);
            groups.push(&head[start..end]);
            end = start;
        }
        groups.reverse();
        groups.push(tail);
        groups.join(self.group)
    }

    fn localize_digits(&self, text: &str) -> String {
        match self.digits {
            Some(map) => text
                .chars()
                .map(|c| c.to_digit(10).map_or(c, |d| map[d as usize]))
                .collect(),
            None => text.to_string(),
        }
    }
}

/// Locale-aware decimal formatting.
///
/// Without a locale, or whenever the locale or options cannot be honoured,
/// falls back to the plain decimal rendering of `value`. Never panics.
pub fn format_number(value: f64, locale: Option<&str>, options: NumberFormatOptions) -> String {
    let plain = || value.to_string();
    let Some(locale) = locale else {
        return plain();
    };
    if !value.is_finite() {
        return plain();
    }
    let Some(symbols) = NumberSymbols::for_locale(locale) else {
        tracing::debug!(locale, "no number symbols for locale, using plain format");
        return plain();
    };
    let Some((min, max)) = fraction_bounds(options) else {
        tracing::debug!(?options, "inconsistent fraction digits, using plain format");
        return plain();
    };

    let (int, frac) = round_decimal(&value.abs().to_string(), min, max);
    let mut out = String::new();
    if value.is_sign_negative() && (int.bytes().any(|b| b != b'0') || frac.bytes().any(|b| b != b'0')) {
        out.push('-');
    }
    out.push_str(&symbols.group_integer(&int));
    if !frac.is_empty() {
        out.push_str(symbols.decimal);
        out.push_str(&frac);
    }
    symbols.localize_digits(&out)
}

fn fraction_bounds(options: NumberFormatOptions) -> Option<(usize, usize)> {
    let min = options.minimum_fraction_digits.map(usize::from);
    let max = options.maximum_fraction_digits.map(usize::from);
    let (min, max) = match (min, max) {
        (Some(min), Some(max)) if max < min => return None,
        (Some(min), Some(max)) => (min, max),
        (Some(min), None) => (min, min.max(DEFAULT_MAX_FRACTION_DIGITS)),
        (None, Some(max)) => (0, max),
        (None, None) => (0, DEFAULT_MAX_FRACTION_DIGITS),
    };
    (max <= FRACTION_DIGIT_LIMIT).then_some((min, max))
}

/// Round a non-negative plain decimal string half away from zero to at most
/// `max` fraction digits, keeping at least `min`.
fn round_decimal(plain: &str, min: usize, max: usize) -> (String, String) {
    let (int, frac) = plain.split_once('.').unwrap_or((plain, ""));
    let mut digits: Vec<u8> = int.bytes().chain(frac.bytes().take(max)).collect();
    let round_up = frac.as_bytes().get(max).is_some_and(|d| *d >= b'5');
    let mut int_len = int.len();

    if round_up {
        let mut i = digits.len();
        loop {
            if i == 0 {
                digits.insert(0, b'1');
                int_len += 1;
                break;
            }
            i -= 1;
            if digits[i] == b'9' {
                digits[i] = b'0';
            } else {
                digits[i] += 1;
                break;
            }
        }
    }

    let (int_digits, frac_digits) = digits.split_at(int_len);
    let mut frac_out: Vec<u8> = frac_digits.to_vec();
    while frac_out.len() > min && frac_out.last() == Some(&b'0') {
        frac_out.pop();
    }
    while frac_out.len() < min {
        frac_out.push(b'0');
    }
    (
        String::from_utf8_lossy(int_digits).into_owned(),
        String::from_utf8_lossy(&frac_out).into_owned(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    fn two_fraction() -> NumberFormatOptions {
        NumberFormatOptions {
            minimum_fraction_digits: Some(2),
            maximum_fraction_digits: Some(2),
        }
    }

    #[test]
    fn format_time_twelve_hour_in_arabic_has_lrm() {
        let t = Utc.with_ymd_and_hms(2024, 1, 15, 14, 5, 0).unwrap();
        let rendered = format_time(&t, false, Some("ar"));
        assert!(rendered.starts_with(LRM));
        assert_eq!(rendered, "\u{200E}02:05");
    }

    #[test]
    fn format_time_twenty_four_hour_without_locale() {
        let t = Utc.with_ymd_and_hms(2024, 1, 15, 14, 5, 0).unwrap();
        assert_eq!(format_time(&t, true, None), "14:05");
        assert_eq!(format_time(&t, true, Some("de")), "14:05");
    }

    #[test]
    fn format_time_midnight_and_noon_in_twelve_hour() {
        let midnight = Utc.with_ymd_and_hms(2024, 1, 15, 0, 30, 0).unwrap();
        let noon = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        assert_eq!(format_time(&midnight, false, Some("en")), "12:30");
        assert_eq!(format_time(&noon, false, None), "12:00");
    }

    #[test]
    fn format_time_uses_instant_offset() {
        let tz = FixedOffset::east_opt(5 * 3600).unwrap();
        let t = Utc
            .with_ymd_and_hms(2024, 1, 15, 20, 0, 0)
            .unwrap()
            .with_timezone(&tz);
        assert_eq!(format_time(&t, true, Some("he-IL")), "\u{200E}01:00");
    }

    #[test]
    fn format_hour_pads_and_wraps() {
        assert_eq!(format_hour(0, false), "12");
        assert_eq!(format_hour(13, false), "01");
        assert_eq!(format_hour(7, true), "07");
        assert_eq!(format_hour(23, true), "23");
    }

    #[test]
    fn alarm_time_label_has_unpadded_hour() {
        let t = Utc.with_ymd_and_hms(2024, 1, 15, 7, 5, 0).unwrap();
        assert_eq!(alarm_time_label(&t), "7:05");
    }

    #[test]
    fn format_number_without_locale_is_plain() {
        assert_eq!(format_number(1234.5, None, NumberFormatOptions::default()), "1234.5");
        assert_eq!(format_number(3.0, None, two_fraction()), "3");
    }

    #[test]
    fn format_number_groups_per_locale() {
        let opts = NumberFormatOptions::default();
        assert_eq!(format_number(1234567.891, Some("en"), opts), "1,234,567.891");
        assert_eq!(format_number(1234567.891, Some("de"), opts), "1.234.567,891");
        assert_eq!(format_number(1234567.0, Some("ru"), opts), "1\u{A0}234\u{A0}567");
        assert_eq!(format_number(1234567.0, Some("hi"), opts), "12,34,567");
    }

    #[test]
    fn format_number_spanish_skips_four_digit_grouping() {
        let opts = NumberFormatOptions::default();
        assert_eq!(format_number(1234.0, Some("es"), opts), "1234");
        assert_eq!(format_number(12345.0, Some("es"), opts), "12.345");
    }

    #[test]
    fn format_number_arabic_uses_arabic_indic_digits() {
        assert_eq!(format_number(1234.5, Some("ar"), two_fraction()), "١٬٢٣٤٫٥٠");
    }

    #[test]
    fn format_number_rounds_half_away_from_zero() {
        let opts = two_fraction();
        assert_eq!(format_number(2.345, Some("en"), opts), "2.35");
        assert_eq!(format_number(9.999, Some("en"), opts), "10.00");
        assert_eq!(format_number(-0.001, Some("en"), opts), "0.00");
        assert_eq!(format_number(-1.5, Some("en"), NumberFormatOptions::default()), "-1.5");
    }

    #[test]
    fn format_number_falls_back_instead_of_failing() {
        let bad = NumberFormatOptions {
            minimum_fraction_digits: Some(3),
            maximum_fraction_digits: Some(1),
        };
        assert_eq!(format_number(1.25, Some("en"), bad), "1.25");
        assert_eq!(format_number(1.25, Some("xx"), two_fraction()), "1.25");
        assert_eq!(format_number(f64::NAN, Some("en"), two_fraction()), "NaN");
        let huge = NumberFormatOptions {
            minimum_fraction_digits: None,
            maximum_fraction_digits: Some(50),
        };
        assert_eq!(format_number(1.25, Some("en"), huge), "1.25");
    }
}
