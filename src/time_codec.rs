//! Conversions between player clock strings (`M:SS`, `H:MM:SS`) and whole seconds.
//!
//! Every timing probe funnels its output through these helpers so a snapshot
//! renders the same text no matter which page surface supplied the numbers.

const ZERO_DISPLAY: &str = "0:00";

/// Renders a second count as canonical `M:SS`.
///
/// Non-finite and negative inputs render as `0:00`. Hours are never emitted;
/// long durations keep counting minutes (`75:00`).
pub fn seconds_to_display(total_seconds: f64) -> String {
    if !total_seconds.is_finite() || total_seconds < 0.0 {
        return ZERO_DISPLAY.to_string();
    }
    let minutes = (total_seconds / 60.0).floor();
    let seconds = (total_seconds % 60.0).floor();
    format!("{}:{:02}", minutes as u64, seconds as u64)
}

/// Integer form of [`seconds_to_display`].
pub fn format_seconds(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

enum Field {
    Whole(u64),
    Fraction(f64),
}

impl Field {
    fn as_f64(&self) -> f64 {
        match self {
            Field::Whole(value) => *value as f64,
            Field::Fraction(value) => *value,
        }
    }
}

fn parse_field(field: &str) -> Option<Field> {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(whole) = trimmed.parse::<u64>() {
        return Some(Field::Whole(whole));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .map(Field::Fraction)
}

/// Parses `M:SS` or `H:MM:SS` into whole seconds.
///
/// Returns `0` for anything it cannot read: a missing separator, an empty or
/// non-numeric field, an unsupported field count, or a total that does not
/// fit in `u64`. Whole-number fields are combined exactly; fractional totals
/// are floored and negative totals clamp to zero.
pub fn display_to_seconds(text: &str) -> u64 {
    if !text.contains(':') {
        return 0;
    }
    let Some(fields) = text.split(':').map(parse_field).collect::<Option<Vec<_>>>() else {
        return 0;
    };
    let weights: &[u64] = match fields.len() {
        2 => &[60, 1],
        3 => &[3_600, 60, 1],
        _ => return 0,
    };

    let whole: Option<Vec<u64>> = fields
        .iter()
        .map(|field| match field {
            Field::Whole(value) => Some(*value),
            Field::Fraction(_) => None,
        })
        .collect();
    if let Some(whole) = whole {
        return whole
            .iter()
            .zip(weights)
            .try_fold(0u64, |total, (value, weight)| {
                value
                    .checked_mul(*weight)
                    .and_then(|part| total.checked_add(part))
            })
            .unwrap_or(0);
    }

    let total: f64 = fields
        .iter()
        .zip(weights)
        .map(|(field, weight)| field.as_f64() * *weight as f64)
        .sum();
    if total > 0.0 && total < u64::MAX as f64 {
        total.floor() as u64
    } else {
        0
    }
}

/// Re-renders an arbitrary clock string in canonical `M:SS` form.
///
/// Three-field input folds its hours into minutes. Seconds overflowing a
/// minute (`1:75`) carry into the minute field, so the result always matches
/// re-encoding [`display_to_seconds`] of the same text.
pub fn normalize_display(text: &str) -> String {
    format_seconds(display_to_seconds(text))
}

#[cfg(test)]
mod tests {
    use super::{display_to_seconds, format_seconds, normalize_display, seconds_to_display};

    #[test]
    fn test_seconds_to_display_pads_seconds_but_not_minutes() {
        assert_eq!(seconds_to_display(0.0), "0:00");
        assert_eq!(seconds_to_display(7.0), "0:07");
        assert_eq!(seconds_to_display(187.0), "3:07");
        assert_eq!(seconds_to_display(600.0), "10:00");
    }

    #[test]
    fn test_seconds_to_display_never_emits_hours() {
        assert_eq!(seconds_to_display(3723.0), "62:03");
        assert_eq!(format_seconds(36_000), "600:00");
    }

    #[test]
    fn test_seconds_to_display_rejects_non_finite_and_negative() {
        assert_eq!(seconds_to_display(f64::NAN), "0:00");
        assert_eq!(seconds_to_display(f64::INFINITY), "0:00");
        assert_eq!(seconds_to_display(-4.0), "0:00");
    }

    #[test]
    fn test_seconds_to_display_floors_fractional_input() {
        assert_eq!(seconds_to_display(62.9), "1:02");
        assert_eq!(seconds_to_display(59.999), "0:59");
    }

    #[test]
    fn test_display_to_seconds_reads_two_and_three_field_forms() {
        assert_eq!(display_to_seconds("3:07"), 187);
        assert_eq!(display_to_seconds("1:02:03"), 3723);
        assert_eq!(display_to_seconds(" 0:59 "), 59);
    }

    #[test]
    fn test_display_to_seconds_returns_zero_for_unreadable_text() {
        assert_eq!(display_to_seconds(""), 0);
        assert_eq!(display_to_seconds("187"), 0);
        assert_eq!(display_to_seconds("a:07"), 0);
        assert_eq!(display_to_seconds("3:"), 0);
        assert_eq!(display_to_seconds("1:2:3:4"), 0);
        assert_eq!(display_to_seconds("-1:30"), 0);
    }

    #[test]
    fn test_round_trip_holds_for_sub_hour_and_long_durations() {
        for seconds in 0..10_000u64 {
            assert_eq!(display_to_seconds(&format_seconds(seconds)), seconds);
        }
        for seconds in [86_399u64, 360_000, 9_999_999, (1 << 53) + 1, u64::MAX] {
            assert_eq!(display_to_seconds(&format_seconds(seconds)), seconds);
        }
    }

    #[test]
    fn test_display_to_seconds_overflow_and_fractions() {
        assert_eq!(display_to_seconds("307445734561825861:00"), 0);
        assert_eq!(display_to_seconds("5124095576030432:00:00"), 0);
        assert_eq!(display_to_seconds("99999999999999999999:00"), 0);
        assert_eq!(display_to_seconds("1:02.9"), 62);
        assert_eq!(display_to_seconds("0.5:00"), 30);
    }

    #[test]
    fn test_format_seconds_matches_float_rendering() {
        for seconds in [0u64, 1, 59, 60, 61, 3599, 3600, 7384] {
            assert_eq!(format_seconds(seconds), seconds_to_display(seconds as f64));
        }
    }

    #[test]
    fn test_normalize_display_canonicalizes_padding_and_hours() {
        assert_eq!(normalize_display("1:02"), "1:02");
        assert_eq!(normalize_display("01:2"), "1:02");
        assert_eq!(normalize_display("1:02:03"), "62:03");
        assert_eq!(normalize_display("0:00:09"), "0:09");
        assert_eq!(normalize_display("garbage"), "0:00");
    }

    #[test]
    fn test_normalize_display_is_idempotent() {
        for text in ["3:07", "03:7", "1:02:03", "1:75", "0:0", "12:34:56", "bad"] {
            let once = normalize_display(text);
            assert_eq!(normalize_display(&once), once, "input {text}");
        }
    }
}
