//! Helpers for times of day stored as `HHmm` integers (930 = 9:30).

/// Returns true for `0..=2359` with minutes below 60.
pub fn is_valid_hhmm(value: i32) -> bool {
    (0..=2359).contains(&value) && value % 100 < 60
}

/// Formats an `HHmm` value on a 12-hour clock, e.g. `1330` -> `1:30 PM`.
pub fn format_hhmm(value: i32) -> String {
    let hours = value / 100;
    let minutes = value % 100;
    let (display_hour, meridiem) = match hours {
        0 => (12, "AM"),
        1..=11 => (hours, "AM"),
        12 => (12, "PM"),
        _ => (hours - 12, "PM"),
    };
    format!("{}:{:02} {}", display_hour, minutes, meridiem)
}

/// `9:00 AM - 11:00 AM`
pub fn format_range(start: i32, end: i32) -> String {
    format!("{} - {}", format_hhmm(start), format_hhmm(end))
}
