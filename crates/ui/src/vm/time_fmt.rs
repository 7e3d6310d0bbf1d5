use chrono::{DateTime, Utc};
use practice_core::time::format_elapsed;

/// Placeholder for values a stored row did not carry.
pub const MISSING_VALUE: &str = "-";

#[must_use]
pub fn format_datetime(value: DateTime<Utc>) -> String {
    value.format("%Y-%m-%d %H:%M").to_string()
}

/// Label for the running clock, e.g. `Time: 03:07`.
#[must_use]
pub fn format_timer(seconds: u32) -> String {
    format!("Time: {}", format_elapsed(seconds))
}

#[must_use]
pub fn format_duration(seconds: Option<u32>) -> String {
    seconds.map_or_else(|| MISSING_VALUE.to_string(), format_elapsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use practice_core::time::fixed_now;

    #[test]
    fn timer_label_is_zero_padded() {
        assert_eq!(format_timer(0), "Time: 00:00");
        assert_eq!(format_timer(187), "Time: 03:07");
    }

    #[test]
    fn datetime_is_minute_precision() {
        assert_eq!(format_datetime(fixed_now()), "2023-11-14 22:13");
    }

    #[test]
    fn missing_duration_uses_placeholder() {
        assert_eq!(format_duration(None), "-");
        assert_eq!(format_duration(Some(61)), "01:01");
    }
}
