//! Time formatting helpers

use std::time::Duration;

use crate::domain::model::TimeSpec;

/// Format a duration as HH:MM:SS, dropping sub-second precision
pub fn format_duration(duration: Duration) -> String {
    TimeSpec::from_seconds(duration.as_secs()).format_hms()
}

/// Format probed seconds as HH:MM:SS.mmm
pub fn format_seconds_precise(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let whole = seconds.trunc() as u64;
    let millis = ((seconds - seconds.trunc()) * 1000.0).round() as u64;
    let (whole, millis) = if millis >= 1000 {
        (whole + 1, 0)
    } else {
        (whole, millis)
    };
    format!("{}.{:03}", TimeSpec::from_seconds(whole).format_hms(), millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(0)), "00:00:00");
        assert_eq!(format_duration(Duration::from_millis(3_725_900)), "01:02:05");
    }

    #[test]
    fn test_format_seconds_precise() {
        assert_eq!(format_seconds_precise(90.5), "00:01:30.500");
        assert_eq!(format_seconds_precise(59.9996), "00:01:00.000");
        assert_eq!(format_seconds_precise(-3.0), "00:00:00.000");
    }
}
