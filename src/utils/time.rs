//! Time formatting helpers for stats lines

use std::time::Duration;

/// Format seconds as `HH:MM:SS`, rounded to the nearest second
pub fn format_hms(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.round() as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

/// `HH:MM:SS (12.34s)` as used by stats lines
pub fn format_elapsed(elapsed: Duration) -> String {
    let seconds = elapsed.as_secs_f64();
    format!("{} ({:.2}s)", format_hms(seconds), seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_hms() {
        assert_eq!(format_hms(0.0), "00:00:00");
        assert_eq!(format_hms(59.6), "00:01:00");
        assert_eq!(format_hms(3723.0), "01:02:03");
        assert_eq!(format_hms(-4.0), "00:00:00");
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_millis(90_250)), "00:01:30 (90.25s)");
    }
}
