//! Duration formatting.

/// Formats whole seconds as `HH:MM:SS`.
///
/// Hours are zero-padded to two digits but never wrap, so 100 hours renders
/// as `100:00:00`. Negative input renders as `00:00:00`.
pub fn format_hms(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_zero() {
        assert_eq!(format_hms(0), "00:00:00");
    }

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_hms(125), "00:02:05");
        assert_eq!(format_hms(3599), "00:59:59");
    }

    #[test]
    fn formats_hours() {
        assert_eq!(format_hms(3600), "01:00:00");
        assert_eq!(format_hms(9 * 3600 + 30 * 60 + 1), "09:30:01");
    }

    #[test]
    fn hours_are_unbounded() {
        assert_eq!(format_hms(100 * 3600), "100:00:00");
        assert_eq!(format_hms(1_000 * 3600 + 59), "1000:00:59");
    }

    #[test]
    fn negative_is_zero() {
        assert_eq!(format_hms(-1), "00:00:00");
        assert_eq!(format_hms(-3600), "00:00:00");
    }
}
