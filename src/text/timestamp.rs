//! Human-readable durations for recording timers.

/// Format `secs` as `MM:SS`, or `HH:MM:SS` once the duration reaches an hour.
///
/// Fractional seconds are truncated; negative or non-finite input is treated
/// as zero.
///
/// ```rust
/// use phono_coach::text::format_timestamp;
///
/// assert_eq!(format_timestamp(5.9), "00:05");
/// assert_eq!(format_timestamp(3_725.0), "01:02:05");
/// ```
pub fn format_timestamp(secs: f64) -> String {
    let total = if secs.is_finite() && secs > 0.0 {
        secs as u64
    } else {
        0
    };

    let hours = total / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero() {
        assert_eq!(format_timestamp(0.0), "00:00");
    }

    #[test]
    fn under_a_minute_truncates_fraction() {
        assert_eq!(format_timestamp(59.99), "00:59");
    }

    #[test]
    fn minutes_and_seconds() {
        assert_eq!(format_timestamp(754.0), "12:34");
    }

    #[test]
    fn hours_prefix_only_when_needed() {
        assert_eq!(format_timestamp(3_599.0), "59:59");
        assert_eq!(format_timestamp(3_600.0), "01:00:00");
    }

    #[test]
    fn negative_and_nan_are_zero() {
        assert_eq!(format_timestamp(-4.0), "00:00");
        assert_eq!(format_timestamp(f64::NAN), "00:00");
    }
}
