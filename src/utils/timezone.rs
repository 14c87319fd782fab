use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Render a ledger timestamp as RFC3339 in the given timezone
pub fn to_display(timestamp: DateTime<Utc>, tz: Tz) -> String {
    timestamp.with_timezone(&tz).to_rfc3339()
}

/// Get current time in the given timezone as RFC3339 string
pub fn display_now(tz: Tz) -> String {
    to_display(Utc::now(), tz)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Asia::Kolkata;

    #[test]
    fn test_india_offset() {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(to_display(base, Kolkata), "2024-01-01T05:30:00+05:30");
    }

    #[test]
    fn test_display_now_carries_offset() {
        assert!(display_now(Kolkata).ends_with("+05:30"));
        assert!(display_now(chrono_tz::UTC).ends_with("+00:00"));
    }
}
