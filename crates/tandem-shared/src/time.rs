//! Human-readable timestamp formatting for presence badges and
//! conversation previews.

use chrono::{DateTime, Utc};

/// Render a relative "last seen" string.
///
/// Buckets: under a minute is "just now", under an hour counts minutes,
/// under a day counts hours, anything older renders as a calendar date.
/// The comparisons are strict, so exactly 60 seconds falls in the minutes
/// bucket and exactly one hour falls in the hours bucket.
pub fn format_last_seen(last_seen: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff_in_seconds = (now - last_seen).num_seconds();
    if diff_in_seconds < 60 {
        return "just now".to_string();
    }
    if diff_in_seconds < 3600 {
        return format!("{} minutes ago", diff_in_seconds / 60);
    }
    if diff_in_seconds < 86_400 {
        return format!("{} hours ago", diff_in_seconds / 3600);
    }
    last_seen.format("%-d %b %Y").to_string()
}

/// Render a message timestamp as `{day} {Mon} {12h}:{mm} {AM/PM}`,
/// e.g. `5 Jan 3:07 PM`.
pub fn format_message_time(ts: DateTime<Utc>) -> String {
    ts.format("%-d %b %-I:%M %p").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn under_a_minute_is_just_now() {
        assert_eq!(format_last_seen(now() - Duration::seconds(59), now()), "just now");
        assert_eq!(format_last_seen(now(), now()), "just now");
    }

    #[test]
    fn exactly_a_minute_falls_in_the_minutes_bucket() {
        assert_eq!(
            format_last_seen(now() - Duration::seconds(60), now()),
            "1 minutes ago"
        );
        assert_eq!(
            format_last_seen(now() - Duration::seconds(61), now()),
            "1 minutes ago"
        );
    }

    #[test]
    fn hours_bucket() {
        assert_eq!(
            format_last_seen(now() - Duration::seconds(3661), now()),
            "1 hours ago"
        );
        assert_eq!(
            format_last_seen(now() - Duration::seconds(3600), now()),
            "1 hours ago"
        );
        assert_eq!(
            format_last_seen(now() - Duration::hours(23), now()),
            "23 hours ago"
        );
    }

    #[test]
    fn older_than_a_day_is_a_calendar_date() {
        assert_eq!(
            format_last_seen(now() - Duration::days(2), now()),
            "13 Jun 2024"
        );
    }

    #[test]
    fn message_time_is_twelve_hour() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 5, 15, 7, 0).unwrap();
        assert_eq!(format_message_time(ts), "5 Jan 3:07 PM");

        let midnight = Utc.with_ymd_and_hms(2024, 1, 5, 0, 4, 0).unwrap();
        assert_eq!(format_message_time(midnight), "5 Jan 12:04 AM");
    }
}
