//! Human readable "time ago" labels derived from stored timestamps.

use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Label returned for missing or unparseable timestamps.
pub const UNKNOWN: &str = "Unknown";

const SECONDS_PER_MINUTE: i64 = 60;
const MINUTES_PER_HOUR: i64 = 60;
const HOURS_PER_DAY: i64 = 24;
const DAYS_PER_MONTH: i64 = 30;
const MONTHS_PER_YEAR: i64 = 12;

/// Describe how long ago `raw` (RFC 3339) happened relative to `now`.
///
/// Timestamps in the future are treated as happening right now.
pub fn format_relative(raw: Option<&str>, now: OffsetDateTime) -> String {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return UNKNOWN.into();
    };
    let Some(then) = parse_timestamp(raw) else {
        return UNKNOWN.into();
    };

    describe_elapsed((now - then).whole_seconds().max(0))
}

/// Accepts RFC 3339 and the zone-less `YYYY-MM-DDTHH:MM:SS` form, read as UTC.
fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(raw, &Rfc3339)
        .or_else(|_| OffsetDateTime::parse(&format!("{raw}Z"), &Rfc3339))
        .ok()
}

fn describe_elapsed(seconds: i64) -> String {
    if seconds < SECONDS_PER_MINUTE {
        return format!("{seconds} seconds ago");
    }
    let minutes = seconds / SECONDS_PER_MINUTE;
    if minutes < MINUTES_PER_HOUR {
        return with_unit(minutes, "minute");
    }
    let hours = minutes / MINUTES_PER_HOUR;
    if hours < HOURS_PER_DAY {
        return with_unit(hours, "hour");
    }
    let days = hours / HOURS_PER_DAY;
    if days < DAYS_PER_MONTH {
        return with_unit(days, "day");
    }
    let months = days / DAYS_PER_MONTH;
    if months < MONTHS_PER_YEAR {
        return with_unit(months, "month");
    }
    with_unit(months / MONTHS_PER_YEAR, "year")
}

// Plural only above one.
fn with_unit(value: i64, unit: &str) -> String {
    let suffix = if value > 1 { "s" } else { "" };
    format!("{value} {unit}{suffix} ago")
}

#[cfg(test)]
mod tests {
    use time::{Duration, format_description::well_known::Rfc3339};

    use super::*;

    fn now() -> OffsetDateTime {
        OffsetDateTime::parse("2025-06-15T12:00:00Z", &Rfc3339).unwrap()
    }

    fn ago(elapsed: Duration) -> String {
        let stamp = (now() - elapsed).format(&Rfc3339).unwrap();
        format_relative(Some(&stamp), now())
    }

    #[test]
    fn missing_or_invalid_input_is_unknown() {
        assert_eq!(format_relative(None, now()), "Unknown");
        assert_eq!(format_relative(Some(""), now()), "Unknown");
        assert_eq!(format_relative(Some("   "), now()), "Unknown");
        assert_eq!(format_relative(Some("yesterday"), now()), "Unknown");
    }

    #[test]
    fn seconds_below_one_minute() {
        assert_eq!(ago(Duration::seconds(0)), "0 seconds ago");
        assert_eq!(ago(Duration::seconds(59)), "59 seconds ago");
    }

    #[test]
    fn one_unit_is_singular_and_two_is_plural() {
        assert_eq!(ago(Duration::seconds(60)), "1 minute ago");
        assert_eq!(ago(Duration::minutes(2)), "2 minutes ago");
        assert_eq!(ago(Duration::hours(1)), "1 hour ago");
        assert_eq!(ago(Duration::hours(2)), "2 hours ago");
        assert_eq!(ago(Duration::days(1)), "1 day ago");
        assert_eq!(ago(Duration::days(2)), "2 days ago");
        assert_eq!(ago(Duration::days(30)), "1 month ago");
        assert_eq!(ago(Duration::days(60)), "2 months ago");
        assert_eq!(ago(Duration::days(360)), "1 year ago");
        assert_eq!(ago(Duration::days(720)), "2 years ago");
    }

    #[test]
    fn thresholds_use_strict_less_than() {
        assert_eq!(ago(Duration::minutes(59)), "59 minutes ago");
        assert_eq!(ago(Duration::minutes(60)), "1 hour ago");
        assert_eq!(ago(Duration::hours(23)), "23 hours ago");
        assert_eq!(ago(Duration::hours(24)), "1 day ago");
        assert_eq!(ago(Duration::days(29)), "29 days ago");
        assert_eq!(ago(Duration::days(359)), "11 months ago");
    }

    #[test]
    fn future_timestamps_clamp_to_now() {
        let future = (now() + Duration::hours(3)).format(&Rfc3339).unwrap();
        assert_eq!(format_relative(Some(&future), now()), "0 seconds ago");
    }

    #[test]
    fn zoneless_timestamps_are_read_as_utc() {
        assert_eq!(
            format_relative(Some("2025-06-15T10:00:00"), now()),
            "2 hours ago"
        );
        assert_eq!(
            format_relative(Some("2025-06-15T10:59:59.750+00:00"), now()),
            "1 hour ago"
        );
    }

    fn rank(label: &str) -> (usize, i64) {
        let mut parts = label.split_whitespace();
        let value: i64 = parts.next().unwrap().parse().unwrap();
        let unit = parts.next().unwrap().trim_end_matches('s');
        let order = ["second", "minute", "hour", "day", "month", "year"]
            .iter()
            .position(|candidate| *candidate == unit)
            .unwrap();
        (order, value)
    }

    #[test]
    fn older_timestamps_never_read_as_more_recent() {
        let mut previous = rank(&ago(Duration::seconds(0)));
        let mut elapsed = Duration::seconds(1);
        while elapsed < Duration::days(2_000) {
            let current = rank(&ago(elapsed));
            assert!(current >= previous, "{elapsed} regressed");
            previous = current;
            elapsed = elapsed * 2 + Duration::seconds(7);
        }
    }

    #[test]
    fn formatting_is_idempotent() {
        let stamp = "2025-06-10T08:30:00Z";
        assert_eq!(
            format_relative(Some(stamp), now()),
            format_relative(Some(stamp), now())
        );
    }
}
