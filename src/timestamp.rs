use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};

/// Formats tried in order. The first one also accepts a fractional-seconds suffix;
/// a comma separator is normalized to a dot before parsing.
pub const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%d-%m-%Y %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
];

/// Parse a raw timestamp with the known formats, first success wins
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let normalized = trimmed.replacen(',', ".", 1);

    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(&normalized, format).ok())
}

/// Sortable instant for any timestamp string.
///
/// Unrecognized input maps to `NaiveDateTime::MIN`, so such entries sort first
/// and fall outside any lower-bounded time range.
pub fn normalize_timestamp(raw: &str) -> NaiveDateTime {
    parse_timestamp(raw).unwrap_or(NaiveDateTime::MIN)
}

/// Parse a user-supplied time bound: a log timestamp, RFC3339, a bare date,
/// or a relative duration such as "2 hours ago".
pub fn parse_time_bound(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();

    if let Some(ts) = parse_timestamp(s) {
        return Some(ts);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Local).naive_local());
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }

    if let Ok(duration) = humantime::parse_duration(s.trim_end_matches(" ago")) {
        let delta = chrono::Duration::from_std(duration).ok()?;
        return Local::now().naive_local().checked_sub_signed(delta);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use quickcheck_macros::quickcheck;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, s).unwrap()
    }

    #[test]
    fn test_known_formats_parse() {
        let with_millis = parse_timestamp("2025-06-08 02:00:15,015").unwrap();
        assert_eq!(with_millis.with_nanosecond(0).unwrap(), at(2025, 6, 8, 2, 0, 15));
        assert_eq!(with_millis.nanosecond(), 15_000_000);

        assert_eq!(parse_timestamp("2025-06-08 02:00:15"), Some(at(2025, 6, 8, 2, 0, 15)));
        assert_eq!(parse_timestamp("08-06-2025 02:00:15"), Some(at(2025, 6, 8, 2, 0, 15)));
        assert_eq!(parse_timestamp("2025/06/08 02:00:15"), Some(at(2025, 6, 8, 2, 0, 15)));
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        assert_eq!(parse_timestamp("  2025-06-08 02:00:15 "), Some(at(2025, 6, 8, 2, 0, 15)));
    }

    #[test]
    fn test_unparsable_maps_to_earliest_instant() {
        assert_eq!(normalize_timestamp("not-a-time"), NaiveDateTime::MIN);
        assert_eq!(normalize_timestamp(""), NaiveDateTime::MIN);
        assert_eq!(normalize_timestamp("08/06"), NaiveDateTime::MIN);
    }

    #[test]
    fn test_normalized_instants_are_comparable() {
        let earlier = normalize_timestamp("2025-06-08 02:00:15");
        let later = normalize_timestamp("2025-06-08 02:00:15,500");
        let garbage = normalize_timestamp("garbage");
        assert!(garbage < earlier);
        assert!(earlier < later);
    }

    #[test]
    fn test_time_bound_accepts_dates_and_relative_times() {
        assert_eq!(parse_time_bound("2025-01-01"), Some(at(2025, 1, 1, 0, 0, 0)));
        assert_eq!(parse_time_bound("2025-01-01 10:30:00"), Some(at(2025, 1, 1, 10, 30, 0)));

        let relative = parse_time_bound("1 hour ago").unwrap();
        assert!(relative < Local::now().naive_local());

        assert!(parse_time_bound("whenever").is_none());
    }

    #[test]
    fn test_time_bound_out_of_range_is_rejected() {
        assert!(parse_time_bound("300000 years ago").is_none());
        assert!(parse_time_bound("10000000 years ago").is_none());
    }

    #[quickcheck]
    fn prop_normalize_never_panics(raw: String) -> bool {
        let instant = normalize_timestamp(&raw);
        instant == NaiveDateTime::MIN || parse_timestamp(&raw) == Some(instant)
    }
}
