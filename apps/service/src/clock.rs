//! Wall-clock helpers bound to the configured timezone.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::warn;

/// Resolve an IANA timezone name, falling back to UTC.
///
/// A bad `TIMEZONE` value must never take the monitor down, so this only
/// logs and carries on.
pub fn resolve_timezone(name: &str) -> Tz {
    match name.trim().parse::<Tz>() {
        Ok(tz) => tz,
        Err(error) => {
            warn!(timezone = name, "Unknown timezone, falling back to UTC: {error}");
            Tz::UTC
        }
    }
}

/// Current instant expressed in `tz`
pub fn now_in(tz: Tz) -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&tz).fixed_offset()
}

/// Current calendar date in `tz`
pub fn today_in(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

/// Calendar date of `timestamp` once converted into `tz`
pub fn local_date(timestamp: &DateTime<FixedOffset>, tz: Tz) -> NaiveDate {
    timestamp.with_timezone(&tz).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_timezone_resolves() {
        assert_eq!(resolve_timezone("Europe/Amsterdam"), Tz::Europe__Amsterdam);
        assert_eq!(resolve_timezone(" UTC "), Tz::UTC);
    }

    #[test]
    fn test_unknown_timezone_falls_back_to_utc() {
        assert_eq!(resolve_timezone("Mars/Olympus_Mons"), Tz::UTC);
        assert_eq!(resolve_timezone(""), Tz::UTC);
    }

    #[test]
    fn test_local_date_crosses_midnight() {
        let ts = DateTime::parse_from_rfc3339("2026-10-15T23:30:00+00:00").unwrap();
        assert_eq!(local_date(&ts, Tz::UTC), NaiveDate::from_ymd_opt(2026, 10, 15).unwrap());
        assert_eq!(
            local_date(&ts, Tz::Asia__Tokyo),
            NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
        );
        assert_eq!(
            local_date(&ts, Tz::America__New_York),
            NaiveDate::from_ymd_opt(2026, 10, 15).unwrap()
        );
    }
}
