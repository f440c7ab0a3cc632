//! Project timezone conversion
//!
//! Appointment dates and times are stored as local wall-clock values in the
//! project's IANA timezone. GHL expects instants with an explicit offset.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::defaults::DEFAULT_TIMEZONE;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimezoneError {
    #[error("unknown timezone '{0}'")]
    UnknownTimezone(String),
    #[error("{date} {time} does not exist in {tz} (daylight saving gap)")]
    NonexistentLocalTime { date: NaiveDate, time: NaiveTime, tz: String },
}

/// Parse an IANA name; empty or missing falls back to the default zone
pub fn parse_timezone(name: Option<&str>) -> Result<Tz, TimezoneError> {
    let name = name.map(str::trim).filter(|n| !n.is_empty()).unwrap_or(DEFAULT_TIMEZONE);
    name.parse::<Tz>()
        .map_err(|_| TimezoneError::UnknownTimezone(name.to_string()))
}

/// Resolve a local wall-clock time. During the autumn overlap the earlier
/// instant wins; times inside the spring gap are rejected.
pub fn localize(date: NaiveDate, time: NaiveTime, tz: Tz) -> Result<DateTime<Tz>, TimezoneError> {
    match tz.from_local_datetime(&date.and_time(time)) {
        LocalResult::Single(dt) => Ok(dt),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest),
        LocalResult::None => Err(TimezoneError::NonexistentLocalTime {
            date,
            time,
            tz: tz.name().to_string(),
        }),
    }
}

pub fn local_to_utc(date: NaiveDate, time: NaiveTime, tz: Tz) -> Result<DateTime<Utc>, TimezoneError> {
    localize(date, time, tz).map(|dt| dt.with_timezone(&Utc))
}

/// Start and end of an appointment as RFC 3339 strings carrying the local offset
pub fn appointment_window(
    date: NaiveDate,
    time: NaiveTime,
    duration_minutes: i64,
    tz: Tz,
) -> Result<(String, String), TimezoneError> {
    let start = localize(date, time, tz)?;
    let end = start + Duration::minutes(duration_minutes);
    Ok((start.to_rfc3339(), end.to_rfc3339()))
}

/// Calendar date of an instant as seen in `tz`
pub fn local_date(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn defaults_to_new_york() {
        assert_eq!(parse_timezone(None).unwrap(), chrono_tz::America::New_York);
        assert_eq!(parse_timezone(Some("")).unwrap(), chrono_tz::America::New_York);
        assert!(matches!(
            parse_timezone(Some("Mars/Olympus")),
            Err(TimezoneError::UnknownTimezone(_))
        ));
    }

    #[test]
    fn converts_across_dst() {
        let tz = parse_timezone(Some("America/Chicago")).unwrap();
        // CST (UTC-6) in January, CDT (UTC-5) in July
        assert_eq!(local_to_utc(d(2024, 1, 15), t(9, 0), tz).unwrap().to_rfc3339(), "2024-01-15T15:00:00+00:00");
        assert_eq!(local_to_utc(d(2024, 7, 15), t(9, 0), tz).unwrap().to_rfc3339(), "2024-07-15T14:00:00+00:00");
    }

    #[test]
    fn ambiguous_time_takes_earlier_instant() {
        let tz = chrono_tz::America::New_York;
        // 2024-11-03 01:30 happens twice; first as EDT (UTC-4)
        let utc = local_to_utc(d(2024, 11, 3), t(1, 30), tz).unwrap();
        assert_eq!(utc.to_rfc3339(), "2024-11-03T05:30:00+00:00");
    }

    #[test]
    fn spring_gap_is_rejected() {
        let tz = chrono_tz::America::New_York;
        let err = local_to_utc(d(2024, 3, 10), t(2, 30), tz).unwrap_err();
        assert!(matches!(err, TimezoneError::NonexistentLocalTime { .. }));
    }

    #[test]
    fn window_keeps_local_offset() {
        let tz = chrono_tz::America::Los_Angeles;
        let (start, end) = appointment_window(d(2024, 6, 1), t(14, 0), 45, tz).unwrap();
        assert_eq!(start, "2024-06-01T14:00:00-07:00");
        assert_eq!(end, "2024-06-01T14:45:00-07:00");
    }

    #[test]
    fn local_date_shifts_late_utc_instants() {
        let instant = "2024-03-02T03:00:00Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(local_date(instant, chrono_tz::America::New_York), d(2024, 3, 1));
    }
}
