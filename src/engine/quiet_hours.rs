//! Quiet hours: a recurring daily local-time window in an IANA timezone.

use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Parse zero-padded "HH:mm" into minutes since midnight.
pub fn parse_hhmm(raw: &str) -> Option<u32> {
    let (hours, minutes) = raw.trim().split_once(':')?;
    if hours.len() != 2 || minutes.len() != 2 {
        return None;
    }
    if !hours.bytes().all(|b| b.is_ascii_digit()) || !minutes.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    let h: u32 = hours.parse().ok()?;
    let m: u32 = minutes.parse().ok()?;
    if h > 23 || m > 59 {
        return None;
    }
    Some(h * 60 + m)
}

/// Local minute-of-day for `now` in `timezone`, or None for an unknown zone.
pub fn local_minute_of_day(now: DateTime<Utc>, timezone: &str) -> Option<u32> {
    let tz: Tz = timezone.trim().parse().ok()?;
    let local = now.with_timezone(&tz);
    Some(local.hour() * 60 + local.minute())
}

/// Whether `current` falls inside the `[start, end)` window, wrapping midnight.
///
/// `start == end` is a full-day window.
pub fn window_contains(start: u32, end: u32, current: u32) -> bool {
    debug_assert!(start < MINUTES_PER_DAY && end < MINUTES_PER_DAY);
    if start == end {
        true
    } else if start < end {
        start <= current && current < end
    } else {
        current >= start || current < end
    }
}

/// Decide whether quiet hours suppress delivery at `now`.
///
/// Missing or malformed bounds and unknown timezones never suppress.
pub fn is_quiet_at(
    quiet_from: Option<&str>,
    quiet_to: Option<&str>,
    timezone: &str,
    now: DateTime<Utc>,
) -> bool {
    let (from, to) = match (quiet_from, quiet_to) {
        (Some(from), Some(to)) => (from, to),
        _ => return false,
    };

    let (start, end) = match (parse_hhmm(from), parse_hhmm(to)) {
        (Some(start), Some(end)) => (start, end),
        _ => {
            tracing::debug!("malformed quiet hours {:?}-{:?}, ignoring", from, to);
            return false;
        }
    };

    let current = match local_minute_of_day(now, timezone) {
        Some(current) => current,
        None => {
            tracing::debug!("unknown timezone {:?}, quiet hours ignored", timezone);
            return false;
        }
    };

    window_contains(start, end, current)
}
