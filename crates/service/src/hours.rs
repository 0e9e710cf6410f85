//! Open/closed evaluation against a store's weekly hours.

use chrono::{Datelike, Local, NaiveDateTime, Timelike};

use models::search::OpenStatus;
use models::store::WeeklyHours;

/// Source of "now" for decorating search results.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Wall clock in the local timezone.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Frozen clock for deterministic evaluation.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Evaluate whether a store is open at `now`.
///
/// The entry for `now`'s weekday must be `"HH:MM-HH:MM"`; the store is open
/// when `start <= now <= end` comparing zero-padded `"HH:MM"` strings, so
/// `"00:00-24:00"` covers the whole day. Missing entries, `"closed"` in any
/// case, and anything not shaped like two `HH:MM` tokens are all `Closed`.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use models::search::OpenStatus;
/// use models::store::WeeklyHours;
/// use service::hours::evaluate;
///
/// let hours = WeeklyHours::business_week();
/// // 2024-01-01 is a Monday
/// let monday = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// assert_eq!(evaluate(&hours, monday.and_hms_opt(10, 0, 0).unwrap()), OpenStatus::Open);
/// assert_eq!(evaluate(&hours, monday.and_hms_opt(18, 30, 0).unwrap()), OpenStatus::Closed);
/// ```
pub fn evaluate(hours: &WeeklyHours, now: NaiveDateTime) -> OpenStatus {
    let Some((start, end)) = hours.for_day(now.weekday()).and_then(parse_window) else {
        return OpenStatus::Closed;
    };
    let current = format!("{:02}:{:02}", now.hour(), now.minute());
    if start <= current.as_str() && current.as_str() <= end {
        OpenStatus::Open
    } else {
        OpenStatus::Closed
    }
}

/// [`evaluate`] against the local wall clock.
pub fn evaluate_local(hours: &WeeklyHours) -> OpenStatus {
    evaluate(hours, LocalClock.now())
}

fn parse_window(entry: &str) -> Option<(&str, &str)> {
    let entry = entry.trim();
    if entry.eq_ignore_ascii_case("closed") {
        return None;
    }
    let (start, end) = entry.split_once('-')?;
    let (start, end) = (start.trim(), end.trim());
    (is_hh_mm(start) && is_hh_mm(end)).then_some((start, end))
}

fn is_hh_mm(token: &str) -> bool {
    matches!(
        token.as_bytes(),
        [h1, h2, b':', m1, m2] if [h1, h2, m1, m2].iter().all(|b| b.is_ascii_digit())
    )
}
