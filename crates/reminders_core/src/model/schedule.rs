//! Notification time and recurrence rules.
//!
//! # Invariants
//! - Stored notification times are local wall-clock times without offset,
//!   written as `YYYY-MM-DD HH:MM`.
//! - Month arithmetic clamps the day to the target month's length.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use std::fmt::{Display, Formatter};

/// Storage format for notification times.
pub const NOTIFY_AT_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Number of occurrences generated after the base one for repeating schedules.
pub const RECURRENCE_HORIZON: u32 = 5;

const ACCEPTED_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Errors raised while building or parsing notification times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// Month outside `1..=12`.
    InvalidMonth(u32),
    /// Day is larger than the selected month allows.
    DayOutOfRange { year: i32, month: u32, max_day: u32 },
    /// Hour outside `1..=12` or minute outside `0..=59`.
    InvalidTime { hour: u32, minute: u32 },
    /// Stored or typed timestamp is not in an accepted format.
    Malformed(String),
    /// Recurrence keyword is unknown.
    UnknownRecurrence(String),
}

impl Display for ScheduleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidMonth(month) => write!(f, "month {month} is not between 1 and 12"),
            Self::DayOutOfRange {
                year,
                month,
                max_day,
            } => write!(
                f,
                "{} {year} has only {max_day} days",
                month_name(*month)
            ),
            Self::InvalidTime { hour, minute } => {
                write!(f, "invalid time {hour:02}:{minute:02}")
            }
            Self::Malformed(value) => write!(f, "malformed notification time `{value}`"),
            Self::UnknownRecurrence(value) => write!(
                f,
                "unknown recurrence `{value}`; expected once|daily|weekly|monthly|quarterly"
            ),
        }
    }
}

impl std::error::Error for ScheduleError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Meridiem {
    Am,
    Pm,
}

/// Repetition applied when scheduling notifications from the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Recurrence {
    #[default]
    Once,
    Daily,
    Weekly,
    Monthly,
    Quarterly,
}

impl Recurrence {
    pub fn parse(value: &str) -> Result<Self, ScheduleError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "once" | "none" => Ok(Self::Once),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            _ => Err(ScheduleError::UnknownRecurrence(value.to_string())),
        }
    }

    /// Returns `base` followed by the next [`RECURRENCE_HORIZON`] occurrences.
    pub fn occurrences(self, base: NaiveDateTime) -> Vec<NaiveDateTime> {
        let mut result = vec![base];
        if self == Self::Once {
            return result;
        }
        for step in 1..=RECURRENCE_HORIZON {
            let next = match self {
                Self::Once => continue,
                Self::Daily => base + Duration::days(i64::from(step)),
                Self::Weekly => base + Duration::weeks(i64::from(step)),
                Self::Monthly => add_months_clamped(base, step),
                Self::Quarterly => add_months_clamped(base, step * 3),
            };
            result.push(next);
        }
        result
    }
}

/// Builds a notification time from picker parts using a 12-hour clock.
pub fn notify_at_from_parts(
    year: i32,
    month: u32,
    day: u32,
    hour12: u32,
    minute: u32,
    meridiem: Meridiem,
) -> Result<NaiveDateTime, ScheduleError> {
    let max_day = days_in_month(year, month)?;
    if day == 0 || day > max_day {
        return Err(ScheduleError::DayOutOfRange {
            year,
            month,
            max_day,
        });
    }
    if !(1..=12).contains(&hour12) || minute > 59 {
        return Err(ScheduleError::InvalidTime {
            hour: hour12,
            minute,
        });
    }

    let hour = match (meridiem, hour12) {
        (Meridiem::Am, 12) => 0,
        (Meridiem::Am, h) => h,
        (Meridiem::Pm, 12) => 12,
        (Meridiem::Pm, h) => h + 12,
    };

    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or(ScheduleError::DayOutOfRange {
        year,
        month,
        max_day,
    })?;
    let time = NaiveTime::from_hms_opt(hour, minute, 0).ok_or(ScheduleError::InvalidTime {
        hour: hour12,
        minute,
    })?;
    Ok(date.and_time(time))
}

/// Number of days in `month` of `year`.
pub fn days_in_month(year: i32, month: u32) -> Result<u32, ScheduleError> {
    if !(1..=12).contains(&month) {
        return Err(ScheduleError::InvalidMonth(month));
    }
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let first_of_next = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .ok_or(ScheduleError::InvalidMonth(month))?;
    Ok(first_of_next.pred_opt().map_or(28, |last| last.day()))
}

/// Adds whole months, clamping the day (Jan 31 + 1 month = Feb 28/29).
pub fn add_months_clamped(base: NaiveDateTime, months: u32) -> NaiveDateTime {
    let zero_based = base.month0() + months;
    let year = base.year() + (zero_based / 12) as i32;
    let month = zero_based % 12 + 1;
    let max_day = days_in_month(year, month).unwrap_or(28);
    let day = base.day().min(max_day);
    NaiveDate::from_ymd_opt(year, month, day)
        .map(|date| date.and_time(base.time()))
        .unwrap_or(base)
}

/// Combines a calendar date with the time of day of an existing
/// notification, defaulting to 09:00.
pub fn at_time_of(date: NaiveDate, existing: Option<NaiveDateTime>) -> NaiveDateTime {
    let (hour, minute) = existing.map_or((9, 0), |at| (at.hour(), at.minute()));
    let time = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN);
    date.and_time(time)
}

pub fn parse_notify_at(value: &str) -> Result<NaiveDateTime, ScheduleError> {
    let trimmed = value.trim();
    ACCEPTED_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| ScheduleError::Malformed(value.to_string()))
}

pub fn format_notify_at(at: NaiveDateTime) -> String {
    at.format(NOTIFY_AT_FORMAT).to_string()
}

/// Body of the desktop notification for one reminder.
pub fn notification_body(text: &str, at: NaiveDateTime) -> String {
    format!(
        "{text}\nScheduled for {}",
        at.format("%I:%M %p on %b %d, %Y")
    )
}

fn month_name(month: u32) -> &'static str {
    const NAMES: [&str; 12] = [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ];
    month
        .checked_sub(1)
        .and_then(|index| NAMES.get(index as usize))
        .copied()
        .unwrap_or("Month")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn twelve_hour_clock_converts_midnight_and_noon() {
        assert_eq!(
            notify_at_from_parts(2026, 5, 1, 12, 30, Meridiem::Am).unwrap(),
            at(2026, 5, 1, 0, 30)
        );
        assert_eq!(
            notify_at_from_parts(2026, 5, 1, 12, 0, Meridiem::Pm).unwrap(),
            at(2026, 5, 1, 12, 0)
        );
        assert_eq!(
            notify_at_from_parts(2026, 5, 1, 7, 15, Meridiem::Pm).unwrap(),
            at(2026, 5, 1, 19, 15)
        );
    }

    #[test]
    fn rejects_day_outside_month() {
        let err = notify_at_from_parts(2025, 2, 29, 9, 0, Meridiem::Am).unwrap_err();
        assert_eq!(
            err,
            ScheduleError::DayOutOfRange {
                year: 2025,
                month: 2,
                max_day: 28
            }
        );
        assert_eq!(err.to_string(), "February 2025 has only 28 days");
        assert!(notify_at_from_parts(2024, 2, 29, 9, 0, Meridiem::Am).is_ok());
    }

    #[test]
    fn rejects_invalid_clock_values() {
        assert!(matches!(
            notify_at_from_parts(2026, 1, 1, 13, 0, Meridiem::Am),
            Err(ScheduleError::InvalidTime { .. })
        ));
        assert!(matches!(
            notify_at_from_parts(2026, 1, 1, 0, 0, Meridiem::Am),
            Err(ScheduleError::InvalidTime { .. })
        ));
        assert!(matches!(
            notify_at_from_parts(2026, 13, 1, 1, 0, Meridiem::Am),
            Err(ScheduleError::InvalidMonth(13))
        ));
    }

    #[test]
    fn monthly_recurrence_clamps_day() {
        let base = at(2026, 1, 31, 8, 0);
        let occurrences = Recurrence::Monthly.occurrences(base);
        assert_eq!(occurrences.len(), 6);
        assert_eq!(occurrences[1], at(2026, 2, 28, 8, 0));
        assert_eq!(occurrences[2], at(2026, 3, 31, 8, 0));
        assert_eq!(occurrences[3], at(2026, 4, 30, 8, 0));
    }

    #[test]
    fn quarterly_recurrence_crosses_year_boundary() {
        let base = at(2026, 11, 30, 18, 45);
        let occurrences = Recurrence::Quarterly.occurrences(base);
        assert_eq!(occurrences[1], at(2027, 2, 28, 18, 45));
        assert_eq!(occurrences[2], at(2027, 5, 30, 18, 45));
        assert_eq!(occurrences[5], at(2028, 2, 29, 18, 45));
    }

    #[test]
    fn daily_weekly_and_once() {
        let base = at(2026, 12, 30, 9, 0);
        assert_eq!(Recurrence::Once.occurrences(base), vec![base]);
        assert_eq!(Recurrence::Daily.occurrences(base)[2], at(2027, 1, 1, 9, 0));
        assert_eq!(Recurrence::Weekly.occurrences(base)[5], at(2027, 2, 3, 9, 0));
    }

    #[test]
    fn parses_stored_and_iso_formats() {
        let expected = at(2026, 3, 4, 5, 6);
        assert_eq!(parse_notify_at("2026-03-04 05:06").unwrap(), expected);
        assert_eq!(parse_notify_at("2026-03-04T05:06:00").unwrap(), expected);
        assert!(parse_notify_at("next tuesday").is_err());
        assert_eq!(format_notify_at(expected), "2026-03-04 05:06");
    }

    #[test]
    fn time_of_day_defaults_to_nine() {
        let date = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        assert_eq!(at_time_of(date, None), at(2026, 6, 1, 9, 0));
        assert_eq!(
            at_time_of(date, Some(at(2020, 1, 1, 17, 20))),
            at(2026, 6, 1, 17, 20)
        );
    }

    #[test]
    fn notification_body_mentions_schedule() {
        let body = notification_body("Pay rent", at(2026, 1, 2, 21, 5));
        assert_eq!(body, "Pay rent\nScheduled for 09:05 PM on Jan 02, 2026");
    }
}
