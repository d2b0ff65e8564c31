//! Per-day attendance over a timeframe, built from check-in history and today's live status.

use crate::format::round_to;
use crate::timer::sanitize_minutes;
use clockin_common::api::{HistoryRecord, StatusData};
use clockin_common::domain::AttendanceStatus;
use clockin_common::timestamp::parse_optional;
use eyre::{bail, eyre, Result};
use std::collections::BTreeMap;
use std::str::FromStr;
use time::macros::format_description;
use time::{Date, Duration, Month, OffsetDateTime, Weekday};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeframe {
    /// Today and the six days before it.
    Last7Days,
    /// The first of the month up to today.
    ThisMonth,
    PreviousMonth,
    Month(i32, Month),
}

impl FromStr for Timeframe {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "7d" | "week" => Ok(Timeframe::Last7Days),
            "month" => Ok(Timeframe::ThisMonth),
            "prev" | "previous-month" => Ok(Timeframe::PreviousMonth),
            other => parse_month(other),
        }
    }
}

/// Parse a `YYYY-MM` month.
pub fn parse_month(value: &str) -> Result<Timeframe> {
    let (year, month) = value
        .split_once('-')
        .ok_or_else(|| eyre!("Invalid timeframe {value:?}. Use 7d, month, prev or YYYY-MM"))?;

    let year = year
        .parse::<i32>()
        .map_err(|_| eyre!("Invalid year in {value:?}"))?;
    let month = month
        .parse::<u8>()
        .map_err(|_| eyre!("Invalid month in {value:?}"))?;
    let month = Month::try_from(month).map_err(|_| eyre!("Invalid month in {value:?}"))?;

    Ok(Timeframe::Month(year, month))
}

impl Timeframe {
    /// First and last day covered, both inclusive. Days after `today` are never included.
    pub fn range(&self, today: Date) -> Result<(Date, Date)> {
        let (start, end) = match self {
            Timeframe::Last7Days => (today - Duration::days(6), today),
            Timeframe::ThisMonth => (today.replace_day(1)?, today),
            Timeframe::PreviousMonth => {
                let last = today.replace_day(1)? - Duration::days(1);
                (last.replace_day(1)?, last)
            }
            Timeframe::Month(year, month) => {
                let start = Date::from_calendar_date(*year, *month, 1)?;
                let days = time::util::days_in_year_month(*year, *month);
                let end = Date::from_calendar_date(*year, *month, days)?;
                (start, end.min(today))
            }
        };

        if start > end {
            bail!("{self} lies in the future");
        }

        Ok((start, end))
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Timeframe::Last7Days => write!(f, "last 7 days"),
            Timeframe::ThisMonth => write!(f, "this month"),
            Timeframe::PreviousMonth => write!(f, "previous month"),
            Timeframe::Month(year, month) => write!(f, "{year}-{:02}", *month as u8),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayStatus {
    Present,
    Absent,
    Weekend,
}

impl DayStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DayStatus::Present => "present",
            DayStatus::Absent => "absent",
            DayStatus::Weekend => "weekend",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceDay {
    pub date: Date,
    pub status: DayStatus,
    pub check_in_time: Option<OffsetDateTime>,
    pub check_out_time: Option<OffsetDateTime>,
    pub minutes: f64,
    pub hours: f64,
}

impl AttendanceDay {
    fn blank(date: Date) -> Self {
        let status = if is_weekend(date) {
            DayStatus::Weekend
        } else {
            DayStatus::Absent
        };

        Self {
            date,
            status,
            check_in_time: None,
            check_out_time: None,
            minutes: 0.0,
            hours: 0.0,
        }
    }

    fn set_minutes(&mut self, minutes: f64) {
        self.minutes = sanitize_minutes(minutes);
        self.hours = round_to(self.minutes / 60.0, 2);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceReport {
    pub start: Date,
    pub end: Date,
    /// Newest first.
    pub days: Vec<AttendanceDay>,
    pub total_hours: f64,
    pub present_days: usize,
    pub absent_days: usize,
}

pub fn is_weekend(date: Date) -> bool {
    matches!(date.weekday(), Weekday::Saturday | Weekday::Sunday)
}

/// Parse the day of a history record. Accepts plain dates and full timestamps.
pub fn record_date(value: &str) -> Option<Date> {
    let day = value.trim().get(..10)?;
    Date::parse(day, format_description!("[year]-[month]-[day]")).ok()
}

/// Fewest history records ever requested.
pub const MIN_HISTORY_LIMIT: u32 = 100;

/// History records to request so that every day from `start` to `today` is covered,
/// allowing for several sessions a day.
pub fn history_limit(start: Date, today: Date) -> u32 {
    let days = (today - start).whole_days().max(0) + 1;
    let wanted = u32::try_from(days.saturating_mul(4)).unwrap_or(u32::MAX);
    wanted.max(MIN_HISTORY_LIMIT)
}

/// Whether a history page fetched with `limit` reaches back to `start`.
/// A short page is the whole history, so it always does.
pub fn history_reaches(history: &[HistoryRecord], limit: u32, start: Date) -> bool {
    if history.len() < limit as usize {
        return true;
    }

    history
        .iter()
        .filter_map(|x| record_date(&x.date))
        .min()
        .is_some_and(|oldest| oldest <= start)
}

pub fn build_report(
    history: &[HistoryRecord],
    today_status: Option<&StatusData>,
    (start, end): (Date, Date),
    today: Date,
) -> AttendanceReport {
    let mut days = BTreeMap::new();
    let mut day = start;
    while day <= end {
        days.insert(day, AttendanceDay::blank(day));
        day = match day.next_day() {
            Some(v) => v,
            None => break,
        };
    }

    let mut today_from_status = false;
    if let (Some(status), Some(entry)) = (today_status, days.get_mut(&today)) {
        if entry.status != DayStatus::Weekend {
            let minutes = sanitize_minutes(status.total_minutes.unwrap_or(0.0));
            let present = match status.status() {
                AttendanceStatus::CheckedIn => true,
                AttendanceStatus::CheckedOut => minutes > 0.0,
            };

            if present {
                entry.status = DayStatus::Present;
                entry.check_in_time = parse_optional(status.check_in_time.as_deref());
                entry.check_out_time = parse_optional(status.check_out_time.as_deref());
                entry.set_minutes(minutes);
                today_from_status = true;
            }
        }
    }

    for record in history {
        let Some(date) = record_date(&record.date) else {
            debug!(date = %record.date, "skipping history record with unreadable date");
            continue;
        };
        if date == today && today_from_status {
            continue;
        }
        let Some(entry) = days.get_mut(&date) else {
            continue;
        };

        // A day can hold several sessions: earliest in, latest out, minutes summed.
        let check_in = parse_optional(record.check_in_time.as_deref());
        let check_out = parse_optional(record.check_out_time.as_deref());
        entry.check_in_time = match (entry.check_in_time, check_in) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        entry.check_out_time = match (entry.check_out_time, check_out) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        entry.set_minutes(entry.minutes + sanitize_minutes(record.minutes()));

        if entry.status != DayStatus::Weekend && record.check_in_time.is_some() {
            entry.status = DayStatus::Present;
        }
    }

    let days = days.into_values().rev().collect::<Vec<_>>();
    let total_minutes = days.iter().map(|x| x.minutes).sum::<f64>();
    let present_days = days
        .iter()
        .filter(|x| x.status == DayStatus::Present)
        .count();
    let absent_days = days.iter().filter(|x| x.status == DayStatus::Absent).count();

    AttendanceReport {
        start,
        end,
        days,
        total_hours: round_to(total_minutes / 60.0, 1),
        present_days,
        absent_days,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn ranges() {
        let today = date!(2026 - 10 - 14);

        assert_eq!(
            Timeframe::Last7Days.range(today).unwrap(),
            (date!(2026 - 10 - 08), today)
        );
        assert_eq!(
            Timeframe::ThisMonth.range(today).unwrap(),
            (date!(2026 - 10 - 01), today)
        );
        assert_eq!(
            Timeframe::PreviousMonth.range(today).unwrap(),
            (date!(2026 - 09 - 01), date!(2026 - 09 - 30))
        );
        assert_eq!(
            Timeframe::Month(2024, Month::February).range(today).unwrap(),
            (date!(2024 - 02 - 01), date!(2024 - 02 - 29))
        );
        assert!(Timeframe::Month(2027, Month::January).range(today).is_err());
    }

    #[test]
    fn parse_timeframes() {
        assert_eq!("7d".parse::<Timeframe>().unwrap(), Timeframe::Last7Days);
        assert_eq!("prev".parse::<Timeframe>().unwrap(), Timeframe::PreviousMonth);
        assert_eq!(
            "2026-03".parse::<Timeframe>().unwrap(),
            Timeframe::Month(2026, Month::March)
        );
        assert!("2026-13".parse::<Timeframe>().is_err());
        assert!("yesterday".parse::<Timeframe>().is_err());
    }

    #[test]
    fn record_dates() {
        assert_eq!(record_date("2026-10-12"), Some(date!(2026 - 10 - 12)));
        assert_eq!(
            record_date("2026-10-12T00:00:00.000Z"),
            Some(date!(2026 - 10 - 12))
        );
        assert_eq!(record_date("12/10"), None);
    }

    #[test]
    fn history_limits() {
        let today = date!(2026 - 10 - 14);

        assert_eq!(history_limit(today - Duration::days(6), today), MIN_HISTORY_LIMIT);
        // 44 days, four sessions each.
        assert_eq!(history_limit(date!(2026 - 09 - 01), today), 176);
        assert_eq!(history_limit(today, today), MIN_HISTORY_LIMIT);
    }

    #[test]
    fn full_page_must_reach_range_start() {
        let page = |dates: &[&str]| {
            dates
                .iter()
                .map(|d| HistoryRecord {
                    date: d.to_string(),
                    check_in_time: None,
                    check_out_time: None,
                    total_hours: 0.0,
                    total_minutes: None,
                })
                .collect::<Vec<_>>()
        };
        let start = date!(2026 - 09 - 01);

        let short = page(&["2026-10-13", "2026-10-12"]);
        assert!(history_reaches(&short, 3, start));

        let truncated = page(&["2026-10-13", "2026-10-12", "2026-09-20"]);
        assert!(!history_reaches(&truncated, 3, start));

        let complete = page(&["2026-10-13", "2026-09-20", "2026-08-31"]);
        assert!(history_reaches(&complete, 3, start));
    }
}
