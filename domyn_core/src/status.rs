//! Weekly overview status derivation.
//!
//! Statuses are derived per rendered week and never persisted. All
//! comparisons are on calendar dates, so "today" is the caller's local date
//! at midnight.

use crate::store::Snapshot;
use crate::{DayStatus, LogStatus, Weekday};
use chrono::{Datelike, Duration, Local, NaiveDate};
use serde::Serialize;

/// Inputs for one date
#[derive(Clone, Copy, Debug)]
pub struct StatusQuery {
    /// Whether the routine for this weekday is scheduled
    pub scheduled: bool,
    pub date: NaiveDate,
    pub today: NaiveDate,
    /// Log recorded for exactly `date`, if any
    pub logged: Option<LogStatus>,
    /// First date the user was tracking; earlier dates are `Past`, not `Missed`
    pub tracking_since: Option<NaiveDate>,
}

/// Derive the overview status for one date.
///
/// Unscheduled days are always `None`. Otherwise a log for the exact date
/// wins; without one, dates before tracking started are `Past`, earlier
/// dates are `Missed`, and today or later is `Scheduled`.
pub fn derive_status(query: &StatusQuery) -> DayStatus {
    if !query.scheduled {
        return DayStatus::None;
    }

    if let Some(logged) = query.logged {
        return logged.into();
    }

    if query
        .tracking_since
        .is_some_and(|since| query.date < since)
    {
        return DayStatus::Past;
    }

    if query.date < query.today {
        DayStatus::Missed
    } else {
        DayStatus::Scheduled
    }
}

/// The caller's current local date
pub fn today_local() -> NaiveDate {
    Local::now().date_naive()
}

/// Monday of the week containing `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// One cell of the week strip
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WeekDayStatus {
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub letter: char,
    pub day_of_month: u32,
    pub is_today: bool,
    pub status: DayStatus,
}

/// Statuses for the Monday-start week containing `today`
pub fn week_overview(
    snapshot: &Snapshot,
    today: NaiveDate,
    tracking_since: Option<NaiveDate>,
) -> Vec<WeekDayStatus> {
    let monday = week_start(today);

    (0..7)
        .map(|offset| {
            let date = monday + Duration::days(offset);
            let weekday = Weekday::from_chrono(date.weekday());
            let status = derive_status(&StatusQuery {
                scheduled: snapshot.is_scheduled(weekday),
                date,
                today,
                logged: snapshot.log_status(date),
                tracking_since,
            });

            WeekDayStatus {
                date,
                weekday,
                letter: weekday.letter(),
                day_of_month: date.day(),
                is_today: date == today,
                status,
            }
        })
        .collect()
}
