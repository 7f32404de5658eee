//! Core domain types for Domyn.
//!
//! This module defines the value types shared across the system:
//! - Weekdays (the routine keys)
//! - Exercises and the drafts/patches used to create and edit them
//! - Workout metadata enums (difficulty, log status)
//! - Personal profile
//! - Weekly overview statuses

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Weekdays
// ============================================================================

/// A routine day.
///
/// Serialized as the full English name ("Monday"). Parsing also accepts the
/// abbreviations found in older records and normalizes them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// All days, Monday first
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }

    /// Single-letter label used by the week strip
    pub fn letter(self) -> char {
        self.name().chars().next().unwrap_or('?')
    }

    pub fn from_chrono(day: chrono::Weekday) -> Self {
        Self::ALL[day.num_days_from_monday() as usize]
    }

    pub fn to_chrono(self) -> chrono::Weekday {
        match self {
            Weekday::Monday => chrono::Weekday::Mon,
            Weekday::Tuesday => chrono::Weekday::Tue,
            Weekday::Wednesday => chrono::Weekday::Wed,
            Weekday::Thursday => chrono::Weekday::Thu,
            Weekday::Friday => chrono::Weekday::Fri,
            Weekday::Saturday => chrono::Weekday::Sat,
            Weekday::Sunday => chrono::Weekday::Sun,
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a string names no weekday
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseWeekdayError(pub String);

impl fmt::Display for ParseWeekdayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown weekday: {:?}", self.0)
    }
}

impl std::error::Error for ParseWeekdayError {}

impl FromStr for Weekday {
    type Err = ParseWeekdayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "monday" | "mon" => Ok(Weekday::Monday),
            "tuesday" | "tue" | "tues" => Ok(Weekday::Tuesday),
            "wednesday" | "wed" => Ok(Weekday::Wednesday),
            "thursday" | "thu" | "thurs" => Ok(Weekday::Thursday),
            "friday" | "fri" => Ok(Weekday::Friday),
            "saturday" | "sat" => Ok(Weekday::Saturday),
            "sunday" | "sun" => Ok(Weekday::Sunday),
            _ => Err(ParseWeekdayError(s.to_string())),
        }
    }
}

impl TryFrom<String> for Weekday {
    type Error = ParseWeekdayError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Weekday> for String {
    fn from(day: Weekday) -> Self {
        day.name().to_string()
    }
}

// ============================================================================
// Workout metadata
// ============================================================================

/// Perceived difficulty of a workout
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// Outcome recorded for a specific date
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogStatus {
    #[default]
    Completed,
    Skipped,
}

impl fmt::Display for LogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogStatus::Completed => f.write_str("completed"),
            LogStatus::Skipped => f.write_str("skipped"),
        }
    }
}

/// Status of one date in the weekly overview
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayStatus {
    /// Not a workout day; rendered transparent
    None,
    Scheduled,
    Completed,
    Skipped,
    Missed,
    /// Before tracking started; rendered scratched out
    Past,
}

impl From<LogStatus> for DayStatus {
    fn from(status: LogStatus) -> Self {
        match status {
            LogStatus::Completed => DayStatus::Completed,
            LogStatus::Skipped => DayStatus::Skipped,
        }
    }
}

impl fmt::Display for DayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DayStatus::None => "none",
            DayStatus::Scheduled => "scheduled",
            DayStatus::Completed => "completed",
            DayStatus::Skipped => "skipped",
            DayStatus::Missed => "missed",
            DayStatus::Past => "past",
        };
        f.write_str(label)
    }
}

// ============================================================================
// Exercises
// ============================================================================

/// One exercise inside a workout
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    #[serde(default = "crate::workout::generate_exercise_id")]
    pub id: String,
    #[serde(alias = "nameOfExercise")]
    pub name: String,
    #[serde(default, deserialize_with = "crate::record::lenient::null_as_default")]
    pub weight: f64,
    #[serde(default, deserialize_with = "crate::record::lenient::null_as_default")]
    pub reps: u32,
    #[serde(default, deserialize_with = "crate::record::lenient::null_as_default")]
    pub sets: u32,
    /// Rest between sets, in seconds
    #[serde(default, deserialize_with = "crate::record::lenient::null_as_default")]
    pub rest_time: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(
        default = "Utc::now",
        deserialize_with = "crate::record::timestamp::deserialize"
    )]
    pub last_updated: DateTime<Utc>,
}

/// Fields supplied when adding an exercise; id and timestamp are assigned
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExerciseDraft {
    pub name: String,
    pub weight: f64,
    pub reps: u32,
    pub sets: u32,
    pub rest_time: u32,
    pub notes: Option<String>,
}

impl ExerciseDraft {
    pub fn new(name: impl Into<String>, weight: f64, reps: u32, sets: u32) -> Self {
        Self {
            name: name.into(),
            weight,
            reps,
            sets,
            rest_time: 0,
            notes: None,
        }
    }

    pub fn with_rest(mut self, rest_time: u32) -> Self {
        self.rest_time = rest_time;
        self
    }
}

/// Partial update for an existing exercise; `None` leaves a field untouched
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExercisePatch {
    pub name: Option<String>,
    pub weight: Option<f64>,
    pub reps: Option<u32>,
    pub sets: Option<u32>,
    pub rest_time: Option<u32>,
    /// `Some(None)` clears the notes
    pub notes: Option<Option<String>>,
}

impl ExercisePatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// ============================================================================
// Profile
// ============================================================================

/// Personal details entered during onboarding, kept as typed text
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalProfile {
    pub name: String,
    pub age: String,
    pub gender: String,
    pub weight: String,
}

impl PersonalProfile {
    pub fn is_complete(&self) -> bool {
        [&self.name, &self.age, &self.gender, &self.weight]
            .iter()
            .all(|field| !field.trim().is_empty())
    }
}
