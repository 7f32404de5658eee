//! Plain serializable records for workouts.
//!
//! Aggregates are persisted as records and re-hydrated with the `From`
//! conversions here. Stored data may come from older app versions, so every
//! optional field has a default and timestamps are read leniently.

use crate::{
    Difficulty, Exercise, LogStatus, LoggedWorkout, Result, RoutineWorkout, Weekday, Workout,
    WorkoutCore,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Lenient timestamp deserialization.
///
/// Accepts RFC 3339 strings, epoch milliseconds, and `{seconds, nanoseconds}`
/// objects as written by the document backend.
pub mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{de::Error as _, Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTimestamp {
        Text(String),
        Millis(i64),
        Float(f64),
        Server {
            seconds: i64,
            #[serde(default)]
            nanoseconds: u32,
        },
    }

    fn convert(raw: RawTimestamp) -> Result<DateTime<Utc>, String> {
        match raw {
            RawTimestamp::Text(text) => DateTime::parse_from_rfc3339(&text)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| format!("invalid timestamp {:?}: {}", text, e)),
            RawTimestamp::Millis(millis) => DateTime::from_timestamp_millis(millis)
                .ok_or_else(|| format!("timestamp out of range: {}", millis)),
            RawTimestamp::Float(millis) => DateTime::from_timestamp_millis(millis as i64)
                .ok_or_else(|| format!("timestamp out of range: {}", millis)),
            RawTimestamp::Server {
                seconds,
                nanoseconds,
            } => DateTime::from_timestamp(seconds, nanoseconds)
                .ok_or_else(|| format!("timestamp out of range: {}s", seconds)),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        convert(RawTimestamp::deserialize(deserializer)?).map_err(D::Error::custom)
    }

    pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<RawTimestamp>::deserialize(deserializer)? {
            Some(raw) => convert(raw).map(Some).map_err(D::Error::custom),
            None => Ok(None),
        }
    }
}

/// Calendar dates stored either as `YYYY-MM-DD` or as a full timestamp
pub mod calendar_date {
    use chrono::{DateTime, NaiveDate};
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d";

    pub fn parse(text: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(text, FORMAT)
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
    }

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        parse(&text).ok_or_else(|| D::Error::custom(format!("invalid date {:?}", text)))
    }
}

/// Field decoders that fall back to defaults instead of failing the record
pub mod lenient {
    use crate::Exercise;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// `null` reads as the type's default
    pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
    }

    /// Exercise list; unreadable entries are skipped and the rest kept
    pub fn exercises<'de, D>(deserializer: D) -> Result<Vec<Exercise>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let items = match Value::deserialize(deserializer)? {
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            other => {
                tracing::warn!("Ignoring exercise list that is not an array: {}", other);
                Vec::new()
            }
        };

        Ok(items
            .into_iter()
            .enumerate()
            .filter_map(|(index, item)| match serde_json::from_value::<Exercise>(item) {
                Ok(exercise) => Some(exercise),
                Err(e) => {
                    tracing::warn!("Skipping unreadable exercise #{}: {}", index, e);
                    None
                }
            })
            .collect())
    }
}

/// Plain form of a [`RoutineWorkout`]
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutineRecord {
    #[serde(alias = "dayName")]
    pub day: Weekday,
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub is_scheduled: bool,
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub custom_name: String,
    #[serde(default, alias = "exercise", deserialize_with = "lenient::exercises")]
    pub exercises: Vec<Exercise>,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub last_modified: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_muscle_groups: Option<BTreeSet<String>>,
    /// Derived from the exercises; written for readers, ignored on load
    #[serde(default)]
    pub total_duration: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Plain form of a [`LoggedWorkout`]
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggedRecord {
    #[serde(with = "calendar_date")]
    pub date: NaiveDate,
    #[serde(default)]
    pub original_routine_day: Option<Weekday>,
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub custom_name: String,
    #[serde(default, alias = "exercise", deserialize_with = "lenient::exercises")]
    pub exercises: Vec<Exercise>,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub last_modified: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub completion_time: u32,
    #[serde(default)]
    pub intensity: Option<u8>,
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub status: LogStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_muscle_groups: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Tagged record for either workout kind
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkoutRecord {
    Routine(RoutineRecord),
    Logged(LoggedRecord),
}

/// Rebuild the shared core; `last_modified` is clamped so it never
/// precedes `created`.
fn core_from_parts(
    custom_name: String,
    exercises: Vec<Exercise>,
    created: Option<DateTime<Utc>>,
    last_modified: Option<DateTime<Utc>>,
    target_muscle_groups: Option<BTreeSet<String>>,
    difficulty: Option<Difficulty>,
    notes: Option<String>,
) -> WorkoutCore {
    let created = created.unwrap_or_else(Utc::now);
    let last_modified = last_modified.unwrap_or(created).max(created);
    WorkoutCore {
        exercises,
        custom_name,
        created,
        last_modified,
        target_muscle_groups,
        difficulty,
        notes,
    }
}

impl From<&RoutineWorkout> for RoutineRecord {
    fn from(workout: &RoutineWorkout) -> Self {
        let core = workout.core();
        RoutineRecord {
            day: workout.day(),
            is_scheduled: workout.is_scheduled(),
            custom_name: core.custom_name.clone(),
            exercises: core.exercises.clone(),
            created: Some(core.created),
            last_modified: Some(core.last_modified),
            target_muscle_groups: core.target_muscle_groups.clone(),
            total_duration: core.estimated_duration(),
            difficulty: core.difficulty,
            notes: core.notes.clone(),
        }
    }
}

impl From<RoutineRecord> for RoutineWorkout {
    fn from(record: RoutineRecord) -> Self {
        let core = core_from_parts(
            record.custom_name,
            record.exercises,
            record.created,
            record.last_modified,
            record.target_muscle_groups,
            record.difficulty,
            record.notes,
        );
        RoutineWorkout::from_parts(record.day, record.is_scheduled, core)
    }
}

impl From<&LoggedWorkout> for LoggedRecord {
    fn from(workout: &LoggedWorkout) -> Self {
        let core = workout.core();
        LoggedRecord {
            date: workout.date(),
            original_routine_day: workout.original_routine_day(),
            custom_name: core.custom_name.clone(),
            exercises: core.exercises.clone(),
            created: Some(core.created),
            last_modified: Some(core.last_modified),
            completion_time: workout.completion_time(),
            intensity: Some(workout.intensity()),
            status: workout.status(),
            target_muscle_groups: core.target_muscle_groups.clone(),
            difficulty: core.difficulty,
            notes: core.notes.clone(),
        }
    }
}

impl From<LoggedRecord> for LoggedWorkout {
    fn from(record: LoggedRecord) -> Self {
        let core = core_from_parts(
            record.custom_name,
            record.exercises,
            record.created,
            record.last_modified,
            record.target_muscle_groups,
            record.difficulty,
            record.notes,
        );
        let intensity = record
            .intensity
            .filter(|level| (1..=10).contains(level))
            .unwrap_or(LoggedWorkout::DEFAULT_INTENSITY);
        LoggedWorkout::from_parts(
            record.date,
            record.original_routine_day,
            record.completion_time,
            intensity,
            record.status,
            core,
        )
    }
}

impl From<&Workout> for WorkoutRecord {
    fn from(workout: &Workout) -> Self {
        match workout {
            Workout::Routine(routine) => WorkoutRecord::Routine(routine.into()),
            Workout::Logged(log) => WorkoutRecord::Logged(log.into()),
        }
    }
}

impl From<WorkoutRecord> for Workout {
    fn from(record: WorkoutRecord) -> Self {
        match record {
            WorkoutRecord::Routine(record) => Workout::Routine(record.into()),
            WorkoutRecord::Logged(record) => Workout::Logged(record.into()),
        }
    }
}

/// Decode a routine from a stored JSON value
pub fn decode_routine(value: serde_json::Value) -> Result<RoutineWorkout> {
    let record: RoutineRecord = serde_json::from_value(value)?;
    Ok(record.into())
}

/// Decode a routine stored under `day`.
///
/// The storage key is authoritative: any day named in the body, including
/// the legacy `dayName` field, is replaced by it.
pub fn decode_routine_for(day: Weekday, mut value: serde_json::Value) -> Result<RoutineWorkout> {
    if let serde_json::Value::Object(map) = &mut value {
        map.remove("dayName");
        let stored = map.insert("day".into(), serde_json::Value::String(day.to_string()));
        if let Some(stored) = stored.as_ref().and_then(serde_json::Value::as_str) {
            if stored.parse::<Weekday>().ok() != Some(day) {
                tracing::warn!("Routine stored under {} names {:?}; using {}", day, stored, day);
            }
        }
    }
    decode_routine(value)
}

/// Decode a logged workout from a stored JSON value
pub fn decode_log(value: serde_json::Value) -> Result<LoggedWorkout> {
    let record: LoggedRecord = serde_json::from_value(value)?;
    Ok(record.into())
}

/// Decode a tagged workout record
pub fn decode_workout(value: serde_json::Value) -> Result<Workout> {
    let record: WorkoutRecord = serde_json::from_value(value)?;
    Ok(record.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExerciseDraft;
    use serde_json::json;

    #[test]
    fn test_routine_roundtrip_preserves_content() {
        let mut routine = RoutineWorkout::new(Weekday::Wednesday, true);
        routine.core_mut().set_custom_name("Legs");
        routine
            .core_mut()
            .add_exercise(ExerciseDraft::new("Squat", 225.0, 5, 5).with_rest(90));

        let value = serde_json::to_value(RoutineRecord::from(&routine)).unwrap();
        assert_eq!(value["totalDuration"], json!(13));

        let restored = decode_routine(value).unwrap();
        assert_eq!(restored.day(), Weekday::Wednesday);
        assert!(restored.is_scheduled());
        assert_eq!(restored.core().custom_name(), "Legs");
        assert_eq!(restored.core().exercises(), routine.core().exercises());
        assert!(restored.core().last_modified() >= restored.core().created());
    }

    #[test]
    fn test_total_duration_is_recomputed() {
        let value = json!({
            "day": "Monday",
            "isScheduled": true,
            "exercises": [{"id": "e1", "name": "Row", "weight": 40, "reps": 10, "sets": 3, "restTime": 2}],
            "totalDuration": 999
        });
        let routine = decode_routine(value).unwrap();
        assert_eq!(routine.core().estimated_duration(), 4);
    }

    #[test]
    fn test_minimal_routine_defaults() {
        let routine = decode_routine(json!({"day": "fri"})).unwrap();
        assert_eq!(routine.day(), Weekday::Friday);
        assert!(!routine.is_scheduled());
        assert_eq!(routine.core().custom_name(), "");
        assert!(routine.core().exercises().is_empty());
        assert!(routine.core().difficulty().is_none());
    }

    #[test]
    fn test_timestamps_accept_strings_and_millis() {
        let routine = decode_routine(json!({
            "day": "Monday",
            "created": 1_700_000_000_000i64,
            "lastModified": "2023-11-15T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(routine.core().created().timestamp_millis(), 1_700_000_000_000);
        assert!(routine.core().last_modified() >= routine.core().created());
    }

    #[test]
    fn test_last_modified_clamped_to_created() {
        let routine = decode_routine(json!({
            "day": "Monday",
            "created": "2024-01-02T00:00:00Z",
            "lastModified": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(routine.core().last_modified(), routine.core().created());
    }

    #[test]
    fn test_legacy_exercise_field_names() {
        let routine = decode_routine(json!({
            "dayName": "Monday",
            "exercise": [{"nameOfExercise": "Squat", "weight": 135, "reps": 5, "sets": 3}]
        }))
        .unwrap();
        assert_eq!(routine.day(), Weekday::Monday);
        assert_eq!(routine.core().total_exercises(), 1);
        assert_eq!(routine.core().exercises()[0].name, "Squat");
        assert!(routine.core().exercises()[0].id.starts_with("exercise_"));
    }

    #[test]
    fn test_bad_exercise_skipped_rest_kept() {
        let routine = decode_routine(json!({
            "day": "Friday",
            "customName": "Pull",
            "exercises": [
                {"name": "Row", "weight": 40, "reps": 10, "sets": 3},
                {"weight": 20, "reps": 10, "sets": 3},
                {"name": "Curl", "weight": null, "reps": 12, "sets": null}
            ]
        }))
        .unwrap();
        assert_eq!(routine.core().custom_name(), "Pull");
        let names: Vec<&str> = routine
            .core()
            .exercises()
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(names, vec!["Row", "Curl"]);
        assert_eq!(routine.core().exercises()[1].weight, 0.0);
        assert_eq!(routine.core().exercises()[1].sets, 0);
    }

    #[test]
    fn test_null_fields_default() {
        let routine = decode_routine(json!({
            "day": "Monday",
            "isScheduled": null,
            "customName": null,
            "exercises": null
        }))
        .unwrap();
        assert!(!routine.is_scheduled());
        assert_eq!(routine.core().custom_name(), "");
        assert!(routine.core().exercises().is_empty());
    }

    #[test]
    fn test_storage_key_decides_day() {
        let routine = decode_routine_for(
            Weekday::Tuesday,
            json!({"day": "Wednesday", "dayName": "Wednesday", "customName": "Legs"}),
        )
        .unwrap();
        assert_eq!(routine.day(), Weekday::Tuesday);
        assert_eq!(routine.core().custom_name(), "Legs");
    }

    #[test]
    fn test_logged_record_defaults() {
        let log = decode_log(json!({"date": "2024-03-04T00:00:00.000Z", "intensity": 0})).unwrap();
        assert_eq!(log.date(), NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        assert_eq!(log.intensity(), 5);
        assert_eq!(log.status(), LogStatus::Completed);
        assert_eq!(log.completion_time(), 0);
    }

    #[test]
    fn test_logged_roundtrip() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let mut log = LoggedWorkout::new(date, Some(Weekday::Tuesday));
        log.set_status(LogStatus::Skipped);
        log.set_intensity(3).unwrap();

        let value = serde_json::to_value(LoggedRecord::from(&log)).unwrap();
        assert_eq!(value["date"], json!("2024-03-05"));
        assert_eq!(value["status"], json!("skipped"));

        let restored = decode_log(value).unwrap();
        assert_eq!(restored.original_routine_day(), Some(Weekday::Tuesday));
        assert_eq!(restored.status(), LogStatus::Skipped);
        assert_eq!(restored.intensity(), 3);
    }

    #[test]
    fn test_tagged_workout_record() {
        let routine = RoutineWorkout::new(Weekday::Sunday, true);
        let value = serde_json::to_value(WorkoutRecord::from(&Workout::from(routine))).unwrap();
        assert_eq!(value["kind"], json!("routine"));

        let workout = decode_workout(value).unwrap();
        assert_eq!(workout.as_routine().map(|r| r.day()), Some(Weekday::Sunday));
    }
}
