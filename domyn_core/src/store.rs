//! The user store: profile, schedule, routines, skips and logs.
//!
//! [`UserStore`] owns the [`Snapshot`] and is its only writer. Callers read
//! through [`UserStore::snapshot`] and change state only through the named
//! commands below; every command persists the whole snapshot before
//! returning.

use crate::kv::KeyValueStore;
use crate::record::{calendar_date, decode_log, decode_routine_for, LoggedRecord, RoutineRecord};
use crate::{
    Error, ExerciseDraft, ExercisePatch, LogStatus, LoggedWorkout, PersonalProfile, Result,
    RoutineWorkout, Weekday,
};
use chrono::{Datelike, NaiveDate};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::{btree_map::Entry, BTreeMap, BTreeSet};

pub const KEY_NAME: &str = "user_name";
pub const KEY_AGE: &str = "user_age";
pub const KEY_GENDER: &str = "user_gender";
pub const KEY_WEIGHT: &str = "user_weight";
pub const KEY_WORKOUTS: &str = "workouts";
pub const KEY_SELECTED_DAYS: &str = "selected_days";
pub const KEY_SKIPPED_DAYS: &str = "skipped_days";
pub const KEY_WORKOUT_LOGS: &str = "workout_logs";

/// Every key the store writes
pub const ALL_KEYS: [&str; 8] = [
    KEY_NAME,
    KEY_AGE,
    KEY_GENDER,
    KEY_WEIGHT,
    KEY_WORKOUTS,
    KEY_SELECTED_DAYS,
    KEY_SKIPPED_DAYS,
    KEY_WORKOUT_LOGS,
];

/// Everything the store knows about the user
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    pub profile: PersonalProfile,
    pub selected_days: BTreeSet<Weekday>,
    pub workouts: BTreeMap<Weekday, RoutineWorkout>,
    pub skipped_days: BTreeMap<NaiveDate, String>,
    pub logs: BTreeMap<NaiveDate, LoggedWorkout>,
}

impl Snapshot {
    /// Whether the routine for `day` exists and is scheduled
    pub fn is_scheduled(&self, day: Weekday) -> bool {
        self.workouts
            .get(&day)
            .map(RoutineWorkout::is_scheduled)
            .unwrap_or(false)
    }

    pub fn log_status(&self, date: NaiveDate) -> Option<LogStatus> {
        self.logs.get(&date).map(LoggedWorkout::status)
    }

    /// Add logs for dates not already logged locally; returns how many
    /// were added
    pub fn merge_logs(&mut self, logs: impl IntoIterator<Item = LoggedWorkout>) -> usize {
        let mut added = 0;
        for log in logs {
            if let Entry::Vacant(slot) = self.logs.entry(log.date()) {
                slot.insert(log);
                added += 1;
            }
        }
        added
    }
}

/// Owner of the user's snapshot, persisted through a [`KeyValueStore`]
pub struct UserStore<K: KeyValueStore> {
    kv: K,
    snapshot: Snapshot,
}

impl<K: KeyValueStore> UserStore<K> {
    /// Load every field from `kv`.
    ///
    /// Missing or unreadable fields fall back to their empty default without
    /// affecting the others.
    pub fn load(kv: K) -> Self {
        let profile = PersonalProfile {
            name: read_text(&kv, KEY_NAME),
            age: read_text(&kv, KEY_AGE),
            gender: read_text(&kv, KEY_GENDER),
            weight: read_text(&kv, KEY_WEIGHT),
        };

        let mut workouts = BTreeMap::new();
        let raw_workouts: BTreeMap<String, Value> =
            read_json(&kv, KEY_WORKOUTS).unwrap_or_default();
        for (key, value) in raw_workouts {
            let Ok(day) = key.parse::<Weekday>() else {
                tracing::warn!("Dropping workout stored under unknown day {:?}", key);
                continue;
            };
            match decode_routine_for(day, value) {
                Ok(routine) => {
                    workouts.insert(day, routine);
                }
                Err(e) => tracing::warn!("Dropping unreadable workout for {}: {}", day, e),
            }
        }

        let selected_days = read_json::<Vec<String>>(&kv, KEY_SELECTED_DAYS)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|name| match name.parse::<Weekday>() {
                Ok(day) => Some(day),
                Err(e) => {
                    tracing::warn!("Ignoring selected day: {}", e);
                    None
                }
            })
            .collect();

        let skipped_days = read_json::<BTreeMap<String, String>>(&kv, KEY_SKIPPED_DAYS)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(key, reason)| match calendar_date::parse(&key) {
                Some(date) => Some((date, reason)),
                None => {
                    tracing::warn!("Ignoring skipped day with invalid date {:?}", key);
                    None
                }
            })
            .collect();

        let mut logs = BTreeMap::new();
        let raw_logs: BTreeMap<String, Value> =
            read_json(&kv, KEY_WORKOUT_LOGS).unwrap_or_default();
        for (key, value) in raw_logs {
            match decode_log(with_field(value, "date", Value::String(key.clone()))) {
                Ok(log) => {
                    logs.insert(log.date(), log);
                }
                Err(e) => tracing::warn!("Dropping unreadable log {:?}: {}", key, e),
            }
        }

        let snapshot = Snapshot {
            profile,
            selected_days,
            workouts,
            skipped_days,
            logs,
        };

        tracing::info!(
            "Loaded user state: {} workouts, {} selected days, {} logs",
            snapshot.workouts.len(),
            snapshot.selected_days.len(),
            snapshot.logs.len()
        );

        Self { kv, snapshot }
    }

    /// Read-only view of the current state
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Give back the underlying key-value store
    pub fn into_inner(self) -> K {
        self.kv
    }

    /// Write the full snapshot, one key per field
    pub fn save_all(&mut self) -> Result<()> {
        let profile = &self.snapshot.profile;
        self.kv.set(KEY_NAME, &serde_json::to_string(&profile.name)?)?;
        self.kv.set(KEY_AGE, &serde_json::to_string(&profile.age)?)?;
        self.kv
            .set(KEY_GENDER, &serde_json::to_string(&profile.gender)?)?;
        self.kv
            .set(KEY_WEIGHT, &serde_json::to_string(&profile.weight)?)?;

        let workouts: BTreeMap<Weekday, RoutineRecord> = self
            .snapshot
            .workouts
            .iter()
            .map(|(day, workout)| (*day, RoutineRecord::from(workout)))
            .collect();
        self.kv.set(KEY_WORKOUTS, &serde_json::to_string(&workouts)?)?;

        let selected: Vec<Weekday> = self.snapshot.selected_days.iter().copied().collect();
        self.kv
            .set(KEY_SELECTED_DAYS, &serde_json::to_string(&selected)?)?;

        let skipped: BTreeMap<String, &String> = self
            .snapshot
            .skipped_days
            .iter()
            .map(|(date, reason)| (date.format(calendar_date::FORMAT).to_string(), reason))
            .collect();
        self.kv
            .set(KEY_SKIPPED_DAYS, &serde_json::to_string(&skipped)?)?;

        let logs: BTreeMap<String, LoggedRecord> = self
            .snapshot
            .logs
            .iter()
            .map(|(date, log)| {
                (
                    date.format(calendar_date::FORMAT).to_string(),
                    LoggedRecord::from(log),
                )
            })
            .collect();
        self.kv.set(KEY_WORKOUT_LOGS, &serde_json::to_string(&logs)?)?;

        tracing::debug!("Saved user snapshot");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Profile
    // ------------------------------------------------------------------

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<()> {
        self.snapshot.profile.name = name.into();
        self.save_all()
    }

    pub fn set_age(&mut self, age: impl Into<String>) -> Result<()> {
        self.snapshot.profile.age = age.into();
        self.save_all()
    }

    pub fn set_gender(&mut self, gender: impl Into<String>) -> Result<()> {
        self.snapshot.profile.gender = gender.into();
        self.save_all()
    }

    pub fn set_weight(&mut self, weight: impl Into<String>) -> Result<()> {
        self.snapshot.profile.weight = weight.into();
        self.save_all()
    }

    pub fn set_profile(&mut self, profile: PersonalProfile) -> Result<()> {
        self.snapshot.profile = profile;
        self.save_all()
    }

    // ------------------------------------------------------------------
    // Schedule and routines
    // ------------------------------------------------------------------

    /// Replace the selected days. Routine entries are left alone.
    pub fn set_selected_days(&mut self, days: impl IntoIterator<Item = Weekday>) -> Result<()> {
        self.snapshot.selected_days = days.into_iter().collect();
        self.save_all()
    }

    /// Create the routine for `day`, or only update its scheduled flag when
    /// it already exists. Existing exercises and names are kept.
    pub fn add_workout(&mut self, day: Weekday, is_scheduled: bool) -> Result<()> {
        match self.snapshot.workouts.get_mut(&day) {
            Some(existing) => {
                tracing::debug!("Workout for {} exists, updating scheduled flag", day);
                existing.set_is_scheduled(is_scheduled);
            }
            None => {
                tracing::debug!("Creating workout for {}", day);
                self.snapshot
                    .workouts
                    .insert(day, RoutineWorkout::new(day, is_scheduled));
            }
        }
        self.save_all()
    }

    pub fn get_workout(&self, day: Weekday) -> Option<&RoutineWorkout> {
        self.snapshot.workouts.get(&day)
    }

    /// Replace the routine stored under `day`
    pub fn update_workout(&mut self, day: Weekday, workout: RoutineWorkout) -> Result<()> {
        if workout.day() != day {
            tracing::warn!(
                "Storing {} workout under {}; keys follow the caller",
                workout.day(),
                day
            );
        }
        self.snapshot.workouts.insert(day, workout);
        self.save_all()
    }

    /// Replace all routines, e.g. after pulling them from the remote store.
    /// The selected days follow the routines' scheduled flags.
    pub fn import_routines(&mut self, workouts: BTreeMap<Weekday, RoutineWorkout>) -> Result<()> {
        self.snapshot.selected_days = workouts
            .values()
            .filter(|w| w.is_scheduled())
            .map(RoutineWorkout::day)
            .collect();
        self.snapshot.workouts = workouts;
        self.save_all()
    }

    fn routine_mut(&mut self, day: Weekday) -> Result<&mut RoutineWorkout> {
        self.snapshot
            .workouts
            .get_mut(&day)
            .ok_or_else(|| Error::State(format!("No workout set up for {}", day)))
    }

    /// Add an exercise to `day` and return the new exercise id
    pub fn add_exercise(&mut self, day: Weekday, draft: ExerciseDraft) -> Result<String> {
        let id = self.routine_mut(day)?.core_mut().add_exercise(draft);
        self.save_all()?;
        Ok(id)
    }

    /// Returns whether an exercise with `id` was found
    pub fn update_exercise(&mut self, day: Weekday, id: &str, patch: ExercisePatch) -> Result<bool> {
        let found = self.routine_mut(day)?.core_mut().update_exercise(id, patch);
        self.save_all()?;
        Ok(found)
    }

    pub fn remove_exercise(&mut self, day: Weekday, id: &str) -> Result<()> {
        self.routine_mut(day)?.core_mut().remove_exercise(id);
        self.save_all()
    }

    pub fn set_custom_name(&mut self, day: Weekday, name: impl Into<String>) -> Result<()> {
        self.routine_mut(day)?.core_mut().set_custom_name(name);
        self.save_all()
    }

    /// Schedule or unschedule `day`; unscheduling wipes its routine
    pub fn set_scheduled(&mut self, day: Weekday, scheduled: bool) -> Result<()> {
        self.routine_mut(day)?.set_scheduled(scheduled);
        if scheduled {
            self.snapshot.selected_days.insert(day);
        } else {
            self.snapshot.selected_days.remove(&day);
        }
        self.save_all()
    }

    // ------------------------------------------------------------------
    // Skips and logs
    // ------------------------------------------------------------------

    pub fn add_skipped_day(&mut self, date: NaiveDate, reason: impl Into<String>) -> Result<()> {
        self.snapshot.skipped_days.insert(date, reason.into());
        self.save_all()
    }

    pub fn get_skipped_day_reason(&self, date: NaiveDate) -> Option<&str> {
        self.snapshot.skipped_days.get(&date).map(String::as_str)
    }

    /// Store `log` as the record for its date, replacing any earlier one
    pub fn record_log(&mut self, log: LoggedWorkout) -> Result<()> {
        tracing::info!("Recording {} workout for {}", log.status(), log.date());
        self.snapshot.logs.insert(log.date(), log);
        self.save_all()
    }

    /// Log the routine for `date` as completed
    pub fn complete_day(
        &mut self,
        date: NaiveDate,
        minutes: Option<i64>,
        intensity: Option<i64>,
    ) -> Result<&LoggedWorkout> {
        let day = Weekday::from_chrono(date.weekday());
        let mut log = match self.snapshot.workouts.get(&day) {
            Some(routine) if routine.is_scheduled() => LoggedWorkout::from_routine(date, routine),
            _ => LoggedWorkout::new(date, None),
        };
        if let Some(minutes) = minutes {
            log.set_completion_time(minutes)?;
        }
        if let Some(level) = intensity {
            log.set_intensity(level)?;
        }
        log.set_status(LogStatus::Completed);

        self.record_log(log)?;
        self.get_log(date)
            .ok_or_else(|| Error::State(format!("Log for {} missing after save", date)))
    }

    /// Record a skip: the reason and a skipped log for the date
    pub fn skip_day(&mut self, date: NaiveDate, reason: impl Into<String>) -> Result<()> {
        let day = Weekday::from_chrono(date.weekday());
        let routine_day = self.snapshot.is_scheduled(day).then_some(day);

        let mut log = LoggedWorkout::new(date, routine_day);
        log.set_status(LogStatus::Skipped);

        self.snapshot.skipped_days.insert(date, reason.into());
        self.record_log(log)
    }

    pub fn get_log(&self, date: NaiveDate) -> Option<&LoggedWorkout> {
        self.snapshot.logs.get(&date)
    }

    /// Logs with `start <= date <= end`, oldest first
    pub fn logs_between(&self, start: NaiveDate, end: NaiveDate) -> Vec<&LoggedWorkout> {
        if start > end {
            return Vec::new();
        }
        self.snapshot.logs.range(start..=end).map(|(_, log)| log).collect()
    }

    // ------------------------------------------------------------------
    // Reset
    // ------------------------------------------------------------------

    /// Wipe every field and every stored key. Irreversible.
    pub fn reset_user(&mut self) -> Result<()> {
        self.snapshot = Snapshot::default();
        self.kv.remove_many(&ALL_KEYS)?;
        tracing::info!("Reset all user data");
        Ok(())
    }
}

/// Read a JSON value; absent, unreadable or malformed entries give `None`
fn read_json<T: DeserializeOwned>(kv: &impl KeyValueStore, key: &str) -> Option<T> {
    let raw = match kv.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!("Unable to read {}: {}. Using default.", key, e);
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Failed to parse {}: {}. Using default.", key, e);
            None
        }
    }
}

/// Profile fields are JSON strings; older data stored the bare text
fn read_text(kv: &impl KeyValueStore, key: &str) -> String {
    match kv.get(key) {
        Ok(Some(raw)) => serde_json::from_str::<String>(&raw).unwrap_or(raw),
        Ok(None) => String::new(),
        Err(e) => {
            tracing::warn!("Unable to read {}: {}. Using default.", key, e);
            String::new()
        }
    }
}

/// Fill `field` on an object when it is missing
fn with_field(mut value: Value, field: &str, fallback: Value) -> Value {
    if let Value::Object(map) = &mut value {
        map.entry(field).or_insert(fallback);
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::{DirStore, MemoryStore};

    fn store() -> UserStore<MemoryStore> {
        crate::logging::init_test();
        UserStore::load(MemoryStore::new())
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_empty_load_defaults() {
        let store = store();
        assert_eq!(store.snapshot(), &Snapshot::default());
    }

    #[test]
    fn test_monday_wednesday_scenario() {
        let mut store = store();
        store
            .set_selected_days([Weekday::Monday, Weekday::Wednesday])
            .unwrap();
        store.add_workout(Weekday::Monday, true).unwrap();
        store.add_workout(Weekday::Wednesday, true).unwrap();
        store
            .add_exercise(Weekday::Monday, ExerciseDraft::new("Squat", 135.0, 5, 3))
            .unwrap();

        assert_eq!(
            store.get_workout(Weekday::Monday).unwrap().core().total_exercises(),
            1
        );
        assert_eq!(
            store
                .get_workout(Weekday::Wednesday)
                .unwrap()
                .core()
                .total_exercises(),
            0
        );

        store.reset_user().unwrap();
        assert!(store.get_workout(Weekday::Monday).is_none());
        assert!(store.get_workout(Weekday::Wednesday).is_none());
        assert!(store.into_inner().is_empty());
    }

    #[test]
    fn test_add_workout_twice_keeps_exercises() {
        let mut store = store();
        store.add_workout(Weekday::Friday, true).unwrap();
        store.set_custom_name(Weekday::Friday, "Arms").unwrap();
        store
            .add_exercise(Weekday::Friday, ExerciseDraft::new("Curl", 25.0, 12, 3))
            .unwrap();

        store.add_workout(Weekday::Friday, false).unwrap();
        let friday = store.get_workout(Weekday::Friday).unwrap();
        assert!(!friday.is_scheduled());
        assert_eq!(friday.core().total_exercises(), 1);
        assert_eq!(friday.core().custom_name(), "Arms");

        store.add_workout(Weekday::Friday, true).unwrap();
        assert_eq!(
            store.get_workout(Weekday::Friday).unwrap().core().total_exercises(),
            1
        );
    }

    #[test]
    fn test_selected_days_do_not_create_workouts() {
        let mut store = store();
        store.set_selected_days([Weekday::Tuesday]).unwrap();
        assert!(store.get_workout(Weekday::Tuesday).is_none());
        assert!(store.snapshot().selected_days.contains(&Weekday::Tuesday));
    }

    #[test]
    fn test_exercise_commands_require_existing_day() {
        let mut store = store();
        let result = store.add_exercise(Weekday::Sunday, ExerciseDraft::new("Run", 0.0, 1, 1));
        assert!(matches!(result, Err(Error::State(_))));
    }

    #[test]
    fn test_update_and_remove_exercise_by_id() {
        let mut store = store();
        store.add_workout(Weekday::Monday, true).unwrap();
        let id = store
            .add_exercise(Weekday::Monday, ExerciseDraft::new("Bench", 95.0, 8, 3))
            .unwrap();

        let found = store
            .update_exercise(
                Weekday::Monday,
                &id,
                ExercisePatch {
                    weight: Some(100.0),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(found);
        assert!(!store
            .update_exercise(Weekday::Monday, "nope", ExercisePatch::default())
            .unwrap());

        let monday = store.get_workout(Weekday::Monday).unwrap();
        assert_eq!(monday.core().exercise(&id).unwrap().weight, 100.0);

        store.remove_exercise(Weekday::Monday, &id).unwrap();
        assert_eq!(
            store.get_workout(Weekday::Monday).unwrap().core().total_exercises(),
            0
        );
    }

    #[test]
    fn test_update_workout_replaces_entry() {
        let mut store = store();
        store.add_workout(Weekday::Monday, true).unwrap();

        let mut replacement = RoutineWorkout::new(Weekday::Monday, true);
        replacement.core_mut().set_custom_name("Fresh");
        store.update_workout(Weekday::Monday, replacement).unwrap();

        assert_eq!(
            store.get_workout(Weekday::Monday).unwrap().core().custom_name(),
            "Fresh"
        );
    }

    #[test]
    fn test_set_scheduled_false_wipes_day() {
        let mut store = store();
        store.set_selected_days([Weekday::Thursday]).unwrap();
        store.add_workout(Weekday::Thursday, true).unwrap();
        store.set_custom_name(Weekday::Thursday, "Cardio").unwrap();

        store.set_scheduled(Weekday::Thursday, false).unwrap();
        let thursday = store.get_workout(Weekday::Thursday).unwrap();
        assert_eq!(thursday.core().custom_name(), "");
        assert!(!store.snapshot().selected_days.contains(&Weekday::Thursday));
    }

    #[test]
    fn test_snapshot_survives_reload() {
        let mut store = store();
        store
            .set_profile(PersonalProfile {
                name: "Alex".into(),
                age: "29".into(),
                gender: "f".into(),
                weight: "140".into(),
            })
            .unwrap();
        store.set_selected_days([Weekday::Monday]).unwrap();
        store.add_workout(Weekday::Monday, true).unwrap();
        store.set_custom_name(Weekday::Monday, "Push").unwrap();
        store
            .add_exercise(
                Weekday::Monday,
                ExerciseDraft::new("Press", 65.0, 8, 4).with_rest(90),
            )
            .unwrap();
        store
            .add_skipped_day(date(2024, 3, 6), "travel")
            .unwrap();
        store.complete_day(date(2024, 3, 4), Some(50), Some(7)).unwrap();

        let before = store.snapshot().clone();
        let reloaded = UserStore::load(store.into_inner());
        let after = reloaded.snapshot();

        assert_eq!(after.profile, before.profile);
        assert_eq!(after.selected_days, before.selected_days);
        assert_eq!(after.skipped_days, before.skipped_days);

        let monday = &after.workouts[&Weekday::Monday];
        let original = &before.workouts[&Weekday::Monday];
        assert_eq!(monday.day(), original.day());
        assert_eq!(monday.is_scheduled(), original.is_scheduled());
        assert_eq!(monday.core().custom_name(), original.core().custom_name());
        assert_eq!(monday.core().exercises(), original.core().exercises());
        assert!(monday.core().last_modified() >= monday.core().created());

        let log = &after.logs[&date(2024, 3, 4)];
        assert_eq!(log.completion_time(), 50);
        assert_eq!(log.intensity(), 7);
        assert_eq!(log.original_routine_day(), Some(Weekday::Monday));
    }

    #[test]
    fn test_load_tolerates_bad_fields() {
        let mut kv = MemoryStore::new();
        kv.set(KEY_NAME, "Jordan").unwrap();
        kv.set(KEY_AGE, "\"31\"").unwrap();
        kv.set(KEY_WORKOUTS, "{ not json").unwrap();
        kv.set(KEY_SELECTED_DAYS, r#"["Mon", "Someday", "Friday"]"#)
            .unwrap();
        kv.set(KEY_SKIPPED_DAYS, r#"{"2024-03-01": "sick", "bad": "x"}"#)
            .unwrap();

        let store = UserStore::load(kv);
        let snapshot = store.snapshot();
        assert_eq!(snapshot.profile.name, "Jordan");
        assert_eq!(snapshot.profile.age, "31");
        assert!(snapshot.workouts.is_empty());
        assert_eq!(
            snapshot.selected_days,
            [Weekday::Monday, Weekday::Friday].into_iter().collect()
        );
        assert_eq!(snapshot.skipped_days.len(), 1);
        assert_eq!(store.get_skipped_day_reason(date(2024, 3, 1)), Some("sick"));
    }

    #[test]
    fn test_load_normalizes_abbreviated_workout_keys() {
        let mut kv = MemoryStore::new();
        kv.set(
            KEY_WORKOUTS,
            r#"{"tue": {"isScheduled": true, "customName": "Back"}, "Blursday": {}}"#,
        )
        .unwrap();

        let store = UserStore::load(kv);
        let tuesday = store.get_workout(Weekday::Tuesday).unwrap();
        assert_eq!(tuesday.day(), Weekday::Tuesday);
        assert_eq!(tuesday.core().custom_name(), "Back");
        assert_eq!(store.snapshot().workouts.len(), 1);
    }

    #[test]
    fn test_legacy_workout_shape_survives_save() {
        let mut kv = MemoryStore::new();
        kv.set(
            KEY_WORKOUTS,
            r#"{"Monday": {"dayName": "Monday", "isScheduled": true, "customName": "Legs",
                "exercise": [{"nameOfExercise": "Squat", "weight": 135, "reps": 5, "sets": 3}]}}"#,
        )
        .unwrap();

        let mut store = UserStore::load(kv);
        store.set_name("Robin").unwrap();

        let reloaded = UserStore::load(store.into_inner());
        let monday = reloaded.get_workout(Weekday::Monday).unwrap();
        assert_eq!(monday.core().custom_name(), "Legs");
        assert_eq!(monday.core().total_exercises(), 1);
        assert_eq!(monday.core().exercises()[0].name, "Squat");
        assert_eq!(monday.core().exercises()[0].weight, 135.0);
    }

    #[test]
    fn test_bad_exercise_does_not_drop_day() {
        let mut kv = MemoryStore::new();
        kv.set(
            KEY_WORKOUTS,
            r#"{"Friday": {"isScheduled": true, "customName": "Pull", "exercises": [
                {"name": "Row", "weight": 40, "reps": 10, "sets": 3},
                {"name": "Curl", "weight": null, "reps": 12, "sets": 3},
                {"reps": "many"}
            ]}}"#,
        )
        .unwrap();

        let store = UserStore::load(kv);
        let friday = store.get_workout(Weekday::Friday).unwrap();
        assert_eq!(friday.core().custom_name(), "Pull");
        assert_eq!(friday.core().total_exercises(), 2);
        assert_eq!(friday.core().exercises()[1].weight, 0.0);
    }

    #[test]
    fn test_workout_key_wins_over_stored_day() {
        let mut kv = MemoryStore::new();
        kv.set(
            KEY_WORKOUTS,
            r#"{"tue": {"day": "Wednesday", "isScheduled": true, "customName": "Back"}}"#,
        )
        .unwrap();

        let store = UserStore::load(kv);
        let snapshot = store.snapshot();
        assert_eq!(snapshot.workouts.len(), 1);
        let tuesday = store.get_workout(Weekday::Tuesday).unwrap();
        assert_eq!(tuesday.day(), Weekday::Tuesday);
        assert!(store.get_workout(Weekday::Wednesday).is_none());
    }

    #[test]
    fn test_merge_logs_keeps_local_entries() {
        let mut store = store();
        store.add_workout(Weekday::Monday, true).unwrap();
        store.complete_day(date(2024, 3, 4), Some(30), None).unwrap();

        let mut remote_monday = LoggedWorkout::new(date(2024, 3, 4), Some(Weekday::Monday));
        remote_monday.set_status(LogStatus::Skipped);
        let remote_tuesday = LoggedWorkout::new(date(2024, 3, 5), None);

        let mut snapshot = store.snapshot().clone();
        let added = snapshot.merge_logs(vec![remote_monday, remote_tuesday]);
        assert_eq!(added, 1);
        assert_eq!(snapshot.log_status(date(2024, 3, 4)), Some(LogStatus::Completed));
        assert_eq!(snapshot.log_status(date(2024, 3, 5)), Some(LogStatus::Completed));
    }

    #[test]
    fn test_skip_day_records_reason_and_log() {
        let mut store = store();
        store.add_workout(Weekday::Wednesday, true).unwrap();
        let wednesday = date(2024, 3, 6);

        store.skip_day(wednesday, "rest").unwrap();
        assert_eq!(store.get_skipped_day_reason(wednesday), Some("rest"));
        let log = store.get_log(wednesday).unwrap();
        assert_eq!(log.status(), LogStatus::Skipped);
        assert_eq!(log.original_routine_day(), Some(Weekday::Wednesday));
    }

    #[test]
    fn test_complete_day_rejects_bad_intensity_without_saving() {
        let mut store = store();
        let result = store.complete_day(date(2024, 3, 4), None, Some(12));
        assert!(matches!(result, Err(Error::Invariant(_))));
        assert!(store.get_log(date(2024, 3, 4)).is_none());
    }

    #[test]
    fn test_logs_between_is_inclusive() {
        let mut store = store();
        for day in 1..=9 {
            store.complete_day(date(2024, 3, day), None, None).unwrap();
        }

        let week = store.logs_between(date(2024, 3, 4), date(2024, 3, 10));
        assert_eq!(week.len(), 6);
        assert_eq!(week[0].date(), date(2024, 3, 4));
        assert!(store
            .logs_between(date(2024, 3, 10), date(2024, 3, 1))
            .is_empty());
    }

    #[test]
    fn test_import_routines_sets_selection() {
        let mut store = store();
        let mut routines = BTreeMap::new();
        routines.insert(Weekday::Monday, RoutineWorkout::new(Weekday::Monday, true));
        routines.insert(Weekday::Tuesday, RoutineWorkout::new(Weekday::Tuesday, false));

        store.import_routines(routines).unwrap();
        assert_eq!(
            store.snapshot().selected_days,
            [Weekday::Monday].into_iter().collect()
        );
        assert_eq!(store.snapshot().workouts.len(), 2);
    }

    #[test]
    fn test_dir_store_backed_reset_removes_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = UserStore::load(DirStore::new(temp_dir.path()));
        store.set_name("Casey").unwrap();
        assert!(temp_dir.path().join("user_name.json").exists());

        store.reset_user().unwrap();
        let remaining = std::fs::read_dir(temp_dir.path()).unwrap().count();
        assert_eq!(remaining, 0);

        let reloaded = UserStore::load(DirStore::new(temp_dir.path()));
        assert_eq!(reloaded.snapshot(), &Snapshot::default());
    }
}
