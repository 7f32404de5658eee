//! Workout aggregates.
//!
//! A workout is a [`WorkoutCore`] (exercise list, naming, timestamps and
//! optional metadata) composed into one of two variants:
//! - [`RoutineWorkout`]: the recurring template for one weekday
//! - [`LoggedWorkout`]: what actually happened on one calendar date
//!
//! [`Workout`] is the sum of both for code that handles either.

use crate::{
    Difficulty, Error, Exercise, ExerciseDraft, ExercisePatch, LogStatus, Result, Weekday,
};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Generate an exercise id: creation time plus a short random token.
///
/// Unique enough for one device; not a security token.
pub fn generate_exercise_id() -> String {
    let token = Uuid::new_v4().simple().to_string();
    format!("exercise_{}_{}", Utc::now().timestamp_millis(), &token[..9])
}

// ============================================================================
// Shared core
// ============================================================================

/// State and behaviour shared by routine and logged workouts
#[derive(Clone, Debug, PartialEq)]
pub struct WorkoutCore {
    pub(crate) exercises: Vec<Exercise>,
    pub(crate) custom_name: String,
    pub(crate) created: DateTime<Utc>,
    pub(crate) last_modified: DateTime<Utc>,
    pub(crate) target_muscle_groups: Option<BTreeSet<String>>,
    pub(crate) difficulty: Option<Difficulty>,
    pub(crate) notes: Option<String>,
}

impl Default for WorkoutCore {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            exercises: Vec::new(),
            custom_name: String::new(),
            created: now,
            last_modified: now,
            target_muscle_groups: None,
            difficulty: None,
            notes: None,
        }
    }
}

impl WorkoutCore {
    pub fn exercises(&self) -> &[Exercise] {
        &self.exercises
    }

    pub fn exercise(&self, id: &str) -> Option<&Exercise> {
        self.exercises.iter().find(|e| e.id == id)
    }

    pub fn custom_name(&self) -> &str {
        &self.custom_name
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    pub fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    pub fn target_muscle_groups(&self) -> Option<&BTreeSet<String>> {
        self.target_muscle_groups.as_ref()
    }

    pub fn difficulty(&self) -> Option<Difficulty> {
        self.difficulty
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Append a new exercise and return its generated id.
    ///
    /// Duplicate names are allowed.
    pub fn add_exercise(&mut self, draft: ExerciseDraft) -> String {
        let exercise = Exercise {
            id: generate_exercise_id(),
            name: draft.name,
            weight: draft.weight,
            reps: draft.reps,
            sets: draft.sets,
            rest_time: draft.rest_time,
            notes: draft.notes,
            last_updated: Utc::now(),
        };
        let id = exercise.id.clone();
        tracing::debug!("Adding exercise {} ({})", exercise.name, id);
        self.exercises.push(exercise);
        self.touch();
        id
    }

    /// Merge `patch` into the exercise with `id`.
    ///
    /// Returns `false` and changes nothing when the id is unknown.
    pub fn update_exercise(&mut self, id: &str, patch: ExercisePatch) -> bool {
        let Some(exercise) = self.exercises.iter_mut().find(|e| e.id == id) else {
            tracing::debug!("update_exercise: no exercise with id {}", id);
            return false;
        };

        if let Some(name) = patch.name {
            exercise.name = name;
        }
        if let Some(weight) = patch.weight {
            exercise.weight = weight;
        }
        if let Some(reps) = patch.reps {
            exercise.reps = reps;
        }
        if let Some(sets) = patch.sets {
            exercise.sets = sets;
        }
        if let Some(rest_time) = patch.rest_time {
            exercise.rest_time = rest_time;
        }
        if let Some(notes) = patch.notes {
            exercise.notes = notes;
        }
        exercise.last_updated = Utc::now().max(exercise.last_updated);

        self.touch();
        true
    }

    /// Drop the exercise with `id`; a no-op for unknown ids apart from the
    /// timestamp refresh.
    pub fn remove_exercise(&mut self, id: &str) {
        self.exercises.retain(|e| e.id != id);
        self.touch();
    }

    /// Replace the custom name verbatim
    pub fn set_custom_name(&mut self, name: impl Into<String>) {
        self.custom_name = name.into();
        self.touch();
    }

    pub fn set_target_muscle_groups(&mut self, groups: Option<BTreeSet<String>>) {
        self.target_muscle_groups = groups;
        self.touch();
    }

    pub fn set_difficulty(&mut self, difficulty: Option<Difficulty>) {
        self.difficulty = difficulty;
        self.touch();
    }

    pub fn set_notes(&mut self, notes: Option<String>) {
        self.notes = notes;
        self.touch();
    }

    pub fn total_exercises(&self) -> usize {
        self.exercises.len()
    }

    /// Estimated minutes: one minute of work per set plus the rest time.
    pub fn estimated_duration(&self) -> u64 {
        let seconds: u64 = self
            .exercises
            .iter()
            .map(|e| u64::from(e.sets) * (60 + u64::from(e.rest_time)))
            .sum();
        seconds.div_ceil(60)
    }

    /// Refresh `last_modified`, never moving it backwards.
    pub(crate) fn touch(&mut self) {
        self.last_modified = Utc::now().max(self.last_modified);
    }

    /// Drop everything except the timestamps
    fn clear_content(&mut self) {
        self.custom_name.clear();
        self.exercises.clear();
        self.target_muscle_groups = None;
        self.difficulty = None;
        self.notes = None;
    }
}

// ============================================================================
// Routine workouts
// ============================================================================

/// Where a routine day is in the setup flow
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoutineSetupState {
    Unscheduled,
    ScheduledEmpty,
    /// Either a name or exercises, not both
    ScheduledPartial,
    ScheduledComplete,
}

/// The recurring workout template for one weekday
#[derive(Clone, Debug, PartialEq)]
pub struct RoutineWorkout {
    day: Weekday,
    is_scheduled: bool,
    pub(crate) core: WorkoutCore,
}

impl RoutineWorkout {
    pub fn new(day: Weekday, is_scheduled: bool) -> Self {
        Self {
            day,
            is_scheduled,
            core: WorkoutCore::default(),
        }
    }

    pub(crate) fn from_parts(day: Weekday, is_scheduled: bool, core: WorkoutCore) -> Self {
        Self {
            day,
            is_scheduled,
            core,
        }
    }

    pub fn day(&self) -> Weekday {
        self.day
    }

    pub fn is_scheduled(&self) -> bool {
        self.is_scheduled
    }

    pub fn core(&self) -> &WorkoutCore {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut WorkoutCore {
        &mut self.core
    }

    /// Schedule or unschedule the day.
    ///
    /// Unscheduling wipes the name, exercises and metadata; scheduling again
    /// starts from a blank slot.
    pub fn set_scheduled(&mut self, scheduled: bool) {
        self.is_scheduled = scheduled;
        if !scheduled {
            tracing::debug!("Unscheduling {}, clearing workout data", self.day);
            self.core.clear_content();
        }
        self.core.touch();
    }

    /// Flip only the scheduled flag, keeping all workout data
    pub fn set_is_scheduled(&mut self, scheduled: bool) {
        self.is_scheduled = scheduled;
        self.core.touch();
    }

    pub fn setup_state(&self) -> RoutineSetupState {
        if !self.is_scheduled {
            return RoutineSetupState::Unscheduled;
        }
        let named = !self.core.custom_name.trim().is_empty();
        let has_exercises = !self.core.exercises.is_empty();
        match (named, has_exercises) {
            (true, true) => RoutineSetupState::ScheduledComplete,
            (false, false) => RoutineSetupState::ScheduledEmpty,
            _ => RoutineSetupState::ScheduledPartial,
        }
    }

    /// Hint shown next to the day on the routine screen
    pub fn setup_hint(&self) -> &'static str {
        let named = !self.core.custom_name.trim().is_empty();
        let has_exercises = !self.core.exercises.is_empty();
        match (named, has_exercises) {
            (false, false) => "Tap to customize",
            (false, true) => "Day needs name",
            (true, false) => "Add exercise",
            (true, true) => "Complete",
        }
    }
}

// ============================================================================
// Logged workouts
// ============================================================================

/// A record of one specific date's workout
#[derive(Clone, Debug, PartialEq)]
pub struct LoggedWorkout {
    date: NaiveDate,
    original_routine_day: Option<Weekday>,
    completion_time: u32,
    intensity: u8,
    status: LogStatus,
    pub(crate) core: WorkoutCore,
}

impl LoggedWorkout {
    pub const DEFAULT_INTENSITY: u8 = 5;

    pub fn new(date: NaiveDate, original_routine_day: Option<Weekday>) -> Self {
        Self {
            date,
            original_routine_day,
            completion_time: 0,
            intensity: Self::DEFAULT_INTENSITY,
            status: LogStatus::Completed,
            core: WorkoutCore::default(),
        }
    }

    /// Start a log pre-filled from a routine's name and exercises
    pub fn from_routine(date: NaiveDate, routine: &RoutineWorkout) -> Self {
        let mut log = Self::new(date, Some(routine.day()));
        log.core.custom_name = routine.core.custom_name.clone();
        log.core.exercises = routine.core.exercises.clone();
        log.core.target_muscle_groups = routine.core.target_muscle_groups.clone();
        log.core.difficulty = routine.core.difficulty;
        log
    }

    pub(crate) fn from_parts(
        date: NaiveDate,
        original_routine_day: Option<Weekday>,
        completion_time: u32,
        intensity: u8,
        status: LogStatus,
        core: WorkoutCore,
    ) -> Self {
        Self {
            date,
            original_routine_day,
            completion_time,
            intensity,
            status,
            core,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn original_routine_day(&self) -> Option<Weekday> {
        self.original_routine_day
    }

    pub fn completion_time(&self) -> u32 {
        self.completion_time
    }

    pub fn intensity(&self) -> u8 {
        self.intensity
    }

    pub fn status(&self) -> LogStatus {
        self.status
    }

    pub fn core(&self) -> &WorkoutCore {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut WorkoutCore {
        &mut self.core
    }

    /// Set how long the workout took, in minutes
    pub fn set_completion_time(&mut self, minutes: i64) -> Result<()> {
        if minutes < 0 {
            return Err(Error::Invariant(
                "Completion time cannot be negative".into(),
            ));
        }
        self.completion_time = u32::try_from(minutes)
            .map_err(|_| Error::Invariant(format!("Completion time {} is too large", minutes)))?;
        self.core.touch();
        Ok(())
    }

    /// Set the perceived intensity, 1 to 10
    pub fn set_intensity(&mut self, level: i64) -> Result<()> {
        if !(1..=10).contains(&level) {
            return Err(Error::Invariant(
                "Intensity must be between 1 and 10".into(),
            ));
        }
        self.intensity = level as u8;
        self.core.touch();
        Ok(())
    }

    pub fn set_status(&mut self, status: LogStatus) {
        self.status = status;
        self.core.touch();
    }

    pub fn set_original_routine_day(&mut self, day: Weekday) {
        self.original_routine_day = Some(day);
        self.core.touch();
    }
}

// ============================================================================
// Sum type
// ============================================================================

/// Either kind of workout
#[derive(Clone, Debug, PartialEq)]
pub enum Workout {
    Routine(RoutineWorkout),
    Logged(LoggedWorkout),
}

impl Workout {
    pub fn core(&self) -> &WorkoutCore {
        match self {
            Workout::Routine(routine) => &routine.core,
            Workout::Logged(log) => &log.core,
        }
    }

    pub fn core_mut(&mut self) -> &mut WorkoutCore {
        match self {
            Workout::Routine(routine) => &mut routine.core,
            Workout::Logged(log) => &mut log.core,
        }
    }

    pub fn as_routine(&self) -> Option<&RoutineWorkout> {
        match self {
            Workout::Routine(routine) => Some(routine),
            Workout::Logged(_) => None,
        }
    }

    pub fn as_logged(&self) -> Option<&LoggedWorkout> {
        match self {
            Workout::Routine(_) => None,
            Workout::Logged(log) => Some(log),
        }
    }
}

impl From<RoutineWorkout> for Workout {
    fn from(routine: RoutineWorkout) -> Self {
        Workout::Routine(routine)
    }
}

impl From<LoggedWorkout> for Workout {
    fn from(log: LoggedWorkout) -> Self {
        Workout::Logged(log)
    }
}
