#![forbid(unsafe_code)]

//! Core domain model and business logic for the Domyn workout tracker.
//!
//! This crate provides:
//! - Domain types (weekdays, exercises, statuses, profile)
//! - Routine and logged workout aggregates
//! - The user context store over key-value persistence
//! - Weekly status derivation
//! - Form validation
//! - Remote document sync and CSV export

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod workout;
pub mod record;
pub mod kv;
pub mod store;
pub mod status;
pub mod validation;
pub mod remote;
pub mod export;

// Re-export commonly used types
pub use error::{Error, RemoteError, Result};
pub use types::*;
pub use workout::{LoggedWorkout, RoutineSetupState, RoutineWorkout, Workout, WorkoutCore};
pub use config::Config;
pub use kv::{DirStore, KeyValueStore, MemoryStore};
pub use store::{Snapshot, UserStore};
pub use status::{derive_status, today_local, week_overview, week_start, StatusQuery, WeekDayStatus};
pub use remote::{
    DirDocumentStore, DocumentStore, Identity, MemoryDocumentStore, RemoteSync, StaticIdentity,
};
pub use export::export_logs_csv;
