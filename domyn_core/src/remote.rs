//! Remote document store contract and the sync layer on top of it.
//!
//! Documents live at slash-separated paths, alternating collection and
//! document ids, as in the backend:
//!
//! - `users/{uid}`: personal data and registration flag
//! - `users/{uid}/workoutRoutine/{day}`: one routine per weekday
//! - `users/{uid}/workoutLogs/{YYYY-MM-DD}`: one log per date
//!
//! Every write stamps `updatedAt` and, on first write, `createdAt`; these
//! stand in for server-assigned timestamps.

use crate::kv::{read_locked, write_atomic};
use crate::record::{calendar_date, decode_log, decode_routine_for, LoggedRecord, RoutineRecord};
use crate::store::Snapshot;
use crate::{
    Error, LoggedWorkout, PersonalProfile, RemoteError, Result, RoutineWorkout, Weekday,
};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A document body
pub type Document = Map<String, Value>;

/// Read/write contract for the remote document database
pub trait DocumentStore {
    fn get(&self, path: &str) -> Result<Option<Document>>;

    /// Write `fields` to `path`. With `merge`, existing top-level fields not
    /// named in `fields` are kept; without it the document is replaced.
    fn set(&mut self, path: &str, fields: Document, merge: bool) -> Result<()>;

    /// All documents directly inside `collection`, sorted by id
    fn list(&self, collection: &str) -> Result<Vec<(String, Document)>>;

    fn delete(&mut self, path: &str) -> Result<()>;
}

/// Accessor for the signed-in user
pub trait Identity {
    fn current_user_id(&self) -> Option<String>;
}

/// Identity fixed at construction, e.g. from config
#[derive(Clone, Debug, Default)]
pub struct StaticIdentity(Option<String>);

impl StaticIdentity {
    pub fn new(user_id: Option<String>) -> Self {
        Self(user_id.filter(|id| !id.trim().is_empty()))
    }

    pub fn signed_in(user_id: impl Into<String>) -> Self {
        Self::new(Some(user_id.into()))
    }
}

impl Identity for StaticIdentity {
    fn current_user_id(&self) -> Option<String> {
        self.0.clone()
    }
}

// ============================================================================
// Paths and write semantics
// ============================================================================

fn invalid_path(path: &str, reason: &str) -> Error {
    Error::Remote(RemoteError::new(
        "invalid-argument",
        format!("{}: {:?}", reason, path),
    ))
}

/// Split and check a path; documents have an even number of segments
fn segments(path: &str, document: bool) -> Result<Vec<&str>> {
    let parts: Vec<&str> = path.split('/').collect();
    for part in &parts {
        let bad = part.is_empty()
            || *part == "."
            || *part == ".."
            || part.contains('\\')
            || part.contains('\0');
        if bad {
            return Err(invalid_path(path, "Invalid path segment"));
        }
    }
    if (parts.len() % 2 == 0) != document {
        let kind = if document { "document" } else { "collection" };
        return Err(invalid_path(path, &format!("Not a {} path", kind)));
    }
    Ok(parts)
}

/// Merge or replace, then stamp the server timestamps
fn apply_write(existing: Option<Document>, fields: Document, merge: bool) -> Document {
    let now = Value::String(Utc::now().to_rfc3339());
    let created_at = existing
        .as_ref()
        .and_then(|doc| doc.get("createdAt").cloned())
        .or_else(|| fields.get("createdAt").cloned())
        .unwrap_or_else(|| now.clone());

    let mut doc = match (merge, existing) {
        (true, Some(mut doc)) => {
            doc.extend(fields);
            doc
        }
        _ => fields,
    };
    doc.insert("createdAt".into(), created_at);
    doc.insert("updatedAt".into(), now);
    doc
}

// ============================================================================
// Implementations
// ============================================================================

/// In-memory document store
#[derive(Clone, Debug, Default)]
pub struct MemoryDocumentStore {
    docs: BTreeMap<String, Document>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn get(&self, path: &str) -> Result<Option<Document>> {
        segments(path, true)?;
        Ok(self.docs.get(path).cloned())
    }

    fn set(&mut self, path: &str, fields: Document, merge: bool) -> Result<()> {
        segments(path, true)?;
        let doc = apply_write(self.docs.remove(path), fields, merge);
        self.docs.insert(path.to_string(), doc);
        Ok(())
    }

    fn list(&self, collection: &str) -> Result<Vec<(String, Document)>> {
        let depth = segments(collection, false)?.len() + 1;
        let prefix = format!("{}/", collection);
        Ok(self
            .docs
            .range(prefix.clone()..)
            .take_while(|(path, _)| path.starts_with(&prefix))
            .filter(|(path, _)| path.split('/').count() == depth)
            .map(|(path, doc)| (path[prefix.len()..].to_string(), doc.clone()))
            .collect())
    }

    fn delete(&mut self, path: &str) -> Result<()> {
        segments(path, true)?;
        self.docs.remove(path);
        Ok(())
    }
}

/// Document store backed by a directory tree of JSON files.
///
/// `a/b/c/d` is stored as `<root>/a/b/c/d.json`; collections are directories.
#[derive(Clone, Debug)]
pub struct DirDocumentStore {
    root: PathBuf,
}

impl DirDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn file_for(&self, path: &str) -> Result<PathBuf> {
        let parts = segments(path, true)?;
        let mut file = self.root.clone();
        for part in &parts[..parts.len() - 1] {
            file.push(part);
        }
        file.push(format!("{}.json", parts[parts.len() - 1]));
        Ok(file)
    }

    fn parse(path: &std::path::Path, contents: &str) -> Result<Document> {
        match serde_json::from_str::<Value>(contents)? {
            Value::Object(doc) => Ok(doc),
            _ => Err(Error::Remote(RemoteError::new(
                "data-loss",
                format!("Document {:?} is not an object", path),
            ))),
        }
    }
}

impl DocumentStore for DirDocumentStore {
    fn get(&self, path: &str) -> Result<Option<Document>> {
        let file = self.file_for(path)?;
        match read_locked(&file)? {
            Some(contents) => Ok(Some(Self::parse(&file, &contents)?)),
            None => Ok(None),
        }
    }

    fn set(&mut self, path: &str, fields: Document, merge: bool) -> Result<()> {
        let file = self.file_for(path)?;
        let existing = self.get(path)?;
        let doc = apply_write(existing, fields, merge);
        write_atomic(&file, &serde_json::to_string(&doc)?)?;
        tracing::debug!("Wrote document {}", path);
        Ok(())
    }

    fn list(&self, collection: &str) -> Result<Vec<(String, Document)>> {
        let mut dir = self.root.clone();
        for part in segments(collection, false)? {
            dir.push(part);
        }
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut docs = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let file = entry?.path();
            if !file.is_file() || file.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let Some(id) = file.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let id = id.to_string();
            if let Some(contents) = read_locked(&file)? {
                match Self::parse(&file, &contents) {
                    Ok(doc) => docs.push((id, doc)),
                    Err(e) => tracing::warn!("Skipping unreadable document {:?}: {}", file, e),
                }
            }
        }
        docs.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(docs)
    }

    fn delete(&mut self, path: &str) -> Result<()> {
        let file = self.file_for(path)?;
        match std::fs::remove_file(&file) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// Sync
// ============================================================================

fn to_document<T: Serialize>(value: &T) -> Result<Document> {
    match serde_json::to_value(value)? {
        Value::Object(doc) => Ok(doc),
        other => Err(Error::Other(format!("Expected an object, got {}", other))),
    }
}

/// Maps the user's data onto the document layout
pub struct RemoteSync<D: DocumentStore, I: Identity> {
    docs: D,
    identity: I,
}

impl<D: DocumentStore, I: Identity> RemoteSync<D, I> {
    pub fn new(docs: D, identity: I) -> Self {
        Self { docs, identity }
    }

    pub fn documents(&self) -> &D {
        &self.docs
    }

    fn uid(&self) -> Result<String> {
        self.identity
            .current_user_id()
            .ok_or(Error::NotAuthenticated)
    }

    fn user_path(&self) -> Result<String> {
        Ok(format!("users/{}", self.uid()?))
    }

    /// Write personal data and mark the user registered
    pub fn push_profile(&mut self, profile: &PersonalProfile, email: Option<&str>) -> Result<()> {
        let path = self.user_path()?;
        let mut personal = to_document(profile)?;
        if let Some(email) = email {
            personal.insert("email".into(), Value::String(email.to_string()));
        }

        let mut fields = Document::new();
        fields.insert("personalData".into(), Value::Object(personal));
        fields.insert("isRegistered".into(), Value::Bool(true));
        self.docs.set(&path, fields, true)?;
        tracing::info!("Pushed profile to {}", path);
        Ok(())
    }

    pub fn is_registered(&self) -> Result<bool> {
        let doc = self.docs.get(&self.user_path()?)?;
        Ok(doc
            .and_then(|doc| doc.get("isRegistered").and_then(Value::as_bool))
            .unwrap_or(false))
    }

    pub fn fetch_profile(&self) -> Result<Option<PersonalProfile>> {
        let Some(doc) = self.docs.get(&self.user_path()?)? else {
            return Ok(None);
        };
        let Some(personal) = doc.get("personalData") else {
            return Ok(None);
        };
        let text = |field: &str| {
            personal
                .get(field)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Ok(Some(PersonalProfile {
            name: text("name"),
            age: text("age"),
            gender: text("gender"),
            weight: text("weight"),
        }))
    }

    pub fn push_routine(&mut self, routine: &RoutineWorkout) -> Result<()> {
        let path = format!("{}/workoutRoutine/{}", self.user_path()?, routine.day());
        let fields = to_document(&RoutineRecord::from(routine))?;
        self.docs.set(&path, fields, true)
    }

    /// Write all seven routine documents; `isScheduled` follows the
    /// selected days. Days without local content only get the flag, so
    /// remote exercises are left alone.
    pub fn push_schedule(&mut self, snapshot: &Snapshot) -> Result<()> {
        let base = self.user_path()?;
        for day in Weekday::ALL {
            let scheduled = snapshot.selected_days.contains(&day);
            let mut fields = match snapshot.workouts.get(&day) {
                Some(routine) => to_document(&RoutineRecord::from(routine))?,
                None => to_document(&json!({ "day": day }))?,
            };
            fields.insert("isScheduled".into(), Value::Bool(scheduled));
            self.docs
                .set(&format!("{}/workoutRoutine/{}", base, day), fields, true)?;
        }
        tracing::info!(
            "Pushed schedule ({} days selected)",
            snapshot.selected_days.len()
        );
        Ok(())
    }

    /// Read every routine document, normalizing abbreviated day ids.
    ///
    /// When two documents name the same day the most recently modified wins.
    pub fn fetch_routine(&self) -> Result<BTreeMap<Weekday, RoutineWorkout>> {
        let collection = format!("{}/workoutRoutine", self.user_path()?);
        let mut routines: BTreeMap<Weekday, RoutineWorkout> = BTreeMap::new();

        for (id, doc) in self.docs.list(&collection)? {
            let Ok(day) = id.parse::<Weekday>() else {
                tracing::warn!("Ignoring routine document with unknown day {:?}", id);
                continue;
            };
            let routine = match decode_routine_for(day, Value::Object(doc)) {
                Ok(routine) => routine,
                Err(e) => {
                    tracing::warn!("Ignoring unreadable routine {:?}: {}", id, e);
                    continue;
                }
            };
            let newer = routines.get(&day).is_none_or(|existing| {
                routine.core().last_modified() > existing.core().last_modified()
            });
            if newer {
                routines.insert(day, routine);
            }
        }
        Ok(routines)
    }

    pub fn push_log(&mut self, log: &LoggedWorkout) -> Result<()> {
        let path = format!(
            "{}/workoutLogs/{}",
            self.user_path()?,
            log.date().format(calendar_date::FORMAT)
        );
        let fields = to_document(&LoggedRecord::from(log))?;
        self.docs.set(&path, fields, false)
    }

    /// Logs dated `start..=end`, oldest first
    pub fn fetch_logs_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<LoggedWorkout>> {
        let collection = format!("{}/workoutLogs", self.user_path()?);
        let mut logs = Vec::new();
        for (id, mut doc) in self.docs.list(&collection)? {
            doc.entry("date").or_insert_with(|| Value::String(id.clone()));
            match decode_log(Value::Object(doc)) {
                Ok(log) if log.date() >= start && log.date() <= end => logs.push(log),
                Ok(_) => {}
                Err(e) => tracing::warn!("Ignoring unreadable log {:?}: {}", id, e),
            }
        }
        logs.sort_by_key(LoggedWorkout::date);
        Ok(logs)
    }

    /// Push profile, schedule and every log
    pub fn push_all(&mut self, snapshot: &Snapshot, email: Option<&str>) -> Result<()> {
        self.push_profile(&snapshot.profile, email)?;
        self.push_schedule(snapshot)?;
        for log in snapshot.logs.values() {
            self.push_log(log)?;
        }
        Ok(())
    }

    /// Remove every routine and log document plus the user document
    pub fn delete_user_data(&mut self) -> Result<()> {
        let base = self.user_path()?;
        for collection in ["workoutRoutine", "workoutLogs"] {
            let collection = format!("{}/{}", base, collection);
            for (id, _) in self.docs.list(&collection)? {
                self.docs.delete(&format!("{}/{}", collection, id))?;
            }
        }
        self.docs.delete(&base)
    }
}
