//! CSV export of logged workouts.

use crate::{LoggedWorkout, Result};
use std::fs::OpenOptions;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    date: String,
    status: String,
    name: String,
    routine_day: Option<String>,
    completion_minutes: u32,
    intensity: u8,
    exercise_count: usize,
    estimated_duration: u64,
}

impl From<&LoggedWorkout> for CsvRow {
    fn from(log: &LoggedWorkout) -> Self {
        CsvRow {
            date: log.date().format("%Y-%m-%d").to_string(),
            status: log.status().to_string(),
            name: log.core().custom_name().to_string(),
            routine_day: log.original_routine_day().map(|day| day.to_string()),
            completion_minutes: log.completion_time(),
            intensity: log.intensity(),
            exercise_count: log.core().total_exercises(),
            estimated_duration: log.core().estimated_duration(),
        }
    }
}

/// Append logs to a CSV file, writing headers only when the file is new
/// or empty. The file is synced before returning the row count.
pub fn export_logs_csv<'a>(
    logs: impl IntoIterator<Item = &'a LoggedWorkout>,
    csv_path: &Path,
) -> Result<usize> {
    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;
    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    let mut count = 0;
    for log in logs {
        writer.serialize(CsvRow::from(log))?;
        count += 1;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!("Exported {} logs to {:?}", count, csv_path);
    Ok(count)
}
