//! Crash-safe durable writes: temp-file-plus-rename, shared by snapshot and
//! archival paths.

use crate::context::AgenticContext;
use crate::error::MemoryError;
use std::path::{Path, PathBuf};

/// Serialise `context` to pretty JSON and write it to `path` via a
/// temp-file-plus-rename so a crash mid-write never leaves a corrupt file.
pub async fn write_durable(dir: &Path, filename: &str, context: &AgenticContext) -> Result<PathBuf, MemoryError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| MemoryError::Persistence(e.to_string()))?;

    let final_path = dir.join(filename);
    let tmp_path = dir.join(format!("{filename}.tmp"));

    let json = serde_json::to_string_pretty(context).map_err(|e| MemoryError::Persistence(e.to_string()))?;

    tokio::fs::write(&tmp_path, json)
        .await
        .map_err(|e| MemoryError::Persistence(e.to_string()))?;
    tokio::fs::rename(&tmp_path, &final_path)
        .await
        .map_err(|e| MemoryError::Persistence(e.to_string()))?;

    Ok(final_path)
}

/// Read a context previously written by [`write_durable`].
pub async fn read_durable(path: &Path) -> Result<AgenticContext, MemoryError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| MemoryError::Persistence(e.to_string()))?;
    serde_json::from_str(&contents).map_err(|e| MemoryError::Malformed(e.to_string()))
}

/// Filename for an archival event: `<session_id>-<unix_millis>.json`,
/// never rewritten in place.
pub fn archive_filename(session_id: &str, unix_millis: i64) -> String {
    format!("{session_id}-{unix_millis}.json")
}

/// Filename for a live snapshot: one file per session id, overwritten via
/// temp-file-plus-rename on each snapshot.
pub fn snapshot_filename(session_id: &str) -> String {
    format!("{session_id}.json")
}
