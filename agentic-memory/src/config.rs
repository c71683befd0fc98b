//! Construction-time configuration for session memory.

use std::path::PathBuf;
use std::time::Duration;

/// Static configuration for a [`crate::SessionMemory`].
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    /// A context is stale once `now - last_activity` exceeds this.
    pub idle_threshold: Duration,
    /// Directory archived contexts (one file per archival event) are
    /// written under.
    pub archive_dir: PathBuf,
    /// Directory periodic live-state snapshots are written under.
    pub snapshot_dir: PathBuf,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            idle_threshold: Duration::from_secs(30 * 60),
            archive_dir: PathBuf::from("agentic-memory/archive"),
            snapshot_dir: PathBuf::from("agentic-memory/snapshots"),
        }
    }
}
