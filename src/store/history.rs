//! Append-only archive of rate snapshots.

use std::io;
use std::path::PathBuf;

use tracing::warn;

use crate::core::rates::RateHistoryEntry;
use crate::store;

/// Durable, append-only record of every snapshot the app has fetched.
/// Kept separate from the live cache so audits survive cache replaces.
pub struct RateHistory {
    path: PathBuf,
}

impl RateHistory {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Appends one entry. Best-effort: a failure is logged and
    /// swallowed so it never fails the operation that produced the
    /// snapshot.
    pub fn append(&self, entry: RateHistoryEntry) {
        if let Err(e) = self.try_append(entry) {
            warn!("failed to record rate history at {}: {e}", self.path.display());
        }
    }

    fn try_append(&self, entry: RateHistoryEntry) -> io::Result<()> {
        // An unreadable file is an error rather than a reset; the
        // archive is never truncated by an append.
        let mut entries: Vec<RateHistoryEntry> =
            store::read_json(&self.path)?.unwrap_or_default();
        entries.push(entry);
        store::write_json_atomic(&self.path, &entries)
    }

    /// Entries oldest first. Re-reads the file, so the returned
    /// iterator can be obtained again at any time. An unreadable file
    /// yields an empty sequence.
    pub fn read_all(&self) -> impl Iterator<Item = RateHistoryEntry> {
        let entries: Vec<RateHistoryEntry> = match store::read_json(&self.path) {
            Ok(entries) => entries.unwrap_or_default(),
            Err(e) => {
                warn!("ignoring unreadable rate history {}: {e}", self.path.display());
                Vec::new()
            }
        };
        entries.into_iter()
    }
}
