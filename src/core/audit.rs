//! Append-only audit trail of committed actions.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;

use chrono::Utc;
use tracing::warn;

/// Plain-text log, one committed action per line. Recording is
/// best-effort: the action already happened, so a logging failure
/// degrades to a warning instead of failing the command.
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Appends one `<timestamp> <ACTION> <detail>` line.
    pub fn record(&self, action: &str, detail: &str) {
        let line = format!(
            "{} {action} {detail}\n",
            Utc::now().format("%Y-%m-%dT%H:%M:%SZ")
        );
        if let Err(e) = self.try_append(&line) {
            warn!("failed to record {action} in audit log: {e}");
        }
    }

    fn try_append(&self, line: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())
    }
}
