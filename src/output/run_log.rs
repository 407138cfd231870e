//! Line-oriented run log
//!
//! One `domain,status,note` CSV row per terminal event, under a header row.
//! Rows are flushed as they are written so the log stays useful if the
//! process is killed.

use crate::domains::Domain;
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

/// Status column of a run log row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStatus {
    Ok,
    Fail,
    Skip,
}

impl LogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Fail => "fail",
            Self::Skip => "skip",
        }
    }
}

/// Append-only run log shared by the scheduler
pub struct RunLog {
    writer: Mutex<csv::Writer<File>>,
}

impl RunLog {
    pub const HEADER: [&'static str; 3] = ["domain", "status", "note"];

    /// Creates (or truncates) the log at `path` and writes the header
    pub fn create(path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut writer = csv::Writer::from_writer(File::create(path)?);
        writer.write_record(Self::HEADER)?;
        writer.flush()?;

        Ok(Self {
            writer: Mutex::new(writer),
        })
    }

    /// Appends one row
    ///
    /// Fields containing commas or quotes are quoted. Line breaks in `note`
    /// are flattened so every row stays on one line. Logging is best effort:
    /// a write failure is reported through tracing and otherwise ignored.
    pub fn record(&self, domain: &Domain, status: LogStatus, note: &str) {
        let note = note.replace(['\n', '\r'], " ");
        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());

        let result = writer
            .write_record([domain.as_str(), status.as_str(), note.trim()])
            .map_err(std::io::Error::from)
            .and_then(|_| writer.flush());
        if let Err(e) = result {
            tracing::warn!("Failed to write run log row for {}: {}", domain, e);
        }
    }
}
