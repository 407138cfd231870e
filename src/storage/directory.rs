use crate::domains::Domain;
use crate::storage::resume::already_handled;
use crate::storage::traits::{RecordKind, ResultStore, StorageError, StorageResult};
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Suffix of success records
pub const SUCCESS_SUFFIX: &str = ".html";

/// Suffix of failure records
pub const FAILURE_SUFFIX: &str = ".error";

/// Suffix of in-progress temporary files
const PARTIAL_SUFFIX: &str = ".part";

/// A result store backed by one directory
///
/// Each domain maps to `<stem>.html` holding the decoded page or
/// `<stem>.error` holding a one-line diagnostic, where `<stem>` is the
/// sanitized domain. Both kinds are written to a temporary file in the same
/// directory and renamed into place, so a reader never observes a partial
/// record.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// Opens the store at `root`, creating the directory if needed
    pub fn open(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the success record for `domain`
    pub fn success_path(&self, domain: &Domain) -> PathBuf {
        self.root.join(format!("{}{}", domain.file_stem(), SUCCESS_SUFFIX))
    }

    /// Path of the failure record for `domain`
    pub fn failure_path(&self, domain: &Domain) -> PathBuf {
        self.root.join(format!("{}{}", domain.file_stem(), FAILURE_SUFFIX))
    }

    fn persist(&self, domain: &Domain, target: &Path, contents: &[u8]) -> StorageResult<()> {
        let file_name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let persist_err = |source: std::io::Error| StorageError::Persist {
            domain: domain.to_string(),
            source,
        };

        let mut temp = tempfile::Builder::new()
            .prefix(&format!(".{}.", file_name))
            .suffix(PARTIAL_SUFFIX)
            .tempfile_in(&self.root)
            .map_err(persist_err)?;
        temp.write_all(contents).map_err(persist_err)?;
        temp.flush().map_err(persist_err)?;
        temp.persist(target).map_err(|e| persist_err(e.error))?;

        Ok(())
    }
}

impl ResultStore for DirectoryStore {
    fn handled(&self) -> StorageResult<HashSet<String>> {
        already_handled(&self.root)
    }

    fn record_kind(&self, domain: &Domain) -> Option<RecordKind> {
        if self.success_path(domain).exists() {
            Some(RecordKind::Success)
        } else if self.failure_path(domain).exists() {
            Some(RecordKind::Failure)
        } else {
            None
        }
    }

    fn write_success(&self, domain: &Domain, body: &[u8]) -> StorageResult<()> {
        self.persist(domain, &self.success_path(domain), body)
    }

    fn write_failure(&self, domain: &Domain, reason: &str) -> StorageResult<()> {
        let reason = if reason.is_empty() { "fail" } else { reason };
        let text = format!("{}\n", reason.trim_end_matches('\n'));
        self.persist(domain, &self.failure_path(domain), text.as_bytes())
    }
}
