//! Storage traits and error types
//!
//! This module defines the trait interface for result stores and the
//! associated error types.

use crate::domains::Domain;
use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to persist record for {domain}: {source}")]
    Persist {
        domain: String,
        source: std::io::Error,
    },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// The kind of terminal record stored for a domain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// Decoded homepage bytes
    Success,

    /// Short diagnostic text
    Failure,
}

/// Trait for result store implementations
///
/// A store keeps at most one terminal record per domain. The presence of a
/// record is the only resume signal; there is no separate manifest.
/// Implementations must be safe to share between threads.
pub trait ResultStore: Send + Sync {
    /// Returns the resume keys of every domain that already has a record
    ///
    /// This is a single snapshot; records written afterwards are not
    /// reflected in the returned set.
    fn handled(&self) -> StorageResult<HashSet<String>>;

    /// Returns the kind of record stored for `domain`, if any
    fn record_kind(&self, domain: &Domain) -> Option<RecordKind>;

    /// Returns true if `domain` already has a terminal record
    fn has_record(&self, domain: &Domain) -> bool {
        self.record_kind(domain).is_some()
    }

    /// Atomically stores the decoded homepage of `domain`
    fn write_success(&self, domain: &Domain, body: &[u8]) -> StorageResult<()>;

    /// Atomically stores a failure diagnostic for `domain`
    ///
    /// The stored text is newline-terminated.
    fn write_failure(&self, domain: &Domain, reason: &str) -> StorageResult<()>;
}
