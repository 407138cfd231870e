//! Storage module for persisting per-domain outcomes
//!
//! This module handles:
//! - Atomic success and failure records in a result directory
//! - The resume index built from existing records

mod directory;
mod resume;
mod traits;

pub use directory::{DirectoryStore, FAILURE_SUFFIX, SUCCESS_SUFFIX};
pub use resume::already_handled;
pub use traits::{RecordKind, ResultStore, StorageError, StorageResult};
