use crate::storage::directory::{FAILURE_SUFFIX, SUCCESS_SUFFIX};
use crate::storage::traits::StorageResult;
use std::collections::HashSet;
use std::path::Path;

/// Scans a result directory for domains that already have a terminal record
///
/// Every entry ending in the success or failure suffix contributes its base
/// name, lowercased. Temporary files never match either suffix and are
/// ignored. Compare against [`Domain::resume_key`](crate::domains::Domain::resume_key).
///
/// # Arguments
///
/// * `dir` - The result directory
///
/// # Returns
///
/// * `Ok(HashSet<String>)` - Resume keys of handled domains
/// * `Err(StorageError)` - The directory could not be listed
pub fn already_handled(dir: &Path) -> StorageResult<HashSet<String>> {
    let mut done = HashSet::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();

        let base = name
            .strip_suffix(SUCCESS_SUFFIX)
            .or_else(|| name.strip_suffix(FAILURE_SUFFIX));

        if let Some(base) = base {
            done.insert(base.to_lowercase());
        }
    }

    tracing::debug!("Resume index found {} handled domains in {}", done.len(), dir.display());
    Ok(done)
}
