use crate::domains::Domain;
use crate::HarvestError;
use std::collections::HashSet;
use std::path::Path;

/// Reads the newline-delimited domain list at `path`
///
/// # Arguments
///
/// * `path` - The domain list file
/// * `limit` - Keep only the first `limit` domains
///
/// # Returns
///
/// * `Ok(Vec<Domain>)` - Normalized domains in file order
/// * `Err(HarvestError::DomainList)` - The file could not be read
pub fn read_domains(path: &Path, limit: Option<usize>) -> Result<Vec<Domain>, HarvestError> {
    let content = std::fs::read_to_string(path).map_err(|source| HarvestError::DomainList {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(parse_domain_list(&content, limit))
}

/// Parses domain list text
///
/// Blank lines and lines starting with `#` are skipped. Domains are
/// lowercased, and repeated domains are kept once at their first position.
pub fn parse_domain_list(content: &str, limit: Option<usize>) -> Vec<Domain> {
    let mut seen = HashSet::new();

    content
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .filter_map(Domain::parse)
        .filter(|domain| seen.insert(domain.clone()))
        .take(limit.unwrap_or(usize::MAX))
        .collect()
}
