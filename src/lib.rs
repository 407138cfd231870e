//! Homepage-Harvest: resumable bulk homepage downloader
//!
//! This crate fetches the homepage HTML of many domains concurrently, trying
//! several scheme/host variants per domain, repairing broken content
//! encodings, and persisting one terminal record per domain so that repeated
//! runs resume instead of redoing work.

pub mod config;
pub mod crawler;
pub mod domains;
pub mod output;
pub mod storage;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Homepage-Harvest operations
///
/// Only run-level problems surface here. Anything that goes wrong while
/// fetching a single domain is turned into a failure record instead.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to read domain list {path}: {source}")]
    DomainList {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

// Re-export commonly used types
pub use config::Config;
pub use crawler::{run_harvest, FetchOutcome};
pub use domains::Domain;
pub use output::RunTally;
