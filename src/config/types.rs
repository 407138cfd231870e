use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Homepage-Harvest
///
/// Every section and key has a default, so a TOML file only needs to name the
/// values it wants to change. Command-line flags are applied on top.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub fetch: FetchConfig,
    pub scheduler: SchedulerConfig,
}

/// Domain list configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct InputConfig {
    /// Path to the newline-delimited domain list
    pub domains_file: PathBuf,

    /// Only take the first `limit` domains from the list
    pub limit: Option<usize>,
}

/// Result store configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory receiving `.html` and `.error` records
    pub directory: PathBuf,

    /// Optional `domain,status,note` run log
    pub log_path: Option<PathBuf>,
}

/// HTTP fetching configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FetchConfig {
    /// Timeout for a single HTTP request (seconds)
    pub request_timeout_secs: u64,

    /// Transport-level retries per candidate URL
    pub retries: u32,

    /// Exponential backoff factor between transport retries (seconds)
    pub backoff_factor: f64,

    /// Pause before re-requesting after an HTTP 429 (milliseconds)
    pub rate_limit_backoff_ms: u64,

    /// Only connect over IPv4
    pub ipv4_only: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 5,
            retries: 3,
            backoff_factor: 0.7,
            rate_limit_backoff_ms: 1000,
            ipv4_only: false,
        }
    }
}

impl FetchConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn rate_limit_backoff(&self) -> Duration {
        Duration::from_millis(self.rate_limit_backoff_ms)
    }
}

/// Task scheduling configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SchedulerConfig {
    /// Maximum number of domains fetched concurrently
    pub workers: usize,

    /// Maximum time a single domain may take (seconds)
    pub task_timeout_secs: u64,

    /// Wall-clock ceiling for the whole run (seconds).
    /// Defaults to `task_timeout_secs` times the number of pending domains.
    pub global_timeout_secs: Option<u64>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            workers: 32,
            task_timeout_secs: 15,
            global_timeout_secs: None,
        }
    }
}

impl SchedulerConfig {
    pub fn task_timeout(&self) -> Duration {
        Duration::from_secs(self.task_timeout_secs)
    }

    pub fn global_timeout(&self) -> Option<Duration> {
        self.global_timeout_secs.map(Duration::from_secs)
    }
}
