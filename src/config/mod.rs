//! Configuration module for Homepage-Harvest
//!
//! This module handles loading and validating the optional TOML configuration
//! file. Command-line flags are layered on top in `main.rs`, after which the
//! merged configuration is validated.
//!
//! # Example
//!
//! ```no_run
//! use homepage_harvest::config::{load_config, validate};
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! validate(&config).unwrap();
//! println!("Per-task timeout: {}s", config.scheduler.task_timeout_secs);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, FetchConfig, InputConfig, OutputConfig, SchedulerConfig};

// Re-export parser and validation functions
pub use parser::{load_config, parse_config};
pub use validation::validate;
