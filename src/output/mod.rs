//! Output module for run reporting
//!
//! This module handles:
//! - Counting successes and failures during a run
//! - Writing the optional `domain,status,note` run log

mod run_log;
pub mod stats;

pub use run_log::{LogStatus, RunLog};
pub use stats::RunTally;
