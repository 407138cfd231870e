//! Run statistics
//!
//! Counters accumulated while a run executes. They are reported at the end
//! of the run and never persisted.

use std::fmt;

/// Success and failure counts for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunTally {
    /// Domains that produced a success record
    pub ok: usize,

    /// Domains that produced a failure record
    pub fail: usize,

    /// Domains found already handled when their task was about to start
    pub skipped: usize,
}

impl RunTally {
    pub fn record_ok(&mut self) {
        self.ok += 1;
    }

    pub fn record_fail(&mut self) {
        self.fail += 1;
    }

    pub fn record_skip(&mut self) {
        self.skipped += 1;
    }

    /// Number of domains that reached a terminal outcome in this run
    pub fn completed(&self) -> usize {
        self.ok + self.fail
    }
}

impl fmt::Display for RunTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Success:{}, Fail:{}", self.ok, self.fail)?;
        if self.skipped > 0 {
            write!(f, ", Skipped:{}", self.skipped)?;
        }
        Ok(())
    }
}
