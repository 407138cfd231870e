//! Task scheduler for bounded-concurrency domain fetching
//!
//! This module handles:
//! - Keeping at most `concurrency` fetch tasks in flight
//! - Abandoning a single task after the per-task timeout
//! - Forcing every unresolved domain to a failure once the run-wide budget
//!   is spent
//! - Converting task panics into failure records
//! - Persisting exactly one terminal record per dispatched domain
//!
//! The per-task and run-wide deadlines are independent. A task timeout only
//! ever affects its own domain, and the run-wide deadline does not wait on
//! abandoned tasks.

use crate::config::SchedulerConfig;
use crate::crawler::fetcher::{CandidateFetcher, FetchOutcome};
use crate::domains::Domain;
use crate::output::{LogStatus, RunLog, RunTally};
use crate::storage::ResultStore;
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinError;
use tokio::time::Instant;

/// Reason recorded when a single task exceeds its timeout
pub const TASK_TIMEOUT_REASON: &str = "task-timeout";

/// Reason recorded for domains still unresolved when the run budget is spent
pub const RUN_TIMEOUT_REASON: &str = "future-timeout";

/// Prefix of the reason recorded when a task dies unexpectedly
pub const TASK_EXCEPTION_PREFIX: &str = "future-exc:";

/// Completed tasks between two progress log lines
const PROGRESS_EVERY: usize = 100;

/// Scheduling limits for one run
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    /// Maximum number of in-flight fetch tasks
    pub concurrency: usize,

    /// Time after which a single task is abandoned
    pub task_timeout: Duration,

    /// Run-wide ceiling; `task_timeout × pending` when `None`
    pub global_timeout: Option<Duration>,
}

impl SchedulerSettings {
    /// The run-wide budget for `pending` domains
    pub fn global_budget(&self, pending: usize) -> Duration {
        self.global_timeout.unwrap_or_else(|| {
            let pending = u32::try_from(pending).unwrap_or(u32::MAX);
            self.task_timeout.saturating_mul(pending)
        })
    }
}

impl From<&SchedulerConfig> for SchedulerSettings {
    fn from(config: &SchedulerConfig) -> Self {
        Self {
            concurrency: config.workers,
            task_timeout: config.task_timeout(),
            global_timeout: config.global_timeout(),
        }
    }
}

/// Runs fetch tasks over the pending domains and records their outcomes
///
/// Outcomes are persisted by the scheduler itself, never by the tasks, so an
/// abandoned task can not write a record after its domain has been resolved.
pub struct TaskScheduler<'a, S: ResultStore> {
    settings: SchedulerSettings,
    store: &'a S,
    log: Option<&'a RunLog>,
}

impl<'a, S: ResultStore> TaskScheduler<'a, S> {
    pub fn new(settings: SchedulerSettings, store: &'a S, log: Option<&'a RunLog>) -> Self {
        Self {
            settings,
            store,
            log,
        }
    }

    /// Fetches every pending domain and returns the run tally
    ///
    /// Returns once each pending domain has produced exactly one outcome
    /// (success, failure, task timeout, run timeout or task exception), or
    /// was found to already have a record when it came up for dispatch.
    pub async fn run<F>(&self, pending: Vec<Domain>, fetcher: Arc<F>) -> RunTally
    where
        F: CandidateFetcher + 'static,
    {
        let total = pending.len();
        let concurrency = self.settings.concurrency.max(1);
        let budget = self.settings.global_budget(total);
        let deadline = Instant::now() + budget;

        tracing::info!(
            "Scheduling {} domains with {} workers (task timeout {:?}, run budget {:?})",
            total,
            concurrency,
            self.settings.task_timeout,
            budget
        );

        let mut queue: VecDeque<Domain> = pending.into();
        let mut in_flight = FuturesUnordered::new();
        let mut unresolved: HashSet<Domain> = HashSet::new();
        let mut tally = RunTally::default();

        loop {
            while in_flight.len() < concurrency {
                let Some(domain) = queue.pop_front() else {
                    break;
                };

                if self.store.has_record(&domain) {
                    tracing::debug!("Skipping {}: record already present", domain);
                    self.log_row(&domain, LogStatus::Skip, "already-have");
                    tally.record_skip();
                    continue;
                }

                let handle = tokio::spawn(run_task(
                    Arc::clone(&fetcher),
                    domain.clone(),
                    self.settings.task_timeout,
                ));
                unresolved.insert(domain.clone());
                in_flight.push(async move { (domain, handle.await) });
            }

            if in_flight.is_empty() {
                break;
            }

            let next = tokio::time::timeout_at(deadline, in_flight.next()).await;
            match next {
                Ok(Some((domain, joined))) => {
                    unresolved.remove(&domain);
                    let outcome = joined.unwrap_or_else(|e| {
                        FetchOutcome::failure(format!("{}{}", TASK_EXCEPTION_PREFIX, describe_join_error(e)))
                    });
                    self.record(&domain, outcome, &mut tally);

                    let done = tally.completed();
                    if done % PROGRESS_EVERY == 0 {
                        tracing::info!(
                            "Progress: {}/{} done, {} ok, {} failed",
                            done,
                            total,
                            tally.ok,
                            tally.fail
                        );
                    }
                }
                Ok(None) => break,
                Err(_) => {
                    tracing::warn!(
                        "Run budget of {:?} spent; forcing {} in-flight and {} queued domains to fail",
                        budget,
                        unresolved.len(),
                        queue.len()
                    );
                    // Dropping the join handles detaches the tasks; their
                    // results are never looked at.
                    drop(in_flight);
                    self.force_unresolved(unresolved.into_iter().chain(queue), &mut tally);
                    break;
                }
            }
        }

        tracing::info!("Scheduler finished: {}", tally);
        tally
    }

    fn force_unresolved(&self, domains: impl Iterator<Item = Domain>, tally: &mut RunTally) {
        let mut domains: Vec<Domain> = domains.collect();
        domains.sort();

        for domain in domains {
            if self.store.has_record(&domain) {
                self.log_row(&domain, LogStatus::Skip, "already-have");
                tally.record_skip();
                continue;
            }
            self.record(&domain, FetchOutcome::failure(RUN_TIMEOUT_REASON), tally);
        }
    }

    /// Persists one outcome and updates the tally
    fn record(&self, domain: &Domain, outcome: FetchOutcome, tally: &mut RunTally) {
        match outcome {
            FetchOutcome::Success { final_url, body } => match self.store.write_success(domain, &body) {
                Ok(()) => {
                    tracing::debug!("{} ok ({}, {} bytes)", domain, final_url, body.len());
                    self.log_row(domain, LogStatus::Ok, &final_url);
                    tally.record_ok();
                }
                Err(e) => {
                    tracing::warn!("Failed to store page for {}: {}", domain, e);
                    self.record_failure(domain, &format!("{}{}", TASK_EXCEPTION_PREFIX, e), tally);
                }
            },
            FetchOutcome::Failure { reason } => self.record_failure(domain, &reason, tally),
        }
    }

    fn record_failure(&self, domain: &Domain, reason: &str, tally: &mut RunTally) {
        if reason == TASK_TIMEOUT_REASON {
            tracing::warn!("{} abandoned after {:?}", domain, self.settings.task_timeout);
        } else {
            tracing::debug!("{} failed: {}", domain, reason);
        }

        if let Err(e) = self.store.write_failure(domain, reason) {
            tracing::error!("Failed to store failure record for {}: {}", domain, e);
        }
        self.log_row(domain, LogStatus::Fail, reason);
        tally.record_fail();
    }

    fn log_row(&self, domain: &Domain, status: LogStatus, note: &str) {
        if let Some(log) = self.log {
            log.record(domain, status, note);
        }
    }
}

/// Body of one spawned task: the fetch bounded by the per-task timeout
async fn run_task<F>(fetcher: Arc<F>, domain: Domain, task_timeout: Duration) -> FetchOutcome
where
    F: CandidateFetcher + 'static,
{
    match tokio::time::timeout(task_timeout, fetcher.fetch(&domain)).await {
        Ok(outcome) => outcome,
        Err(_) => FetchOutcome::failure(TASK_TIMEOUT_REASON),
    }
}

fn describe_join_error(err: JoinError) -> String {
    if err.is_panic() {
        let payload = err.into_panic();
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        format!("panic: {}", message)
    } else {
        "task cancelled".to_string()
    }
}
