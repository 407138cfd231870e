//! Harvest coordinator - run orchestration
//!
//! This module ties the pieces of a run together:
//! - Reading and normalizing the domain list
//! - Filtering out domains that already have a record (resume)
//! - Opening the optional run log
//! - Building the shared HTTP client only when there is work to do
//! - Handing the pending domains to the task scheduler

use crate::config::Config;
use crate::crawler::fetcher::{CandidateFetcher, HomepageFetcher};
use crate::crawler::scheduler::{SchedulerSettings, TaskScheduler};
use crate::domains::{read_domains, Domain};
use crate::output::{LogStatus, RunLog, RunTally};
use crate::storage::{DirectoryStore, ResultStore};
use crate::HarvestError;
use std::sync::Arc;

/// The work of one run, decided before any request is made
#[derive(Debug, Clone)]
pub struct HarvestPlan {
    /// Number of domains read from the list (after limit and de-duplication)
    pub total: usize,

    /// Number of records found in the result directory
    pub already_handled: usize,

    /// Domains from the list that already have a record
    pub skipped: Vec<Domain>,

    /// Domains to fetch in this run
    pub pending: Vec<Domain>,
}

impl HarvestPlan {
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Summary of a finished (or trivially empty) run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarvestSummary {
    pub total: usize,
    pub already_handled: usize,
    pub pending: usize,
    pub tally: RunTally,
}

/// Main harvest coordinator
pub struct Coordinator {
    config: Config,
    store: DirectoryStore,
}

impl Coordinator {
    /// Creates a coordinator, creating the output directory if needed
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to plan a run
    /// * `Err(HarvestError)` - The output directory could not be created
    pub fn new(config: Config) -> Result<Self, HarvestError> {
        let store = DirectoryStore::open(&config.output.directory)?;
        Ok(Self { config, store })
    }

    pub fn store(&self) -> &DirectoryStore {
        &self.store
    }

    /// Reads the domain list and applies the resume index
    pub fn plan(&self) -> Result<HarvestPlan, HarvestError> {
        let domains = read_domains(&self.config.input.domains_file, self.config.input.limit)?;
        let handled = self.store.handled()?;

        let total = domains.len();
        let (skipped, pending): (Vec<Domain>, Vec<Domain>) = domains
            .into_iter()
            .partition(|domain| handled.contains(&domain.resume_key()));

        Ok(HarvestPlan {
            total,
            already_handled: handled.len(),
            skipped,
            pending,
        })
    }

    /// Runs `plan` with the given fetcher
    ///
    /// Opens the run log (if configured), records a `skip` row for every
    /// resumed domain, then schedules the pending domains.
    pub async fn execute<F>(&self, plan: HarvestPlan, fetcher: Arc<F>) -> Result<HarvestSummary, HarvestError>
    where
        F: CandidateFetcher + 'static,
    {
        let log = match &self.config.output.log_path {
            Some(path) => Some(RunLog::create(path)?),
            None => None,
        };

        for domain in &plan.skipped {
            tracing::debug!("Resume: {} already handled", domain);
            if let Some(log) = &log {
                log.record(domain, LogStatus::Skip, "already-have");
            }
        }

        let pending = plan.pending.len();
        let scheduler = TaskScheduler::new(
            SchedulerSettings::from(&self.config.scheduler),
            &self.store,
            log.as_ref(),
        );
        let tally = scheduler.run(plan.pending, fetcher).await;

        Ok(HarvestSummary {
            total: plan.total,
            already_handled: plan.already_handled,
            pending,
            tally,
        })
    }
}

/// Runs a complete harvest
///
/// 1. Create the output directory and read the domain list
/// 2. Skip domains that already have a record
/// 3. Return immediately when nothing is pending
/// 4. Build the shared HTTP client sized to the worker count
/// 5. Fetch every pending domain and persist its outcome
///
/// The HTTP client lives for the duration of this call and is released
/// once the tally has been produced.
///
/// # Example
///
/// ```no_run
/// use homepage_harvest::config::load_config;
/// use homepage_harvest::crawler::run_harvest;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("harvest.toml"))?;
/// let summary = run_harvest(config).await?;
/// println!("{}", summary.tally);
/// # Ok(())
/// # }
/// ```
pub async fn run_harvest(config: Config) -> Result<HarvestSummary, HarvestError> {
    let coordinator = Coordinator::new(config)?;
    let plan = coordinator.plan()?;

    tracing::info!(
        "Total domains in file: {}, already handled: {}, pending this run: {}",
        plan.total,
        plan.already_handled,
        plan.pending.len()
    );

    if plan.is_empty() {
        return Ok(HarvestSummary {
            total: plan.total,
            already_handled: plan.already_handled,
            pending: 0,
            tally: RunTally::default(),
        });
    }

    let fetcher = Arc::new(HomepageFetcher::from_config(
        &coordinator.config.fetch,
        coordinator.config.scheduler.workers,
    )?);
    coordinator.execute(plan, fetcher).await
}
