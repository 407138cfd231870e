//! Crawler module for homepage fetching
//!
//! This module contains the fetch-and-decode pipeline:
//! - Candidate URL generation per domain
//! - Content-Encoding decoding with repair fallbacks
//! - The HTML-likelihood heuristic
//! - HTTP fetching with retries and User-Agent rotation
//! - Bounded-concurrency scheduling with per-task and run-wide timeouts
//! - Overall run coordination

mod candidates;
mod classify;
mod coordinator;
mod decode;
mod fetcher;
mod scheduler;
mod user_agent;

pub use candidates::{candidate_urls, CandidateTemplate, CANDIDATE_TEMPLATES};
pub use classify::{looks_like_html, SAMPLE_LEN};
pub use coordinator::{run_harvest, Coordinator, HarvestPlan, HarvestSummary};
pub use decode::{decode_body, gunzip_repair, EncodingDecision};
pub use fetcher::{
    build_http_client, categorize_error, CandidateAttempt, CandidateFetcher, FetchOutcome,
    FetchSettings, HomepageFetcher,
};
pub use scheduler::{
    SchedulerSettings, TaskScheduler, RUN_TIMEOUT_REASON, TASK_EXCEPTION_PREFIX,
    TASK_TIMEOUT_REASON,
};
pub use user_agent::{choose_user_agent, UserAgentPicker, USER_AGENT_POOL};
