//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the harvester, including:
//! - Building the shared HTTP client with browser-like default headers
//! - Trying each candidate URL of a domain in preference order
//! - Transport-level retries with exponential backoff
//! - The one-shot HTTP 429 pause and retry
//! - Decoding and classifying response bodies
//! - Error classification into short reason codes

use crate::config::FetchConfig;
use crate::crawler::candidates::candidate_urls;
use crate::crawler::classify::looks_like_html;
use crate::crawler::decode::decode_body;
use crate::crawler::user_agent::UserAgentPicker;
use crate::domains::Domain;
use async_trait::async_trait;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, CONTENT_ENCODING,
    RETRY_AFTER, USER_AGENT,
};
use reqwest::{redirect::Policy, Client, Response, StatusCode};
use std::error::Error as StdError;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use url::Url;

/// Longest pause between two transport retries
const BACKOFF_MAX: Duration = Duration::from_secs(120);

/// Maximum number of redirects followed per request
const MAX_REDIRECTS: usize = 10;

/// Statuses that trigger a transport-level retry
const RETRY_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Terminal result of fetching one domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A candidate returned a 2xx HTML page
    Success {
        /// URL after redirects
        final_url: String,
        /// Decoded page bytes
        body: Vec<u8>,
    },

    /// Every candidate failed
    Failure {
        /// Short diagnostic of the last failure
        reason: String,
    },
}

impl FetchOutcome {
    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// One candidate URL tried while fetching a domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateAttempt {
    pub url: String,

    /// Reason the candidate failed, `None` if it produced the result
    pub failure: Option<String>,
}

/// Something that can resolve a domain to a terminal outcome
///
/// The scheduler only depends on this trait, so tests can substitute a fake
/// implementation for the network.
#[async_trait]
pub trait CandidateFetcher: Send + Sync {
    async fn fetch(&self, domain: &Domain) -> FetchOutcome;
}

/// Retry and backoff settings for [`HomepageFetcher`]
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Transport-level retries per candidate
    pub retries: u32,

    /// Exponential backoff factor between transport retries (seconds)
    pub backoff_factor: f64,

    /// Pause before the extra request that follows an HTTP 429
    pub rate_limit_backoff: Duration,
}

impl From<&FetchConfig> for FetchSettings {
    fn from(config: &FetchConfig) -> Self {
        Self {
            retries: config.retries,
            backoff_factor: config.backoff_factor,
            rate_limit_backoff: config.rate_limit_backoff(),
        }
    }
}

/// Builds the shared HTTP client
///
/// The client follows redirects, applies the per-request timeout, keeps an
/// idle pool of `pool_size` connections per host and never decompresses
/// bodies itself, so the declared `Content-Encoding` is preserved for
/// [`decode_body`].
///
/// # Arguments
///
/// * `config` - The fetch configuration
/// * `pool_size` - Idle connections kept per host, normally the worker count
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use homepage_harvest::config::FetchConfig;
/// use homepage_harvest::crawler::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default(), 32).unwrap();
/// ```
pub fn build_http_client(config: &FetchConfig, pool_size: usize) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate, br"));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en;q=0.9"));

    let mut builder = Client::builder()
        .default_headers(headers)
        .timeout(config.request_timeout())
        .connect_timeout(config.request_timeout())
        .redirect(Policy::limited(MAX_REDIRECTS))
        .pool_max_idle_per_host(pool_size);

    if config.ipv4_only {
        builder = builder.local_address(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    }

    builder.build()
}

/// Fetches domain homepages by trying each candidate URL in turn
pub struct HomepageFetcher {
    client: Client,
    settings: FetchSettings,
    agents: UserAgentPicker,
}

impl HomepageFetcher {
    pub fn new(client: Client, settings: FetchSettings) -> Self {
        Self::with_user_agents(client, settings, UserAgentPicker::new())
    }

    pub fn with_user_agents(client: Client, settings: FetchSettings, agents: UserAgentPicker) -> Self {
        Self {
            client,
            settings,
            agents,
        }
    }

    /// Builds a fetcher with its own client from configuration
    pub fn from_config(config: &FetchConfig, pool_size: usize) -> Result<Self, reqwest::Error> {
        let client = build_http_client(config, pool_size)?;
        Ok(Self::new(client, FetchSettings::from(config)))
    }

    /// Fetches the homepage of `domain`
    ///
    /// # Request Flow
    ///
    /// For each candidate (https+www, https, http+www, http):
    ///
    /// 1. GET with a random User-Agent, redirects followed, transport retries
    /// 2. On HTTP 429, pause and GET once more with a fresh User-Agent
    /// 3. Decode the body using the declared `Content-Encoding`
    /// 4. A fatal decode → remember the note, next candidate
    /// 5. 2xx and HTML-like → return `Success`
    /// 6. Otherwise remember `status:<code>`, next candidate
    ///
    /// Network failures are remembered as `timeout:<kind>` or `net:<kind>`.
    /// When every candidate fails, the last remembered reason is returned.
    pub async fn fetch_homepage(&self, domain: &Domain) -> FetchOutcome {
        self.fetch_with_trail(domain).await.0
    }

    /// Like [`fetch_homepage`](Self::fetch_homepage), but also returns every
    /// candidate that was attempted, in the order it was attempted
    pub async fn fetch_with_trail(&self, domain: &Domain) -> (FetchOutcome, Vec<CandidateAttempt>) {
        let mut trail = Vec::new();
        let mut last_err = String::new();

        for candidate in candidate_urls(domain) {
            match self.try_candidate(&candidate).await {
                Ok(outcome) => {
                    tracing::debug!(domain = %domain, url = %candidate, "candidate succeeded");
                    trail.push(CandidateAttempt {
                        url: candidate,
                        failure: None,
                    });
                    return (outcome, trail);
                }
                Err(reason) => {
                    tracing::debug!(domain = %domain, url = %candidate, reason = %reason, "candidate failed");
                    trail.push(CandidateAttempt {
                        url: candidate,
                        failure: Some(reason.clone()),
                    });
                    last_err = reason;
                }
            }
        }

        if last_err.is_empty() {
            last_err = "fail".to_string();
        }
        (FetchOutcome::Failure { reason: last_err }, trail)
    }

    async fn try_candidate(&self, candidate: &str) -> Result<FetchOutcome, String> {
        let url = Url::parse(candidate).map_err(|_| "net:invalid-url".to_string())?;

        let mut response = self
            .get_with_retries(&url, self.agents.pick())
            .await
            .map_err(|e| categorize_error(&e))?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            tokio::time::sleep(self.settings.rate_limit_backoff).await;
            response = self
                .get_with_retries(&url, self.agents.pick())
                .await
                .map_err(|e| categorize_error(&e))?;
        }

        let status = response.status();
        let final_url = response.url().to_string();
        let encoding = response
            .headers()
            .get(CONTENT_ENCODING)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        let raw = response.bytes().await.map_err(|e| categorize_error(&e))?;

        let decision = decode_body(encoding.as_deref(), &raw);
        let body = match decision.bytes {
            Some(body) => body,
            None => return Err(decision.note.unwrap_or_else(|| "decode-failed".to_string())),
        };
        if let Some(note) = &decision.note {
            tracing::debug!(url = %final_url, note = %note, "body decoded with repair");
        }

        if status.is_success() && looks_like_html(&body) {
            return Ok(FetchOutcome::Success { final_url, body });
        }

        Err(format!("status:{}", status.as_u16()))
    }

    /// Sends a GET, retrying transient failures
    ///
    /// Connection and timeout errors, and the statuses in
    /// [`RETRY_STATUSES`], are retried up to `retries` times. When retries
    /// run out on a retryable status, that response is returned as-is.
    async fn get_with_retries(&self, url: &Url, user_agent: &str) -> Result<Response, reqwest::Error> {
        let mut attempt: u32 = 0;

        loop {
            let result = self
                .client
                .get(url.clone())
                .header(USER_AGENT, user_agent)
                .send()
                .await;

            let retries_left = attempt < self.settings.retries;
            attempt += 1;

            let delay = match &result {
                Ok(response) if retries_left && RETRY_STATUSES.contains(&response.status().as_u16()) => {
                    Some(retry_after(response).unwrap_or_else(|| self.backoff(attempt)))
                }
                Err(e) if retries_left && (e.is_connect() || e.is_timeout()) => Some(self.backoff(attempt)),
                _ => None,
            };
            let Some(delay) = delay else {
                return result;
            };

            tracing::trace!(url = %url, attempt, "retrying in {:?}", delay);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }

    /// Backoff before retry number `attempt` (1-based); the first retry is immediate
    fn backoff(&self, attempt: u32) -> Duration {
        backoff_delay(self.settings.backoff_factor, attempt)
    }
}

#[async_trait]
impl CandidateFetcher for HomepageFetcher {
    async fn fetch(&self, domain: &Domain) -> FetchOutcome {
        self.fetch_homepage(domain).await
    }
}

fn backoff_delay(factor: f64, attempt: u32) -> Duration {
    if attempt <= 1 {
        return Duration::ZERO;
    }
    let secs = factor * 2f64.powi(attempt as i32 - 1);
    Duration::from_secs_f64(secs.min(BACKOFF_MAX.as_secs_f64()))
}

fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(|secs| Duration::from_secs(secs).min(BACKOFF_MAX))
}

/// Maps a reqwest error to a short reason code
///
/// TLS failures are grouped with timeouts, as both usually mean the
/// endpoint exists but is not usable over this scheme.
pub fn categorize_error(error: &reqwest::Error) -> String {
    let kind = if error.is_timeout() {
        if error.is_connect() {
            "timeout:connect"
        } else {
            "timeout:read"
        }
    } else if is_tls_error(error) {
        "timeout:tls"
    } else if error.is_connect() {
        "net:connect"
    } else if error.is_redirect() {
        "net:redirect"
    } else if error.is_body() || error.is_decode() {
        "net:body"
    } else if error.is_builder() {
        "net:invalid-url"
    } else {
        "net:request"
    };
    kind.to_string()
}

fn is_tls_error(error: &reqwest::Error) -> bool {
    let mut source: Option<&(dyn StdError + 'static)> = error.source();
    while let Some(err) = source {
        let text = err.to_string().to_lowercase();
        if text.contains("certificate") || text.contains("tls") || text.contains("handshake") {
            return true;
        }
        source = err.source();
    }
    false
}
