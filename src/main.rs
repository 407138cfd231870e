//! Homepage-Harvest main entry point
//!
//! This is the command-line interface for the homepage harvester.

use clap::Parser;
use homepage_harvest::config::{load_config, validate, Config};
use homepage_harvest::crawler::run_harvest;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Homepage-Harvest: resumable bulk homepage downloader
///
/// Downloads the decoded homepage HTML of every domain in DOMAINS_FILE into
/// OUT_DIR as `<domain>.html`. Domains that fail are recorded as
/// `<domain>.error`. Domains with either record are skipped on later runs.
#[derive(Parser, Debug)]
#[command(name = "homepage-harvest")]
#[command(version = "1.0.0")]
#[command(about = "Resumable bulk homepage downloader", long_about = None)]
struct Cli {
    /// Newline-delimited list of domains
    #[arg(value_name = "DOMAINS_FILE")]
    domains_file: PathBuf,

    /// Directory receiving .html and .error records
    #[arg(value_name = "OUT_DIR")]
    out_dir: PathBuf,

    /// Optional TOML configuration file; flags take precedence
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Number of concurrent workers [default: 32]
    #[arg(long)]
    workers: Option<usize>,

    /// Per-request timeout in seconds [default: 5]
    #[arg(long)]
    timeout: Option<u64>,

    /// Transport-level retries per request [default: 3]
    #[arg(long)]
    retries: Option<u32>,

    /// Only process the first N domains
    #[arg(long)]
    limit: Option<usize>,

    /// Write a domain,status,note run log to this file
    #[arg(long, value_name = "FILE")]
    log: Option<PathBuf>,

    /// Only connect over IPv4
    #[arg(long)]
    ipv4: bool,

    /// Maximum seconds a single domain may take [default: 15]
    #[arg(long, alias = "future-timeout")]
    task_timeout: Option<u64>,

    /// Wall-clock ceiling for the whole run in seconds
    /// [default: task timeout × pending domains]
    #[arg(long)]
    global_timeout: Option<u64>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    /// Applies command-line values on top of `config`
    fn apply(&self, config: &mut Config) {
        config.input.domains_file = self.domains_file.clone();
        config.output.directory = self.out_dir.clone();

        if let Some(limit) = self.limit {
            config.input.limit = Some(limit);
        }
        if let Some(log) = &self.log {
            config.output.log_path = Some(log.clone());
        }
        if let Some(timeout) = self.timeout {
            config.fetch.request_timeout_secs = timeout;
        }
        if let Some(retries) = self.retries {
            config.fetch.retries = retries;
        }
        if self.ipv4 {
            config.fetch.ipv4_only = true;
        }
        if let Some(workers) = self.workers {
            config.scheduler.workers = workers;
        }
        if let Some(task_timeout) = self.task_timeout {
            config.scheduler.task_timeout_secs = task_timeout;
        }
        if let Some(global_timeout) = self.global_timeout {
            config.scheduler.global_timeout_secs = Some(global_timeout);
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path).inspect_err(|e| tracing::error!("Failed to load configuration: {}", e))?
        }
        None => Config::default(),
    };
    cli.apply(&mut config);
    validate(&config)?;

    let summary = match run_harvest(config).await {
        Ok(summary) => summary,
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            return Err(e.into());
        }
    };

    println!("Total domains in file: {}", summary.total);
    println!("Already handled: {}", summary.already_handled);
    println!("Pending this run: {}", summary.pending);

    if summary.pending > 0 {
        println!("\nDone. {}", summary.tally);
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("homepage_harvest=info,warn"),
            1 => EnvFilter::new("homepage_harvest=debug,info"),
            2 => EnvFilter::new("homepage_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}
