//! Full-run scenarios: resume, idempotence and task timeouts

use async_trait::async_trait;
use homepage_harvest::config::Config;
use homepage_harvest::crawler::{run_harvest, CandidateFetcher, Coordinator, FetchOutcome};
use homepage_harvest::domains::Domain;
use homepage_harvest::storage::ResultStore;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAGE: &str = "<html><head><title>ok</title></head></html>";

/// Records every domain it is asked for and always succeeds
#[derive(Default)]
struct RecordingFetcher {
    seen: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

#[async_trait]
impl CandidateFetcher for RecordingFetcher {
    async fn fetch(&self, domain: &Domain) -> FetchOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(domain.to_string());
        FetchOutcome::Success {
            final_url: format!("https://www.{}/", domain),
            body: PAGE.as_bytes().to_vec(),
        }
    }
}

fn create_test_config(dir: &Path, domains: &str) -> Config {
    let list = dir.join("domains.txt");
    std::fs::write(&list, domains).unwrap();

    let mut config = Config::default();
    config.input.domains_file = list;
    config.output.directory = dir.join("out");
    config.output.log_path = Some(dir.join("run.csv"));
    config.fetch.request_timeout_secs = 2;
    config.fetch.retries = 0;
    config.fetch.backoff_factor = 0.0;
    config.fetch.rate_limit_backoff_ms = 10;
    config.scheduler.workers = 4;
    config
}

fn record_names(dir: &Path) -> BTreeSet<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect()
}

#[tokio::test]
async fn test_resume_skips_domain_with_failure_record() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), "a.test\nb.test\n");
    let coordinator = Coordinator::new(config).unwrap();
    coordinator
        .store()
        .write_failure(&Domain::parse("a.test").unwrap(), "status:500")
        .unwrap();

    let fetcher = Arc::new(RecordingFetcher::default());
    let plan = coordinator.plan().unwrap();
    let summary = coordinator.execute(plan, Arc::clone(&fetcher)).await.unwrap();

    assert_eq!(summary.pending, 1);
    assert_eq!(summary.tally.completed(), 1);
    assert_eq!(summary.tally.ok, 1);
    assert_eq!(*fetcher.seen.lock().unwrap(), vec!["b.test".to_string()]);

    let log = std::fs::read_to_string(dir.path().join("run.csv")).unwrap();
    assert!(log.starts_with("domain,status,note\n"));
    assert!(log.contains("a.test,skip,already-have\n"));
    assert!(log.contains("b.test,ok,https://www.b.test/\n"));
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), "a.test\nb.test\nc.test\n");
    let coordinator = Coordinator::new(config).unwrap();
    let fetcher = Arc::new(RecordingFetcher::default());

    let first = coordinator
        .execute(coordinator.plan().unwrap(), Arc::clone(&fetcher))
        .await
        .unwrap();
    assert_eq!(first.tally.ok, 3);
    let records_after_first = record_names(coordinator.store().root());

    let second_plan = coordinator.plan().unwrap();
    assert!(second_plan.is_empty());
    assert_eq!(second_plan.skipped.len(), 3);

    let second = coordinator
        .execute(second_plan, Arc::clone(&fetcher))
        .await
        .unwrap();
    assert_eq!(second.tally.completed(), 0);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
    assert_eq!(record_names(coordinator.store().root()), records_after_first);
}

#[tokio::test]
async fn test_full_run_against_mock_server() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
        .mount(&mock_server)
        .await;

    let live = format!("127.0.0.1:{}", mock_server.address().port());
    let dead = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        format!("127.0.0.1:{}", listener.local_addr().unwrap().port())
    };

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), &format!("{}\n{}\n", live, dead));
    let out = config.output.directory.clone();

    let summary = run_harvest(config.clone()).await.unwrap();
    assert_eq!(summary.pending, 2);
    assert_eq!(summary.tally.ok, 1);
    assert_eq!(summary.tally.fail, 1);

    let live_stem = live.replace(':', "_");
    let dead_stem = dead.replace(':', "_");
    assert_eq!(
        std::fs::read_to_string(out.join(format!("{}.html", live_stem))).unwrap(),
        PAGE
    );
    assert_eq!(
        std::fs::read_to_string(out.join(format!("{}.error", dead_stem))).unwrap(),
        "net:connect\n"
    );

    // A second run issues no requests and changes nothing
    let requests_before = mock_server.received_requests().await.unwrap().len();
    let records_before = record_names(&out);

    let again = run_harvest(config).await.unwrap();
    assert_eq!(again.pending, 0);
    assert_eq!(again.already_handled, 2);
    assert_eq!(mock_server.received_requests().await.unwrap().len(), requests_before);
    assert_eq!(record_names(&out), records_before);
}

#[tokio::test]
async fn test_stuck_domain_times_out_without_blocking_siblings() {
    let fast_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
        .mount(&fast_server)
        .await;

    let stuck_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(PAGE)
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&stuck_server)
        .await;

    let fast = format!("127.0.0.1:{}", fast_server.address().port());
    let stuck = format!("127.0.0.1:{}", stuck_server.address().port());

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(dir.path(), &format!("{}\n{}\n", stuck, fast));
    config.fetch.request_timeout_secs = 10;
    config.scheduler.task_timeout_secs = 1;
    let out = config.output.directory.clone();

    let summary = run_harvest(config).await.unwrap();
    assert_eq!(summary.tally.ok, 1);
    assert_eq!(summary.tally.fail, 1);

    assert_eq!(
        std::fs::read_to_string(out.join(format!("{}.error", stuck.replace(':', "_")))).unwrap(),
        "task-timeout\n"
    );
    assert!(out.join(format!("{}.html", fast.replace(':', "_"))).exists());
}
