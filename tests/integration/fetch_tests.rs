//! Candidate fetching against mock servers
//!
//! Mock servers listen on `127.0.0.1:<port>`, so a domain of that form only
//! answers on the last candidate: the `www.` variants are not valid hosts and
//! the https variant fails its TLS handshake against a plain HTTP server.

use flate2::write::GzEncoder;
use flate2::Compression;
use homepage_harvest::config::FetchConfig;
use homepage_harvest::crawler::{
    build_http_client, candidate_urls, FetchOutcome, FetchSettings, HomepageFetcher,
    UserAgentPicker,
};
use homepage_harvest::domains::Domain;
use std::io::Write;
use wiremock::matchers::{header_exists, header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAGE: &str = "<!DOCTYPE html><html><head><title>x</title></head><body>hi</body></html>";

fn test_config() -> FetchConfig {
    FetchConfig {
        request_timeout_secs: 2,
        retries: 0,
        backoff_factor: 0.0,
        rate_limit_backoff_ms: 10,
        ipv4_only: false,
    }
}

fn create_fetcher(config: &FetchConfig) -> HomepageFetcher {
    let client = build_http_client(config, 4).expect("Failed to build client");
    HomepageFetcher::with_user_agents(client, FetchSettings::from(config), UserAgentPicker::seeded(7))
}

fn server_domain(server: &MockServer) -> Domain {
    Domain::parse(&format!("127.0.0.1:{}", server.address().port())).expect("valid domain")
}

fn closed_port_domain() -> Domain {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);
    Domain::parse(&format!("127.0.0.1:{}", port)).expect("valid domain")
}

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

#[tokio::test]
async fn test_plain_http_candidate_succeeds_last() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
        .mount(&mock_server)
        .await;

    let domain = server_domain(&mock_server);
    let outcome = create_fetcher(&test_config()).fetch_homepage(&domain).await;

    assert_eq!(
        outcome,
        FetchOutcome::Success {
            final_url: format!("http://{}/", domain),
            body: PAGE.as_bytes().to_vec(),
        }
    );

    // Only the working candidate reached the server
    let requests = mock_server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 1);
}

#[tokio::test]
async fn test_candidates_attempted_in_preference_order() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
        .mount(&mock_server)
        .await;

    let domain = server_domain(&mock_server);
    let (outcome, trail) = create_fetcher(&test_config()).fetch_with_trail(&domain).await;
    assert!(outcome.is_success());

    let attempted: Vec<&str> = trail.iter().map(|a| a.url.as_str()).collect();
    assert_eq!(
        attempted,
        vec![
            format!("https://www.{}/", domain),
            format!("https://{}/", domain),
            format!("http://www.{}/", domain),
            format!("http://{}/", domain),
        ]
    );
    assert_eq!(attempted, candidate_urls(&domain));

    // The three earlier candidates failed before the plain-http one answered
    assert_eq!(trail[0].failure.as_deref(), Some("net:invalid-url"));
    assert!(trail[1].failure.is_some());
    assert_eq!(trail[2].failure.as_deref(), Some("net:invalid-url"));
    assert_eq!(trail[3].failure, None);
}

#[tokio::test]
async fn test_request_headers() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header_regex("user-agent", "Mozilla|Gecko"))
        .and(header_regex("accept-encoding", "gzip|deflate|br"))
        .and(header_exists("accept-language"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
        .mount(&mock_server)
        .await;

    // Requests without the expected headers fall through to a 404
    let domain = server_domain(&mock_server);
    let outcome = create_fetcher(&test_config()).fetch_homepage(&domain).await;
    assert!(outcome.is_success(), "got {:?}", outcome);
}

#[tokio::test]
async fn test_gzip_body_is_decoded() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(gzip(PAGE.as_bytes()))
                .insert_header("content-encoding", "gzip"),
        )
        .mount(&mock_server)
        .await;

    let domain = server_domain(&mock_server);
    match create_fetcher(&test_config()).fetch_homepage(&domain).await {
        FetchOutcome::Success { body, .. } => assert_eq!(body, PAGE.as_bytes()),
        other => panic!("expected success, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unknown_encoding_fails_candidate() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(PAGE)
                .insert_header("content-encoding", "compress"),
        )
        .mount(&mock_server)
        .await;

    let domain = server_domain(&mock_server);
    let outcome = create_fetcher(&test_config()).fetch_homepage(&domain).await;
    assert_eq!(outcome, FetchOutcome::failure("unknown encoding: compress"));
}

#[tokio::test]
async fn test_non_html_success_is_rejected() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"hello": "world"}"#))
        .mount(&mock_server)
        .await;

    let domain = server_domain(&mock_server);
    let outcome = create_fetcher(&test_config()).fetch_homepage(&domain).await;
    assert_eq!(outcome, FetchOutcome::failure("status:200"));
}

#[tokio::test]
async fn test_error_status_with_html_body() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string(PAGE))
        .mount(&mock_server)
        .await;

    let domain = server_domain(&mock_server);
    let outcome = create_fetcher(&test_config()).fetch_homepage(&domain).await;
    assert_eq!(outcome, FetchOutcome::failure("status:404"));
}

#[tokio::test]
async fn test_rate_limited_then_retried_once() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
        .mount(&mock_server)
        .await;

    let domain = server_domain(&mock_server);
    let outcome = create_fetcher(&test_config()).fetch_homepage(&domain).await;

    assert!(outcome.is_success(), "got {:?}", outcome);
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_persistent_rate_limit_reports_status() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&mock_server)
        .await;

    let domain = server_domain(&mock_server);
    let outcome = create_fetcher(&test_config()).fetch_homepage(&domain).await;

    assert_eq!(outcome, FetchOutcome::failure("status:429"));
    // One request plus the single retry after the pause
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_transport_retries_on_server_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
        .mount(&mock_server)
        .await;

    let config = FetchConfig {
        retries: 2,
        ..test_config()
    };
    let domain = server_domain(&mock_server);
    let outcome = create_fetcher(&config).fetch_homepage(&domain).await;

    assert!(outcome.is_success(), "got {:?}", outcome);
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_redirect_is_followed() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/home"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/home"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
        .mount(&mock_server)
        .await;

    let domain = server_domain(&mock_server);
    match create_fetcher(&test_config()).fetch_homepage(&domain).await {
        FetchOutcome::Success { final_url, .. } => {
            assert_eq!(final_url, format!("http://{}/home", domain))
        }
        other => panic!("expected success, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_domain_keeps_last_reason() {
    let domain = closed_port_domain();
    let outcome = create_fetcher(&test_config()).fetch_homepage(&domain).await;
    assert_eq!(outcome, FetchOutcome::failure("net:connect"));
}
