//! Resilient fetch against a local mock server.
//!
//! The fetch client is blocking, so each call runs on a blocking thread
//! while wiremock serves from the async runtime.

use std::time::{Duration, Instant};

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use jobsync::config::FetchOptions;
use jobsync::fetch::{build_client, fetch_with_retry};

fn options(timeout: Duration, max_attempts: u32, base_backoff: Duration) -> FetchOptions {
    FetchOptions {
        timeout,
        max_attempts,
        base_backoff,
        ..FetchOptions::default()
    }
}

/// Issue one fetch on a blocking thread; returns (status or error, elapsed).
async fn fetch(url: String, opts: FetchOptions) -> (Result<u16, reqwest::Error>, Duration) {
    tokio::task::spawn_blocking(move || {
        let client = build_client(&opts).unwrap();
        let started = Instant::now();
        let result = fetch_with_retry(&client, &url, &opts).map(|r| r.status().as_u16());
        (result, started.elapsed())
    })
    .await
    .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn succeeds_on_third_attempt_after_backoff() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/board"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/board"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .with_priority(2)
        .mount(&server)
        .await;

    let (result, elapsed) = fetch(
        format!("{}/board", server.uri()),
        options(Duration::from_secs(5), 3, Duration::from_millis(400)),
    )
    .await;

    assert_eq!(result.unwrap(), 200);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
    // 400ms after the first failure, 800ms after the second.
    assert!(elapsed >= Duration::from_millis(1200), "elapsed {:?}", elapsed);
}

#[tokio::test(flavor = "multi_thread")]
async fn returns_last_response_when_attempts_run_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let (result, _) = fetch(
        format!("{}/board", server.uri()),
        options(Duration::from_secs(5), 3, Duration::from_millis(10)),
    )
    .await;

    assert_eq!(result.unwrap(), 429);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (result, _) = fetch(
        format!("{}/board", server.uri()),
        options(Duration::from_secs(5), 3, Duration::from_millis(10)),
    )
    .await;

    assert_eq!(result.unwrap(), 404);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn timeouts_are_retried_then_raised() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let (result, _) = fetch(
        format!("{}/slow", server.uri()),
        options(Duration::from_millis(200), 2, Duration::from_millis(10)),
    )
    .await;

    let err = result.unwrap_err();
    assert!(err.is_timeout(), "{:?}", err);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}
