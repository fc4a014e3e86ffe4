//! Retry behavior of the HTTP executor against a mock server.

use g2s_connectors::testing::test_connector_config;
use g2s_connectors::{ConnectorError, HttpClient, RetryPolicy};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(base_url: &str, max_attempts: u32) -> HttpClient {
    HttpClient::new(test_connector_config("retry-test", base_url))
        .unwrap()
        .with_retry_policy(RetryPolicy {
            max_attempts,
            delay: Duration::ZERO,
        })
}

#[tokio::test]
async fn test_not_found_returns_on_first_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/hardware/404"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let response = client(&server.uri(), 4)
        .get("/hardware/404", &[])
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hardware"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let response = client(&server.uri(), 4)
        .post("/hardware", &json!({ "asset_tag": "SN1" }))
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 500);
}

#[tokio::test]
async fn test_rate_limited_until_exhausted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;

    let result = client(&server.uri(), 3).get("/models", &[]).await;

    match result {
        Err(ConnectorError::RetriesExhausted { attempts, .. }) => assert_eq!(attempts, 3),
        other => panic!("Expected RetriesExhausted, got {:?}", other.map(|r| r.status())),
    }
}

#[tokio::test]
async fn test_rate_limited_then_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/statuslabels"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/statuslabels"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "total": 0, "rows": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client(&server.uri(), 4)
        .get("/statuslabels", &[])
        .await
        .unwrap();

    assert!(response.status().is_success());
}

#[tokio::test]
async fn test_connection_refused_is_retried_then_exhausted() {
    let result = client("http://127.0.0.1:1", 2).get("/hardware", &[]).await;

    assert!(matches!(
        result,
        Err(ConnectorError::RetriesExhausted { attempts: 2, .. })
    ));
}

#[tokio::test]
async fn test_delay_is_applied_between_attempts_only() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let client = HttpClient::new(test_connector_config("retry-test", &server.uri()))
        .unwrap()
        .with_retry_policy(RetryPolicy {
            max_attempts: 2,
            delay: Duration::from_millis(500),
        });

    let started = std::time::Instant::now();
    let _ = client.get("/users", &[]).await;
    let elapsed = started.elapsed();

    assert!(elapsed >= Duration::from_millis(500));
    assert!(elapsed < Duration::from_millis(1000));
}
