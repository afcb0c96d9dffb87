//! Integration tests using mock HTTP server
//!
//! Tests the full end-to-end flow: CLI flags → rate limiter → auth → HTTP request → printed response

use clap::Parser;
use reqline::auth::AuthConfig;
use reqline::cli::{Cli, Runner};
use reqline::http::{HttpClient, HttpClientConfig, RequestConfig};
use reqline::Error;
use serde_json::json;
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_string, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn cli(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("reqline").chain(args.iter().copied())).unwrap()
}

async fn run(args: &[&str]) -> reqline::Result<String> {
    let mut out = Vec::new();
    Runner::new(cli(args))
        .run_with_writer(&mut out, &CancellationToken::new())
        .await?;
    Ok(String::from_utf8(out).unwrap())
}

// ============================================================================
// CLI Runner Tests
// ============================================================================

#[tokio::test]
async fn test_runner_prints_status_headers_and_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/users"))
        .and(query_param("page", "2"))
        .and(header("Accept", "application/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Request-Id", "req-1")
                .set_body_raw(r#"{"users":[{"id":1}]}"#, "application/json"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/api/users", mock_server.uri());
    let output = run(&["-H", "Accept: application/json", "-q", "page=2", &url])
        .await
        .unwrap();

    assert!(output.starts_with("HTTP/1.1 200 OK\n"), "{output}");
    assert!(output.contains("\nContent-Type: application/json\n"), "{output}");
    assert!(output.contains("\nX-Request-Id: req-1\n"), "{output}");
    assert!(output.ends_with("\n\n{\"users\":[{\"id\":1}]}"), "{output}");
}

#[tokio::test]
async fn test_runner_pretty_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(r#"{"ok":true}"#, "application/json"))
        .mount(&mock_server)
        .await;

    let output = run(&["--format", "pretty", &mock_server.uri()])
        .await
        .unwrap();

    assert!(output.ends_with("\n\n{\n  \"ok\": true\n}"), "{output}");
}

#[tokio::test]
async fn test_runner_pretty_xml() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("<a><b>1</b></a>", "application/xml"),
        )
        .mount(&mock_server)
        .await;

    let output = run(&["--format", "pretty", &mock_server.uri()])
        .await
        .unwrap();

    assert!(output.ends_with("\n\n<a>\n  <b>1</b>\n</a>"), "{output}");
}

#[tokio::test]
async fn test_runner_non_success_status_is_printed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/items/1"))
        .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/api/items/1", mock_server.uri());
    let output = run(&["-X", "DELETE", &url]).await.unwrap();

    assert!(output.starts_with("HTTP/1.1 404 Not Found\n"), "{output}");
    assert!(output.ends_with("\n\nmissing"), "{output}");
}

#[tokio::test]
async fn test_runner_posts_data_from_file() {
    let mock_server = MockServer::start().await;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(br#"{"name":"widget"}"#).unwrap();
    let data = format!("@{}", file.path().display());

    Mock::given(method("POST"))
        .and(path("/api/items"))
        .and(header("Content-Type", "application/json"))
        .and(body_string(r#"{"name":"widget"}"#))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/api/items", mock_server.uri());
    let output = run(&[
        "-X",
        "POST",
        "-H",
        "Content-Type: application/json",
        "-d",
        &data,
        &url,
    ])
    .await
    .unwrap();

    assert!(output.starts_with("HTTP/1.1 201 Created\n"), "{output}");
}

#[tokio::test]
async fn test_runner_multipart_form() {
    let mock_server = MockServer::start().await;

    let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
    file.write_all(b"attachment body").unwrap();
    let field = format!("doc=@{}", file.path().display());

    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(body_string_contains(r#"name="title""#))
        .and(body_string_contains("hello"))
        .and(body_string_contains(r#"name="doc""#))
        .and(body_string_contains("Content-Type: text/plain"))
        .and(body_string_contains("attachment body"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/upload", mock_server.uri());
    run(&["-X", "POST", "-f", "title=hello", "-f", &field, &url])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_runner_missing_data_file() {
    let err = run(&["-d", "@/no/such/file.json", "http://127.0.0.1:1/"])
        .await
        .unwrap_err();

    assert!(matches!(err, Error::FileNotFound { .. }));
}

#[tokio::test]
async fn test_runner_invalid_rate() {
    let err = run(&["--rate", "10", "http://127.0.0.1:1/"])
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidRateFormat { .. }));
    assert!(err.to_string().starts_with("Invalid rate format"));
}

#[tokio::test]
async fn test_runner_huge_timeout_is_unbounded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let output = run(&["-t", "18446744073709551615s", &mock_server.uri()])
        .await
        .unwrap();

    assert!(output.starts_with("HTTP/1.1 200 OK\n"), "{output}");
    assert!(output.ends_with("\n\nok"), "{output}");
}

#[tokio::test]
async fn test_runner_interrupted_in_flight() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&mock_server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let mut out = Vec::new();
    let started = Instant::now();
    let err = Runner::new(cli(&[&mock_server.uri()]))
        .run_with_writer(&mut out, &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Interrupted));
    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(out.is_empty());
}

// ============================================================================
// Authentication Integration Tests
// ============================================================================

#[tokio::test]
async fn test_runner_basic_auth() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("Authorization", "Basic dXNlcjpwYXNz"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    run(&["-u", "user", "-p", "pass", &mock_server.uri()])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_runner_basic_wins_over_bearer() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("Authorization", "Basic dXNlcjpwYXNz"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    run(&["-u", "user", "-p", "pass", "--token", "ignored", &mock_server.uri()])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_runner_custom_header_auth() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("X-Api-Key", "key-123"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    run(&[
        "--auth-header",
        "X-Api-Key",
        "--auth-value",
        "key-123",
        &mock_server.uri(),
    ])
    .await
    .unwrap();
}

#[tokio::test]
async fn test_runner_oauth2_client_credentials() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("scope=read+write"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "oauth-token",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/me"))
        .and(header("Authorization", "Bearer oauth-token"))
        .respond_with(ResponseTemplate::new(200).set_body_string("me"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let token_url = format!("{}/oauth/token", mock_server.uri());
    let url = format!("{}/api/me", mock_server.uri());
    let output = run(&[
        "--client-id",
        "id",
        "--client-secret",
        "secret",
        "--token-url",
        &token_url,
        "--scope",
        "read,write",
        &url,
    ])
    .await
    .unwrap();

    assert!(output.ends_with("\n\nme"), "{output}");
}

#[tokio::test]
async fn test_runner_oauth2_failure_sends_nothing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/me"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let token_url = format!("{}/oauth/token", mock_server.uri());
    let url = format!("{}/api/me", mock_server.uri());
    let err = run(&[
        "--client-id",
        "id",
        "--client-secret",
        "secret",
        "--token-url",
        &token_url,
        &url,
    ])
    .await
    .unwrap_err();

    assert!(matches!(err, Error::TokenFetch { status: Some(401), .. }));
    assert!(err.to_string().starts_with("Failed to get OAuth2 token"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shared_client_fetches_token_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "shared", "expires_in": 3600}))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/data"))
        .and(header("Authorization", "Bearer shared"))
        .respond_with(ResponseTemplate::new(200))
        .expect(8)
        .mount(&mock_server)
        .await;

    let auth = AuthConfig {
        client_id: "id".to_string(),
        client_secret: "secret".to_string(),
        token_url: format!("{}/oauth/token", mock_server.uri()),
        ..AuthConfig::default()
    };
    let client = Arc::new(HttpClient::with_auth(HttpClientConfig::default(), &auth).unwrap());
    let url = format!("{}/api/data", mock_server.uri());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let client = Arc::clone(&client);
            let url = url.clone();
            tokio::spawn(async move {
                let request = RequestConfig::new(url).build(client.inner()).await?;
                client.send(request).await.map(|r| r.status())
            })
        })
        .collect();

    for result in futures::future::join_all(handles).await {
        assert_eq!(result.unwrap().unwrap(), 200);
    }
}

// ============================================================================
// Rate Limiting Integration Tests
// ============================================================================

#[tokio::test]
async fn test_rate_limited_client_spaces_requests() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = HttpClientConfig::builder().rate("2/s").build();
    let client = HttpClient::with_config(config).unwrap();

    let start = Instant::now();
    for _ in 0..3 {
        let request = client.inner().get(mock_server.uri()).build().unwrap();
        client.send(request).await.unwrap();
    }

    // Two requests fit the burst, the third waits for half a second of refill
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(400), "elapsed {elapsed:?}");
}

#[tokio::test]
async fn test_rate_limit_disabled_at_runtime() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(5)
        .mount(&mock_server)
        .await;

    let config = HttpClientConfig::builder().rate("1/h").build();
    let client = HttpClient::with_config(config).unwrap();
    client.rate_limiter().allow().unwrap();

    client.rate_limiter().set_rate("").unwrap();
    assert!(!client.rate_limiter().is_enabled());

    for _ in 0..5 {
        let request = client.inner().get(mock_server.uri()).build().unwrap();
        client
            .execute(request, Duration::from_millis(500))
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_rate_limit_wait_bounded_by_timeout() {
    let config = HttpClientConfig::builder().rate("1/h").build();
    let client = HttpClient::with_config(config).unwrap();
    client.rate_limiter().allow().unwrap();

    let start = Instant::now();
    let request = client.inner().get("http://127.0.0.1:1/").build().unwrap();
    let err = client
        .execute(request, Duration::from_millis(200))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Cancelled));
    assert!(start.elapsed() < Duration::from_secs(2));

    let stats = client.rate_limiter().stats();
    assert!(stats.enabled);
    assert!(stats.tokens.unwrap() < 1.0);
}

#[tokio::test]
async fn test_rate_limit_wait_cancelled() {
    let config = HttpClientConfig::builder().rate("1/h").build();
    let client = HttpClient::with_config(config).unwrap();
    client.rate_limiter().allow().unwrap();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let request = RequestConfig::new("http://127.0.0.1:1/")
        .build(client.inner())
        .await
        .unwrap();
    let err = client
        .execute_with_cancel(request, Duration::from_secs(30), &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Cancelled));
}
