use std::collections::HashMap;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::Request;
use tower::ServiceExt;
use url_mux::config::LimitsConfig;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::{
    build_app, mount_posts, post_body, spawn_app, spawn_default_app, url_array,
};

fn post_urls(server: &MockServer, ids: &[usize]) -> Vec<String> {
    ids.iter()
        .map(|id| format!("{}/posts/{}", server.uri(), id))
        .collect()
}

#[tokio::test]
async fn test_simple_request() {
    let mock_server = MockServer::start().await;
    mount_posts(&mock_server, 3, Duration::ZERO).await;
    let app = spawn_default_app().await;

    let urls = post_urls(&mock_server, &[1, 2, 3]);
    let response = app.post(url_array(&urls)).await;

    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "application/json"
    );

    let body = response.text().await.unwrap();
    let results: HashMap<String, String> = serde_json::from_str(&body).unwrap();

    let expected: HashMap<String, String> = urls
        .iter()
        .enumerate()
        .map(|(i, url)| (url.clone(), post_body(i + 1)))
        .collect();
    assert_eq!(results, expected);
}

#[tokio::test]
async fn test_incorrect_request() {
    let mock_server = MockServer::start().await;
    mount_posts(&mock_server, 3, Duration::ZERO).await;
    let app = spawn_default_app().await;

    let mut urls = post_urls(&mock_server, &[1, 2, 3]);
    urls.push("http:/incorrect.qwerty.ytre".to_string());
    urls.push("another-incorrect-url".to_string());

    let response = app.post(url_array(&urls)).await;

    assert_eq!(response.status(), 500);
    let body = response.text().await.unwrap();
    assert!(serde_json::from_str::<HashMap<String, String>>(&body).is_err());
}

#[tokio::test]
async fn test_unreachable_host_fails_request() {
    let mock_server = MockServer::start().await;
    mount_posts(&mock_server, 2, Duration::ZERO).await;
    let app = spawn_default_app().await;

    // Nothing listens on port 9 of the loopback interface
    let mut urls = post_urls(&mock_server, &[1, 2]);
    urls.push("http://127.0.0.1:9/".to_string());

    let response = app.post(url_array(&urls)).await;
    assert_eq!(response.status(), 500);
}

#[tokio::test]
async fn test_sub_request_timeout_fails_request() {
    let mock_server = MockServer::start().await;
    mount_posts(&mock_server, 2, Duration::from_millis(800)).await;
    let app = spawn_app(LimitsConfig::default(), Duration::from_millis(200)).await;

    let response = app.post(url_array(&post_urls(&mock_server, &[1, 2]))).await;

    assert_eq!(response.status(), 500);
    assert!(response.text().await.unwrap().contains("timeout"));
}

#[tokio::test]
async fn test_non_success_status_is_passed_through() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
        .mount(&mock_server)
        .await;
    let app = spawn_default_app().await;

    let url = format!("{}/gone", mock_server.uri());
    let response = app.post(url_array(&[url.clone()])).await;

    assert_eq!(response.status(), 200);
    let results: HashMap<String, String> =
        serde_json::from_str(&response.text().await.unwrap()).unwrap();
    assert_eq!(results[&url], "missing");
}

#[tokio::test]
async fn test_duplicate_urls_collapse() {
    let mock_server = MockServer::start().await;
    mount_posts(&mock_server, 2, Duration::ZERO).await;
    let app = spawn_default_app().await;

    let urls = post_urls(&mock_server, &[1, 2, 1, 1, 2]);
    let response = app.post(url_array(&urls)).await;

    assert_eq!(response.status(), 200);
    let results: HashMap<String, String> =
        serde_json::from_str(&response.text().await.unwrap()).unwrap();
    assert_eq!(results.len(), 2);

    // Every duplicate is still fetched
    let received = mock_server.received_requests().await.unwrap();
    assert_eq!(received.len(), 5);
}

#[tokio::test]
async fn test_empty_list() {
    let app = spawn_default_app().await;
    let response = app.post("[]").await;

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "{}");
}

#[tokio::test]
async fn test_too_many_urls() {
    let mock_server = MockServer::start().await;
    mount_posts(&mock_server, 3, Duration::ZERO).await;
    let limits = LimitsConfig {
        max_urls: 2,
        max_concurrent_sub_requests: 4,
    };
    let app = spawn_app(limits, Duration::from_secs(1)).await;

    let response = app.post(url_array(&post_urls(&mock_server, &[1, 2, 3]))).await;

    assert_eq!(response.status(), 500);
    assert!(response
        .text()
        .await
        .unwrap()
        .starts_with("500 getting urls from req"));
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unterminated_body() {
    let app = spawn_default_app().await;
    let response = app.post(r#"["http://a.test/1", "http://a.te"#).await;
    assert_eq!(response.status(), 500);
}

#[tokio::test]
async fn test_only_post_is_allowed() {
    let app = spawn_default_app().await;

    let response = app
        .client
        .get(format!("http://{}/", app.addr))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 405);
    assert_eq!(
        response.text().await.unwrap(),
        "405 only POST method allowed"
    );
}

#[tokio::test]
async fn test_sub_requests_are_bounded() {
    const LIMIT: usize = 4;
    const URLS: usize = 8;
    let delay = Duration::from_millis(300);

    let mock_server = MockServer::start().await;
    mount_posts(&mock_server, URLS, delay).await;
    let limits = LimitsConfig {
        max_urls: 20,
        max_concurrent_sub_requests: LIMIT,
    };
    let app = spawn_app(limits, Duration::from_secs(5)).await;

    let ids: Vec<usize> = (1..=URLS).collect();
    let start = Instant::now();
    let response = app.post(url_array(&post_urls(&mock_server, &ids))).await;
    let elapsed = start.elapsed();

    assert_eq!(response.status(), 200);
    // ceil(8 / 4) = 2 waves
    assert!(elapsed >= delay * 2, "finished too early: {:?}", elapsed);
    assert!(elapsed <= delay * 3, "finished too late: {:?}", elapsed);
}

#[tokio::test]
async fn test_shutdown_cancels_before_dispatch() {
    let mock_server = MockServer::start().await;
    mount_posts(&mock_server, 3, Duration::ZERO).await;
    let app = spawn_default_app().await;
    app.shutdown.cancel();

    let response = app.post(url_array(&post_urls(&mock_server, &[1, 2, 3]))).await;

    assert_eq!(response.status(), 500);
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_abandoned_request_cancels_sub_requests() {
    let mock_server = MockServer::start().await;
    mount_posts(&mock_server, 3, Duration::from_secs(1)).await;
    let limits = LimitsConfig {
        max_urls: 20,
        max_concurrent_sub_requests: 1,
    };
    let (app, _shutdown) = build_app(limits, Duration::from_secs(10));

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .body(Body::from(url_array(&post_urls(&mock_server, &[1, 2, 3]))))
        .unwrap();
    let handle = tokio::spawn(app.oneshot(request));

    tokio::time::sleep(Duration::from_millis(200)).await;
    handle.abort();
    assert!(handle.await.unwrap_err().is_cancelled());

    // Without cancellation the remaining two fetches would start within 2s
    tokio::time::sleep(Duration::from_millis(2500)).await;
    let received = mock_server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
}
