//! Shared setup for the integration tests

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use url_mux::config::LimitsConfig;
use url_mux::{router, AppState, HttpFetcher, Multiplexer};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A running url-mux server on an ephemeral port
pub struct TestApp {
    pub addr: SocketAddr,
    pub shutdown: CancellationToken,
    pub client: reqwest::Client,
}

impl TestApp {
    /// Posts `body` to the multiplexer
    pub async fn post(&self, body: impl Into<String>) -> reqwest::Response {
        self.client
            .post(format!("http://{}/", self.addr))
            .header("content-type", "application/json")
            .body(body.into())
            .send()
            .await
            .expect("Failed to reach url-mux")
    }
}

/// Builds the application router around a real HTTP fetcher
pub fn build_app(
    limits: LimitsConfig,
    timeout: Duration,
) -> (axum::Router, CancellationToken) {
    let fetcher = Arc::new(HttpFetcher::new(timeout).expect("Failed to build HTTP client"));
    let shutdown = CancellationToken::new();
    let state = AppState::new(Multiplexer::new(fetcher, &limits), shutdown.clone());
    (router(state, 100), shutdown)
}

/// Starts url-mux with the given limits and sub-request timeout
pub async fn spawn_app(limits: LimitsConfig, timeout: Duration) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().unwrap();
    let (app, shutdown) = build_app(limits, timeout);

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("url-mux server failed");
    });

    TestApp {
        addr,
        shutdown,
        client: reqwest::Client::new(),
    }
}

/// Starts url-mux with the default limits and a one second timeout
pub async fn spawn_default_app() -> TestApp {
    spawn_app(LimitsConfig::default(), Duration::from_secs(1)).await
}

/// Body served for `/posts/{id}` by `mount_posts`
pub fn post_body(id: usize) -> String {
    format!(
        "{{\n  \"userId\": 1,\n  \"id\": {},\n  \"title\": \"post {}\"\n}}",
        id, id
    )
}

/// Mounts `/posts/1` to `/posts/{count}` on the mock server
pub async fn mount_posts(server: &MockServer, count: usize, delay: Duration) {
    for id in 1..=count {
        Mock::given(method("GET"))
            .and(path(format!("/posts/{}", id)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(post_body(id))
                    .insert_header("content-type", "application/json")
                    .set_delay(delay),
            )
            .mount(server)
            .await;
    }
}

/// Renders URLs as the JSON array body the multiplexer expects
pub fn url_array(urls: &[String]) -> String {
    let quoted: Vec<String> = urls.iter().map(|u| format!("\"{}\"", u)).collect();
    format!("[\n{}\n]\n", quoted.join(",\n"))
}
