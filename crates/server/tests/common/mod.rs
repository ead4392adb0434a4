//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that builds the router in-process
//! with the mock fetcher and transcoder injected, so the HTTP surface can be
//! exercised without yt-dlp or ffmpeg installed.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use ytdl_core::{
    testing::{MockFetcher, MockTranscoder},
    BatchScheduler, Config, PlatformRegistry, QueueStatus,
};
use ytdl_server::state::AppState;

/// Re-export fixtures for test convenience
pub use ytdl_core::testing::fixtures;

/// Test fixture for API testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_submit() {
///     let fixture = TestFixture::new().await;
///
///     let response = fixture.post("/api/v1/jobs", json!({
///         "url": "https://vimeo.com/123",
///         "kind": "video"
///     })).await;
///
///     assert_eq!(response.status, 201);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Direct handle on the scheduler behind the router
    pub scheduler: Arc<BatchScheduler>,
    /// Mock fetcher - control download behavior
    pub fetcher: MockFetcher,
    /// Mock transcoder - control conversion behavior
    pub transcoder: MockTranscoder,
    /// Download directory used as the default output path
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with a stopped scheduler and one worker.
    pub async fn new() -> Self {
        Self::with_concurrency(1).await
    }

    pub async fn with_concurrency(concurrency: usize) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let fetcher = MockFetcher::new();
        fetcher.set_timing(2, Duration::from_millis(5)).await;
        let transcoder = MockTranscoder::new();
        transcoder.set_timing(2, Duration::from_millis(5)).await;

        let mut config = Config::default();
        config.downloads.directory = temp_dir.path().to_path_buf();
        config.scheduler = fixtures::scheduler_config(concurrency);

        let registry = Arc::new(PlatformRegistry::builtin());
        let scheduler = Arc::new(BatchScheduler::new(
            config.scheduler.clone(),
            registry.clone(),
            Arc::new(fetcher.clone()),
            Arc::new(transcoder.clone()),
        ));

        let state = Arc::new(AppState::new(config, Arc::clone(&scheduler), registry));
        let router = ytdl_server::api::create_router(state);

        Self {
            router,
            scheduler,
            fetcher,
            transcoder,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a PUT request with JSON body.
    pub async fn put(&self, path: &str, body: Value) -> TestResponse {
        self.request("PUT", path, Some(body)).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Send a GET request and return the raw text body.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Poll the scheduler until `predicate` holds or five seconds pass.
    pub async fn wait_for_status(&self, predicate: impl Fn(&QueueStatus) -> bool) -> QueueStatus {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            let status = self.scheduler.queue_status().await;
            if predicate(&status) {
                return status;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "timed out, last status {:?}",
                status
            );
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}
