//! HTTP API integration tests.
//!
//! Requests go through the full router (middleware included) against a real
//! scheduler driven by the mock fetcher and transcoder.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{fixtures, TestFixture};

#[tokio::test]
async fn test_health() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/health").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_config_is_sanitized() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/config").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["fetcher"]["binary"], "yt-dlp");
    assert_eq!(response.body["fetcher"]["extra_args_configured"], false);
    assert!(response.body["fetcher"].get("extra_args").is_none());
    assert_eq!(response.body["scheduler"]["concurrency"], 1);
}

#[tokio::test]
async fn test_submit_job_uses_configured_defaults() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post(
            "/api/v1/jobs",
            json!({ "url": "vimeo.com/123", "kind": "video" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    let job = &response.body;
    assert!(job["id"].as_str().unwrap().starts_with("video_"));
    assert_eq!(job["url"], "https://vimeo.com/123");
    assert_eq!(job["status"], "pending");
    assert_eq!(job["platform"], "Vimeo");
    assert_eq!(job["format_ext"], "mp4");
    assert_eq!(
        job["output_path"],
        fixture.temp_dir.path().to_string_lossy().as_ref()
    );

    let id = job["id"].as_str().unwrap();
    let response = fixture.get(&format!("/api/v1/jobs/{}", id)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["id"], id);
}

#[tokio::test]
async fn test_submit_invalid_url_is_bad_request() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post("/api/v1/jobs", json!({ "url": "", "kind": "audio" }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "URL cannot be empty");

    let response = fixture
        .post(
            "/api/v1/jobs",
            json!({ "url": "ftp://files.example.org/a.mp3", "kind": "audio" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .starts_with("Platform not supported"));

    let status = fixture.get("/api/v1/status").await;
    assert_eq!(status.body["pending"], 0);
}

#[tokio::test]
async fn test_batch_submission_reports_rejections() {
    let fixture = TestFixture::new().await;
    let mut urls = fixtures::audio_urls(2);
    urls.insert(1, "not a url".to_string());

    let response = fixture
        .post(
            "/api/v1/jobs/batch",
            json!({ "urls": urls, "kind": "audio", "format": "m4a" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["submitted"].as_array().unwrap().len(), 2);
    let rejected = response.body["rejected"].as_array().unwrap();
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0]["url"], "not a url");

    let jobs = fixture.get("/api/v1/jobs").await;
    let pending = jobs.body["pending"].as_array().unwrap();
    assert_eq!(pending.len(), 2);
    assert!(pending.iter().all(|j| j["format_ext"] == "m4a"));

    let response = fixture
        .post("/api/v1/jobs/batch", json!({ "urls": [], "kind": "audio" }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_scheduler_lifecycle_over_http() {
    let fixture = TestFixture::new().await;

    let response = fixture.post_empty("/api/v1/scheduler/pause").await;
    assert_eq!(response.status, StatusCode::CONFLICT);

    for url in fixtures::audio_urls(3) {
        let response = fixture
            .post("/api/v1/jobs", json!({ "url": url, "kind": "audio" }))
            .await;
        assert_eq!(response.status, StatusCode::CREATED);
    }

    let response = fixture.post_empty("/api/v1/scheduler/start").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["running"], true);

    fixture.wait_for_status(|s| s.completed == 3).await;

    let response = fixture.get("/api/v1/status").await;
    assert_eq!(response.body["completed"], 3);
    assert_eq!(response.body["state"], "running");

    let response = fixture.post_empty("/api/v1/scheduler/pause").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["state"], "paused");

    let response = fixture.post_empty("/api/v1/scheduler/resume").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["state"], "running");

    let response = fixture.post_empty("/api/v1/scheduler/stop").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["state"], "stopped");
    assert_eq!(response.body["running"], false);

    let response = fixture.delete("/api/v1/jobs/finished").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["removed"], 3);
}

#[tokio::test]
async fn test_cancel_job() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post(
            "/api/v1/jobs",
            json!({ "url": "https://soundcloud.com/artist/track", "kind": "audio" }),
        )
        .await;
    let id = response.body["id"].as_str().unwrap().to_string();

    let response = fixture.delete(&format!("/api/v1/jobs/{}", id)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["cancelled"], true);

    let response = fixture.get(&format!("/api/v1/jobs/{}", id)).await;
    assert_eq!(response.body["status"], "cancelled");

    // Terminal jobs cannot be cancelled again
    let response = fixture.delete(&format!("/api/v1/jobs/{}", id)).await;
    assert_eq!(response.status, StatusCode::CONFLICT);

    let response = fixture.delete("/api/v1/jobs/audio_0_0").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    assert_eq!(fixture.fetcher.fetch_count().await, 0);
}

#[tokio::test]
async fn test_get_unknown_job_is_not_found() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/jobs/video_1_1").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "Job not found: video_1_1");
}

#[tokio::test]
async fn test_set_concurrency() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .put("/api/v1/scheduler/concurrency", json!({ "concurrency": 0 }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = fixture
        .put("/api/v1/scheduler/concurrency", json!({ "concurrency": 4 }))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["concurrency"], 4);

    fixture.post_empty("/api/v1/scheduler/start").await;
    let response = fixture
        .put("/api/v1/scheduler/concurrency", json!({ "concurrency": 2 }))
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);

    fixture.post_empty("/api/v1/scheduler/stop").await;
}

#[tokio::test]
async fn test_convert_job_over_http() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post(
            "/api/v1/jobs",
            json!({ "url": "/media/clip.mkv", "kind": "convert", "format": "mp3", "quality": "high" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["quality"], "high");
    assert!(response.body["platform"].is_null());

    fixture.post_empty("/api/v1/scheduler/start").await;
    fixture.wait_for_status(|s| s.completed == 1).await;

    let jobs = fixture.get("/api/v1/jobs").await;
    assert_eq!(jobs.body["completed"][0]["filename"], "clip.mp3");

    fixture.post_empty("/api/v1/scheduler/stop").await;
}

#[tokio::test]
async fn test_platform_listing() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/platforms").await;
    assert_eq!(response.status, StatusCode::OK);
    let names: Vec<&str> = response
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"YouTube"));
    assert!(!names.contains(&"Generic (yt-dlp supported)"));
    assert!(response
        .body
        .as_array()
        .unwrap()
        .iter()
        .all(|p| p["category"] != "adult"));

    let response = fixture
        .get("/api/v1/platforms?include_restricted=true&include_generic=true")
        .await;
    let all = response.body.as_array().unwrap();
    assert!(all.iter().any(|p| p["category"] == "adult"));
    assert!(all.iter().any(|p| p["id"] == "generic"));

    let response = fixture.get("/api/v1/platforms/categories").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body["video"]
        .as_array()
        .unwrap()
        .iter()
        .any(|n| n == "YouTube"));
}

#[tokio::test]
async fn test_validate_url() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post(
            "/api/v1/platforms/validate",
            json!({ "url": "https://www.youtube.com/watch?v=abc12345678" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["valid"], true);
    assert_eq!(response.body["platform"]["name"], "YouTube");
    assert_eq!(response.body["restricted"], false);

    let response = fixture
        .post("/api/v1/platforms/validate", json!({ "url": "not a url" }))
        .await;
    assert_eq!(response.body["valid"], false);
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid URL format"));
}

#[tokio::test]
async fn test_download_options() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .get("/api/v1/platforms/options?url=https://www.youtube.com/watch?v=abc12345678")
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["platform"]["name"], "YouTube");
    assert_eq!(response.body["options"]["recommended_quality"], "1080p");
    assert_eq!(response.body["qualities"][0], "Best");

    let response = fixture.get("/api/v1/platforms/options?url=").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_media_info_lookup() {
    let fixture = TestFixture::new().await;
    fixture.fetcher.fail_url("private", "Private video").await;

    let response = fixture.get("/api/v1/media/info?url=vimeo.com/123").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["title"], "123");
    assert_eq!(response.body["formats"][1]["kind"], "audio_only");

    let response = fixture
        .get("/api/v1/media/info?url=https://vimeo.com/private")
        .await;
    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .contains("Private video"));

    let response = fixture.get("/api/v1/media/info?url=not%20a%20url").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    assert_eq!(fixture.fetcher.fetch_count().await, 0);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new().await;
    fixture.get("/api/v1/health").await;

    let (status, body) = fixture.get_text("/api/v1/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("ytdl_http_requests_total"));
    assert!(body.contains("ytdl_queue_jobs"));
    assert!(body.contains("ytdl_scheduler_state"));
}
