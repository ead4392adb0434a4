//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the ytdl server:
//! - HTTP request metrics (latency, counts)
//! - WebSocket connection metrics
//! - Job lifecycle counters, fed from scheduler events
//! - Queue gauges (refreshed on every scrape)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec,
    Opts, Registry, TextEncoder,
};
use regex_lite::Regex;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};
use ytdl_core::{BatchScheduler, PoolState, SchedulerEvent};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "ytdl_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
        ]),
        &["method", "path", "status"],
    )
    .expect("valid metric definition")
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ytdl_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .expect("valid metric definition")
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "ytdl_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .expect("valid metric definition")
});

// =============================================================================
// WebSocket Metrics
// =============================================================================

/// Active WebSocket connections.
pub static WS_CONNECTIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "ytdl_ws_connections_active",
        "Number of active WebSocket connections",
    )
    .expect("valid metric definition")
});

/// Total WebSocket connections (cumulative).
pub static WS_CONNECTIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "ytdl_ws_connections_total",
        "Total WebSocket connections since startup",
    )
    .expect("valid metric definition")
});

/// WebSocket messages sent by type.
pub static WS_MESSAGES_SENT: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ytdl_ws_messages_sent_total", "WebSocket messages sent"),
        &["type"],
    )
    .expect("valid metric definition")
});

/// WebSocket lag events (when client falls behind).
pub static WS_LAG_EVENTS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "ytdl_ws_lag_events_total",
        "WebSocket lag events (client fell behind)",
    )
    .expect("valid metric definition")
});

// =============================================================================
// Job Metrics
// =============================================================================

/// Jobs accepted by the scheduler, by kind.
pub static JOBS_SUBMITTED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ytdl_jobs_submitted_total", "Jobs accepted into the queue"),
        &["kind"],
    )
    .expect("valid metric definition")
});

/// Jobs claimed by a worker.
pub static JOBS_STARTED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("ytdl_jobs_started_total", "Jobs claimed by a worker")
        .expect("valid metric definition")
});

/// Jobs that reached a terminal state, by status.
pub static JOBS_FINISHED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ytdl_jobs_finished_total", "Jobs that reached a terminal state"),
        &["status"],
    )
    .expect("valid metric definition")
});

// =============================================================================
// Queue Metrics (collected dynamically)
// =============================================================================

/// Jobs per partition.
pub static QUEUE_JOBS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("ytdl_queue_jobs", "Current job count by partition"),
        &["partition"],
    )
    .expect("valid metric definition")
});

/// Worker pool state (0 = stopped, 1 = running, 2 = paused).
pub static SCHEDULER_STATE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "ytdl_scheduler_state",
        "Worker pool state: 0 stopped, 1 running, 2 paused",
    )
    .expect("valid metric definition")
});

/// Configured worker count.
pub static SCHEDULER_CONCURRENCY: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("ytdl_scheduler_concurrency", "Configured worker count")
        .expect("valid metric definition")
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // HTTP
        Box::new(HTTP_REQUEST_DURATION.clone()),
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
        Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()),
        // WebSocket
        Box::new(WS_CONNECTIONS_ACTIVE.clone()),
        Box::new(WS_CONNECTIONS_TOTAL.clone()),
        Box::new(WS_MESSAGES_SENT.clone()),
        Box::new(WS_LAG_EVENTS.clone()),
        // Jobs
        Box::new(JOBS_SUBMITTED_TOTAL.clone()),
        Box::new(JOBS_STARTED_TOTAL.clone()),
        Box::new(JOBS_FINISHED_TOTAL.clone()),
        // Queue
        Box::new(QUEUE_JOBS.clone()),
        Box::new(SCHEDULER_STATE.clone()),
        Box::new(SCHEDULER_CONCURRENCY.clone()),
    ];

    for collector in collectors {
        if let Err(e) = registry.register(collector) {
            error!("Failed to register metric: {}", e);
        }
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Refresh queue gauges from the scheduler.
///
/// Called before encoding so a scrape always sees current counts.
pub async fn collect_dynamic_metrics(scheduler: &BatchScheduler) {
    let status = scheduler.queue_status().await;

    QUEUE_JOBS
        .with_label_values(&["pending"])
        .set(status.pending as i64);
    QUEUE_JOBS
        .with_label_values(&["active"])
        .set(status.active as i64);
    QUEUE_JOBS
        .with_label_values(&["completed"])
        .set(status.completed as i64);
    QUEUE_JOBS
        .with_label_values(&["failed"])
        .set((status.failed - status.cancelled) as i64);
    QUEUE_JOBS
        .with_label_values(&["cancelled"])
        .set(status.cancelled as i64);

    SCHEDULER_STATE.set(match status.state {
        PoolState::Stopped => 0,
        PoolState::Running => 1,
        PoolState::Paused => 2,
    });
    SCHEDULER_CONCURRENCY.set(status.concurrency as i64);
}

/// Updates job counters for one scheduler event.
pub fn record_event(event: &SchedulerEvent) {
    match event {
        SchedulerEvent::JobAdded { kind, .. } => {
            JOBS_SUBMITTED_TOTAL
                .with_label_values(&[kind.as_str()])
                .inc();
        }
        SchedulerEvent::DownloadStarted { .. } => JOBS_STARTED_TOTAL.inc(),
        SchedulerEvent::DownloadCompleted { status, .. } => {
            JOBS_FINISHED_TOTAL
                .with_label_values(&[status.as_str()])
                .inc();
        }
        _ => {}
    }
}

/// Feeds job counters from the scheduler's event stream until it closes.
pub fn spawn_event_recorder(scheduler: &Arc<BatchScheduler>) -> JoinHandle<()> {
    let mut rx = scheduler.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => record_event(&event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Metrics recorder lagged, skipped {} events", n);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Scheduler event stream closed");
                    break;
                }
            }
        }
    })
}

static JOB_ID_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/(video|audio|convert)_\d+_\d+").expect("valid job id pattern"));

/// Normalize a path for metric labels (replace job ids with a placeholder).
pub fn normalize_path(path: &str) -> String {
    JOB_ID_SEGMENT.replace_all(path, "/{id}").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ytdl_core::{JobId, JobKind, JobStatus};

    #[test]
    fn test_normalize_path_job_id() {
        let path = "/api/v1/jobs/audio_1718000000000_42";
        assert_eq!(normalize_path(path), "/api/v1/jobs/{id}");
    }

    #[test]
    fn test_normalize_path_no_ids() {
        assert_eq!(normalize_path("/api/v1/health"), "/api/v1/health");
        assert_eq!(normalize_path("/api/v1/jobs/finished"), "/api/v1/jobs/finished");
    }

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics();
        assert!(output.contains("ytdl_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_record_event_counts_jobs() {
        let before = JOBS_FINISHED_TOTAL.with_label_values(&["failed"]).get();

        record_event(&SchedulerEvent::JobAdded {
            job_id: JobId::from("audio_1_1"),
            kind: JobKind::Audio,
            url: "https://soundcloud.com/a/b".to_string(),
        });
        record_event(&SchedulerEvent::DownloadCompleted {
            job_id: JobId::from("audio_1_1"),
            status: JobStatus::Failed,
            error_message: Some("boom".to_string()),
            filename: None,
        });

        assert_eq!(
            JOBS_FINISHED_TOTAL.with_label_values(&["failed"]).get(),
            before + 1
        );
        assert!(JOBS_SUBMITTED_TOTAL.with_label_values(&["audio"]).get() >= 1);

        let output = encode_metrics();
        assert!(output.contains("ytdl_jobs_submitted_total"));
        assert!(output.contains("ytdl_jobs_finished_total"));
    }
}
