use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{handlers, jobs, middleware::metrics_middleware, platforms, scheduler, ws};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health, config and metrics
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::get_metrics))
        // Jobs
        .route("/jobs", get(jobs::list_jobs))
        .route("/jobs", post(jobs::submit_job))
        .route("/jobs/batch", post(jobs::submit_batch))
        .route("/jobs/finished", delete(jobs::clear_finished))
        .route("/jobs/{id}", get(jobs::get_job))
        .route("/jobs/{id}", delete(jobs::cancel_job))
        // Scheduler
        .route("/status", get(scheduler::get_status))
        .route("/scheduler/start", post(scheduler::start))
        .route("/scheduler/stop", post(scheduler::stop))
        .route("/scheduler/pause", post(scheduler::pause))
        .route("/scheduler/resume", post(scheduler::resume))
        .route("/scheduler/concurrency", put(scheduler::set_concurrency))
        // Platforms
        .route("/platforms", get(platforms::list_platforms))
        .route("/platforms/categories", get(platforms::list_categories))
        .route("/platforms/validate", post(platforms::validate_url))
        .route("/platforms/options", get(platforms::get_options))
        .route("/media/info", get(platforms::get_media_info))
        // Live scheduler events
        .route("/ws", get(ws::ws_handler))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
