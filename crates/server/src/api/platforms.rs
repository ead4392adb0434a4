//! Platform lookup API handlers.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;
use ytdl_core::fetcher::{Fetcher, MediaDetails};
use ytdl_core::platform::{
    normalize_url, quality_options, ContentCategory, DownloadOptions, PlatformCapabilities,
    PlatformInfo, PlatformResolver,
};

use super::handlers::{api_error, ApiError};
use crate::state::AppState;

/// Query parameters for listing platforms
#[derive(Debug, Deserialize)]
pub struct ListPlatformsParams {
    /// Include adult platforms
    #[serde(default)]
    pub include_restricted: bool,
    /// Include the generic fallback
    #[serde(default)]
    pub include_generic: bool,
}

#[derive(Debug, Deserialize)]
pub struct UrlBody {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct UrlParams {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub platform: Option<PlatformInfo>,
    pub restricted: bool,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OptionsResponse {
    pub platform: PlatformInfo,
    pub capabilities: PlatformCapabilities,
    pub options: DownloadOptions,
    pub qualities: Vec<String>,
}

/// List platform definitions
pub async fn list_platforms(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListPlatformsParams>,
) -> Json<Vec<PlatformInfo>> {
    let platforms = state
        .registry()
        .platforms()
        .into_iter()
        .filter(|p| params.include_restricted || !p.is_restricted())
        .filter(|p| params.include_generic || p.id != "generic")
        .collect();
    Json(platforms)
}

/// Platform names grouped by content category
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Json<BTreeMap<ContentCategory, Vec<String>>> {
    Json(state.registry().platforms_by_category())
}

/// Check whether a URL would be accepted
pub async fn validate_url(
    State(state): State<Arc<AppState>>,
    Json(body): Json<UrlBody>,
) -> Json<ValidateResponse> {
    let response = match state.registry().validate(&body.url) {
        Ok(info) => ValidateResponse {
            valid: true,
            restricted: info.is_restricted(),
            platform: Some(info),
            error: None,
        },
        Err(e) => ValidateResponse {
            valid: false,
            platform: None,
            restricted: false,
            error: Some(e.to_string()),
        },
    };
    Json(response)
}

/// Title, duration and formats of a URL, read without downloading
pub async fn get_media_info(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UrlParams>,
) -> Result<Json<MediaDetails>, ApiError> {
    state
        .registry()
        .validate(&params.url)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;
    let url = normalize_url(&params.url)
        .map(|n| n.text)
        .unwrap_or_else(|| params.url.trim().to_string());

    let details = state.scheduler().fetcher().info(&url).await.map_err(|e| {
        warn!(url = %url, error = %e, "Metadata lookup failed");
        api_error(StatusCode::BAD_GATEWAY, e.job_message())
    })?;
    Ok(Json(details))
}

/// Formats and qualities offered for a URL
pub async fn get_options(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UrlParams>,
) -> Result<Json<OptionsResponse>, ApiError> {
    let registry = state.registry();
    let platform = registry
        .validate(&params.url)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;

    Ok(Json(OptionsResponse {
        capabilities: PlatformCapabilities::from(&platform),
        options: registry.download_options(&params.url),
        qualities: quality_options(platform.max_quality),
        platform,
    }))
}
