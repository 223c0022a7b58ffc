use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use wmdb_aggregator::{ingest_listings, IngestSummary, RawListing};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct IngestRequest {
    pub platform: String,
    pub listings: Vec<RawListing>,
}

/// `POST /api/v1/ingest` — bearer-protected batch ingest of scraped rows
/// for one platform. Malformed rows are counted as skipped, never failed.
pub(super) async fn ingest_batch(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<IngestRequest>,
) -> Result<Json<ApiResponse<IngestSummary>>, ApiError> {
    let platform = body.platform.trim().to_string();
    if platform.is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "platform is required",
        ));
    }
    if !state
        .registry
        .platforms
        .iter()
        .any(|p| p.slug() == platform)
    {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            format!("unknown platform '{platform}'"),
        ));
    }

    let summary = ingest_listings(&state.pool, &platform, body.listings)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, platform, "ingest batch failed");
            ApiError::new(req_id.0.clone(), "internal_error", "ingest failed")
        })?;

    Ok(Json(ApiResponse {
        data: summary,
        meta: ResponseMeta::new(req_id.0),
    }))
}
