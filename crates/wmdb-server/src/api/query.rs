use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use wmdb_query::ParsedQuery;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct ParseQueryRequest {
    pub q: String,
}

/// `POST /api/v1/parse-query` — AI-assisted query parsing. Never fails on
/// model trouble; the deterministic fallback parser answers instead.
pub(super) async fn parse_query(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<ParseQueryRequest>,
) -> Result<Json<ApiResponse<ParsedQuery>>, ApiError> {
    let text = body.q.trim();
    if text.is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "q must not be empty",
        ));
    }

    let parsed = state.parser.parse(text).await;

    Ok(Json(ApiResponse {
        data: parsed,
        meta: ResponseMeta::new(req_id.0),
    }))
}
