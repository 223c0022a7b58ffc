use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{is_plausible_email, map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct SubscribeRequest {
    pub email: String,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct SubscriberItem {
    pub email: String,
    pub status: String,
    pub subscribed_at: DateTime<Utc>,
}

/// `POST /api/v1/newsletter` — idempotent signup.
pub(super) async fn subscribe(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<SubscribeRequest>,
) -> Result<Json<ApiResponse<SubscriberItem>>, ApiError> {
    if !is_plausible_email(&body.email) {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "a valid email address is required",
        ));
    }

    let row = wmdb_db::subscribe(&state.pool, body.email.trim(), body.source.as_deref())
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: SubscriberItem {
            email: row.email,
            status: row.status,
            subscribed_at: row.subscribed_at,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
