use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{
    is_plausible_email, map_db_error, normalize_limit, ApiError, ApiResponse, AppState,
    ResponseMeta,
};

#[derive(Debug, Deserialize)]
pub(super) struct ApplyRequest {
    pub company_name: String,
    pub contact_email: String,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub inventory_note: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct ApplicationItem {
    pub public_id: Uuid,
    pub company_name: String,
    pub contact_email: String,
    pub website: Option<String>,
    pub inventory_note: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl From<wmdb_db::SellerApplicationRow> for ApplicationItem {
    fn from(row: wmdb_db::SellerApplicationRow) -> Self {
        Self {
            public_id: row.public_id,
            company_name: row.company_name,
            contact_email: row.contact_email,
            website: row.website,
            inventory_note: row.inventory_note,
            status: row.status,
            created_at: row.created_at,
            reviewed_at: row.reviewed_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ListApplicationsParams {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

/// `POST /api/v1/sellers/apply` — dealer application intake.
pub(super) async fn apply(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<ApplyRequest>,
) -> Result<Json<ApiResponse<ApplicationItem>>, ApiError> {
    if body.company_name.trim().is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "company_name is required",
        ));
    }
    if !is_plausible_email(&body.contact_email) {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "a valid contact_email is required",
        ));
    }

    let row = wmdb_db::create_seller_application(
        &state.pool,
        body.company_name.trim(),
        body.contact_email.trim(),
        body.website.as_deref().map(str::trim),
        body.inventory_note.as_deref().map(str::trim),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: row.into(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// `GET /api/v1/sellers/applications` — admin list, newest first.
pub(super) async fn list_applications(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<ListApplicationsParams>,
) -> Result<Json<ApiResponse<Vec<ApplicationItem>>>, ApiError> {
    let rows = wmdb_db::list_seller_applications(
        &state.pool,
        params.status.as_deref(),
        normalize_limit(params.limit),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(ApplicationItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}
