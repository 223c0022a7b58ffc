use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use wmdb_core::make_group_key;

use crate::middleware::RequestId;

use super::{is_plausible_email, map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct CreateAlertRequest {
    pub email: String,
    pub brand: String,
    #[serde(default)]
    pub reference: Option<String>,
    /// Decimal string, e.g. `"9000"`.
    pub threshold_price: Decimal,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct AlertItem {
    pub public_id: Uuid,
    pub email: String,
    pub brand: String,
    pub reference: Option<String>,
    pub group_key: String,
    pub threshold_price: Decimal,
    pub currency: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub triggered_at: Option<DateTime<Utc>>,
}

impl From<wmdb_db::PriceAlertRow> for AlertItem {
    fn from(row: wmdb_db::PriceAlertRow) -> Self {
        Self {
            public_id: row.public_id,
            email: row.email,
            brand: row.brand,
            reference: row.reference,
            group_key: row.group_key,
            threshold_price: row.threshold_price,
            currency: row.currency,
            is_active: row.is_active,
            created_at: row.created_at,
            triggered_at: row.triggered_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ListAlertsParams {
    pub email: String,
}

/// `POST /api/v1/alerts` — subscribe to a price drop on a watch group.
pub(super) async fn create_alert(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateAlertRequest>,
) -> Result<Json<ApiResponse<AlertItem>>, ApiError> {
    if !is_plausible_email(&body.email) {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "a valid email address is required",
        ));
    }
    if body.brand.trim().is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "brand is required",
        ));
    }
    if body.threshold_price <= Decimal::ZERO {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "threshold_price must be positive",
        ));
    }

    let group_key = make_group_key(body.brand.trim(), None, body.reference.as_deref());
    let currency = body
        .currency
        .map_or_else(|| "USD".to_string(), |c| c.trim().to_uppercase());

    let row = wmdb_db::create_price_alert(
        &state.pool,
        body.email.trim(),
        body.brand.trim(),
        body.reference.as_deref(),
        &group_key,
        body.threshold_price,
        &currency,
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: row.into(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// `GET /api/v1/alerts?email=` — list a subscriber's alerts.
pub(super) async fn list_alerts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<ListAlertsParams>,
) -> Result<Json<ApiResponse<Vec<AlertItem>>>, ApiError> {
    let rows = wmdb_db::list_alerts_by_email(&state.pool, params.email.trim())
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(AlertItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// `DELETE /api/v1/alerts/{public_id}` — deactivate an alert.
pub(super) async fn delete_alert(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(public_id): Path<Uuid>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    wmdb_db::deactivate_alert(&state.pool, public_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: serde_json::json!({ "deactivated": true }),
        meta: ResponseMeta::new(req_id.0),
    }))
}
