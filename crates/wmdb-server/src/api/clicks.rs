use axum::{extract::State, Extension, Json};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct ClickRequest {
    pub platform: String,
    #[serde(default)]
    pub group_key: Option<String>,
    pub listing_url: String,
    #[serde(default)]
    pub referrer: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct ClickResponse {
    /// Where the client should send the user: the listing URL with the
    /// platform's affiliate tag applied when one is configured.
    pub target_url: String,
}

/// `POST /api/v1/clicks` — record an outbound click and hand back the
/// destination URL. The redirect itself is the frontend's job.
pub(super) async fn record_click(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<ClickRequest>,
) -> Result<Json<ApiResponse<ClickResponse>>, ApiError> {
    let listing_url = body.listing_url.trim().to_string();
    if listing_url.is_empty() || body.platform.trim().is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "platform and listing_url are required",
        ));
    }

    let affiliate_tag = state
        .registry
        .platforms
        .iter()
        .find(|p| p.slug() == body.platform)
        .and_then(|p| p.affiliate_tag.clone());
    let target_url = apply_affiliate_tag(&listing_url, affiliate_tag.as_deref());

    let event = wmdb_db::NewClickEvent {
        platform: body.platform,
        group_key: body.group_key,
        listing_url,
        target_url: target_url.clone(),
        referrer: body.referrer,
        request_id: Some(req_id.0.clone()),
    };
    wmdb_db::insert_click_event(&state.pool, &event)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: ClickResponse { target_url },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Characters that cannot appear raw in a query value.
const QUERY_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'#')
    .add(b'&')
    .add(b'=')
    .add(b'?')
    .add(b'+')
    .add(b'%');

/// Appends the platform's affiliate campaign tag as a `campid` query
/// parameter. URLs that already carry one are left alone. Tags come from
/// the registry file, so encode rather than trust them.
fn apply_affiliate_tag(url: &str, tag: Option<&str>) -> String {
    let Some(tag) = tag else {
        return url.to_string();
    };
    if url.contains("campid=") {
        return url.to_string();
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    let encoded = utf8_percent_encode(tag, QUERY_VALUE);
    format!("{url}{separator}campid={encoded}")
}
