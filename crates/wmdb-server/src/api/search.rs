use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use wmdb_aggregator::{group_listings, search_all_platforms, SearchOutcome};
use wmdb_core::{Condition, Listing, SearchOptions, SearchQuery, WatchGroup};

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct SearchParams {
    pub q: Option<String>,
    pub brand: Option<String>,
    pub reference: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    /// Condition floor as its snake_case name, e.g. `very_good`.
    pub condition: Option<String>,
    /// Comma-separated platform slugs.
    pub platforms: Option<String>,
    pub limit: Option<u32>,
}

impl SearchParams {
    fn into_query(self) -> (SearchQuery, SearchOptions) {
        let query = SearchQuery {
            text: self.q.unwrap_or_default(),
            brand: self.brand,
            reference: self.reference,
        };

        let min_condition = self
            .condition
            .as_deref()
            .and_then(|c| Condition::from_label(&c.replace('_', " ")));
        let platforms = self.platforms.map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToOwned::to_owned)
                .collect::<Vec<_>>()
        });

        let options = SearchOptions {
            min_price: self.min_price,
            max_price: self.max_price,
            min_condition,
            platforms,
            limit_per_platform: self.limit.unwrap_or(50),
        };
        (query, options)
    }
}

/// `GET /api/v1/search` — fan out to every enabled platform and return
/// grouped results plus per-source failure summaries.
pub(super) async fn search(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<SearchParams>,
) -> Json<ApiResponse<SearchOutcome>> {
    let (query, options) = params.into_query();
    let outcome = search_all_platforms(&state.deps, &state.registry, &query, &options).await;

    Json(ApiResponse {
        data: outcome,
        meta: ResponseMeta::new(req_id.0),
    })
}

/// `GET /api/v1/listings` — the same search, flattened into one
/// price-ascending list for comparison-table consumers.
pub(super) async fn list_listings(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<SearchParams>,
) -> Json<ApiResponse<Vec<Listing>>> {
    let (query, options) = params.into_query();
    let outcome = search_all_platforms(&state.deps, &state.registry, &query, &options).await;

    let mut listings: Vec<Listing> = outcome
        .groups
        .into_iter()
        .flat_map(|group| group.listings)
        .collect();
    listings.sort_by(|a, b| {
        a.price
            .cmp(&b.price)
            .then_with(|| a.platform.cmp(&b.platform))
            .then_with(|| a.source_listing_id.cmp(&b.source_listing_id))
    });

    Json(ApiResponse {
        data: listings,
        meta: ResponseMeta::new(req_id.0),
    })
}

/// Group payload for the detail endpoint: the group plus its stable
/// hash-derived identifier, for consumers that bookmark or link groups.
#[derive(Debug, Serialize)]
pub(super) struct GroupDetail {
    pub public_id: String,
    #[serde(flatten)]
    pub group: WatchGroup,
}

/// `GET /api/v1/groups/{key}` — single group detail built from the archive.
pub(super) async fn get_group(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(key): Path<String>,
) -> Result<Json<ApiResponse<GroupDetail>>, ApiError> {
    let rows = wmdb_db::get_group_listings(&state.pool, &key)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let listings: Vec<Listing> = rows
        .into_iter()
        .map(wmdb_db::ArchiveListingRow::into_listing)
        .collect();

    // Rows are price-ascending and share one key, so this yields one group.
    let group = group_listings(listings)
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", "resource not found"))?;

    Ok(Json(ApiResponse {
        data: GroupDetail {
            public_id: group.public_id(),
            group,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
