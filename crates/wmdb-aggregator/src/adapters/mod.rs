//! Per-source search adapters.
//!
//! One module per source kind, uniform signature, dispatched on
//! [`PlatformKind`]. Adapters return normalized [`Listing`]s; filtering,
//! sorting, and grouping happen in the search pipeline afterward.

mod archive;
mod ebay;
pub(crate) mod extract;
mod mock;

use wmdb_core::{Listing, PlatformConfig, PlatformKind, SearchOptions, SearchQuery};

use crate::AggregatorError;

/// Shared handles the adapters need: the archive pool, an optional live
/// eBay client (absent when credentials are not configured), and the
/// fan-out concurrency bound.
#[derive(Clone)]
pub struct SearchDeps {
    pub pool: sqlx::PgPool,
    pub ebay: Option<std::sync::Arc<wmdb_ebay::EbayClient>>,
    pub search_max_concurrency: usize,
}

/// Runs a search against a single platform, dispatching on its kind.
///
/// # Errors
///
/// Returns [`AggregatorError::EbayUnavailable`] for an eBay-kind platform
/// with no configured client, or the adapter's underlying error.
pub async fn search_platform(
    deps: &SearchDeps,
    platform: &PlatformConfig,
    query: &SearchQuery,
    options: &SearchOptions,
) -> Result<Vec<Listing>, AggregatorError> {
    match platform.kind {
        PlatformKind::Ebay => ebay::search(deps, platform, query, options).await,
        PlatformKind::Archive => archive::search(&deps.pool, platform, query, options).await,
        PlatformKind::Mock => Ok(mock::search(platform, query, options)),
    }
}

/// Free-text form of a query for sources that only take a text box: the
/// raw text when present, otherwise brand and reference joined.
pub(crate) fn query_text(query: &SearchQuery) -> String {
    let trimmed = query.text.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    let mut parts: Vec<&str> = Vec::new();
    if let Some(brand) = query.brand.as_deref() {
        parts.push(brand);
    }
    if let Some(reference) = query.reference.as_deref() {
        parts.push(reference);
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_text_prefers_raw_text() {
        let mut query = SearchQuery::from_text("rolex submariner under 10k");
        query.brand = Some("Rolex".to_string());
        assert_eq!(query_text(&query), "rolex submariner under 10k");
    }

    #[test]
    fn query_text_falls_back_to_structured_parts() {
        let mut query = SearchQuery::from_text("  ");
        query.brand = Some("Omega".to_string());
        query.reference = Some("311.30.42.30.01.005".to_string());
        assert_eq!(query_text(&query), "Omega 311.30.42.30.01.005");
    }
}
