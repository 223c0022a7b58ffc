//! Archive adapter: searches previously-scraped rows in Postgres.
//!
//! Platforms without live API access (Chrono24, WatchBox) are represented
//! by their most recent scrape, refreshed by the collect path.

use sqlx::PgPool;
use wmdb_core::{Listing, PlatformConfig, SearchOptions, SearchQuery};

use crate::AggregatorError;

pub(super) async fn search(
    pool: &PgPool,
    platform: &PlatformConfig,
    query: &SearchQuery,
    options: &SearchOptions,
) -> Result<Vec<Listing>, AggregatorError> {
    let slug = platform.slug();
    let text = super::query_text(query);
    let rows = wmdb_db::search_archive_listings(
        pool,
        &text,
        Some(&slug),
        i64::from(options.normalized_limit()),
    )
    .await?;

    let listings: Vec<Listing> = rows
        .into_iter()
        .map(wmdb_db::ArchiveListingRow::into_listing)
        .collect();

    tracing::debug!(platform = %slug, count = listings.len(), "matched archive rows");
    Ok(listings)
}
