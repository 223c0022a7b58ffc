//! Collection: pulling a platform's current inventory into the archive.
//!
//! Used by the CLI `collect` command and the nightly refresh job. Archive
//! platforms are skipped here since they are fed externally through the
//! ingest endpoint; collecting them into themselves would be a no-op.

use std::collections::HashSet;

use serde::Serialize;
use wmdb_core::{Listing, PlatformConfig, PlatformKind, SearchOptions, SearchQuery};

use crate::adapters::{search_platform, SearchDeps};
use crate::AggregatorError;

/// Brand queries used to walk a live marketplace that has no "give me
/// everything" endpoint.
const SEED_QUERIES: &[&str] = &["Rolex", "Omega", "Tudor", "Cartier", "Seiko", "Breitling"];

/// Counts from collecting one platform.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CollectStats {
    pub fetched: usize,
    pub inserted: usize,
    pub updated: usize,
    pub price_points: usize,
}

impl CollectStats {
    #[must_use]
    pub fn records(&self) -> usize {
        self.inserted + self.updated
    }
}

/// Fetches a platform's inventory and upserts it into the archive,
/// recording price points on change.
///
/// Mock platforms yield their whole catalog from an empty query; eBay is
/// walked with brand seed queries and deduped by URL. Archive platforms
/// return zero stats.
///
/// # Errors
///
/// Returns the adapter or database error. Per-platform failure handling
/// (run bookkeeping, continue-past-failure) is the caller's concern.
pub async fn collect_platform(
    deps: &SearchDeps,
    platform: &PlatformConfig,
) -> Result<CollectStats, AggregatorError> {
    let slug = platform.slug();
    let listings = match platform.kind {
        PlatformKind::Archive => {
            tracing::debug!(platform = %slug, "archive platform is fed via ingest; skipping");
            return Ok(CollectStats::default());
        }
        PlatformKind::Mock => {
            let query = SearchQuery::from_text("");
            search_platform(deps, platform, &query, &catalog_options()).await?
        }
        PlatformKind::Ebay => fetch_ebay_inventory(deps, platform).await?,
    };

    let mut stats = CollectStats {
        fetched: listings.len(),
        ..CollectStats::default()
    };

    for listing in &listings {
        let upsert = wmdb_db::upsert_archive_listing(&deps.pool, listing).await?;
        if upsert.inserted {
            stats.inserted += 1;
        } else {
            stats.updated += 1;
        }
        if wmdb_db::insert_price_point_if_changed(
            &deps.pool,
            upsert.id,
            listing.price,
            &listing.currency,
        )
        .await?
        {
            stats.price_points += 1;
        }
    }

    tracing::info!(
        platform = %slug,
        fetched = stats.fetched,
        inserted = stats.inserted,
        updated = stats.updated,
        price_points = stats.price_points,
        "collected platform inventory"
    );
    Ok(stats)
}

async fn fetch_ebay_inventory(
    deps: &SearchDeps,
    platform: &PlatformConfig,
) -> Result<Vec<Listing>, AggregatorError> {
    let options = catalog_options();
    let mut seen: HashSet<String> = HashSet::new();
    let mut listings: Vec<Listing> = Vec::new();

    for seed in SEED_QUERIES {
        let query = SearchQuery::from_text(*seed);
        let batch = search_platform(deps, platform, &query, &options).await?;
        for listing in batch {
            if seen.insert(listing.url.clone()) {
                listings.push(listing);
            }
        }
    }

    Ok(listings)
}

fn catalog_options() -> SearchOptions {
    SearchOptions {
        limit_per_platform: 200,
        ..SearchOptions::default()
    }
}
