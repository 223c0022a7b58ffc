//! Cross-marketplace search fan-out, grouping, and archive ingestion.
//!
//! This crate is the seam between the per-source adapters (live eBay,
//! scraped archive rows, mock fixtures) and everything that consumes
//! normalized results: the HTTP API, the CLI, and the scheduler. The two
//! entry points are [`search_all_platforms`] and [`ingest_listings`].

mod adapters;
mod collect;
mod ingest;
mod search;

pub use adapters::{search_platform, SearchDeps};
pub use collect::{collect_platform, CollectStats};
pub use ingest::{ingest_listings, IngestSummary, RawListing};
pub use search::{group_listings, search_all_platforms, PlatformFailure, SearchOutcome};

use thiserror::Error;

/// Errors surfaced by a single source adapter.
///
/// [`search_all_platforms`] never propagates these; it converts them into
/// [`PlatformFailure`] entries so one bad source cannot fail a search.
#[derive(Debug, Error)]
pub enum AggregatorError {
    #[error("ebay source error: {0}")]
    Ebay(#[from] wmdb_ebay::EbayError),

    #[error("database error: {0}")]
    Db(#[from] wmdb_db::DbError),

    /// The registry lists an eBay-kind platform but no client was built
    /// (credentials not configured).
    #[error("platform '{0}' requires eBay API credentials")]
    EbayUnavailable(String),
}
