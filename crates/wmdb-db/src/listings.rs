//! Database operations for the `archive_listings` table.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use wmdb_core::{Condition, Listing};

use crate::DbError;

/// A row from the `archive_listings` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ArchiveListingRow {
    pub id: i64,
    pub platform: String,
    pub source_listing_id: String,
    pub brand: String,
    pub model: Option<String>,
    pub reference: Option<String>,
    pub group_key: String,
    pub title: String,
    pub price: Decimal,
    pub currency: String,
    /// Stored as the [`Condition`] display string; `NULL` when unknown.
    pub condition: Option<String>,
    pub year: Option<i32>,
    pub seller: Option<String>,
    pub seller_country: Option<String>,
    pub url: String,
    pub image_url: Option<String>,
    pub listed_at: Option<DateTime<Utc>>,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub is_active: bool,
}

impl ArchiveListingRow {
    /// Converts the row back into the shared [`Listing`] shape.
    #[must_use]
    pub fn into_listing(self) -> Listing {
        Listing {
            source_listing_id: self.source_listing_id,
            platform: self.platform,
            brand: self.brand,
            model: self.model,
            reference: self.reference,
            title: self.title,
            price: self.price,
            currency: self.currency,
            condition: self.condition.as_deref().and_then(Condition::from_label),
            year: self.year,
            seller: self.seller,
            seller_country: self.seller_country,
            url: self.url,
            image_url: self.image_url,
            listed_at: self.listed_at,
        }
    }
}

const SELECT_COLUMNS: &str = "id, platform, source_listing_id, brand, model, reference, \
     group_key, title, price, currency, condition, year, seller, seller_country, \
     url, image_url, listed_at, first_seen_at, last_seen_at, is_active";

/// Outcome of [`upsert_archive_listing`]: the row's internal `id` and
/// whether the statement inserted a fresh row (as opposed to updating an
/// existing one).
#[derive(Debug, Clone, Copy)]
pub struct ListingUpsert {
    pub id: i64,
    pub inserted: bool,
}

/// Upserts a scraped listing into the archive.
///
/// Conflicts on `(platform, source_listing_id)` update the listing fields,
/// bump `last_seen_at`, and re-activate the row. `group_key` is derived in
/// Rust via [`Listing::group_key`] so grouping semantics live in one place.
/// The `xmax = 0` check distinguishes inserts from conflict-updates.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_archive_listing(
    pool: &PgPool,
    listing: &Listing,
) -> Result<ListingUpsert, DbError> {
    let group_key = listing.group_key();
    let condition = listing.condition.map(|c| c.to_string());

    let (id, inserted): (i64, bool) = sqlx::query_as(
        "INSERT INTO archive_listings \
             (platform, source_listing_id, brand, model, reference, group_key, \
              title, price, currency, condition, year, seller, seller_country, \
              url, image_url, listed_at) \
         VALUES ($1, $2, $3, $4, $5, $6, \
                 $7, $8, $9, $10, $11, $12, $13, \
                 $14, $15, $16) \
         ON CONFLICT (platform, source_listing_id) DO UPDATE SET \
             brand          = EXCLUDED.brand, \
             model          = EXCLUDED.model, \
             reference      = EXCLUDED.reference, \
             group_key      = EXCLUDED.group_key, \
             title          = EXCLUDED.title, \
             price          = EXCLUDED.price, \
             currency       = EXCLUDED.currency, \
             condition      = EXCLUDED.condition, \
             year           = EXCLUDED.year, \
             seller         = EXCLUDED.seller, \
             seller_country = EXCLUDED.seller_country, \
             url            = EXCLUDED.url, \
             image_url      = EXCLUDED.image_url, \
             listed_at      = EXCLUDED.listed_at, \
             last_seen_at   = NOW(), \
             is_active      = true \
         RETURNING id, (xmax = 0) AS inserted",
    )
    .bind(&listing.platform)
    .bind(&listing.source_listing_id)
    .bind(&listing.brand)
    .bind(&listing.model)
    .bind(&listing.reference)
    .bind(&group_key)
    .bind(&listing.title)
    .bind(listing.price)
    .bind(&listing.currency)
    .bind(condition)
    .bind(listing.year)
    .bind(&listing.seller)
    .bind(&listing.seller_country)
    .bind(&listing.url)
    .bind(&listing.image_url)
    .bind(listing.listed_at)
    .fetch_one(pool)
    .await?;

    Ok(ListingUpsert { id, inserted })
}

/// Text-searches active archive rows, optionally restricted to one platform.
///
/// Each whitespace-separated token of `text` must `ILIKE`-match somewhere in
/// the title, brand, or reference, so "rolex 116610" finds a row titled
/// "Rolex Submariner Date 116610LN". An empty query matches everything.
/// Results are price-ascending with `id` as a deterministic tie-break.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn search_archive_listings(
    pool: &PgPool,
    text: &str,
    platform: Option<&str>,
    limit: i64,
) -> Result<Vec<ArchiveListingRow>, DbError> {
    let patterns: Vec<String> = text
        .split_whitespace()
        .map(|token| format!("%{token}%"))
        .collect();

    let rows = sqlx::query_as::<_, ArchiveListingRow>(&format!(
        "SELECT {SELECT_COLUMNS} \
         FROM archive_listings \
         WHERE is_active \
           AND (title || ' ' || brand || ' ' || COALESCE(reference, '')) ILIKE ALL($1) \
           AND ($2::text IS NULL OR platform = $2) \
         ORDER BY price ASC, id ASC \
         LIMIT $3",
    ))
    .bind(&patterns)
    .bind(platform)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns all active archive rows sharing one group key, price-ascending.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the key matches no active rows, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_group_listings(
    pool: &PgPool,
    group_key: &str,
) -> Result<Vec<ArchiveListingRow>, DbError> {
    let rows = sqlx::query_as::<_, ArchiveListingRow>(&format!(
        "SELECT {SELECT_COLUMNS} \
         FROM archive_listings \
         WHERE is_active AND group_key = $1 \
         ORDER BY price ASC, id ASC",
    ))
    .bind(group_key)
    .fetch_all(pool)
    .await?;

    if rows.is_empty() {
        return Err(DbError::NotFound);
    }

    Ok(rows)
}
