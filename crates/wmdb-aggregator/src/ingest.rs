//! Batch ingestion of scraped rows into the archive.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use wmdb_core::{Condition, Listing};

use crate::AggregatorError;

/// A scraped row as submitted by a collector, before validation.
///
/// Everything is defaulted so one malformed row is skipped instead of
/// failing the whole batch at the deserialization boundary.
#[derive(Debug, Clone, Deserialize)]
pub struct RawListing {
    #[serde(default)]
    pub source_listing_id: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub title: String,
    /// Decimal string, e.g. `"10500.00"`.
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub seller: Option<String>,
    #[serde(default)]
    pub seller_country: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub listed_at: Option<DateTime<Utc>>,
}

/// Counts from one ingestion batch.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct IngestSummary {
    pub inserted: usize,
    pub updated: usize,
    /// Rows rejected by validation (missing id/title/url, bad price).
    pub skipped: usize,
    /// Price points recorded because the asking price changed.
    pub price_points: usize,
}

/// Normalizes and upserts a batch of scraped rows for one platform.
///
/// Rows failing validation are counted as skipped and logged at debug;
/// valid rows upsert keyed on `(platform, source_listing_id)`, and a price
/// point is recorded whenever the stored price actually changed.
///
/// # Errors
///
/// Returns [`AggregatorError::Db`] if a database operation fails. Row
/// validation never errors; it only skips.
pub async fn ingest_listings(
    pool: &PgPool,
    platform: &str,
    rows: Vec<RawListing>,
) -> Result<IngestSummary, AggregatorError> {
    let mut summary = IngestSummary::default();

    for raw in rows {
        let Some(listing) = normalize(platform, raw) else {
            summary.skipped += 1;
            continue;
        };

        let upsert = wmdb_db::upsert_archive_listing(pool, &listing).await?;
        if upsert.inserted {
            summary.inserted += 1;
        } else {
            summary.updated += 1;
        }

        let recorded = wmdb_db::insert_price_point_if_changed(
            pool,
            upsert.id,
            listing.price,
            &listing.currency,
        )
        .await?;
        if recorded {
            summary.price_points += 1;
        }
    }

    tracing::info!(
        platform,
        inserted = summary.inserted,
        updated = summary.updated,
        skipped = summary.skipped,
        price_points = summary.price_points,
        "ingested listing batch"
    );
    Ok(summary)
}

/// Validates and trims a raw row into a [`Listing`], or `None` if it fails
/// the floor requirements: a source ID, a title, a URL, and a positive
/// price.
fn normalize(platform: &str, raw: RawListing) -> Option<Listing> {
    let source_listing_id = raw.source_listing_id.trim().to_string();
    let title = raw.title.trim().to_string();
    let url = raw.url.trim().to_string();

    if source_listing_id.is_empty() || title.is_empty() || url.is_empty() {
        tracing::debug!(platform, "skipping row missing id, title, or url");
        return None;
    }

    let price = match raw.price {
        Some(price) if price > Decimal::ZERO => price,
        _ => {
            tracing::debug!(platform, source_listing_id, "skipping row without positive price");
            return None;
        }
    };

    let brand = raw.brand.trim().to_string();
    Some(Listing {
        source_listing_id,
        platform: platform.to_string(),
        brand: if brand.is_empty() {
            "Unknown".to_string()
        } else {
            brand
        },
        model: trimmed_opt(raw.model),
        reference: trimmed_opt(raw.reference),
        title,
        price,
        currency: raw
            .currency
            .map_or_else(|| "USD".to_string(), |c| c.trim().to_uppercase()),
        condition: raw.condition.as_deref().and_then(Condition::from_label),
        year: raw.year,
        seller: trimmed_opt(raw.seller),
        seller_country: trimmed_opt(raw.seller_country),
        url,
        image_url: trimmed_opt(raw.image_url),
        listed_at: raw.listed_at,
    })
}

fn trimmed_opt(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(json: &str) -> RawListing {
        serde_json::from_str(json).expect("fixture row should parse")
    }

    #[test]
    fn normalize_trims_and_maps_condition() {
        let row = raw(
            r#"{
                "source_listing_id": " C24-1 ",
                "brand": " Rolex ",
                "reference": "116610LN",
                "title": "  Rolex Submariner Date 116610LN  ",
                "price": "10500.00",
                "currency": "usd",
                "condition": "Very good",
                "url": " https://chrono24.example.com/1 "
            }"#,
        );

        let listing = normalize("chrono24", row).expect("row should normalize");
        assert_eq!(listing.source_listing_id, "C24-1");
        assert_eq!(listing.brand, "Rolex");
        assert_eq!(listing.currency, "USD");
        assert_eq!(listing.condition, Some(Condition::VeryGood));
        assert_eq!(listing.group_key(), "rolex:116610LN");
    }

    #[test]
    fn normalize_rejects_missing_required_fields() {
        let no_title = raw(r#"{"source_listing_id":"1","price":"100","url":"https://x.example"}"#);
        assert!(normalize("chrono24", no_title).is_none());

        let no_url = raw(r#"{"source_listing_id":"1","title":"Watch","price":"100"}"#);
        assert!(normalize("chrono24", no_url).is_none());

        let no_id = raw(r#"{"title":"Watch","price":"100","url":"https://x.example"}"#);
        assert!(normalize("chrono24", no_id).is_none());
    }

    #[test]
    fn normalize_rejects_non_positive_prices() {
        let zero = raw(
            r#"{"source_listing_id":"1","title":"Watch","price":"0","url":"https://x.example"}"#,
        );
        assert!(normalize("chrono24", zero).is_none());

        let missing =
            raw(r#"{"source_listing_id":"1","title":"Watch","url":"https://x.example"}"#);
        assert!(normalize("chrono24", missing).is_none());
    }

    #[test]
    fn normalize_defaults_blank_brand_and_currency() {
        let row = raw(
            r#"{"source_listing_id":"1","title":"Mystery watch","price":"250","url":"https://x.example"}"#,
        );
        let listing = normalize("chrono24", row).expect("row should normalize");
        assert_eq!(listing.brand, "Unknown");
        assert_eq!(listing.currency, "USD");
        assert_eq!(listing.group_key(), "unknown:unspecified");
    }
}
