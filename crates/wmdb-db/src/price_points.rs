//! Database operations for the `listing_price_points` table.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `listing_price_points` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PricePointRow {
    pub id: i64,
    pub listing_id: i64,
    pub captured_at: DateTime<Utc>,
    pub currency: String,
    pub price: Decimal,
}

/// Returns the most recent price point for an archive listing, if one exists.
///
/// Ordered by `captured_at DESC, id DESC` so that the first row is always the
/// latest, even when multiple points share the same timestamp.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_last_price_point(
    pool: &PgPool,
    listing_id: i64,
) -> Result<Option<PricePointRow>, DbError> {
    let row = sqlx::query_as::<_, PricePointRow>(
        "SELECT id, listing_id, captured_at, currency, price \
         FROM listing_price_points \
         WHERE listing_id = $1 \
         ORDER BY captured_at DESC, id DESC \
         LIMIT 1",
    )
    .bind(listing_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Inserts a new price point only if the price differs from the last one.
///
/// Uses an atomic CTE to SELECT the last point and conditionally INSERT in a
/// single round-trip, so a concurrent ingest cannot slip a duplicate between
/// the check and the insert.
///
/// Returns `true` if a new point was inserted, `false` if the price was
/// unchanged.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the database operation fails.
pub async fn insert_price_point_if_changed(
    pool: &PgPool,
    listing_id: i64,
    price: Decimal,
    currency: &str,
) -> Result<bool, DbError> {
    let rows_affected = sqlx::query(
        "WITH last AS ( \
             SELECT price, currency \
             FROM listing_price_points \
             WHERE listing_id = $1 \
             ORDER BY captured_at DESC, id DESC \
             LIMIT 1 \
         ) \
         INSERT INTO listing_price_points (listing_id, captured_at, currency, price) \
         SELECT $1, NOW(), $2, $3 \
         WHERE NOT EXISTS ( \
             SELECT 1 FROM last \
             WHERE last.price = $3 \
               AND last.currency = $2 \
         )",
    )
    .bind(listing_id)
    .bind(currency)
    .bind(price)
    .execute(pool)
    .await?
    .rows_affected();

    Ok(rows_affected > 0)
}
