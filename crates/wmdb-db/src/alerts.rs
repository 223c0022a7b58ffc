//! Database operations for `price_alerts` and `alert_events`.
//!
//! Alerts are one-shot: [`trigger_alert`] records the matching listing and
//! deactivates the alert in one transaction. Re-creating the alert is the
//! re-arm path.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `price_alerts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PriceAlertRow {
    pub id: i64,
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

/// A row from the `alert_events` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AlertEventRow {
    pub id: i64,
    pub alert_id: i64,
    pub matched_price: Decimal,
    pub listing_url: String,
    pub platform: String,
    pub created_at: DateTime<Utc>,
}

const ALERT_COLUMNS: &str = "id, public_id, email, brand, reference, group_key, \
     threshold_price, currency, is_active, created_at, triggered_at";

/// Creates an active price alert.
///
/// Generates the public UUID in Rust and returns the full newly-created row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_price_alert(
    pool: &PgPool,
    email: &str,
    brand: &str,
    reference: Option<&str>,
    group_key: &str,
    threshold_price: Decimal,
    currency: &str,
) -> Result<PriceAlertRow, DbError> {
    let public_id = Uuid::new_v4();

    let row = sqlx::query_as::<_, PriceAlertRow>(&format!(
        "INSERT INTO price_alerts \
             (public_id, email, brand, reference, group_key, threshold_price, currency) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING {ALERT_COLUMNS}",
    ))
    .bind(public_id)
    .bind(email.trim().to_lowercase())
    .bind(brand)
    .bind(reference)
    .bind(group_key)
    .bind(threshold_price)
    .bind(currency)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Fetches an alert by its public UUID.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row matches, or [`DbError::Sqlx`] if
/// the query fails.
pub async fn get_alert_by_public_id(
    pool: &PgPool,
    public_id: Uuid,
) -> Result<PriceAlertRow, DbError> {
    let row = sqlx::query_as::<_, PriceAlertRow>(&format!(
        "SELECT {ALERT_COLUMNS} FROM price_alerts WHERE public_id = $1",
    ))
    .bind(public_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Returns all alerts for an email address, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_alerts_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Vec<PriceAlertRow>, DbError> {
    let rows = sqlx::query_as::<_, PriceAlertRow>(&format!(
        "SELECT {ALERT_COLUMNS} \
         FROM price_alerts \
         WHERE email = $1 \
         ORDER BY created_at DESC, id DESC",
    ))
    .bind(email.trim().to_lowercase())
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns every active alert, for the evaluation job.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_active_alerts(pool: &PgPool) -> Result<Vec<PriceAlertRow>, DbError> {
    let rows = sqlx::query_as::<_, PriceAlertRow>(&format!(
        "SELECT {ALERT_COLUMNS} \
         FROM price_alerts \
         WHERE is_active \
         ORDER BY created_at ASC, id ASC",
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Deactivates an alert by its public UUID (user-initiated delete).
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no active row matches, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn deactivate_alert(pool: &PgPool, public_id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE price_alerts SET is_active = false WHERE public_id = $1 AND is_active",
    )
    .bind(public_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

/// Fires an alert: records the matching listing in `alert_events`, stamps
/// `triggered_at`, and deactivates the alert — all in one transaction.
///
/// The guard on `is_active` makes concurrent evaluation runs safe: only one
/// of them gets the row, the other sees zero rows affected and reports
/// [`DbError::NotFound`].
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the alert is not active, or
/// [`DbError::Sqlx`] if any statement fails.
pub async fn trigger_alert(
    pool: &PgPool,
    alert_id: i64,
    matched_price: Decimal,
    listing_url: &str,
    platform: &str,
) -> Result<AlertEventRow, DbError> {
    let mut tx = pool.begin().await?;

    let deactivated = sqlx::query(
        "UPDATE price_alerts \
         SET is_active = false, triggered_at = NOW() \
         WHERE id = $1 AND is_active",
    )
    .bind(alert_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if deactivated == 0 {
        return Err(DbError::NotFound);
    }

    let event = sqlx::query_as::<_, AlertEventRow>(
        "INSERT INTO alert_events (alert_id, matched_price, listing_url, platform) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id, alert_id, matched_price, listing_url, platform, created_at",
    )
    .bind(alert_id)
    .bind(matched_price)
    .bind(listing_url)
    .bind(platform)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(event)
}
