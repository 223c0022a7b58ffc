//! Database operations for the `click_events` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// Fields for a new click event, before the database assigns `id` and
/// `occurred_at`.
#[derive(Debug, Clone)]
pub struct NewClickEvent {
    pub platform: String,
    pub group_key: Option<String>,
    pub listing_url: String,
    pub target_url: String,
    pub referrer: Option<String>,
    pub request_id: Option<String>,
}

/// A row from the `click_events` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClickEventRow {
    pub id: i64,
    pub platform: String,
    pub group_key: Option<String>,
    pub listing_url: String,
    pub target_url: String,
    pub referrer: Option<String>,
    pub request_id: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Records an outbound click.
///
/// Returns the internal `id` of the new row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_click_event(pool: &PgPool, event: &NewClickEvent) -> Result<i64, DbError> {
    let id: i64 = sqlx::query_scalar::<_, i64>(
        "INSERT INTO click_events \
             (platform, group_key, listing_url, target_url, referrer, request_id) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING id",
    )
    .bind(&event.platform)
    .bind(&event.group_key)
    .bind(&event.listing_url)
    .bind(&event.target_url)
    .bind(&event.referrer)
    .bind(&event.request_id)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Returns the most recent `limit` click events, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_recent_clicks(pool: &PgPool, limit: i64) -> Result<Vec<ClickEventRow>, DbError> {
    let rows = sqlx::query_as::<_, ClickEventRow>(
        "SELECT id, platform, group_key, listing_url, target_url, referrer, \
                request_id, occurred_at \
         FROM click_events \
         ORDER BY occurred_at DESC, id DESC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
