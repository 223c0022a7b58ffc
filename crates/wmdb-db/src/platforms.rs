//! Database operations for the `platforms` registry table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `platforms` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PlatformRow {
    pub id: i64,
    pub name: String,
    pub slug: String,
    /// `"ebay"`, `"archive"`, or `"mock"`.
    pub kind: String,
    pub enabled: bool,
    pub base_url: Option<String>,
    pub affiliate_tag: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Returns every platform row, optionally restricted to enabled ones.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_platforms(pool: &PgPool, enabled_only: bool) -> Result<Vec<PlatformRow>, DbError> {
    let rows = sqlx::query_as::<_, PlatformRow>(
        "SELECT id, name, slug, kind, enabled, base_url, affiliate_tag, notes, \
                created_at, updated_at \
         FROM platforms \
         WHERE NOT $1 OR enabled \
         ORDER BY name ASC",
    )
    .bind(enabled_only)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
