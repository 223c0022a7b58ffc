//! Database operations for the `seller_applications` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `seller_applications` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SellerApplicationRow {
    pub id: i64,
    pub public_id: Uuid,
    pub company_name: String,
    pub contact_email: String,
    pub website: Option<String>,
    pub inventory_note: Option<String>,
    /// `"pending"`, `"approved"`, or `"rejected"`.
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

/// Creates a seller application in `pending` status.
///
/// Returns the full newly-created row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_seller_application(
    pool: &PgPool,
    company_name: &str,
    contact_email: &str,
    website: Option<&str>,
    inventory_note: Option<&str>,
) -> Result<SellerApplicationRow, DbError> {
    let public_id = Uuid::new_v4();

    let row = sqlx::query_as::<_, SellerApplicationRow>(
        "INSERT INTO seller_applications \
             (public_id, company_name, contact_email, website, inventory_note) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING id, public_id, company_name, contact_email, website, \
                   inventory_note, status, created_at, reviewed_at",
    )
    .bind(public_id)
    .bind(company_name)
    .bind(contact_email.trim().to_lowercase())
    .bind(website)
    .bind(inventory_note)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns applications, newest first, optionally filtered by status.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_seller_applications(
    pool: &PgPool,
    status: Option<&str>,
    limit: i64,
) -> Result<Vec<SellerApplicationRow>, DbError> {
    let rows = sqlx::query_as::<_, SellerApplicationRow>(
        "SELECT id, public_id, company_name, contact_email, website, \
                inventory_note, status, created_at, reviewed_at \
         FROM seller_applications \
         WHERE ($1::text IS NULL OR status = $1) \
         ORDER BY created_at DESC, id DESC \
         LIMIT $2",
    )
    .bind(status)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
