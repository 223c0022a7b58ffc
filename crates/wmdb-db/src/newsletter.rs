//! Database operations for the `newsletter_subscribers` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `newsletter_subscribers` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SubscriberRow {
    pub id: i64,
    pub email: String,
    /// `"subscribed"` or `"unsubscribed"`.
    pub status: String,
    pub source: Option<String>,
    pub subscribed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Subscribes an email address. Idempotent: re-subscribing an existing
/// address (including a previously unsubscribed one) flips it back to
/// `subscribed` rather than failing on the unique constraint.
///
/// Emails are stored lowercased so `A@example.com` and `a@example.com`
/// are one subscriber.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn subscribe(
    pool: &PgPool,
    email: &str,
    source: Option<&str>,
) -> Result<SubscriberRow, DbError> {
    let email = email.trim().to_lowercase();

    let row = sqlx::query_as::<_, SubscriberRow>(
        "INSERT INTO newsletter_subscribers (email, status, source) \
         VALUES ($1, 'subscribed', $2) \
         ON CONFLICT (email) DO UPDATE SET \
             status     = 'subscribed', \
             source     = COALESCE(EXCLUDED.source, newsletter_subscribers.source), \
             updated_at = NOW() \
         RETURNING id, email, status, source, subscribed_at, updated_at",
    )
    .bind(&email)
    .bind(source)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Marks an email address unsubscribed.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the address was never subscribed, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn unsubscribe(pool: &PgPool, email: &str) -> Result<(), DbError> {
    let email = email.trim().to_lowercase();

    let result = sqlx::query(
        "UPDATE newsletter_subscribers \
         SET status = 'unsubscribed', updated_at = NOW() \
         WHERE email = $1",
    )
    .bind(&email)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

/// Fetches a subscriber by email.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists for the address, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_subscriber(pool: &PgPool, email: &str) -> Result<SubscriberRow, DbError> {
    let email = email.trim().to_lowercase();

    let row = sqlx::query_as::<_, SubscriberRow>(
        "SELECT id, email, status, source, subscribed_at, updated_at \
         FROM newsletter_subscribers \
         WHERE email = $1",
    )
    .bind(&email)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}
