use sqlx::PgPool;
use wmdb_core::PlatformConfig;

use crate::DbError;

/// Upsert platforms from the YAML registry into the database.
///
/// Returns the number of platforms processed (inserted or updated).
/// All upserts run inside a single transaction; if any operation fails
/// the entire batch is rolled back.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_platforms(pool: &PgPool, platforms: &[PlatformConfig]) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;

    for platform in platforms {
        let slug = platform.slug();
        let kind = platform.kind.to_string();

        sqlx::query(
            "INSERT INTO platforms (name, slug, kind, enabled, base_url, affiliate_tag, notes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (slug) DO UPDATE SET \
                 name          = EXCLUDED.name, \
                 kind          = EXCLUDED.kind, \
                 enabled       = EXCLUDED.enabled, \
                 base_url      = EXCLUDED.base_url, \
                 affiliate_tag = EXCLUDED.affiliate_tag, \
                 notes         = EXCLUDED.notes, \
                 updated_at    = NOW()",
        )
        .bind(&platform.name)
        .bind(&slug)
        .bind(&kind)
        .bind(platform.enabled)
        .bind(&platform.base_url)
        .bind(&platform.affiliate_tag)
        .bind(&platform.notes)
        .execute(&mut *tx)
        .await?;

        count += 1;
    }

    tx.commit().await?;
    Ok(count)
}
