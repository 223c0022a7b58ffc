//! Periodic price-alert evaluation.

use std::sync::Arc;

use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use wmdb_db::DbError;

/// Register the hourly alert evaluation job (`0 15 * * * *`, quarter past
/// every hour, offset from the nightly refresh).
pub(super) async fn register_alert_job(
    scheduler: &JobScheduler,
    pool: PgPool,
) -> Result<(), JobSchedulerError> {
    let pool = Arc::new(pool);

    let job = Job::new_async("0 15 * * * *", move |_uuid, _lock| {
        let pool = Arc::clone(&pool);

        Box::pin(async move {
            match evaluate_price_alerts(&pool).await {
                Ok(triggered) if triggered > 0 => {
                    tracing::info!(triggered, "scheduler: price alerts fired");
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(error = %e, "scheduler: alert evaluation failed");
                }
            }
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

/// Compares each active alert's threshold against the current lowest
/// archive price for its group and fires the ones that match.
///
/// Alerts are one-shot: triggering deactivates them, and the `is_active`
/// guard inside [`wmdb_db::trigger_alert`] makes overlapping evaluation
/// runs safe. Returns the number of alerts fired.
///
/// # Errors
///
/// Returns [`DbError`] only for listing-active-alerts failures; a problem
/// evaluating one alert is logged and skipped.
pub(super) async fn evaluate_price_alerts(pool: &PgPool) -> Result<usize, DbError> {
    let alerts = wmdb_db::list_active_alerts(pool).await?;
    let mut triggered = 0usize;

    for alert in alerts {
        let rows = match wmdb_db::get_group_listings(pool, &alert.group_key).await {
            Ok(rows) => rows,
            Err(DbError::NotFound) => continue,
            Err(e) => {
                tracing::warn!(
                    group_key = %alert.group_key,
                    error = %e,
                    "alert evaluation: group lookup failed"
                );
                continue;
            }
        };

        // Rows are price-ascending; the head is the best current offer.
        let Some(best) = rows.first() else {
            continue;
        };
        if best.price > alert.threshold_price {
            continue;
        }

        match wmdb_db::trigger_alert(pool, alert.id, best.price, &best.url, &best.platform).await {
            Ok(_) => {
                tracing::info!(
                    email = %alert.email,
                    group_key = %alert.group_key,
                    price = %best.price,
                    threshold = %alert.threshold_price,
                    "price alert triggered"
                );
                triggered += 1;
            }
            Err(DbError::NotFound) => {
                // Another evaluation run got there first.
            }
            Err(e) => {
                tracing::warn!(alert_id = alert.id, error = %e, "failed to trigger alert");
            }
        }
    }

    Ok(triggered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use wmdb_core::{Condition, Listing};

    fn archive_listing(id: &str, price: i64) -> Listing {
        Listing {
            source_listing_id: id.to_string(),
            platform: "chrono24".to_string(),
            brand: "Rolex".to_string(),
            model: Some("Submariner".to_string()),
            reference: Some("116610LN".to_string()),
            title: "Rolex Submariner Date 116610LN".to_string(),
            price: Decimal::new(price, 0),
            currency: "USD".to_string(),
            condition: Some(Condition::Excellent),
            year: Some(2018),
            seller: None,
            seller_country: None,
            url: format!("https://chrono24.example.com/{id}"),
            image_url: None,
            listed_at: None,
        }
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn alert_fires_when_price_reaches_threshold(pool: sqlx::PgPool) {
        wmdb_db::upsert_archive_listing(&pool, &archive_listing("C24-1", 8_750))
            .await
            .expect("upsert failed");
        let alert = wmdb_db::create_price_alert(
            &pool,
            "collector@example.com",
            "Rolex",
            Some("116610LN"),
            "rolex:116610LN",
            Decimal::new(9_000, 0),
            "USD",
        )
        .await
        .expect("create alert failed");

        let fired = evaluate_price_alerts(&pool).await.expect("evaluation failed");
        assert_eq!(fired, 1);

        let row = wmdb_db::get_alert_by_public_id(&pool, alert.public_id)
            .await
            .expect("fetch failed");
        assert!(!row.is_active);

        // A second pass finds nothing active.
        let fired = evaluate_price_alerts(&pool).await.expect("evaluation failed");
        assert_eq!(fired, 0);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn alert_holds_while_price_is_above_threshold(pool: sqlx::PgPool) {
        wmdb_db::upsert_archive_listing(&pool, &archive_listing("C24-1", 10_500))
            .await
            .expect("upsert failed");
        let alert = wmdb_db::create_price_alert(
            &pool,
            "collector@example.com",
            "Rolex",
            Some("116610LN"),
            "rolex:116610LN",
            Decimal::new(9_000, 0),
            "USD",
        )
        .await
        .expect("create alert failed");

        let fired = evaluate_price_alerts(&pool).await.expect("evaluation failed");
        assert_eq!(fired, 0);

        let row = wmdb_db::get_alert_by_public_id(&pool, alert.public_id)
            .await
            .expect("fetch failed");
        assert!(row.is_active, "alert must stay armed above threshold");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn alert_with_no_archive_coverage_is_skipped(pool: sqlx::PgPool) {
        wmdb_db::create_price_alert(
            &pool,
            "collector@example.com",
            "Patek Philippe",
            Some("5711/1A"),
            "patek-philippe:57111A",
            Decimal::new(80_000, 0),
            "USD",
        )
        .await
        .expect("create alert failed");

        let fired = evaluate_price_alerts(&pool).await.expect("evaluation failed");
        assert_eq!(fired, 0);
    }
}
