//! `collect` command: walk every enabled platform and upsert its current
//! inventory into the archive, with ingestion-run bookkeeping.
//!
//! Per-platform failures are recorded and skipped rather than propagated;
//! the run only fails outright when every platform fails.

use futures::stream::{self, StreamExt};
use wmdb_aggregator::{collect_platform, CollectStats, SearchDeps};
use wmdb_core::{PlatformConfig, PlatformsFile};

use crate::fail_run_best_effort;

/// Resolve the platforms a collect run should cover.
///
/// With a filter, the slug must name an enabled registry entry; without
/// one, all enabled platforms are returned.
fn select_platforms<'a>(
    registry: &'a PlatformsFile,
    platform_filter: Option<&str>,
) -> anyhow::Result<Vec<&'a PlatformConfig>> {
    match platform_filter {
        Some(slug) => {
            let restrict = vec![slug.to_string()];
            let selected = registry.enabled(Some(&restrict));
            if selected.is_empty() {
                anyhow::bail!(
                    "platform '{slug}' is not an enabled registry entry; check config/platforms.yaml"
                );
            }
            Ok(selected)
        }
        None => Ok(registry.enabled(None)),
    }
}

/// Collect inventory across platforms with bounded concurrency, recording
/// per-platform outcomes on the ingestion run.
///
/// # Errors
///
/// Returns an error if the platform filter resolves to nothing, the run
/// cannot be created or finalized, or every platform fails.
pub(crate) async fn run_collect(
    deps: &SearchDeps,
    registry: &PlatformsFile,
    platform_filter: Option<&str>,
    max_concurrent: usize,
) -> anyhow::Result<()> {
    let platforms = select_platforms(registry, platform_filter)?;
    if platforms.is_empty() {
        println!("no enabled platforms found; skipping run creation");
        return Ok(());
    }
    let platform_count = platforms.len();

    let run = wmdb_db::create_ingestion_run(&deps.pool, "collect", "cli").await?;
    if let Err(e) = wmdb_db::start_ingestion_run(&deps.pool, run.id).await {
        fail_run_best_effort(&deps.pool, run.id, format!("{e:#}")).await;
        return Err(e.into());
    }

    let results: Vec<(String, Result<CollectStats, wmdb_aggregator::AggregatorError>)> =
        stream::iter(platforms)
            .map(|platform| async move {
                let slug = platform.slug();
                let result = collect_platform(deps, platform).await;
                (slug, result)
            })
            .buffer_unordered(max_concurrent.max(1))
            .collect()
            .await;

    let mut total_records: i32 = 0;
    let mut total_price_points: usize = 0;
    let mut failed_platforms: usize = 0;

    for (slug, result) in &results {
        match result {
            Ok(stats) => {
                let records = i32::try_from(stats.records()).unwrap_or(i32::MAX);
                total_records = total_records.saturating_add(records);
                total_price_points += stats.price_points;
                record_platform_outcome(deps, run.id, slug, "succeeded", Some(records), None)
                    .await;
            }
            Err(e) => {
                tracing::error!(platform = %slug, error = %e, "platform collection failed");
                failed_platforms += 1;
                record_platform_outcome(
                    deps,
                    run.id,
                    slug,
                    "failed",
                    None,
                    Some(&e.to_string()),
                )
                .await;
            }
        }
    }

    if failed_platforms > 0 {
        tracing::warn!(
            failed_platforms,
            total_platforms = platform_count,
            "some platforms failed during collection"
        );
    }

    if failed_platforms == platform_count {
        let message = format!("all {failed_platforms} platforms failed collection");
        fail_run_best_effort(&deps.pool, run.id, message.clone()).await;
        anyhow::bail!("{message}");
    }

    if let Err(err) = wmdb_db::complete_ingestion_run(&deps.pool, run.id, total_records).await {
        let message = format!("{err:#}");
        fail_run_best_effort(&deps.pool, run.id, message).await;
        return Err(err.into());
    }

    println!(
        "collected {total_records} listings ({total_price_points} price points) across {platform_count} platforms"
    );
    Ok(())
}

async fn record_platform_outcome(
    deps: &SearchDeps,
    run_id: i64,
    platform: &str,
    status: &str,
    records: Option<i32>,
    error_message: Option<&str>,
) {
    if let Err(e) = wmdb_db::upsert_ingestion_run_platform(
        &deps.pool,
        run_id,
        platform,
        status,
        records,
        error_message,
    )
    .await
    {
        tracing::warn!(platform, error = %e, "failed to record platform outcome");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_registry() -> PlatformsFile {
        serde_yaml::from_str(
            r"
platforms:
  - name: Bobs Watches
    kind: mock
    enabled: true
    base_url: https://www.bobswatches.com
    affiliate_tag: null
    notes: null
  - name: Crown and Caliber
    kind: mock
    enabled: true
    base_url: https://www.crownandcaliber.com
    affiliate_tag: null
    notes: null
",
        )
        .expect("registry yaml must parse")
    }

    fn ebay_only_registry() -> PlatformsFile {
        serde_yaml::from_str(
            r"
platforms:
  - name: eBay
    kind: ebay
    enabled: true
    base_url: https://www.ebay.com
    affiliate_tag: null
    notes: null
",
        )
        .expect("registry yaml must parse")
    }

    fn deps_for(pool: sqlx::PgPool) -> SearchDeps {
        SearchDeps {
            pool,
            ebay: None,
            search_max_concurrency: 2,
        }
    }

    #[test]
    fn select_platforms_rejects_unknown_slug() {
        let registry = mock_registry();
        let err = select_platforms(&registry, Some("watchfinder")).unwrap_err();
        assert!(err.to_string().contains("watchfinder"));
    }

    #[test]
    fn select_platforms_restricts_to_requested_slug() {
        let registry = mock_registry();
        let selected =
            select_platforms(&registry, Some("bobs-watches")).expect("selection failed");
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].slug(), "bobs-watches");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn collect_run_succeeds_over_mock_platforms(pool: sqlx::PgPool) {
        let deps = deps_for(pool.clone());
        let registry = mock_registry();

        run_collect(&deps, &registry, None, 2)
            .await
            .expect("collect run failed");

        let runs = wmdb_db::list_ingestion_runs(&pool, 10)
            .await
            .expect("listing runs failed");
        assert_eq!(runs.len(), 1);
        let run = &runs[0];
        assert_eq!(run.status, "succeeded");
        assert_eq!(run.run_type, "collect");
        assert_eq!(run.trigger_source, "cli");
        assert!(run.records_processed > 0, "mock fixtures must be persisted");

        let outcomes = wmdb_db::list_ingestion_run_platforms(&pool, run.id)
            .await
            .expect("listing platform outcomes failed");
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.status == "succeeded"));

        // A second run over unchanged fixtures is idempotent.
        run_collect(&deps, &registry, None, 2)
            .await
            .expect("second collect run failed");
        let rows = wmdb_db::search_archive_listings(&pool, "Rolex", None, 50)
            .await
            .expect("archive search failed");
        assert!(!rows.is_empty(), "collected fixtures must be searchable");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn collect_run_restricted_to_one_platform(pool: sqlx::PgPool) {
        let deps = deps_for(pool.clone());
        let registry = mock_registry();

        run_collect(&deps, &registry, Some("crown-and-caliber"), 2)
            .await
            .expect("collect run failed");

        let runs = wmdb_db::list_ingestion_runs(&pool, 10)
            .await
            .expect("listing runs failed");
        let outcomes = wmdb_db::list_ingestion_run_platforms(&pool, runs[0].id)
            .await
            .expect("listing platform outcomes failed");
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].platform, "crown-and-caliber");

        // Nothing from the other mock platform landed in the archive.
        let rows = wmdb_db::search_archive_listings(&pool, "", Some("bobs-watches"), 50)
            .await
            .expect("archive search failed");
        assert!(rows.is_empty());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn collect_run_fails_when_every_platform_fails(pool: sqlx::PgPool) {
        // No eBay client configured, so the only platform cannot be collected.
        let deps = deps_for(pool.clone());
        let registry = ebay_only_registry();

        let err = run_collect(&deps, &registry, None, 2)
            .await
            .expect_err("run must fail when all platforms fail");
        assert!(err.to_string().contains("all 1 platforms failed"));

        let runs = wmdb_db::list_ingestion_runs(&pool, 10)
            .await
            .expect("listing runs failed");
        assert_eq!(runs[0].status, "failed");
        assert!(runs[0]
            .error_message
            .as_deref()
            .is_some_and(|m| m.contains("failed collection")));

        let outcomes = wmdb_db::list_ingestion_run_platforms(&pool, runs[0].id)
            .await
            .expect("listing platform outcomes failed");
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].status, "failed");
        assert!(outcomes[0]
            .error_message
            .as_deref()
            .is_some_and(|m| m.contains("credentials")));
    }
}
