//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the
//! nightly archive refresh and the periodic price-alert evaluation.

mod alerts;

use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use wmdb_aggregator::SearchDeps;
use wmdb_core::PlatformsFile;

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process — dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// a job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    deps: SearchDeps,
    registry: Arc<PlatformsFile>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_refresh_job(&scheduler, deps.clone(), registry).await?;
    alerts::register_alert_job(&scheduler, deps.pool).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the nightly archive refresh.
///
/// Runs every night at 03:00 UTC (`0 0 3 * * *`): re-collects inventory
/// for every enabled platform so grouped prices and price history stay
/// current without manual CLI runs.
async fn register_refresh_job(
    scheduler: &JobScheduler,
    deps: SearchDeps,
    registry: Arc<PlatformsFile>,
) -> Result<(), JobSchedulerError> {
    let deps = Arc::new(deps);

    let job = Job::new_async("0 0 3 * * *", move |_uuid, _lock| {
        let deps = Arc::clone(&deps);
        let registry = Arc::clone(&registry);

        Box::pin(async move {
            tracing::info!("scheduler: starting nightly archive refresh");
            run_refresh_job(&deps, &registry).await;
            tracing::info!("scheduler: nightly archive refresh complete");
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

/// Collect every enabled platform, with run bookkeeping. One failing
/// platform does not stop the others.
async fn run_refresh_job(deps: &SearchDeps, registry: &PlatformsFile) {
    let platforms = registry.enabled(None);
    if platforms.is_empty() {
        tracing::info!("scheduler: no enabled platforms; skipping refresh");
        return;
    }

    let run = match wmdb_db::create_ingestion_run(&deps.pool, "refresh", "scheduler").await {
        Ok(run) => run,
        Err(e) => {
            tracing::error!(error = %e, "scheduler: failed to create ingestion run");
            return;
        }
    };
    if let Err(e) = wmdb_db::start_ingestion_run(&deps.pool, run.id).await {
        tracing::error!(error = %e, "scheduler: failed to start ingestion run");
        return;
    }

    let mut total: i32 = 0;
    let mut failed: usize = 0;
    let platform_count = platforms.len();

    for platform in platforms {
        let slug = platform.slug();
        match wmdb_aggregator::collect_platform(deps, platform).await {
            Ok(stats) => {
                let records = i32::try_from(stats.records()).unwrap_or(i32::MAX);
                total = total.saturating_add(records);
                record_platform_outcome(deps, run.id, &slug, "succeeded", Some(records), None)
                    .await;
            }
            Err(e) => {
                tracing::error!(platform = %slug, error = %e, "scheduler: platform refresh failed");
                failed += 1;
                record_platform_outcome(deps, run.id, &slug, "failed", None, Some(&e.to_string()))
                    .await;
            }
        }
    }

    let result = if failed == platform_count {
        wmdb_db::fail_ingestion_run(&deps.pool, run.id, "all platforms failed refresh").await
    } else {
        wmdb_db::complete_ingestion_run(&deps.pool, run.id, total).await
    };
    if let Err(e) = result {
        tracing::error!(error = %e, "scheduler: failed to finalize ingestion run");
    }
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
        tracing::warn!(platform, error = %e, "scheduler: failed to record platform outcome");
    }
}
