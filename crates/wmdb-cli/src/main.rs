use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use wmdb_aggregator::SearchDeps;

mod collect;
mod search;

#[derive(Debug, Parser)]
#[command(name = "wmdb-cli")]
#[command(about = "WMDB command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Pull current inventory from every enabled platform into the archive
    Collect {
        /// Restrict collection to a specific platform (by slug)
        #[arg(long)]
        platform: Option<String>,
    },
    /// Search all platforms and print grouped price comparisons
    Search {
        /// Free-text query, e.g. "rolex submariner under 10000"
        query: String,

        /// Per-platform result limit
        #[arg(long)]
        limit: Option<u32>,

        /// Print the full outcome as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Sync the platform registry file into the database
    SeedPlatforms,
    /// Apply pending database migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = wmdb_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let pool =
        wmdb_db::connect_pool(&config.database_url, wmdb_db::PoolConfig::from_env()).await?;

    match cli.command {
        Commands::Collect { platform } => {
            let registry = wmdb_core::load_platforms(&config.platforms_path)?;
            let deps = build_search_deps(pool, &config)?;
            collect::run_collect(
                &deps,
                &registry,
                platform.as_deref(),
                config.collect_max_concurrency,
            )
            .await
        }
        Commands::Search { query, limit, json } => {
            let registry = wmdb_core::load_platforms(&config.platforms_path)?;
            let deps = build_search_deps(pool, &config)?;
            let parser = wmdb_query::QueryParser::new(
                config.openai_api_key.clone(),
                &config.openai_base_url,
                &config.openai_model,
                config.http_timeout_secs,
            )?;
            search::run_search(&deps, &registry, &parser, &query, limit, json).await
        }
        Commands::SeedPlatforms => {
            let registry = wmdb_core::load_platforms(&config.platforms_path)?;
            let count = wmdb_db::seed_platforms(&pool, &registry.platforms).await?;
            println!(
                "seeded {count} platforms from {}",
                config.platforms_path.display()
            );
            Ok(())
        }
        Commands::Migrate => {
            let applied = wmdb_db::run_migrations(&pool).await?;
            println!("applied {applied} migrations");
            Ok(())
        }
    }
}

/// Build the shared adapter dependencies. The eBay client is optional;
/// without credentials, eBay-kind platforms fail individually instead of
/// blocking the whole command.
fn build_search_deps(
    pool: sqlx::PgPool,
    config: &wmdb_core::AppConfig,
) -> anyhow::Result<SearchDeps> {
    let ebay = if config.has_ebay_credentials() {
        let client_id = config
            .ebay_client_id
            .clone()
            .ok_or_else(|| anyhow::anyhow!("WMDB_EBAY_CLIENT_ID missing"))?;
        let client_secret = config
            .ebay_client_secret
            .clone()
            .ok_or_else(|| anyhow::anyhow!("WMDB_EBAY_CLIENT_SECRET missing"))?;
        Some(Arc::new(wmdb_ebay::EbayClient::with_base_urls(
            &client_id,
            &client_secret,
            config.http_timeout_secs,
            &config.ebay_base_url,
            &config.ebay_auth_url,
        )?))
    } else {
        tracing::warn!("eBay credentials not configured; eBay platforms will be unavailable");
        None
    };

    Ok(SearchDeps {
        pool,
        ebay,
        search_max_concurrency: config.search_max_concurrency,
    })
}

/// Mark an ingestion run as failed, logging rather than propagating any
/// error from the status update itself so the original failure survives.
pub(crate) async fn fail_run_best_effort(pool: &sqlx::PgPool, run_id: i64, message: String) {
    if let Err(e) = wmdb_db::fail_ingestion_run(pool, run_id, &message).await {
        tracing::error!(run_id, error = %e, "failed to mark ingestion run as failed");
    }
}
