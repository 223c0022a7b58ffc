mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use wmdb_aggregator::SearchDeps;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(wmdb_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = wmdb_db::PoolConfig::from_env();
    let pool = wmdb_db::connect_pool(&config.database_url, pool_config).await?;
    wmdb_db::run_migrations(&pool).await?;

    let registry = Arc::new(wmdb_core::load_platforms(&config.platforms_path)?);
    wmdb_db::seed_platforms(&pool, &registry.platforms).await?;

    let ebay = if config.has_ebay_credentials() {
        Some(Arc::new(build_ebay_client(&config)?))
    } else {
        tracing::warn!("eBay credentials not configured; live eBay search disabled");
        None
    };

    let deps = SearchDeps {
        pool: pool.clone(),
        ebay,
        search_max_concurrency: config.search_max_concurrency,
    };

    let parser = Arc::new(wmdb_query::QueryParser::new(
        config.openai_api_key.clone(),
        &config.openai_base_url,
        &config.openai_model,
        config.http_timeout_secs,
    )?);

    let _scheduler = scheduler::build_scheduler(deps.clone(), Arc::clone(&registry)).await?;

    let auth = AuthState::from_env(matches!(config.env, wmdb_core::Environment::Development))?;
    let app = build_app(
        AppState {
            pool,
            deps,
            registry,
            parser,
        },
        auth,
        default_rate_limit_state(),
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn build_ebay_client(config: &wmdb_core::AppConfig) -> anyhow::Result<wmdb_ebay::EbayClient> {
    let client_id = config
        .ebay_client_id
        .clone()
        .ok_or_else(|| anyhow::anyhow!("WMDB_EBAY_CLIENT_ID missing"))?;
    let client_secret = config
        .ebay_client_secret
        .clone()
        .ok_or_else(|| anyhow::anyhow!("WMDB_EBAY_CLIENT_SECRET missing"))?;

    Ok(wmdb_ebay::EbayClient::with_base_urls(
        &client_id,
        &client_secret,
        config.http_timeout_secs,
        &config.ebay_base_url,
        &config.ebay_auth_url,
    )?)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
