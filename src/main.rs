//! Gold Prices - derived retail gold prices for the storefront page
//!
//! Serves `/api/gold` from a 30-second cache over the provider's page data.

use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gold_prices_backend::{
    api::{create_router, AppState},
    cache::PriceCache,
    config::Config,
    scrapers::GoldProviderClient,
};

#[tokio::main]
async fn main() -> Result<()> {
    load_env();
    init_tracing();

    let config = Config::parse();
    info!(
        upstream = %config.upstream_base_url,
        timeout_secs = config.upstream_timeout().as_secs(),
        cache_ttl_secs = config.cache_ttl().as_secs(),
        "Gold prices backend starting"
    );

    let provider = GoldProviderClient::new(config.upstream_base_url.clone(), config.upstream_timeout())
        .context("Failed to initialize price provider client")?;
    let state = AppState::new(Arc::new(provider), PriceCache::new(config.cache_ttl()));

    let app = create_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    info!("API server listening on {}", config.bind);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gold_prices_backend=debug,gold_prices=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_env() {
    // Standard dotenv search (cwd + parents)
    let _ = dotenv();

    // Also try the crate directory when launched from elsewhere
    let manifest_env = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    if manifest_env.exists() {
        let _ = dotenv::from_path(&manifest_env);
    }
}
