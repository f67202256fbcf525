use axum::{
    extract::State,
    middleware,
    response::Json,
    routing::get,
    Router,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tokio::time::Instant;

use crate::cache::PriceCache;
use crate::middleware::request_logging_simple;
use crate::scrapers::gold_provider::QuoteSource;

use super::gold::{get_gold_prices, ApiError};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn QuoteSource>,
    pub cache: Arc<PriceCache<ApiError>>,
}

impl AppState {
    pub fn new(source: Arc<dyn QuoteSource>, cache: PriceCache<ApiError>) -> Self {
        Self {
            source,
            cache: Arc::new(cache),
        }
    }
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/gold", get(get_gold_prices))
        .layer(middleware::from_fn(request_logging_simple))
        .with_state(state)
}

// ===== Route Handlers =====

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let cache_age_secs = state
        .cache
        .age(Instant::now())
        .await
        .map(|age| age.as_secs());

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
        cache_age_secs,
    })
}

// ===== Response Types =====

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    cache_age_secs: Option<u64>,
}
