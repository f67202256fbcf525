//! `GET /api/gold`
//!
//! Cache check, two upstream fetches, derivation, cache store. Any upstream
//! failure ends the request with 502 and leaves the cache as it was.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use tracing::{error, info};

use super::AppState;
use crate::models::ProductQuote;
use crate::pricing::derive_products;
use crate::scrapers::gold_provider::{QuoteSource, UpstreamError};

/// Which upstream page a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamPage {
    Main,
    Crafted,
}

impl UpstreamPage {
    pub fn label(self) -> &'static str {
        match self {
            UpstreamPage::Main => "gold quotes",
            UpstreamPage::Crafted => "coin quotes",
        }
    }
}

#[derive(Debug, Clone)]
pub enum ApiError {
    Upstream {
        page: UpstreamPage,
        error: UpstreamError,
    },
}

impl ApiError {
    fn upstream(page: UpstreamPage) -> impl FnOnce(UpstreamError) -> ApiError {
        move |error| ApiError::Upstream { page, error }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let ApiError::Upstream { page, error } = self;
        error!(page = page.label(), url = %error.url(), error = %error, "upstream request failed");

        let (category, detail) = match error {
            UpstreamError::Connection { .. } => (
                "upstream connection failed",
                format!("could not reach the {} source", page.label()),
            ),
            UpstreamError::Format { .. } => (
                "upstream format error",
                format!("the {} source returned data in an unexpected format", page.label()),
            ),
        };

        let body = Json(json!({
            "error": category,
            "detail": detail,
        }));

        (StatusCode::BAD_GATEWAY, body).into_response()
    }
}

/// One full upstream round: both pages, then the product table.
pub async fn refresh_products(source: &dyn QuoteSource) -> Result<Vec<ProductQuote>, ApiError> {
    let main = source
        .main_snapshot()
        .await
        .map_err(ApiError::upstream(UpstreamPage::Main))?;
    let items = source
        .crafted_items()
        .await
        .map_err(ApiError::upstream(UpstreamPage::Crafted))?;

    let products = derive_products(&main, &items);
    info!(
        rows = products.len(),
        instruments = main.instruments.len(),
        crafted_items = items.items.len(),
        "product prices refreshed"
    );
    Ok(products)
}

pub async fn get_gold_prices(State(state): State<AppState>) -> Result<Response, ApiError> {
    let source = state.source.clone();
    let (payload, cache_status) = state
        .cache
        .get_or_refresh(|| async move { refresh_products(source.as_ref()).await })
        .await?;

    let mut response = Json(payload.as_slice()).into_response();
    response.extensions_mut().insert(cache_status);
    Ok(response)
}
