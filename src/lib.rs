//! Gold Prices Backend Library
//!
//! Fetches gram gold, spot ounce and coin quotes from the price provider,
//! derives the retail product table and serves it from `/api/gold`.

pub mod api;
pub mod cache;
pub mod config;
pub mod middleware;
pub mod models;
pub mod pricing;
pub mod scrapers;
