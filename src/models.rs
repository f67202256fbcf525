//! Quote and product models shared by the provider client, pricing and API.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Normalized bid/ask pair for one upstream instrument.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Quote {
    pub bid: f64,
    pub ask: f64,
}

/// Main page payload, keyed by instrument code ("ALTIN", "ONS", ...).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteSnapshot {
    pub instruments: HashMap<String, Quote>,
}

impl QuoteSnapshot {
    /// Missing instruments read as a zero quote.
    pub fn quote(&self, code: &str) -> Quote {
        self.instruments.get(code).copied().unwrap_or_default()
    }
}

/// A coin product priced as a multiple of the gram price.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CraftedItem {
    /// Provider display name, e.g. "ESKİ ÇEYREK ALTIN".
    pub name: Option<String>,
    pub bid_coefficient: f64,
    pub ask_coefficient: f64,
}

/// Crafted-item payload, keyed by product code ("stl2", "stl4", ...).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CraftedItems {
    pub items: HashMap<String, CraftedItem>,
}

impl CraftedItems {
    pub fn get(&self, code: &str) -> Option<&CraftedItem> {
        self.items.get(code)
    }
}

/// One row of the `/api/gold` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductQuote {
    #[serde(rename = "urun")]
    pub name: String,
    #[serde(rename = "alis")]
    pub bid: String,
    #[serde(rename = "satis")]
    pub ask: String,
}
