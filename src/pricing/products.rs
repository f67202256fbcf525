//! Retail product table.
//!
//! Every product is a linear function of one upstream figure. Row order is
//! the order the front-end renders, so it is part of the response contract.

use crate::models::{CraftedItems, ProductQuote, QuoteSnapshot};
use crate::pricing::format::format_price;

/// Main-page instrument holding the per-gram price of pure gold.
pub const GRAM_CODE: &str = "ALTIN";
/// Main-page instrument holding the spot ounce price.
pub const OUNCE_CODE: &str = "ONS";

/// Which side of the market a formula is evaluated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Bid,
    Ask,
}

/// The figure a formula scales.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Basis {
    Ounce,
    Gram,
    /// Crafted-item coefficient times the gram price on the same side.
    Coefficient(&'static str),
}

/// `basis * multiplier + offset`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Formula {
    pub basis: Basis,
    pub multiplier: f64,
    pub offset: f64,
}

impl Formula {
    const fn new(basis: Basis, multiplier: f64, offset: f64) -> Self {
        Self {
            basis,
            multiplier,
            offset,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NameSource {
    /// Use the default name verbatim.
    Literal,
    /// Strip the gold prefix from the default name.
    Stripped,
    /// Strip the gold prefix from the crafted item's display name.
    Item(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProductRule {
    pub default_name: &'static str,
    pub name: NameSource,
    pub bid: Formula,
    pub ask: Formula,
}

pub const PRODUCT_TABLE: [ProductRule; 8] = [
    ProductRule {
        default_name: "Ons ( $ )",
        name: NameSource::Stripped,
        bid: Formula::new(Basis::Ounce, 1.0, 0.0),
        ask: Formula::new(Basis::Ounce, 1.0, 0.0),
    },
    ProductRule {
        default_name: "Has Altın",
        name: NameSource::Literal,
        bid: Formula::new(Basis::Gram, 1.0, 0.0),
        ask: Formula::new(Basis::Gram, 1.0, 0.0),
    },
    ProductRule {
        default_name: "Gram Altın (24 Ayar)",
        name: NameSource::Literal,
        bid: Formula::new(Basis::Gram, 0.995, 0.0),
        ask: Formula::new(Basis::Gram, 1.004, 10.0),
    },
    ProductRule {
        default_name: "E. Çeyrek",
        name: NameSource::Item("stl2"),
        bid: Formula::new(Basis::Coefficient("stl2"), 1.0, 0.0),
        ask: Formula::new(Basis::Coefficient("stl2"), 1.0, 10.0),
    },
    ProductRule {
        default_name: "E. Yarım",
        name: NameSource::Item("stl4"),
        bid: Formula::new(Basis::Coefficient("stl4"), 1.0, 0.0),
        ask: Formula::new(Basis::Coefficient("stl4"), 1.0, 20.0),
    },
    ProductRule {
        default_name: "E. Teklik",
        name: NameSource::Item("stl6"),
        bid: Formula::new(Basis::Coefficient("stl6"), 1.0, 0.0),
        ask: Formula::new(Basis::Coefficient("stl6"), 1.0, 40.0),
    },
    // Dealer margin: the Ata lira bid sits 50 below the coefficient price.
    ProductRule {
        default_name: "E. Ata Lira",
        name: NameSource::Item("stl10"),
        bid: Formula::new(Basis::Coefficient("stl10"), 1.0, -50.0),
        ask: Formula::new(Basis::Coefficient("stl10"), 1.0, 100.0),
    },
    ProductRule {
        default_name: "22 Ayar Hurda Bilezik",
        name: NameSource::Literal,
        bid: Formula::new(Basis::Gram, 0.912, -3.0),
        ask: Formula::new(Basis::Gram, 0.912, 10.0),
    },
];

/// Normalized figures every formula draws from.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PriceInputs {
    pub gram_bid: f64,
    pub gram_ask: f64,
    pub ons_bid: f64,
    pub ons_ask: f64,
}

impl PriceInputs {
    pub fn from_snapshot(snapshot: &QuoteSnapshot) -> Self {
        let gram = snapshot.quote(GRAM_CODE);
        let ounce = snapshot.quote(OUNCE_CODE);
        Self {
            gram_bid: gram.bid,
            gram_ask: gram.ask,
            ons_bid: ounce.bid,
            ons_ask: ounce.ask,
        }
    }

    fn gram(&self, side: Side) -> f64 {
        match side {
            Side::Bid => self.gram_bid,
            Side::Ask => self.gram_ask,
        }
    }

    fn ounce(&self, side: Side) -> f64 {
        match side {
            Side::Bid => self.ons_bid,
            Side::Ask => self.ons_ask,
        }
    }
}

impl Formula {
    pub fn evaluate(&self, side: Side, inputs: &PriceInputs, items: &CraftedItems) -> f64 {
        let base = match self.basis {
            Basis::Ounce => inputs.ounce(side),
            Basis::Gram => inputs.gram(side),
            Basis::Coefficient(code) => {
                // Missing items degrade to a zero coefficient.
                let coefficient = items.get(code).map_or(0.0, |item| match side {
                    Side::Bid => item.bid_coefficient,
                    Side::Ask => item.ask_coefficient,
                });
                coefficient * inputs.gram(side)
            }
        };
        base * self.multiplier + self.offset
    }
}

/// Remove the "ALTIN"/"Altın" marker from a provider display name.
pub fn strip_gold_prefix(name: &str) -> String {
    name.replace("ALTIN", "").replace("Altın", "").trim().to_string()
}

impl ProductRule {
    pub fn display_name(&self, items: &CraftedItems) -> String {
        let stripped = match self.name {
            NameSource::Literal => return self.default_name.to_string(),
            NameSource::Stripped => strip_gold_prefix(self.default_name),
            NameSource::Item(code) => {
                let source = items
                    .get(code)
                    .and_then(|item| item.name.as_deref())
                    .unwrap_or(self.default_name);
                strip_gold_prefix(source)
            }
        };

        if stripped.is_empty() {
            self.default_name.to_string()
        } else {
            stripped
        }
    }

    pub fn quote(&self, inputs: &PriceInputs, items: &CraftedItems) -> ProductQuote {
        ProductQuote {
            name: self.display_name(items),
            bid: format_price(self.bid.evaluate(Side::Bid, inputs, items)),
            ask: format_price(self.ask.evaluate(Side::Ask, inputs, items)),
        }
    }
}

/// Build the full product list in table order.
pub fn derive_products(main: &QuoteSnapshot, items: &CraftedItems) -> Vec<ProductQuote> {
    let inputs = PriceInputs::from_snapshot(main);
    PRODUCT_TABLE
        .iter()
        .map(|rule| rule.quote(&inputs, items))
        .collect()
}
