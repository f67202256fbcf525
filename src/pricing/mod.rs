//! Price normalization and retail product derivation.

pub mod coerce;
pub mod format;
pub mod products;

pub use coerce::{safe_float, RawScalar};
pub use format::format_price;
pub use products::{derive_products, PriceInputs, ProductRule, PRODUCT_TABLE};
