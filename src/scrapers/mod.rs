pub mod gold_provider; // Page-data client for gram gold, ounce and coin quotes

pub use gold_provider::{GoldProviderClient, QuoteSource, UpstreamError};
