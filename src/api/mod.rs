pub mod gold;
pub mod routes;

pub use gold::{get_gold_prices, ApiError};
pub use routes::{create_router, AppState};
