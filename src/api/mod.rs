//! Health and status HTTP API.

pub mod handlers;
pub mod routes;

pub use handlers::{AppState, MarketSnapshot};
pub use routes::build_router;
