//! HTTP surface: axum routes and error mapping.

pub mod error;
pub mod routes;

pub use error::ApiError;
pub use routes::{AppState, SNAPSHOT_FIELD, api_routes};
