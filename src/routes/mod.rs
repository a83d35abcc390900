mod error;
pub mod health;
pub mod usage;

use axum::{Router, routing::get};
pub use error::*;

use crate::AppState;

/// Routes mounted under `/api`.
pub fn api_routes() -> Router<AppState> {
    Router::new().route("/openrouter/usage", get(usage::openrouter_usage))
}
