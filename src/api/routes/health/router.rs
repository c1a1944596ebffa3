//! Router for the health check

use std::sync::{Arc, RwLock};

use axum::Router;

use crate::api::state::AppState;

type SharedState = Arc<RwLock<AppState>>;

async fn health_check() -> &'static str {
    "success"
}

/// Create the health check router
pub fn router() -> Router<SharedState> {
    Router::new().route("/", axum::routing::get(health_check))
}
