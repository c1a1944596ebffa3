//! API routes module

pub mod availability;
pub mod health;
pub mod token;

use std::sync::{Arc, RwLock};

use crate::api::state::AppState;
use axum::Router;

type SharedState = Arc<RwLock<AppState>>;

/// Create the combined router. The SOAP endpoint lives at the root
/// because that's where calendar clients are configured to post.
pub fn router() -> Router<SharedState> {
    Router::new()
        // EWS free/busy lookups
        .merge(availability::router())
        // Client credential check
        .nest("/token", token::router())
        // Liveness check
        .nest("/health-check", health::router())
}
