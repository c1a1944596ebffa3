use std::sync::{Arc, RwLock};

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use super::routes;
use crate::api::state::AppState;
use crate::core::AppConfig;
use crate::graph::TokenCache;

pub fn app(shared_state: Arc<RwLock<AppState>>) -> Router {
    Router::new()
        .merge(routes::router())
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::clone(&shared_state))
}

// Run the server
pub async fn serve(host: String, port: String, config: AppConfig) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                // axum logs rejections from built-in extractors with the `axum::rejection`
                // target, at `TRACE` level. `axum::rejection=trace` enables showing those events
                format! {
                    "{}=debug,tower_http=debug,axum::rejection=trace",
                    env!("CARGO_CRATE_NAME")
                }
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Lives for the whole process so tokens are reused across requests
    let tokens = Arc::new(TokenCache::new());
    let app_state = AppState::new(&config, tokens).expect("Failed to build app state");
    let shared_state = Arc::new(RwLock::new(app_state));
    let app = app(Arc::clone(&shared_state));

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port))
        .await
        .expect("Failed to bind listener");

    tracing::debug!(
        "Server started. Listening on {}",
        listener
            .local_addr()
            .expect("Listener has no local address")
    );

    axum::serve(listener, app).await.expect("Server failed");
}
