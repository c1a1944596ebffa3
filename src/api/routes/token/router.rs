//! Router for the token API

use std::sync::{Arc, RwLock};

use axum::extract::rejection::FormRejection;
use axum::{Form, Json, Router, extract::State};

use super::public::{TokenRequest, TokenResponse};
use crate::api::public::ApiError;
use crate::api::state::AppState;

type SharedState = Arc<RwLock<AppState>>;

/// Check the client id and secret and hand back the configured token.
/// A missing or unreadable form counts as wrong credentials.
async fn token_handler(
    State(state): State<SharedState>,
    form: Result<Form<TokenRequest>, FormRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let params = form.map(|Form(params)| params).unwrap_or_default();
    let gate = state
        .read()
        .map_err(|_| anyhow::anyhow!("Unable to read shared state"))?
        .gate
        .clone();

    let access_token = gate.authenticate(
        params.client_id.as_deref(),
        params.client_secret.as_deref(),
    );

    Ok(Json(TokenResponse { access_token }))
}

/// Create the token router
pub fn router() -> Router<SharedState> {
    Router::new().route(
        "/",
        axum::routing::get(token_handler).post(token_handler),
    )
}
