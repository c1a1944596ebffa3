//! Router for EWS free/busy lookups

use std::sync::{Arc, RwLock};

use axum::body::Bytes;
use axum::response::IntoResponse;
use axum::{Router, extract::State};
use http::header;

use crate::api::public::ApiError;
use crate::api::state::AppState;
use crate::ews;

type SharedState = Arc<RwLock<AppState>>;

/// Decode the SOAP request, ask the backend, and answer in SOAP
async fn get_user_availability(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let graph = state
        .read()
        .map_err(|_| anyhow::anyhow!("Unable to read shared state"))?
        .graph
        .clone();

    let query = ews::decode(&body)?;
    let schedules = graph.fetch(&query).await?;
    let xml = ews::encode(&schedules)?;

    Ok(([(header::CONTENT_TYPE, "text/xml; charset=utf-8")], xml))
}

/// Create the availability router
pub fn router() -> Router<SharedState> {
    Router::new().route(
        "/",
        axum::routing::get(get_user_availability).post(get_user_availability),
    )
}
