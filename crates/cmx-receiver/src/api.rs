//! HTTP endpoints of the receiver.
//!
//! # Push API
//!
//! - `GET /events` returns the validator token so the vendor dashboard can
//!   confirm the URL.
//! - `POST /events` accepts one `DevicesSeen` batch. The answer is an empty
//!   `200 OK` whether the batch was applied or refused; refusals are only
//!   logged, because the sender does not act on them. A store failure is the
//!   exception and returns `500` so the sender retries.
//!
//! # Read API
//!
//! - `GET /clients/{mac}` returns the client's last known position, or `{}`.
//! - `GET /clients` returns every client seen in the last five minutes.
//!
//! # Lock Acquisition
//!
//! Handlers take `state.store` for the duration of one batch or one query
//! and never hold it across an `.await`.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{info, warn};

use cmx_store::ClientRecord;

use crate::ingest;
use crate::state::AppState;
use crate::validator::validate_batch;

const INDEX_HTML: &str = include_str!("../assets/index.html");

/// Create the API router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index))
        .route("/api/health", get(health))
        .route("/events", get(validator_token).post(ingest_events))
        .route("/clients", get(recent_clients))
        .route("/clients/", get(recent_clients))
        .route("/clients/{mac}", get(get_client))
}

/// Map frontend.
async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// Health check endpoint.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: OffsetDateTime::now_utc(),
    })
}

/// Validation handshake: echo the configured validator token.
async fn validator_token(State(state): State<Arc<AppState>>) -> String {
    info!("Sending validator");
    state.config.receiver.validator.clone()
}

/// Ingest one push.
///
/// # Errors
///
/// Returns [`AppError::Store`] if persisting an accepted observation fails.
async fn ingest_events(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let data = match validate_batch(&headers, &body, &state.config.receiver) {
        Ok(data) => data,
        Err(rejection) => {
            warn!("Dropping push: {}", rejection);
            return Ok(StatusCode::OK);
        }
    };

    let summary = {
        let store = state.store.lock().await;
        ingest::process_batch(&store, &data)?
    };

    info!(
        "Push from AP {}: {} observations, {} applied, {} ignored, {} skipped",
        data.ap_mac, summary.observations, summary.applied, summary.ignored, summary.skipped
    );

    Ok(StatusCode::OK)
}

/// Look up one client by MAC address.
///
/// The router has already percent-decoded the path; a `+` left in it is
/// read as a form-encoded space.
async fn get_client(
    State(state): State<Arc<AppState>>,
    Path(mac): Path<String>,
) -> Result<Response, AppError> {
    let mac = mac.replace('+', " ");

    let client = {
        let store = state.store.lock().await;
        store.get_client(&mac)?
    };

    Ok(match client {
        Some(client) => Json(client).into_response(),
        None => Json(serde_json::json!({})).into_response(),
    })
}

/// List clients seen within the recency window.
async fn recent_clients(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ClientRecord>>, AppError> {
    let store = state.store.lock().await;
    let clients = store.recent_clients()?;
    Ok(Json(clients))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    Store(cmx_store::Error),
}

impl From<cmx_store::Error> for AppError {
    fn from(e: cmx_store::Error) -> Self {
        AppError::Store(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, Json(body)).into_response()
    }
}
