use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::{store::StoreError, AppState};

/// Error body for ids that were never issued or were already consumed.
pub const NOT_FOUND_MESSAGE: &str = "Not found or already retrieved.";

// ── Health ────────────────────────────────────────────────────────────────────

pub async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

// ── Create ────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateRequest {
    /// Ciphertext, opaque to the server.
    pub value: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateResponse {
    pub id: String,
}

pub async fn create_secret(
    State(state): State<AppState>,
    Json(body): Json<CreateRequest>,
) -> Response {
    match state.store.create(&body.value) {
        Ok(id) => {
            info!(
                bytes = body.value.len(),
                live = state.store.len(),
                "secret created"
            );
            (StatusCode::CREATED, Json(CreateResponse { id })).into_response()
        }
        Err(StoreError::EmptyCiphertext) => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "value must not be empty"})),
        )
            .into_response(),
        Err(e @ StoreError::NotFound) => internal_error(e.into()),
    }
}

// ── Get ───────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct GetResponse {
    pub value: String,
}

pub async fn get_secret(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.store.take_and_remove(&id) {
        Ok(value) => {
            info!(live = state.store.len(), "secret retrieved and destroyed");
            Json(GetResponse { value }).into_response()
        }
        Err(StoreError::NotFound) => {
            debug!("secret lookup missed");
            (
                StatusCode::NOT_FOUND,
                Json(json!({"error": NOT_FOUND_MESSAGE})),
            )
                .into_response()
        }
        Err(e @ StoreError::EmptyCiphertext) => internal_error(e.into()),
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn internal_error(e: anyhow::Error) -> Response {
    tracing::error!(error = %e, "internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": "internal server error"})),
    )
        .into_response()
}
