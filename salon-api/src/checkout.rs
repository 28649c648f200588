use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use futures_util::Stream;
use salon_shared::{PendingReservation, ReservationCreated, ServiceSelection};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateReservationRequest {
    pub services: Vec<ServiceSelection>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub valid: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SweepResponse {
    pub removed: usize,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/checkout/reservations",
            get(list_reservations).post(create_reservation),
        )
        .route("/v1/checkout/reservations/{id}", get(get_reservation))
        .route("/v1/checkout/reservations/{id}/confirm", post(confirm_reservation))
        .route("/v1/checkout/reservations/{id}/validate", get(validate_reservation))
        .route("/v1/checkout/current", get(get_current).delete(clear_current))
        .route("/v1/checkout/sweep", post(sweep_expired))
        .route("/v1/checkout/events", get(stream_events))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /v1/checkout/reservations
pub async fn list_reservations(State(state): State<AppState>) -> Json<Vec<PendingReservation>> {
    Json(state.store.list_pending_reservations())
}

/// POST /v1/checkout/reservations
/// Start a checkout; the new reservation becomes the current selection
pub async fn create_reservation(
    State(state): State<AppState>,
    Json(req): Json<CreateReservationRequest>,
) -> Result<(StatusCode, Json<PendingReservation>), AppError> {
    // Persisting may block on storage I/O
    let store = state.store.clone();
    let reservation = tokio::task::spawn_blocking(move || store.create_pending_reservation(req.services))
        .await
        .map_err(|e| AppError::InternalServerError(format!("Create task failed: {}", e)))??;
    Ok((StatusCode::CREATED, Json(reservation)))
}

/// GET /v1/checkout/reservations/{id}
pub async fn get_reservation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PendingReservation>, AppError> {
    state
        .store
        .get_pending_reservation(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Pending reservation not found: {}", id)))
}

/// POST /v1/checkout/reservations/{id}/confirm
/// Forwards the backend acknowledgment as is
pub async fn confirm_reservation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ReservationCreated>, AppError> {
    let created = state.store.confirm_reservation(&id).await?;
    Ok(Json(created))
}

/// GET /v1/checkout/reservations/{id}/validate
pub async fn validate_reservation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ValidateResponse>, AppError> {
    let valid = state.store.validate_pending_reservation(&id).await?;
    Ok(Json(ValidateResponse { valid }))
}

/// GET /v1/checkout/current
pub async fn get_current(State(state): State<AppState>) -> Result<Json<PendingReservation>, AppError> {
    state
        .store
        .get_current_checkout_reservation()
        .map(Json)
        .ok_or_else(|| AppError::NotFound("No reservation is being checked out".to_string()))
}

/// DELETE /v1/checkout/current
pub async fn clear_current(State(state): State<AppState>) -> StatusCode {
    state.store.clear_current_checkout_reservation();
    StatusCode::NO_CONTENT
}

/// POST /v1/checkout/sweep
pub async fn sweep_expired(State(state): State<AppState>) -> Result<Json<SweepResponse>, AppError> {
    let store = state.store.clone();
    let removed = tokio::task::spawn_blocking(move || store.clean_expired_reservations())
        .await
        .map_err(|e| AppError::InternalServerError(format!("Sweep task failed: {}", e)))?;
    Ok(Json(SweepResponse { removed }))
}

/// GET /v1/checkout/events
/// Server-sent stream of checkout changes
pub async fn stream_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.store.subscribe_changes();

    // Lagged receivers skip what they missed
    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let event = result.ok()?;
        Event::default()
            .event(event.name())
            .json_data(&event)
            .ok()
            .map(Ok)
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
