use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use marquee_core::{Booking, Hold, HoldId, ReservationError, SeatLabel, ShowtimeId};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

use crate::middleware::CustomerClaims;
use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
struct CreateHoldRequest {
    showtime_id: Uuid,
    seats: Vec<String>,
    ttl_seconds: Option<u64>,
}

#[derive(Debug, Serialize)]
struct DegradedBookingResponse {
    booking: Booking,
    warning: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/holds", post(create_hold))
        .route("/v1/holds/{id}", get(get_hold).delete(cancel_hold))
        .route("/v1/holds/{id}/confirm", post(confirm_hold))
}

async fn create_hold(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Json(req): Json<CreateHoldRequest>,
) -> Result<(StatusCode, Json<Hold>), AppError> {
    let ttl = req
        .ttl_seconds
        .map(Duration::from_secs)
        .unwrap_or(state.default_hold_ttl);
    let seats = req.seats.into_iter().map(SeatLabel).collect();

    let hold = state
        .coordinator
        .select_seats(ShowtimeId(req.showtime_id), seats, claims.holder(), ttl)
        .await?;

    Ok((StatusCode::CREATED, Json(hold)))
}

async fn get_hold(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Hold>, AppError> {
    Ok(Json(owned_hold(&state, &claims, HoldId(id))?))
}

async fn confirm_hold(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let hold = owned_hold(&state, &claims, HoldId(id))?;

    match state.coordinator.confirm(hold.id).await {
        Ok(booking) => Ok((StatusCode::CREATED, Json(booking)).into_response()),
        Err(ReservationError::PersistenceDegraded { booking, reason }) => {
            warn!("Booking {} confirmed without a durable record: {}", booking.id, reason);
            let body = DegradedBookingResponse {
                booking: *booking,
                warning: "Seats are booked but the booking record could not be saved yet".to_string(),
            };
            Ok((StatusCode::ACCEPTED, Json(body)).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

async fn cancel_hold(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Hold>, AppError> {
    let hold = owned_hold(&state, &claims, HoldId(id))?;
    let released = state.coordinator.cancel(hold.id).await?;
    Ok(Json(released))
}

fn owned_hold(state: &AppState, claims: &CustomerClaims, hold_id: HoldId) -> Result<Hold, AppError> {
    let hold = state
        .coordinator
        .hold(hold_id)
        .ok_or(ReservationError::HoldNotFound(hold_id))?;
    if hold.holder != claims.holder() {
        return Err(AppError::AuthorizationError("Hold belongs to another customer".to_string()));
    }
    Ok(hold)
}
