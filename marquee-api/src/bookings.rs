use axum::{
    extract::{Path, State},
    routing::get,
    Extension, Json, Router,
};
use marquee_core::{Booking, BookingId};
use uuid::Uuid;

use crate::middleware::CustomerClaims;
use crate::{error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", get(list_bookings))
        .route("/v1/bookings/{id}", get(get_booking))
}

async fn list_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let bookings = state
        .bookings
        .list_for_holder(claims.holder())
        .await
        .map_err(|e| AppError::UpstreamError(e.to_string()))?;
    Ok(Json(bookings))
}

async fn get_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    let booking = state
        .bookings
        .get(BookingId(id))
        .await
        .map_err(|e| AppError::UpstreamError(e.to_string()))?
        .ok_or_else(|| AppError::NotFoundError(format!("Booking not found: {}", id)))?;

    if booking.holder != claims.holder() {
        return Err(AppError::AuthorizationError("Booking belongs to another customer".to_string()));
    }
    Ok(Json(booking))
}
