use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Json, Router,
};
use futures_util::{Stream, StreamExt};
use marquee_catalog::SeatMapSummary;
use marquee_core::{SeatLabel, Showtime, ShowtimeId};
use serde::Serialize;
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Serialize)]
struct SeatAvailabilityResponse {
    showtime: Showtime,
    available: Vec<SeatLabel>,
    summary: SeatMapSummary,
    utilization: f64,
    active_holds: usize,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/showtimes", get(list_showtimes))
        .route("/v1/showtimes/{id}/seats", get(seat_availability))
        .route("/v1/showtimes/{id}/stream", get(seat_stream))
}

async fn list_showtimes(State(state): State<AppState>) -> Result<Json<Vec<Showtime>>, AppError> {
    let showtimes = state
        .catalog
        .list_showtimes()
        .await
        .map_err(|e| AppError::UpstreamError(e.to_string()))?;
    Ok(Json(showtimes))
}

async fn seat_availability(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SeatAvailabilityResponse>, AppError> {
    let availability = state.coordinator.availability(ShowtimeId(id)).await?;
    Ok(Json(SeatAvailabilityResponse {
        utilization: availability.summary.utilization(),
        active_holds: availability.holds.len(),
        showtime: availability.showtime,
        available: availability.free.into_iter().collect(),
        summary: availability.summary,
    }))
}

/// Server-sent seat transitions for one showtime.
async fn seat_stream(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    // 404 for unknown showtimes instead of an empty stream
    state.coordinator.availability(ShowtimeId(id)).await?;
    let rx = state.coordinator.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(move |result| async move {
        match result {
            Ok(event) if event.showtime_id == id => {
                let data = serde_json::to_string(&event).ok()?;
                Some(Ok::<_, Infallible>(
                    Event::default().event(event.kind.as_str()).data(data),
                ))
            }
            // lagged receivers just skip ahead
            _ => None,
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
