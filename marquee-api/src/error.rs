use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use marquee_core::ReservationError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    AuthenticationError(String),
    #[error("{0}")]
    AuthorizationError(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("{0}")]
    NotFoundError(String),
    #[error("{0}")]
    ConflictError(String),
    #[error("{0}")]
    GoneError(String),
    #[error("{0}")]
    RateLimited(String),
    #[error("{0}")]
    UpstreamError(String),
    #[error("{0}")]
    UnavailableError(String),
    #[error("{0}")]
    InternalServerError(String),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::GoneError(msg) => (StatusCode::GONE, msg),
            AppError::RateLimited(msg) => (StatusCode::TOO_MANY_REQUESTS, msg),
            AppError::UpstreamError(msg) => {
                tracing::warn!("Upstream failure: {}", msg);
                (StatusCode::BAD_GATEWAY, msg)
            }
            AppError::UnavailableError(msg) => {
                tracing::warn!("Service unavailable: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, msg)
            }
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {:#}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<ReservationError> for AppError {
    fn from(err: ReservationError) -> Self {
        let msg = err.to_string();
        match err {
            ReservationError::SeatUnavailable { .. } => AppError::ConflictError(msg),
            ReservationError::UnknownSeat { .. } | ReservationError::InvalidSelection(_) => {
                AppError::ValidationError(msg)
            }
            ReservationError::ShowtimeNotFound(_) | ReservationError::HoldNotFound(_) => {
                AppError::NotFoundError(msg)
            }
            ReservationError::HoldExpired(_) => AppError::GoneError(msg),
            ReservationError::Catalog(e) if e.is_transient() => AppError::UnavailableError(msg),
            ReservationError::Catalog(_) => AppError::UpstreamError(msg),
            ReservationError::HoldMismatch { .. } | ReservationError::PersistenceDegraded { .. } => {
                AppError::InternalServerError(msg)
            }
        }
    }
}
