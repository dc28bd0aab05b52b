use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use tracing::warn;

use crate::error::AppError;
use crate::state::AppState;

/// Per-client fixed-window limit backed by Redis. Fails open when Redis is unreachable.
pub async fn rate_limit_middleware(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let Some(limiter) = state.rate_limiter.as_ref() else {
        return next.run(req).await;
    };

    let ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    match limiter.allow(&ip).await {
        Ok(true) => next.run(req).await,
        Ok(false) => AppError::RateLimited("Rate limit exceeded".to_string()).into_response(),
        Err(e) => {
            warn!("Rate limiter unavailable, allowing request: {}", e);
            next.run(req).await
        }
    }
}
