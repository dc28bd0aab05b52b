use axum::{
    http::{header, Method},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod bookings;
pub mod error;
pub mod holds;
pub mod middleware;
pub mod showtimes;
pub mod state;

pub use error::AppError;
pub use state::{AppState, AuthConfig};

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::USER_AGENT]);

    // holds and bookings act on behalf of the bearer
    let protected = Router::new()
        .merge(holds::routes())
        .merge(bookings::routes())
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::customer_auth_middleware,
        ));

    Router::new()
        .route("/health", get(health))
        .merge(auth::routes())
        .merge(showtimes::routes())
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit_middleware,
        ))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
