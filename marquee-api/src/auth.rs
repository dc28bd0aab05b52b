use axum::{extract::State, routing::post, Json, Router};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::auth::{CustomerClaims, ROLE_CUSTOMER, ROLE_GUEST};
use crate::{error::AppError, state::AppState};

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct TokenRequest {
    email: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/auth/guest", post(login_guest))
        .route("/v1/auth/token", post(login_customer))
}

async fn login_guest(State(state): State<AppState>) -> Result<Json<AuthResponse>, AppError> {
    let claims = CustomerClaims {
        sub: format!("guest-{}", Uuid::new_v4()),
        email: None,
        role: ROLE_GUEST.to_owned(),
        exp: expiry(&state),
    };
    Ok(Json(AuthResponse { token: sign(&state, &claims)? }))
}

/// Issues a customer token for an email address. Identity is not verified here.
async fn login_customer(
    State(state): State<AppState>,
    Json(req): Json<TokenRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let email = req.email.trim().to_lowercase();
    if !is_plausible_email(&email) {
        return Err(AppError::ValidationError("A valid email is required".to_string()));
    }

    let claims = CustomerClaims {
        sub: email.clone(),
        email: Some(email),
        role: ROLE_CUSTOMER.to_owned(),
        exp: expiry(&state),
    };
    Ok(Json(AuthResponse { token: sign(&state, &claims)? }))
}

fn expiry(state: &AppState) -> usize {
    (Utc::now() + Duration::seconds(state.auth.expiration as i64)).timestamp() as usize
}

fn sign(state: &AppState, claims: &CustomerClaims) -> Result<String, AppError> {
    encode(&Header::default(), claims, &EncodingKey::from_secret(state.auth.secret.as_bytes()))
        .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}
