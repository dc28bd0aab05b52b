use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

pub const ROLE_GUEST: &str = "GUEST";
pub const ROLE_CUSTOMER: &str = "CUSTOMER";

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CustomerClaims {
    pub sub: String,
    pub email: Option<String>,
    pub role: String,
    pub exp: usize,
}

impl CustomerClaims {
    /// Identity recorded on holds and bookings. Signed-in customers are known by email
    /// so confirmations can reach them.
    pub fn holder(&self) -> &str {
        self.email.as_deref().unwrap_or(&self.sub)
    }
}

// ============================================================================
// Customer Authentication Middleware
// ============================================================================

pub async fn customer_auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let TypedHeader(Authorization(bearer)) =
        bearer.ok_or_else(|| AppError::AuthenticationError("Missing bearer token".to_string()))?;

    let token_data = decode::<CustomerClaims>(
        bearer.token(),
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| AppError::AuthenticationError(format!("Invalid token: {}", e)))?;

    if token_data.claims.role != ROLE_CUSTOMER && token_data.claims.role != ROLE_GUEST {
        return Err(AppError::AuthorizationError("Role not allowed".to_string()));
    }

    req.extensions_mut().insert(token_data.claims);

    Ok(next.run(req).await)
}
