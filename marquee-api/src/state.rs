use marquee_core::{BookingStore, CatalogService};
use marquee_reservation::ReservationCoordinator;
use marquee_store::RedisRateLimiter;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<ReservationCoordinator>,
    pub catalog: Arc<dyn CatalogService>,
    pub bookings: Arc<dyn BookingStore>,
    /// Rate limiting is skipped when absent.
    pub rate_limiter: Option<Arc<RedisRateLimiter>>,
    pub auth: AuthConfig,
    pub default_hold_ttl: Duration,
}
