pub mod app_config;
pub mod database;
pub mod booking_repo;
pub mod rate_limit;
pub mod notifications;

pub use booking_repo::PgBookingStore;
pub use notifications::KafkaNotificationSender;
pub use rate_limit::RedisRateLimiter;
