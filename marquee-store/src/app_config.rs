use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub kafka: KafkaConfig,
    pub rate_limit: RateLimitConfig,
    pub reservation: ReservationRules,
    pub catalog: CatalogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
}

/// Bookings fall back to process memory when `url` is unset.
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
            acquire_timeout_seconds: default_acquire_timeout(),
        }
    }
}

fn default_max_connections() -> u32 {
    5
}

fn default_acquire_timeout() -> u64 {
    3
}

/// Rate limiting is disabled when `url` is unset.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct RedisConfig {
    pub url: Option<String>,
}

/// Notifications are only logged when `brokers` is unset.
#[derive(Debug, Deserialize, Clone)]
pub struct KafkaConfig {
    pub brokers: Option<String>,
    #[serde(default = "default_notification_topic")]
    pub notification_topic: String,
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            brokers: None,
            notification_topic: default_notification_topic(),
        }
    }
}

fn default_notification_topic() -> String {
    "booking.notifications".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitConfig {
    pub requests: i64,
    pub window_seconds: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReservationRules {
    pub default_hold_ttl_seconds: u64,
    pub max_hold_ttl_seconds: u64,
    pub max_seats_per_hold: usize,
    pub sweep_interval_seconds: u64,
}

impl ReservationRules {
    pub fn default_hold_ttl(&self) -> Duration {
        Duration::from_secs(self.default_hold_ttl_seconds)
    }

    pub fn max_hold_ttl(&self) -> Duration {
        Duration::from_secs(self.max_hold_ttl_seconds)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds.max(1))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    pub rows: u8,
    pub seats_per_row: u16,
    pub days_ahead: u32,
    pub currency: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // optional per-environment overrides
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `MARQUEE__SERVER__PORT=8080`
            .add_source(config::Environment::with_prefix("MARQUEE").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    pub fn from_toml(toml: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}
