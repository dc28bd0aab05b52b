use anyhow::Context;
use chrono::Utc;
use marquee_api::{app, AppState, AuthConfig};
use marquee_catalog::InMemoryCatalog;
use marquee_core::{BookingStore, NotificationSender, SeatLayout, SystemClock};
use marquee_reservation::{
    CoordinatorSettings, ExpirySweeper, InMemoryBookingStore, ReservationCoordinator, RetryPolicy,
    TracingNotificationSender,
};
use marquee_store::app_config::Config;
use marquee_store::{database, KafkaNotificationSender, RedisRateLimiter};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "marquee_api=debug,marquee_reservation=debug,tower_http=debug,axum::rejection=trace".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Marquee API on port {}", config.server.port);

    let layout = SeatLayout {
        rows: config.catalog.rows,
        seats_per_row: config.catalog.seats_per_row,
    };
    let catalog = Arc::new(
        InMemoryCatalog::seeded(layout, Utc::now().date_naive(), config.catalog.days_ahead, &config.catalog.currency)
            .context("Failed to load seed catalog")?,
    );
    tracing::info!("Catalog loaded with {} showtimes", catalog.len());

    let bookings: Arc<dyn BookingStore> = match config.database.url.as_deref() {
        Some(url) => Arc::new(
            database::booking_store(url, &config.database)
                .await
                .context("Failed to set up Postgres booking store")?,
        ),
        None => {
            tracing::warn!("No database configured, bookings are kept in memory");
            Arc::new(InMemoryBookingStore::new())
        }
    };

    let notifier: Arc<dyn NotificationSender> = match config.kafka.brokers.as_deref() {
        Some(brokers) => Arc::new(
            KafkaNotificationSender::new(brokers, config.kafka.notification_topic.clone())
                .context("Failed to create Kafka producer")?,
        ),
        None => {
            tracing::warn!("No Kafka brokers configured, notifications are only logged");
            Arc::new(TracingNotificationSender)
        }
    };

    let rate_limiter = match config.redis.url.as_deref() {
        Some(url) => Some(Arc::new(
            RedisRateLimiter::new(url, &config.rate_limit).context("Invalid Redis URL")?,
        )),
        None => {
            tracing::warn!("No Redis configured, rate limiting disabled");
            None
        }
    };

    let coordinator = Arc::new(ReservationCoordinator::new(
        catalog.clone(),
        bookings.clone(),
        notifier,
        Arc::new(SystemClock),
        CoordinatorSettings {
            max_seats_per_hold: config.reservation.max_seats_per_hold,
            max_hold_ttl: config.reservation.max_hold_ttl(),
            catalog_retry: RetryPolicy::default(),
        },
    ));

    let (sweeper, sweeper_shutdown) =
        ExpirySweeper::new(coordinator.clone(), config.reservation.sweep_interval());
    let sweeper_handle = sweeper.spawn();

    let app_state = AppState {
        coordinator,
        catalog,
        bookings,
        rate_limiter,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
        default_hold_ttl: config.reservation.default_hold_ttl(),
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(app_state).into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = sweeper_shutdown.send(true);
    sweeper_handle.await?;
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
