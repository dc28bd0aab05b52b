use async_trait::async_trait;
use chrono::{DateTime, Utc};
use marquee_core::{
    Booking, BookingId, BookingStore, CollaboratorError, HoldId, Money, SeatLabel, ShowtimeId,
};
use sqlx::PgPool;
use uuid::Uuid;

pub struct PgBookingStore {
    pool: PgPool,
}

impl PgBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    hold_id: Uuid,
    showtime_id: Uuid,
    seats: Vec<String>,
    tickets: i32,
    holder: String,
    price_amount: i64,
    currency: String,
    committed_at: DateTime<Utc>,
}

impl From<BookingRow> for Booking {
    fn from(row: BookingRow) -> Self {
        Booking {
            id: BookingId(row.id),
            hold_id: HoldId(row.hold_id),
            showtime_id: ShowtimeId(row.showtime_id),
            seats: row.seats.into_iter().map(SeatLabel).collect(),
            tickets: row.tickets.max(0) as u32,
            holder: row.holder,
            price: Money::new(row.price_amount, row.currency),
            committed_at: row.committed_at,
        }
    }
}

/// Pool exhaustion and I/O are worth another try; everything else is not.
fn classify(e: sqlx::Error) -> CollaboratorError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            CollaboratorError::Transient(e.to_string())
        }
        other => CollaboratorError::Permanent(other.to_string()),
    }
}

const SELECT_BOOKING: &str = r#"
    SELECT id, hold_id, showtime_id, seats, tickets, holder, price_amount, currency, committed_at
    FROM bookings
"#;

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn persist(&self, booking: &Booking) -> Result<(), CollaboratorError> {
        let seats: Vec<String> = booking.seats.iter().map(|s| s.0.clone()).collect();

        // a booking is immutable; replaying the same one is a no-op
        sqlx::query(
            r#"
            INSERT INTO bookings
                (id, hold_id, showtime_id, seats, tickets, holder, price_amount, currency, committed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(booking.id.0)
        .bind(booking.hold_id.0)
        .bind(booking.showtime_id.0)
        .bind(&seats)
        .bind(booking.tickets as i32)
        .bind(&booking.holder)
        .bind(booking.price.amount)
        .bind(&booking.price.currency)
        .bind(booking.committed_at)
        .execute(&self.pool)
        .await
        .map_err(classify)?;

        Ok(())
    }

    async fn get(&self, id: BookingId) -> Result<Option<Booking>, CollaboratorError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!("{} WHERE id = $1", SELECT_BOOKING))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(classify)?;

        Ok(row.map(Booking::from))
    }

    async fn list_for_holder(&self, holder: &str) -> Result<Vec<Booking>, CollaboratorError> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "{} WHERE holder = $1 ORDER BY committed_at",
            SELECT_BOOKING
        ))
        .bind(holder)
        .fetch_all(&self.pool)
        .await
        .map_err(classify)?;

        Ok(rows.into_iter().map(Booking::from).collect())
    }
}
