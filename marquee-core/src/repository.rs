use async_trait::async_trait;

use crate::reservation::{Booking, BookingId};
use crate::showtime::{Showtime, ShowtimeId};
use crate::CollaboratorError;

/// Read-only access to scheduled showtimes.
#[async_trait]
pub trait CatalogService: Send + Sync {
    async fn get_showtime(&self, id: ShowtimeId) -> Result<Option<Showtime>, CollaboratorError>;

    async fn list_showtimes(&self) -> Result<Vec<Showtime>, CollaboratorError>;
}

/// Durable record of committed bookings.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn persist(&self, booking: &Booking) -> Result<(), CollaboratorError>;

    async fn get(&self, id: BookingId) -> Result<Option<Booking>, CollaboratorError>;

    async fn list_for_holder(&self, holder: &str) -> Result<Vec<Booking>, CollaboratorError>;
}

/// Outbound, best-effort notification channel.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn notify(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), CollaboratorError>;
}
