use async_trait::async_trait;
use marquee_core::{Booking, CollaboratorError, NotificationSender, Showtime};
use marquee_shared::Masked;
use tracing::info;

/// Subject and body of the booking confirmation sent to the holder.
pub fn booking_confirmation(booking: &Booking, showtime: &Showtime) -> (String, String) {
    let subject = format!("🎟 Booking Confirmed: {}", showtime.movie_title);
    let seats = booking
        .seats
        .iter()
        .map(|seat| seat.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let body = format!(
        "Hi {}, your booking for '{}' at {} on {} is confirmed.\nTheatre: {}\nSeats: {}\nTickets: {}\nPrice: {}",
        booking.holder,
        showtime.movie_title,
        showtime.time,
        showtime.date,
        showtime.theatre,
        seats,
        booking.tickets,
        booking.price,
    );
    (subject, body)
}

/// Notifier that only logs; used when no message broker is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotificationSender;

#[async_trait]
impl NotificationSender for TracingNotificationSender {
    async fn notify(
        &self,
        recipient: &str,
        subject: &str,
        _body: &str,
    ) -> Result<(), CollaboratorError> {
        info!("Notification for {}: {}", Masked(recipient), subject);
        Ok(())
    }
}
