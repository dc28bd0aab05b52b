use async_trait::async_trait;
use marquee_core::{Booking, BookingId, BookingStore, CollaboratorError};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Booking store kept in process memory. Used when no database is configured.
#[derive(Default)]
pub struct InMemoryBookingStore {
    bookings: RwLock<HashMap<BookingId, Booking>>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.bookings.read().await.len()
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn persist(&self, booking: &Booking) -> Result<(), CollaboratorError> {
        self.bookings.write().await.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn get(&self, id: BookingId) -> Result<Option<Booking>, CollaboratorError> {
        Ok(self.bookings.read().await.get(&id).cloned())
    }

    async fn list_for_holder(&self, holder: &str) -> Result<Vec<Booking>, CollaboratorError> {
        let bookings = self.bookings.read().await;
        let mut list: Vec<Booking> = bookings.values().filter(|b| b.holder == holder).cloned().collect();
        list.sort_by_key(|b| b.committed_at);
        Ok(list)
    }
}
