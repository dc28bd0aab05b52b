pub mod showtime;
pub mod reservation;
pub mod repository;
pub mod clock;

pub use clock::{Clock, ManualClock, SystemClock};
pub use repository::{BookingStore, CatalogService, NotificationSender};
pub use reservation::{Booking, BookingId, Hold, HoldId};
pub use showtime::{Money, SeatLabel, SeatLayout, SeatState, Showtime, ShowtimeId};

/// Failure reported by an external collaborator (catalog, booking store, notifier).
#[derive(Debug, Clone, thiserror::Error)]
pub enum CollaboratorError {
    #[error("Transient collaborator failure: {0}")]
    Transient(String),
    #[error("Collaborator failure: {0}")]
    Permanent(String),
}

impl CollaboratorError {
    pub fn is_transient(&self) -> bool {
        matches!(self, CollaboratorError::Transient(_))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReservationError {
    #[error("Showtime not found: {0}")]
    ShowtimeNotFound(ShowtimeId),

    #[error("Seats unavailable: {}", showtime::join_labels(.seats))]
    SeatUnavailable { seats: Vec<SeatLabel> },

    #[error("Unknown seats: {}", showtime::join_labels(.seats))]
    UnknownSeat { seats: Vec<SeatLabel> },

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("Hold not found: {0}")]
    HoldNotFound(HoldId),

    #[error("Hold expired: {0}")]
    HoldExpired(HoldId),

    /// Seat map and ledger disagree. Never retried.
    #[error("Seat map disagrees with ledger for hold {hold_id}: {detail}")]
    HoldMismatch { hold_id: HoldId, detail: String },

    #[error("Catalog unavailable: {0}")]
    Catalog(#[source] CollaboratorError),

    /// The seats are booked; only the booking record failed to persist.
    #[error("Booking committed but not persisted: {reason}")]
    PersistenceDegraded { booking: Box<Booking>, reason: String },
}

pub type ReservationResult<T> = Result<T, ReservationError>;
