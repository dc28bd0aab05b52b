pub mod ledger;
pub mod coordinator;
pub mod sweeper;
pub mod retry;
pub mod notice;
pub mod bookings;

pub use bookings::InMemoryBookingStore;
pub use coordinator::{Availability, CoordinatorSettings, ReservationCoordinator, SweepReport};
pub use ledger::Ledger;
pub use notice::TracingNotificationSender;
pub use retry::RetryPolicy;
pub use sweeper::ExpirySweeper;
