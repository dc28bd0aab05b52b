pub mod models;
pub mod pii;

pub use models::events::{NotificationMessage, SeatEvent, SeatEventKind};
pub use pii::Masked;
