use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatEventKind {
    Held,
    Booked,
    Released,
}

impl SeatEventKind {
    /// SSE event name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SeatEventKind::Held => "seat_held",
            SeatEventKind::Booked => "seat_booked",
            SeatEventKind::Released => "seat_released",
        }
    }
}

/// Broadcast on every seat transition of a showtime.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct SeatEvent {
    pub showtime_id: Uuid,
    pub seats: Vec<String>,
    pub kind: SeatEventKind,
    pub hold_id: Uuid,
    pub at: i64,
}

/// Payload published to the notification topic.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct NotificationMessage {
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub timestamp: i64,
}
