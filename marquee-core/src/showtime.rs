use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::reservation::{BookingId, HoldId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShowtimeId(pub Uuid);

impl ShowtimeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ShowtimeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ShowtimeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Seat label such as `A1`, unique within one showtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeatLabel(pub String);

impl SeatLabel {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SeatLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SeatLabel {
    fn from(label: &str) -> Self {
        Self(label.to_string())
    }
}

impl From<String> for SeatLabel {
    fn from(label: String) -> Self {
        Self(label)
    }
}

pub(crate) fn join_labels(seats: &[SeatLabel]) -> String {
    seats.iter().map(SeatLabel::as_str).collect::<Vec<_>>().join(", ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "owner", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatState {
    Free,
    Held(HoldId),
    Booked(BookingId),
}

/// Amount in minor currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub amount: i64,
    pub currency: String,
}

impl Money {
    pub fn new(amount: i64, currency: impl Into<String>) -> Self {
        Self { amount, currency: currency.into() }
    }

    pub fn times(&self, quantity: u32) -> Self {
        Self {
            amount: self.amount * i64::from(quantity),
            currency: self.currency.clone(),
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}.{:02}", self.currency, self.amount / 100, self.amount % 100)
    }
}

/// Rectangular auditorium: rows lettered from `A`, seats numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatLayout {
    pub rows: u8,
    pub seats_per_row: u16,
}

impl SeatLayout {
    pub const MAX_ROWS: u8 = 26;

    pub fn labels(&self) -> Vec<SeatLabel> {
        let rows = self.rows.min(Self::MAX_ROWS);
        (0..rows)
            .flat_map(|row| {
                let letter = char::from(b'A' + row);
                (1..=self.seats_per_row).map(move |n| SeatLabel(format!("{}{}", letter, n)))
            })
            .collect()
    }

    pub fn capacity(&self) -> usize {
        usize::from(self.rows.min(Self::MAX_ROWS)) * usize::from(self.seats_per_row)
    }
}

/// A scheduled screening. Immutable once scheduled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Showtime {
    pub id: ShowtimeId,
    pub movie_id: String,
    pub movie_title: String,
    pub theatre: String,
    pub date: NaiveDate,
    pub time: String,
    pub ticket_price: Money,
    pub layout: SeatLayout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_labels() {
        let layout = SeatLayout { rows: 2, seats_per_row: 3 };
        let labels: Vec<String> = layout.labels().into_iter().map(|l| l.0).collect();
        assert_eq!(labels, vec!["A1", "A2", "A3", "B1", "B2", "B3"]);
        assert_eq!(layout.capacity(), 6);
    }

    #[test]
    fn test_layout_rows_capped_at_z() {
        let layout = SeatLayout { rows: 40, seats_per_row: 1 };
        let labels = layout.labels();
        assert_eq!(labels.len(), 26);
        assert_eq!(labels.last().unwrap().as_str(), "Z1");
    }

    #[test]
    fn test_money_times_and_display() {
        let price = Money::new(18000, "INR");
        let total = price.times(3);
        assert_eq!(total.amount, 54000);
        assert_eq!(total.to_string(), "INR 540.00");
    }

    #[test]
    fn test_seat_state_serialization() {
        let hold_id = HoldId::new();
        let json = serde_json::to_value(SeatState::Held(hold_id)).unwrap();
        assert_eq!(json["state"], "HELD");
        assert_eq!(json["owner"], hold_id.to_string());
    }
}
