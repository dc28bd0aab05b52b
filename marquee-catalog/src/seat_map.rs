use marquee_core::{
    BookingId, HoldId, ReservationError, ReservationResult, SeatLabel, SeatState, Showtime,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Seat states of one showtime.
///
/// A `SeatMap` has no locking of its own; callers serialize access to it through the
/// per-showtime lock that owns it.
#[derive(Debug, Clone)]
pub struct SeatMap {
    showtime: Showtime,
    seats: BTreeMap<SeatLabel, SeatState>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatMapSummary {
    pub capacity: usize,
    pub free: usize,
    pub held: usize,
    pub booked: usize,
}

impl SeatMapSummary {
    /// Share of seats that are held or booked.
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        1.0 - (self.free as f64 / self.capacity as f64)
    }
}

impl SeatMap {
    /// Every seat of the showtime's layout starts out free.
    pub fn new(showtime: Showtime) -> Self {
        let seats = showtime
            .layout
            .labels()
            .into_iter()
            .map(|label| (label, SeatState::Free))
            .collect();
        Self { showtime, seats }
    }

    pub fn showtime(&self) -> &Showtime {
        &self.showtime
    }

    pub fn state(&self, seat: &SeatLabel) -> Option<SeatState> {
        self.seats.get(seat).copied()
    }

    /// Free seat labels, in label order.
    pub fn available(&self) -> BTreeSet<SeatLabel> {
        self.seats
            .iter()
            .filter(|(_, state)| **state == SeatState::Free)
            .map(|(label, _)| label.clone())
            .collect()
    }

    /// Free -> Held for every seat, or no change at all.
    pub fn mark_held(&mut self, seats: &BTreeSet<SeatLabel>, hold_id: HoldId) -> ReservationResult<()> {
        self.ensure_known(seats)?;

        let taken: Vec<SeatLabel> = seats
            .iter()
            .filter(|seat| self.seats.get(*seat) != Some(&SeatState::Free))
            .cloned()
            .collect();
        if !taken.is_empty() {
            return Err(ReservationError::SeatUnavailable { seats: taken });
        }

        for seat in seats {
            self.seats.insert(seat.clone(), SeatState::Held(hold_id));
        }
        Ok(())
    }

    /// Held(hold_id) -> Booked for every seat, or no change at all.
    pub fn mark_booked(
        &mut self,
        seats: &BTreeSet<SeatLabel>,
        hold_id: HoldId,
        booking_id: BookingId,
    ) -> ReservationResult<()> {
        let mismatched: Vec<String> = seats
            .iter()
            .filter(|seat| self.seats.get(*seat) != Some(&SeatState::Held(hold_id)))
            .map(|seat| match self.seats.get(seat) {
                Some(state) => format!("{} is {:?}", seat, state),
                None => format!("{} does not exist", seat),
            })
            .collect();
        if !mismatched.is_empty() {
            return Err(ReservationError::HoldMismatch {
                hold_id,
                detail: mismatched.join("; "),
            });
        }

        for seat in seats {
            self.seats.insert(seat.clone(), SeatState::Booked(booking_id));
        }
        Ok(())
    }

    /// Held(hold_id) -> Free. Seats in any other state are left alone; returns how many
    /// seats were actually released.
    pub fn release(&mut self, seats: &BTreeSet<SeatLabel>, hold_id: HoldId) -> usize {
        let mut released = 0;
        for seat in seats {
            if let Some(state) = self.seats.get_mut(seat) {
                if *state == SeatState::Held(hold_id) {
                    *state = SeatState::Free;
                    released += 1;
                }
            }
        }
        released
    }

    pub fn summary(&self) -> SeatMapSummary {
        let mut summary = SeatMapSummary {
            capacity: self.seats.len(),
            free: 0,
            held: 0,
            booked: 0,
        };
        for state in self.seats.values() {
            match state {
                SeatState::Free => summary.free += 1,
                SeatState::Held(_) => summary.held += 1,
                SeatState::Booked(_) => summary.booked += 1,
            }
        }
        summary
    }

    fn ensure_known(&self, seats: &BTreeSet<SeatLabel>) -> ReservationResult<()> {
        let unknown: Vec<SeatLabel> = seats
            .iter()
            .filter(|seat| !self.seats.contains_key(*seat))
            .cloned()
            .collect();
        if unknown.is_empty() {
            Ok(())
        } else {
            Err(ReservationError::UnknownSeat { seats: unknown })
        }
    }
}
