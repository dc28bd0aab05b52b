use chrono::{DateTime, Duration, Utc};
use marquee_core::{Clock, Hold, HoldId, SeatLabel, ShowtimeId};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

/// Table of active holds keyed by hold id, with a per-showtime expiry index.
///
/// The ledger never looks at seat state. Callers that pair a ledger write with a seat
/// transition do both under the showtime's lock; the internal mutex only keeps the two
/// tables consistent with each other and is never held across an `.await`.
pub struct Ledger {
    clock: Arc<dyn Clock>,
    tables: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    holds: HashMap<HoldId, Hold>,
    by_expiry: BTreeMap<ShowtimeId, BTreeSet<(DateTime<Utc>, HoldId)>>,
}

impl Ledger {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            tables: Mutex::new(Tables::default()),
        }
    }

    /// Records a new hold expiring `ttl` from now.
    pub fn create(
        &self,
        showtime_id: ShowtimeId,
        seats: BTreeSet<SeatLabel>,
        holder: &str,
        ttl: Duration,
    ) -> Hold {
        let now = self.clock.now();
        let hold = Hold {
            id: HoldId::new(),
            showtime_id,
            seats,
            holder: holder.to_string(),
            created_at: now,
            expires_at: now + ttl,
        };

        let mut tables = self.lock();
        tables
            .by_expiry
            .entry(showtime_id)
            .or_default()
            .insert((hold.expires_at, hold.id));
        tables.holds.insert(hold.id, hold.clone());
        hold
    }

    pub fn get(&self, hold_id: HoldId) -> Option<Hold> {
        self.lock().holds.get(&hold_id).cloned()
    }

    /// Idempotent; returns the hold if it was still present.
    pub fn remove(&self, hold_id: HoldId) -> Option<Hold> {
        let mut tables = self.lock();
        let hold = tables.holds.remove(&hold_id)?;

        if let Some(index) = tables.by_expiry.get_mut(&hold.showtime_id) {
            index.remove(&(hold.expires_at, hold.id));
            if index.is_empty() {
                tables.by_expiry.remove(&hold.showtime_id);
            }
        }
        Some(hold)
    }

    /// Holds with `expires_at <= now`, grouped by showtime, earliest first.
    pub fn expired(&self, now: DateTime<Utc>) -> Vec<(ShowtimeId, HoldId)> {
        let tables = self.lock();
        tables
            .by_expiry
            .iter()
            .flat_map(|(showtime_id, index)| {
                index
                    .iter()
                    .take_while(move |(expires_at, _)| *expires_at <= now)
                    .map(move |(_, hold_id)| (*showtime_id, *hold_id))
            })
            .collect()
    }

    pub fn holds_for(&self, showtime_id: ShowtimeId) -> Vec<Hold> {
        let tables = self.lock();
        tables
            .by_expiry
            .get(&showtime_id)
            .map(|index| {
                index
                    .iter()
                    .filter_map(|(_, hold_id)| tables.holds.get(hold_id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn active_count(&self) -> usize {
        self.lock().holds.len()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }
}
