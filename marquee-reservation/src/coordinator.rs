use marquee_catalog::{SeatMap, SeatMapSummary};
use marquee_core::{
    Booking, BookingId, BookingStore, CatalogService, Clock, Hold, HoldId, NotificationSender,
    ReservationError, ReservationResult, SeatLabel, Showtime, ShowtimeId,
};
use marquee_shared::{Masked, SeatEvent, SeatEventKind};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::ledger::Ledger;
use crate::notice::booking_confirmation;
use crate::retry::{retry_with_backoff, RetryPolicy};

const SEAT_EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct CoordinatorSettings {
    pub max_seats_per_hold: usize,
    pub max_hold_ttl: Duration,
    pub catalog_retry: RetryPolicy,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            max_seats_per_hold: 10,
            max_hold_ttl: Duration::from_secs(30 * 60),
            catalog_retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Availability {
    pub showtime: Showtime,
    pub free: BTreeSet<SeatLabel>,
    pub summary: SeatMapSummary,
    /// Live holds on the showtime, earliest expiry first.
    pub holds: Vec<Hold>,
}

/// Outcome of one sweep cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub reclaimed: usize,
    /// Already confirmed or cancelled by the time the showtime lock was taken.
    pub skipped: usize,
    /// Left in the ledger for the next cycle.
    pub failed: usize,
}

/// Entry point for seat selection, confirmation and cancellation.
///
/// Each showtime's seat map sits behind its own mutex; that mutex also covers the ledger
/// entries of the showtime whenever they change together with seat state. Collaborator
/// I/O (catalog, booking store, notifier) never happens while it is held.
pub struct ReservationCoordinator {
    catalog: Arc<dyn CatalogService>,
    bookings: Arc<dyn BookingStore>,
    notifier: Arc<dyn NotificationSender>,
    clock: Arc<dyn Clock>,
    ledger: Ledger,
    seat_maps: RwLock<HashMap<ShowtimeId, Arc<Mutex<SeatMap>>>>,
    events: broadcast::Sender<SeatEvent>,
    settings: CoordinatorSettings,
}

impl ReservationCoordinator {
    pub fn new(
        catalog: Arc<dyn CatalogService>,
        bookings: Arc<dyn BookingStore>,
        notifier: Arc<dyn NotificationSender>,
        clock: Arc<dyn Clock>,
        settings: CoordinatorSettings,
    ) -> Self {
        let (events, _) = broadcast::channel(SEAT_EVENT_CAPACITY);
        Self {
            catalog,
            bookings,
            notifier,
            ledger: Ledger::new(clock.clone()),
            clock,
            seat_maps: RwLock::new(HashMap::new()),
            events,
            settings,
        }
    }

    /// Seat transitions as they happen. Slow subscribers lose events.
    pub fn subscribe(&self) -> broadcast::Receiver<SeatEvent> {
        self.events.subscribe()
    }

    /// Lock-free lookup of an active hold.
    pub fn hold(&self, hold_id: HoldId) -> Option<Hold> {
        self.ledger.get(hold_id)
    }

    pub fn active_holds(&self) -> usize {
        self.ledger.active_count()
    }

    /// Free seats, read under the showtime lock.
    pub async fn query_availability(&self, showtime_id: ShowtimeId) -> ReservationResult<BTreeSet<SeatLabel>> {
        let map = self.seat_map(showtime_id).await?;
        let map = map.lock().await;
        Ok(map.available())
    }

    /// Showtime, free seats, counts and live holds, all read under the showtime lock.
    pub async fn availability(&self, showtime_id: ShowtimeId) -> ReservationResult<Availability> {
        let map = self.seat_map(showtime_id).await?;
        let map = map.lock().await;
        Ok(Availability {
            showtime: map.showtime().clone(),
            free: map.available(),
            summary: map.summary(),
            holds: self.ledger.holds_for(showtime_id),
        })
    }

    /// Places a hold on `seats` for `holder`. Fails with `SeatUnavailable` if any seat is
    /// not free; the caller picks again, nothing is retried here.
    pub async fn select_seats(
        &self,
        showtime_id: ShowtimeId,
        seats: Vec<SeatLabel>,
        holder: &str,
        ttl: Duration,
    ) -> ReservationResult<Hold> {
        let (seats, ttl) = self.validate_selection(seats, holder, ttl)?;
        let map = self.seat_map(showtime_id).await?;

        let hold = {
            let mut map = map.lock().await;
            let hold = self.ledger.create(showtime_id, seats, holder, ttl);
            if let Err(e) = map.mark_held(&hold.seats, hold.id) {
                self.ledger.remove(hold.id);
                debug!("Seat selection rejected for showtime {}: {}", showtime_id, e);
                return Err(e);
            }
            hold
        };

        info!(
            "Hold {} placed on showtime {} for {} ({} seats, expires {})",
            hold.id,
            showtime_id,
            Masked(holder),
            hold.seats.len(),
            hold.expires_at
        );
        self.publish(&hold, SeatEventKind::Held);
        Ok(hold)
    }

    /// Turns a live hold into a booking.
    ///
    /// The seats are committed before the booking is persisted. If persistence fails the
    /// seats stay booked and `PersistenceDegraded` carries the booking back to the caller.
    /// The confirmation notice is dispatched in the background either way.
    pub async fn confirm(&self, hold_id: HoldId) -> ReservationResult<Booking> {
        let hold = self.ledger.get(hold_id).ok_or(ReservationError::HoldNotFound(hold_id))?;
        if hold.is_expired(self.clock.now()) {
            return Err(ReservationError::HoldExpired(hold_id));
        }
        let map = self.seat_map(hold.showtime_id).await?;

        let (booking, showtime) = {
            let mut map = map.lock().await;
            // cancel or sweep may have won the race for the lock
            let hold = self.ledger.get(hold_id).ok_or(ReservationError::HoldNotFound(hold_id))?;
            let now = self.clock.now();
            if hold.is_expired(now) {
                return Err(ReservationError::HoldExpired(hold_id));
            }

            let booking_id = BookingId::new();
            if let Err(e) = map.mark_booked(&hold.seats, hold_id, booking_id) {
                error!("Consistency violation while confirming hold {}: {}", hold_id, e);
                return Err(e);
            }
            self.ledger.remove(hold_id);

            let tickets = hold.seats.len() as u32;
            let booking = Booking {
                id: booking_id,
                hold_id,
                showtime_id: hold.showtime_id,
                price: map.showtime().ticket_price.times(tickets),
                seats: hold.seats,
                tickets,
                holder: hold.holder,
                committed_at: now,
            };
            (booking, map.showtime().clone())
        };

        info!("Hold {} confirmed as booking {}", hold_id, booking.id);
        let _ = self.events.send(SeatEvent {
            showtime_id: booking.showtime_id.0,
            seats: booking.seats.iter().map(|s| s.0.clone()).collect(),
            kind: SeatEventKind::Booked,
            hold_id: hold_id.0,
            at: self.clock.now().timestamp(),
        });

        let persisted = self.bookings.persist(&booking).await;
        self.dispatch_confirmation(&booking, &showtime);

        match persisted {
            Ok(()) => Ok(booking),
            Err(e) => {
                warn!("Booking {} committed but could not be persisted: {}", booking.id, e);
                Err(ReservationError::PersistenceDegraded {
                    booking: Box::new(booking),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Releases a hold's seats. Idempotent with respect to sweeps and other cancels: the
    /// loser of a race sees `HoldNotFound`.
    pub async fn cancel(&self, hold_id: HoldId) -> ReservationResult<Hold> {
        let hold = self.ledger.get(hold_id).ok_or(ReservationError::HoldNotFound(hold_id))?;
        let map = self.seat_map(hold.showtime_id).await?;

        let hold = {
            let mut map = map.lock().await;
            let hold = self.ledger.get(hold_id).ok_or(ReservationError::HoldNotFound(hold_id))?;
            map.release(&hold.seats, hold_id);
            self.ledger.remove(hold_id);
            hold
        };

        info!("Hold {} cancelled, {} seats released", hold_id, hold.seats.len());
        self.publish(&hold, SeatEventKind::Released);
        Ok(hold)
    }

    /// Reclaims every hold whose expiry has passed.
    ///
    /// Each hold is re-checked under its showtime's lock, so a hold confirmed or cancelled
    /// in the meantime is skipped rather than released twice. A showtime whose lock is busy
    /// is not waited on; its holds count as `failed` and are picked up by the next sweep.
    pub async fn sweep_once(&self) -> SweepReport {
        let now = self.clock.now();
        let mut report = SweepReport::default();

        for (showtime_id, hold_id) in self.ledger.expired(now) {
            let map = self.seat_maps.read().await.get(&showtime_id).cloned();
            let Some(map) = map else {
                error!("No seat map for showtime {} while sweeping hold {}", showtime_id, hold_id);
                report.failed += 1;
                continue;
            };

            let reclaimed = {
                let Ok(mut map) = map.try_lock() else {
                    debug!("Showtime {} busy, hold {} deferred to next sweep", showtime_id, hold_id);
                    report.failed += 1;
                    continue;
                };
                match self.ledger.get(hold_id) {
                    Some(hold) if hold.is_expired(now) => {
                        map.release(&hold.seats, hold_id);
                        self.ledger.remove(hold_id);
                        Some(hold)
                    }
                    _ => None,
                }
            };

            match reclaimed {
                Some(hold) => {
                    debug!("Hold {} expired, {} seats returned", hold_id, hold.seats.len());
                    report.reclaimed += 1;
                    self.publish(&hold, SeatEventKind::Released);
                }
                None => report.skipped += 1,
            }
        }

        report
    }

    /// Registered seat map for the showtime, materialized from the catalog on first use.
    async fn seat_map(&self, showtime_id: ShowtimeId) -> ReservationResult<Arc<Mutex<SeatMap>>> {
        if let Some(map) = self.seat_maps.read().await.get(&showtime_id) {
            return Ok(map.clone());
        }

        let showtime = retry_with_backoff(&self.settings.catalog_retry, || {
            self.catalog.get_showtime(showtime_id)
        })
        .await
        .map_err(ReservationError::Catalog)?
        .ok_or(ReservationError::ShowtimeNotFound(showtime_id))?;

        let mut maps = self.seat_maps.write().await;
        let map = maps
            .entry(showtime_id)
            .or_insert_with(|| {
                debug!("Seat map materialized for showtime {}", showtime_id);
                Arc::new(Mutex::new(SeatMap::new(showtime)))
            })
            .clone();
        Ok(map)
    }

    fn validate_selection(
        &self,
        seats: Vec<SeatLabel>,
        holder: &str,
        ttl: Duration,
    ) -> ReservationResult<(BTreeSet<SeatLabel>, chrono::Duration)> {
        if holder.trim().is_empty() {
            return Err(ReservationError::InvalidSelection("holder identity is required".into()));
        }
        if seats.is_empty() {
            return Err(ReservationError::InvalidSelection("no seats selected".into()));
        }
        if seats.len() > self.settings.max_seats_per_hold {
            return Err(ReservationError::InvalidSelection(format!(
                "at most {} seats per hold",
                self.settings.max_seats_per_hold
            )));
        }

        let count = seats.len();
        let unique: BTreeSet<SeatLabel> = seats.into_iter().collect();
        if unique.len() != count {
            return Err(ReservationError::InvalidSelection("duplicate seat in selection".into()));
        }

        if ttl.is_zero() || ttl > self.settings.max_hold_ttl {
            return Err(ReservationError::InvalidSelection(format!(
                "hold ttl must be between 1s and {}s",
                self.settings.max_hold_ttl.as_secs()
            )));
        }
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|_| ReservationError::InvalidSelection("hold ttl out of range".into()))?;

        Ok((unique, ttl))
    }

    fn publish(&self, hold: &Hold, kind: SeatEventKind) {
        // no subscribers is fine
        let _ = self.events.send(SeatEvent {
            showtime_id: hold.showtime_id.0,
            seats: hold.seats.iter().map(|s| s.0.clone()).collect(),
            kind,
            hold_id: hold.id.0,
            at: self.clock.now().timestamp(),
        });
    }

    /// Fire-and-forget: failures are logged and never reach the caller of `confirm`.
    fn dispatch_confirmation(&self, booking: &Booking, showtime: &Showtime) {
        let (subject, body) = booking_confirmation(booking, showtime);
        let recipient = booking.holder.clone();
        let booking_id = booking.id;
        let notifier = self.notifier.clone();

        tokio::spawn(async move {
            match notifier.notify(&recipient, &subject, &body).await {
                Ok(()) => debug!("Confirmation sent for booking {}", booking_id),
                Err(e) => warn!("Confirmation for booking {} not sent: {}", booking_id, e),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use marquee_catalog::InMemoryCatalog;
    use marquee_core::{CollaboratorError, ManualClock, Money, SeatLayout};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct RecordingStore {
        bookings: std::sync::Mutex<Vec<Booking>>,
        fail: bool,
    }

    #[async_trait]
    impl BookingStore for RecordingStore {
        async fn persist(&self, booking: &Booking) -> Result<(), CollaboratorError> {
            if self.fail {
                return Err(CollaboratorError::Transient("connection reset".into()));
            }
            self.bookings.lock().unwrap().push(booking.clone());
            Ok(())
        }

        async fn get(&self, id: BookingId) -> Result<Option<Booking>, CollaboratorError> {
            Ok(self.bookings.lock().unwrap().iter().find(|b| b.id == id).cloned())
        }

        async fn list_for_holder(&self, holder: &str) -> Result<Vec<Booking>, CollaboratorError> {
            Ok(self.bookings.lock().unwrap().iter().filter(|b| b.holder == holder).cloned().collect())
        }
    }

    #[derive(Default)]
    struct CountingNotifier {
        sent: AtomicUsize,
    }

    #[async_trait]
    impl NotificationSender for CountingNotifier {
        async fn notify(&self, _: &str, _: &str, _: &str) -> Result<(), CollaboratorError> {
            self.sent.fetch_add(1, Ordering::SeqCst);
            Err(CollaboratorError::Permanent("topic does not exist".into()))
        }
    }

    struct Fixture {
        coordinator: ReservationCoordinator,
        clock: Arc<ManualClock>,
        store: Arc<RecordingStore>,
        notifier: Arc<CountingNotifier>,
        catalog: Arc<InMemoryCatalog>,
        showtime_id: ShowtimeId,
    }

    fn showtime() -> Showtime {
        Showtime {
            id: ShowtimeId::new(),
            movie_id: "9".to_string(),
            movie_title: "Kannappa".to_string(),
            theatre: "Sri Lakshmi Theatre, Kavali".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
            time: "4:00 PM".to_string(),
            ticket_price: Money::new(30000, "INR"),
            layout: SeatLayout { rows: 1, seats_per_row: 3 },
        }
    }

    fn fixture_with(store: RecordingStore) -> Fixture {
        let catalog = Arc::new(InMemoryCatalog::new());
        let showtime = showtime();
        let showtime_id = showtime.id;
        catalog.insert(showtime);

        let clock = Arc::new(ManualClock::default());
        let store = Arc::new(store);
        let notifier = Arc::new(CountingNotifier::default());
        let coordinator = ReservationCoordinator::new(
            catalog.clone(),
            store.clone(),
            notifier.clone(),
            clock.clone(),
            CoordinatorSettings::default(),
        );
        Fixture { coordinator, clock, store, notifier, catalog, showtime_id }
    }

    fn fixture() -> Fixture {
        fixture_with(RecordingStore::default())
    }

    fn labels(seats: &[&str]) -> Vec<SeatLabel> {
        seats.iter().map(|s| SeatLabel::from(*s)).collect()
    }

    fn set(seats: &[&str]) -> BTreeSet<SeatLabel> {
        labels(seats).into_iter().collect()
    }

    const MINUTE: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn test_select_confirm_scenario() {
        let f = fixture();
        let c = &f.coordinator;

        let h1 = c.select_seats(f.showtime_id, labels(&["A1", "A2"]), "alice", MINUTE).await.unwrap();
        assert_eq!(h1.seats, set(&["A1", "A2"]));

        let err = c.select_seats(f.showtime_id, labels(&["A2", "A3"]), "bob", MINUTE).await.unwrap_err();
        match err {
            ReservationError::SeatUnavailable { seats } => assert_eq!(seats, labels(&["A2"])),
            other => panic!("unexpected error: {:?}", other),
        }

        let booking = c.confirm(h1.id).await.unwrap();
        assert_eq!(booking.seats, set(&["A1", "A2"]));
        assert_eq!(booking.tickets, 2);
        assert_eq!(booking.price, Money::new(60000, "INR"));
        assert_eq!(booking.holder, "alice");

        assert_eq!(c.query_availability(f.showtime_id).await.unwrap(), set(&["A3"]));
        assert_eq!(f.store.get(booking.id).await.unwrap(), Some(booking));
    }

    #[tokio::test]
    async fn test_confirm_twice_reports_not_found() {
        let f = fixture();
        let hold = f.coordinator.select_seats(f.showtime_id, labels(&["A1"]), "alice", MINUTE).await.unwrap();

        f.coordinator.confirm(hold.id).await.unwrap();
        let err = f.coordinator.confirm(hold.id).await.unwrap_err();
        assert!(matches!(err, ReservationError::HoldNotFound(id) if id == hold.id));
    }

    #[tokio::test]
    async fn test_cancel_after_confirm_keeps_booking() {
        let f = fixture();
        let hold = f.coordinator.select_seats(f.showtime_id, labels(&["A1", "A2"]), "alice", MINUTE).await.unwrap();
        let booking = f.coordinator.confirm(hold.id).await.unwrap();

        let err = f.coordinator.cancel(hold.id).await.unwrap_err();
        assert!(matches!(err, ReservationError::HoldNotFound(_)));

        let summary = f.coordinator.availability(f.showtime_id).await.unwrap().summary;
        assert_eq!(summary.booked, booking.seats.len());
        assert_eq!(f.coordinator.query_availability(f.showtime_id).await.unwrap(), set(&["A3"]));
    }

    #[tokio::test]
    async fn test_cancel_releases_seats() {
        let f = fixture();
        let hold = f.coordinator.select_seats(f.showtime_id, labels(&["A3"]), "bob", MINUTE).await.unwrap();

        let released = f.coordinator.cancel(hold.id).await.unwrap();
        assert_eq!(released.id, hold.id);
        assert_eq!(f.coordinator.query_availability(f.showtime_id).await.unwrap().len(), 3);
        assert!(matches!(f.coordinator.cancel(hold.id).await, Err(ReservationError::HoldNotFound(_))));
        assert_eq!(f.coordinator.active_holds(), 0);
    }

    #[tokio::test]
    async fn test_expired_hold_cannot_be_confirmed_and_is_swept() {
        let f = fixture();
        let hold = f
            .coordinator
            .select_seats(f.showtime_id, labels(&["A1"]), "alice", Duration::from_secs(1))
            .await
            .unwrap();

        f.clock.advance(chrono::Duration::seconds(2));

        // lazy expiry, sweeper has not run
        let err = f.coordinator.confirm(hold.id).await.unwrap_err();
        assert!(matches!(err, ReservationError::HoldExpired(_)));
        assert!(!f.coordinator.query_availability(f.showtime_id).await.unwrap().contains(&SeatLabel::from("A1")));

        let report = f.coordinator.sweep_once().await;
        assert_eq!(report, SweepReport { reclaimed: 1, skipped: 0, failed: 0 });
        assert_eq!(f.coordinator.query_availability(f.showtime_id).await.unwrap().len(), 3);

        let err = f.coordinator.confirm(hold.id).await.unwrap_err();
        assert!(matches!(err, ReservationError::HoldNotFound(_)));
        assert_eq!(f.coordinator.sweep_once().await, SweepReport::default());
    }

    #[tokio::test]
    async fn test_sweep_leaves_live_holds() {
        let f = fixture();
        f.coordinator.select_seats(f.showtime_id, labels(&["A1"]), "alice", Duration::from_secs(1)).await.unwrap();
        let live = f.coordinator.select_seats(f.showtime_id, labels(&["A2"]), "bob", MINUTE).await.unwrap();

        f.clock.advance(chrono::Duration::seconds(5));
        let report = f.coordinator.sweep_once().await;
        assert_eq!(report.reclaimed, 1);
        assert!(f.coordinator.hold(live.id).is_some());
        assert_eq!(f.coordinator.query_availability(f.showtime_id).await.unwrap(), set(&["A1", "A3"]));
    }

    #[tokio::test]
    async fn test_persistence_failure_is_degraded_success() {
        let f = fixture_with(RecordingStore { fail: true, ..Default::default() });
        let hold = f.coordinator.select_seats(f.showtime_id, labels(&["A2"]), "alice", MINUTE).await.unwrap();

        let err = f.coordinator.confirm(hold.id).await.unwrap_err();
        let booking = match err {
            ReservationError::PersistenceDegraded { booking, .. } => booking,
            other => panic!("unexpected error: {:?}", other),
        };
        assert_eq!(booking.seats, set(&["A2"]));

        // the seat stays committed
        let summary = f.coordinator.availability(f.showtime_id).await.unwrap().summary;
        assert_eq!(summary.booked, 1);
        assert!(f.coordinator.hold(hold.id).is_none());
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_fail_confirm() {
        let f = fixture();
        let hold = f.coordinator.select_seats(f.showtime_id, labels(&["A1"]), "alice", MINUTE).await.unwrap();
        assert!(f.coordinator.confirm(hold.id).await.is_ok());

        for _ in 0..50 {
            if f.notifier.sent.load(Ordering::SeqCst) == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(f.notifier.sent.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_selections() {
        let f = fixture();
        let c = &f.coordinator;

        let cases = vec![
            (labels(&[]), "alice", MINUTE),
            (labels(&["A1", "A1"]), "alice", MINUTE),
            (labels(&["A1"]), " ", MINUTE),
            (labels(&["A1"]), "alice", Duration::ZERO),
            (labels(&["A1"]), "alice", Duration::from_secs(24 * 60 * 60)),
        ];
        for (seats, holder, ttl) in cases {
            let err = c.select_seats(f.showtime_id, seats, holder, ttl).await.unwrap_err();
            assert!(matches!(err, ReservationError::InvalidSelection(_)), "got {:?}", err);
        }

        let err = c.select_seats(f.showtime_id, labels(&["Q7"]), "alice", MINUTE).await.unwrap_err();
        assert!(matches!(err, ReservationError::UnknownSeat { .. }));
        assert_eq!(c.active_holds(), 0);
    }

    #[tokio::test]
    async fn test_unknown_showtime() {
        let f = fixture();
        let missing = ShowtimeId::new();
        let err = f.coordinator.query_availability(missing).await.unwrap_err();
        assert!(matches!(err, ReservationError::ShowtimeNotFound(id) if id == missing));
    }

    #[tokio::test]
    async fn test_seat_events_are_broadcast() {
        let f = fixture();
        let mut rx = f.coordinator.subscribe();

        let hold = f.coordinator.select_seats(f.showtime_id, labels(&["A1"]), "alice", MINUTE).await.unwrap();
        f.coordinator.cancel(hold.id).await.unwrap();

        let held = rx.recv().await.unwrap();
        assert_eq!(held.kind, SeatEventKind::Held);
        assert_eq!(held.hold_id, hold.id.0);
        let released = rx.recv().await.unwrap();
        assert_eq!(released.kind, SeatEventKind::Released);
        assert_eq!(released.seats, vec!["A1".to_string()]);
    }

    #[tokio::test]
    async fn test_busy_showtime_does_not_stall_sweep() {
        let f = fixture();
        let other = showtime();
        let other_id = other.id;
        f.catalog.insert(other);

        let ttl = Duration::from_secs(1);
        f.coordinator.select_seats(f.showtime_id, labels(&["A1"]), "alice", ttl).await.unwrap();
        let idle = f.coordinator.select_seats(other_id, labels(&["A2"]), "bob", ttl).await.unwrap();
        f.clock.advance(chrono::Duration::seconds(2));

        let busy = f.coordinator.seat_map(f.showtime_id).await.unwrap();
        let guard = busy.lock().await;

        let report = tokio::time::timeout(Duration::from_millis(300), f.coordinator.sweep_once())
            .await
            .expect("sweep waited on a busy showtime");
        assert_eq!(report, SweepReport { reclaimed: 1, skipped: 0, failed: 1 });
        assert!(f.coordinator.hold(idle.id).is_none());
        assert_eq!(f.coordinator.query_availability(other_id).await.unwrap().len(), 3);

        // the deferred hold is reclaimed once the showtime is free again
        drop(guard);
        let report = f.coordinator.sweep_once().await;
        assert_eq!(report, SweepReport { reclaimed: 1, skipped: 0, failed: 0 });
        assert_eq!(f.coordinator.query_availability(f.showtime_id).await.unwrap().len(), 3);
        assert_eq!(f.coordinator.active_holds(), 0);
    }

    #[tokio::test]
    async fn test_seat_events_use_coordinator_clock() {
        let start = chrono::DateTime::parse_from_rfc3339("2025-08-01T10:00:00Z").unwrap().with_timezone(&chrono::Utc);
        let f = fixture();
        let clock = Arc::new(ManualClock::new(start));
        let coordinator = ReservationCoordinator::new(
            f.catalog.clone(),
            f.store.clone(),
            f.notifier.clone(),
            clock.clone(),
            CoordinatorSettings::default(),
        );
        let mut rx = coordinator.subscribe();

        let hold = coordinator.select_seats(f.showtime_id, labels(&["A1"]), "alice", MINUTE).await.unwrap();
        clock.advance(chrono::Duration::seconds(30));
        let booking = coordinator.confirm(hold.id).await.unwrap();

        let held = rx.recv().await.unwrap();
        assert_eq!(held.at, hold.created_at.timestamp());
        assert_eq!(held.at, start.timestamp());
        let booked = rx.recv().await.unwrap();
        assert_eq!(booked.kind, SeatEventKind::Booked);
        assert_eq!(booked.at, booking.committed_at.timestamp());
    }

    #[tokio::test]
    async fn test_availability_lists_live_holds() {
        let f = fixture();
        let first = f.coordinator.select_seats(f.showtime_id, labels(&["A1"]), "alice", MINUTE).await.unwrap();
        let second = f
            .coordinator
            .select_seats(f.showtime_id, labels(&["A3"]), "bob", Duration::from_secs(30))
            .await
            .unwrap();

        let availability = f.coordinator.availability(f.showtime_id).await.unwrap();
        let ids: Vec<HoldId> = availability.holds.iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
        assert_eq!(availability.summary.held, 2);

        f.coordinator.cancel(first.id).await.unwrap();
        let availability = f.coordinator.availability(f.showtime_id).await.unwrap();
        assert_eq!(availability.holds.len(), 1);
    }
}
