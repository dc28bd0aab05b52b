use chrono::NaiveDate;
use marquee_catalog::InMemoryCatalog;
use marquee_core::{
    BookingStore, ManualClock, Money, ReservationError, SeatLabel, SeatLayout, Showtime, ShowtimeId,
};
use marquee_reservation::{
    CoordinatorSettings, ExpirySweeper, InMemoryBookingStore, ReservationCoordinator,
    TracingNotificationSender,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Barrier;

const MINUTE: Duration = Duration::from_secs(60);

struct Harness {
    coordinator: Arc<ReservationCoordinator>,
    clock: Arc<ManualClock>,
    store: Arc<InMemoryBookingStore>,
    showtimes: Vec<ShowtimeId>,
}

fn showtime(seats_per_row: u16) -> Showtime {
    Showtime {
        id: ShowtimeId::new(),
        movie_id: "4".to_string(),
        movie_title: "War 2".to_string(),
        theatre: "Sri Lakshmi Theatre, Kavali".to_string(),
        date: NaiveDate::from_ymd_opt(2025, 8, 14).unwrap(),
        time: "1:00 PM".to_string(),
        ticket_price: Money::new(20000, "INR"),
        layout: SeatLayout { rows: 2, seats_per_row },
    }
}

fn harness(showtime_count: usize) -> Harness {
    let catalog = InMemoryCatalog::new();
    let mut showtimes = Vec::new();
    for _ in 0..showtime_count {
        let s = showtime(10);
        showtimes.push(s.id);
        catalog.insert(s);
    }

    let clock = Arc::new(ManualClock::default());
    let store = Arc::new(InMemoryBookingStore::new());
    let coordinator = Arc::new(ReservationCoordinator::new(
        Arc::new(catalog),
        store.clone(),
        Arc::new(TracingNotificationSender),
        clock.clone(),
        CoordinatorSettings::default(),
    ));
    Harness { coordinator, clock, store, showtimes }
}

fn labels(seats: &[&str]) -> Vec<SeatLabel> {
    seats.iter().map(|s| SeatLabel::from(*s)).collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_disjoint_selections_both_succeed() {
    for _ in 0..25 {
        let h = harness(1);
        let showtime_id = h.showtimes[0];
        let barrier = Arc::new(Barrier::new(2));

        let spawn = |seats: Vec<SeatLabel>, holder: &'static str| {
            let coordinator = h.coordinator.clone();
            let barrier = barrier.clone();
            tokio::spawn(async move {
                barrier.wait().await;
                coordinator.select_seats(showtime_id, seats, holder, MINUTE).await
            })
        };
        let a = spawn(labels(&["A1", "A2"]), "alice");
        let b = spawn(labels(&["A3", "B1"]), "bob");

        assert!(a.await.unwrap().is_ok());
        assert!(b.await.unwrap().is_ok());
        assert_eq!(h.coordinator.query_availability(showtime_id).await.unwrap().len(), 16);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_overlapping_selections_have_one_winner() {
    for _ in 0..25 {
        let h = harness(1);
        let showtime_id = h.showtimes[0];
        let barrier = Arc::new(Barrier::new(2));

        let spawn = |seats: Vec<SeatLabel>, holder: &'static str| {
            let coordinator = h.coordinator.clone();
            let barrier = barrier.clone();
            tokio::spawn(async move {
                barrier.wait().await;
                coordinator.select_seats(showtime_id, seats, holder, MINUTE).await
            })
        };
        let a = spawn(labels(&["A1", "A2"]), "alice");
        let b = spawn(labels(&["A2", "A3"]), "bob");

        let results = vec![a.await.unwrap(), b.await.unwrap()];
        let winners = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(ReservationError::SeatUnavailable { .. }))));
        assert_eq!(h.coordinator.active_holds(), 1);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_last_seat_goes_to_exactly_one_contender() {
    let h = harness(1);
    let showtime_id = h.showtimes[0];
    let contenders = 16;
    let barrier = Arc::new(Barrier::new(contenders));

    let mut handles = Vec::new();
    for i in 0..contenders {
        let coordinator = h.coordinator.clone();
        let barrier = barrier.clone();
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            coordinator
                .select_seats(showtime_id, labels(&["B10"]), &format!("user-{}", i), MINUTE)
                .await
        }));
    }

    let mut won = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => won += 1,
            Err(ReservationError::SeatUnavailable { .. }) => {}
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }
    assert_eq!(won, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_confirm_and_cancel_race_has_one_winner() {
    for _ in 0..25 {
        let h = harness(1);
        let showtime_id = h.showtimes[0];
        let hold = h
            .coordinator
            .select_seats(showtime_id, labels(&["A5"]), "alice", MINUTE)
            .await
            .unwrap()
            .id;
        let barrier = Arc::new(Barrier::new(2));

        let confirm = {
            let coordinator = h.coordinator.clone();
            let barrier = barrier.clone();
            tokio::spawn(async move {
                barrier.wait().await;
                coordinator.confirm(hold).await
            })
        };
        let cancel = {
            let coordinator = h.coordinator.clone();
            let barrier = barrier.clone();
            tokio::spawn(async move {
                barrier.wait().await;
                coordinator.cancel(hold).await
            })
        };

        let confirmed = confirm.await.unwrap();
        let cancelled = cancel.await.unwrap();
        assert!(confirmed.is_ok() != cancelled.is_ok());

        let free = h.coordinator.query_availability(showtime_id).await.unwrap();
        match confirmed {
            Ok(booking) => {
                assert!(matches!(cancelled, Err(ReservationError::HoldNotFound(_))));
                assert!(!free.contains(&SeatLabel::from("A5")));
                assert!(h.store.get(booking.id).await.unwrap().is_some());
            }
            Err(e) => {
                assert!(matches!(e, ReservationError::HoldNotFound(_)));
                assert!(free.contains(&SeatLabel::from("A5")));
                assert_eq!(h.store.len().await, 0);
            }
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_sweep_and_cancel_never_both_release() {
    for _ in 0..25 {
        let h = harness(1);
        let showtime_id = h.showtimes[0];
        let hold = h
            .coordinator
            .select_seats(showtime_id, labels(&["A1"]), "alice", Duration::from_secs(1))
            .await
            .unwrap()
            .id;
        h.clock.advance(chrono::Duration::seconds(2));

        let sweep = {
            let coordinator = h.coordinator.clone();
            tokio::spawn(async move { coordinator.sweep_once().await })
        };
        let cancel = {
            let coordinator = h.coordinator.clone();
            tokio::spawn(async move { coordinator.cancel(hold).await })
        };

        let report = sweep.await.unwrap();
        let cancelled = cancel.await.unwrap();
        assert_eq!(report.reclaimed + usize::from(cancelled.is_ok()), 1);
        assert_eq!(h.coordinator.query_availability(showtime_id).await.unwrap().len(), 20);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_showtimes_are_independent() {
    let h = harness(4);
    let mut handles = Vec::new();
    for (i, showtime_id) in h.showtimes.iter().copied().enumerate() {
        for row in ["A", "B"] {
            let coordinator = h.coordinator.clone();
            handles.push(tokio::spawn(async move {
                let seats: Vec<SeatLabel> = (1..=10).map(|n| SeatLabel(format!("{}{}", row, n))).collect();
                coordinator
                    .select_seats(showtime_id, seats, &format!("user-{}-{}", i, row), MINUTE)
                    .await
            }));
        }
    }
    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }
    for showtime_id in &h.showtimes {
        assert!(h.coordinator.query_availability(*showtime_id).await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_sweeper_loop_returns_expired_seats() {
    let h = harness(1);
    let showtime_id = h.showtimes[0];
    h.coordinator
        .select_seats(showtime_id, labels(&["A1", "A2"]), "alice", Duration::from_secs(1))
        .await
        .unwrap();

    let (sweeper, shutdown) = ExpirySweeper::new(h.coordinator.clone(), Duration::from_millis(10));
    let handle = sweeper.spawn();

    h.clock.advance(chrono::Duration::seconds(2));

    let expected: BTreeSet<SeatLabel> = h
        .coordinator
        .availability(showtime_id)
        .await
        .unwrap()
        .showtime
        .layout
        .labels()
        .into_iter()
        .collect();
    let mut free = BTreeSet::new();
    for _ in 0..100 {
        free = h.coordinator.query_availability(showtime_id).await.unwrap();
        if free == expected {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(free, expected);
    assert_eq!(h.coordinator.active_holds(), 0);

    shutdown.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("sweeper did not stop")
        .unwrap();
}
