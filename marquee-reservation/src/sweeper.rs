use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::coordinator::ReservationCoordinator;

/// Background loop returning abandoned holds to availability.
///
/// A hold that cannot be reclaimed in one cycle stays in the ledger and is picked up
/// again on the next tick.
pub struct ExpirySweeper {
    coordinator: Arc<ReservationCoordinator>,
    period: Duration,
    shutdown: watch::Receiver<bool>,
}

impl ExpirySweeper {
    /// Returns the sweeper and the sender that stops it (`send(true)`).
    pub fn new(coordinator: Arc<ReservationCoordinator>, period: Duration) -> (Self, watch::Sender<bool>) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let sweeper = Self {
            coordinator,
            period,
            shutdown: shutdown_rx,
        };
        (sweeper, shutdown_tx)
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Expiry sweeper started, period {:?}", self.period);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.coordinator.sweep_once().await;
                    if report.failed > 0 {
                        warn!(
                            "Sweep reclaimed {} holds, {} left for the next cycle",
                            report.reclaimed, report.failed
                        );
                    } else if report.reclaimed > 0 {
                        info!("Sweep reclaimed {} expired holds", report.reclaimed);
                    } else {
                        debug!("Sweep found nothing to reclaim ({} skipped)", report.skipped);
                    }
                }
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Expiry sweeper stopped");
    }
}
