//! Land detector scheduling loop.
//!
//! Runs one detection cycle per period, or earlier when a new local
//! position report arrives. The period timer is re-armed at the start of
//! every cycle so a silent position source degrades to the timer cadence
//! instead of stalling the detector.

use std::future::pending;
use std::sync::Arc;
use std::time::Duration;

use land_core::{LandDetector, RawStateProvider};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio::time::{sleep_until, Instant};

use crate::bus::WatchBus;
use crate::state::AppState;

pub const LOOP_NAME: &str = "land-detector";

/// Single pending wake-up deadline.
#[derive(Debug, Default)]
pub struct Scheduler {
    deadline: Option<Instant>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule_delayed(&mut self, delay: Duration) {
        self.deadline = Some(Instant::now() + delay);
    }

    pub fn schedule_clear(&mut self) {
        self.deadline = None;
    }

    pub fn is_scheduled(&self) -> bool {
        self.deadline.is_some()
    }

    /// Resolve at the deadline; never resolves while cleared.
    pub async fn wait(&self) {
        match self.deadline {
            Some(deadline) => sleep_until(deadline).await,
            None => pending().await,
        }
    }
}

/// Start the land detector loop.
pub async fn run_land_detector_loop<P>(
    state: Arc<AppState>,
    provider: P,
    mut shutdown: broadcast::Receiver<()>,
) where
    P: RawStateProvider + 'static,
{
    let period = state.config().cycle_period();
    let mut detector = LandDetector::new(provider);
    let mut bus = WatchBus::new(state.telemetry(), state.params());
    let mut params = state.params().clone();
    let mut position_wakeup = state.telemetry().subscribe_local_position();
    let mut wakeup_enabled = true;
    let mut scheduler = Scheduler::new();
    let boot = Instant::now();

    scheduler.schedule_delayed(period);
    tracing::info!("Land detector loop started ({} ms cycle)", period.as_millis());

    loop {
        tokio::select! {
            _ = scheduler.wait() => {}
            changed = position_wakeup.changed(), if wakeup_enabled => {
                if changed.is_err() {
                    tracing::warn!("Local position channel closed, falling back to timer");
                    wakeup_enabled = false;
                }
            }
        }

        // Backup schedule in case the position wake-up stops firing
        scheduler.schedule_delayed(period);

        let now = boot.elapsed();
        let report = detector.run_cycle(now, &mut bus, &mut params, &mut state.results());
        if let Some(result) = report.published {
            tracing::trace!(
                "Published landed={} maybe_landed={} ground_contact={} freefall={}",
                result.landed,
                result.maybe_landed,
                result.ground_contact,
                result.freefall
            );
        }
        state.mark_loop_heartbeat(LOOP_NAME);

        if shutdown_requested(&mut shutdown) {
            scheduler.schedule_clear();
            tracing::info!("Land detector loop shutting down");
            break;
        }
    }
}

fn shutdown_requested(shutdown: &mut broadcast::Receiver<()>) -> bool {
    match shutdown.try_recv() {
        Ok(()) | Err(TryRecvError::Lagged(_)) | Err(TryRecvError::Closed) => true,
        Err(TryRecvError::Empty) => false,
    }
}
