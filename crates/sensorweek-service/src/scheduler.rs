//! Periodic weekly window recompute.

use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info};

use crate::state::AppState;

/// Background task that recomputes the weekly windows on a fixed period.
///
/// The period starts when the scheduler starts: the first run happens one
/// full period later, and the cutover point is not aligned to midnight.
/// A single task drives all runs, so a run never overlaps another one.
pub struct RecomputeScheduler {
    state: Arc<AppState>,
}

impl RecomputeScheduler {
    /// Create a new scheduler.
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Start the periodic recompute.
    ///
    /// Returns `None` without spawning anything if the scheduler is already
    /// running. Returns immediately; runs happen in the background until
    /// [`SchedulerState::signal_stop`](crate::state::SchedulerState::signal_stop).
    pub fn start(&self) -> Option<JoinHandle<()>> {
        let Some(generation) = self.state.scheduler.try_start() else {
            debug!("Recompute scheduler is already running");
            return None;
        };

        let period = Duration::from_secs(self.state.config.recompute.interval_secs);
        info!(
            "Starting weekly window recompute every {}s",
            period.as_secs()
        );

        let state = Arc::clone(&self.state);
        Some(tokio::spawn(async move {
            run_scheduler(state, period, generation).await;
        }))
    }
}

async fn run_scheduler(state: Arc<AppState>, period: Duration, generation: u64) {
    let mut stop_rx = state.scheduler.subscribe_stop();
    let mut timer = interval_at(Instant::now() + period, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = timer.tick() => {
                if !state.scheduler.is_current(generation) {
                    break;
                }
                state.recompute_window(OffsetDateTime::now_utc()).await;
            }
            changed = stop_rx.changed() => {
                if changed.is_err() || !state.scheduler.is_current(generation) {
                    break;
                }
            }
        }
    }

    info!("Weekly window recompute stopped");
}
