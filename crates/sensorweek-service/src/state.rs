//! Application state shared across handlers.
//!
//! # Locking
//!
//! The engine sits behind a single `RwLock`. Ingest and window recompute take
//! the write lock, so every mutation of a rollup or a day bucket is
//! serialized and a recompute never exposes a half-rebuilt window. Queries
//! take the read lock and may run concurrently.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use sensorweek_store::{RecomputeReport, StatsEngine};
use time::OffsetDateTime;
use tokio::sync::{RwLock, watch};
use tracing::info;

use crate::config::Config;

/// Shared application state.
pub struct AppState {
    /// The statistics engine.
    pub engine: RwLock<StatsEngine>,
    /// Configuration loaded at startup.
    pub config: Config,
    /// Recompute scheduler control state.
    pub scheduler: SchedulerState,
}

impl AppState {
    /// Create new application state around an engine.
    pub fn new(engine: StatsEngine, config: Config) -> Arc<Self> {
        Arc::new(Self {
            engine: RwLock::new(engine),
            config,
            scheduler: SchedulerState::new(),
        })
    }

    /// Rebuild the weekly windows relative to `now` and record the run.
    ///
    /// Holds the engine write lock for the whole rebuild and until the run is
    /// recorded, so `last_run` always describes the latest rebuild.
    pub async fn recompute_window(&self, now: OffsetDateTime) -> RecomputeReport {
        let mut engine = self.engine.write().await;
        let report = engine.recompute_window(now);
        self.scheduler.record_run(now, report).await;
        drop(engine);

        info!(
            "Recomputed weekly window for {} (start: {}, end: {}): {} sensor(s), {} reading(s)",
            report.today,
            report
                .window_start
                .map_or_else(|| "-".to_string(), |d| d.to_string()),
            report
                .window_end
                .map_or_else(|| "-".to_string(), |d| d.to_string()),
            report.sensors,
            report.readings
        );

        report
    }
}

/// A completed recompute run.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct LastRun {
    /// When the run happened.
    #[serde(with = "time::serde::rfc3339")]
    pub at: OffsetDateTime,
    /// What the run rebuilt.
    pub report: RecomputeReport,
}

/// State for tracking and controlling the recompute scheduler.
pub struct SchedulerState {
    /// Whether the scheduler task is currently running.
    running: AtomicBool,
    /// Generation of the most recently started scheduler task.
    generation: AtomicU64,
    /// When the scheduler was started (Unix timestamp).
    started_at: AtomicU64,
    /// Number of completed recompute runs, scheduled or manual.
    run_count: AtomicU64,
    /// The most recent run.
    last_run: RwLock<Option<LastRun>>,
    /// Channel to signal the scheduler task to stop.
    stop_tx: watch::Sender<bool>,
    /// Receiver for stop signal (cloned by the scheduler task).
    stop_rx: watch::Receiver<bool>,
}

impl SchedulerState {
    /// Create a new scheduler state.
    pub fn new() -> Self {
        let (stop_tx, stop_rx) = watch::channel(false);
        Self {
            running: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            started_at: AtomicU64::new(0),
            run_count: AtomicU64::new(0),
            last_run: RwLock::new(None),
            stop_tx,
            stop_rx,
        }
    }

    /// Check if the scheduler is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Claim the scheduler for a new task.
    ///
    /// Returns the generation the new task must run under, or `None` if a
    /// task is already running. Starting a new generation clears the stop
    /// signal; tasks of older generations still exit.
    pub fn try_start(&self) -> Option<u64> {
        self.running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()?;

        let now = OffsetDateTime::now_utc().unix_timestamp() as u64;
        self.started_at.store(now, Ordering::SeqCst);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let _ = self.stop_tx.send(false);
        Some(generation)
    }

    /// Whether a task of `generation` should keep running.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation && !*self.stop_rx.borrow()
    }

    /// Get the scheduler start time.
    pub fn started_at(&self) -> Option<OffsetDateTime> {
        let ts = self.started_at.load(Ordering::SeqCst);
        if ts == 0 {
            None
        } else {
            OffsetDateTime::from_unix_timestamp(ts as i64).ok()
        }
    }

    /// Number of completed recompute runs.
    pub fn run_count(&self) -> u64 {
        self.run_count.load(Ordering::SeqCst)
    }

    /// The most recent recompute run.
    pub async fn last_run(&self) -> Option<LastRun> {
        *self.last_run.read().await
    }

    async fn record_run(&self, at: OffsetDateTime, report: RecomputeReport) {
        *self.last_run.write().await = Some(LastRun { at, report });
        self.run_count.fetch_add(1, Ordering::SeqCst);
    }

    /// Get a receiver for the stop signal.
    pub fn subscribe_stop(&self) -> watch::Receiver<bool> {
        self.stop_rx.clone()
    }

    /// Signal the scheduler task to stop.
    pub fn signal_stop(&self) {
        let _ = self.stop_tx.send(true);
        self.running.store(false, Ordering::SeqCst);
    }
}

impl Default for SchedulerState {
    fn default() -> Self {
        Self::new()
    }
}
