//! In-memory daily and rolling weekly statistics for sensor readings.
//!
//! This crate provides the aggregation engine behind sensorweek-service.
//! All state is memory-resident and lost when the process exits.
//!
//! # Features
//!
//! - Per-sensor day buckets with raw values and running statistics
//! - Global day buckets across all sensors
//! - Weekly rollups updated incrementally on every reading
//! - Periodic recompute of the weekly window from the 7 days before today
//! - Queries for weekly avg/min/max per sensor or across all sensors
//!
//! # Example
//!
//! ```
//! use sensorweek_store::StatsEngine;
//! use time::{Duration, macros::datetime};
//!
//! let day0 = datetime!(2021-10-06 08:47:28 UTC);
//! let mut engine = StatsEngine::new();
//! engine.record("tempA", 10.0, day0);
//! engine.record("tempB", 5.0, day0);
//!
//! // A week later the readings of day0 are still in the window.
//! engine.recompute_window(day0 + Duration::days(7));
//! assert_eq!(engine.all_weekly().avg, Some(7.5));
//!
//! // A day after that they have aged out.
//! engine.recompute_window(day0 + Duration::days(8));
//! assert_eq!(engine.all_weekly().avg, None);
//! ```

mod error;
mod models;
mod queries;
mod store;
mod window;

pub use error::{Error, Result};
pub use models::{GlobalEntry, PerSensorEntry, SensorDayRecord};
pub use queries::{DailyStats, SensorWeekly};
pub use store::{GlobalStore, PerSensorStore, StatsEngine};
pub use window::{DayBucket, RecomputeReport, WINDOW_DAYS, window_statistics};
