//! HTTP service collecting sensor readings and reporting weekly statistics.
//!
//! This crate provides a service that:
//! - Accepts numeric readings from named sensors over HTTP
//! - Keeps per-day statistics for each sensor and across all sensors
//! - Rebuilds a rolling seven-day window on a fixed period
//! - Reports the weekly average, minimum and maximum per sensor and globally
//!
//! # REST API Endpoints
//!
//! - `GET /` - Server time and description
//! - `POST /add-sensor-data` - Submit `{"sensorName": ..., "data": ...}`
//! - `GET /get-sensor-statistics-by-week/{sensorName}` - Weekly stats of one sensor
//! - `GET /get-all-sensors-statistics-by-week` - Weekly stats across all sensors
//! - `GET /api/health` - Service health check
//! - `GET /api/status` - Engine totals and scheduler state
//! - `GET /api/sensors` - Names of all sensors seen
//! - `GET /api/sensors/{sensorName}/days` - Per-day statistics of one sensor
//! - `POST /api/recompute` - Rebuild the weekly windows now
//! - `GET /metrics` - Prometheus metrics (when enabled)
//!
//! # Configuration
//!
//! The service reads configuration from `~/.config/sensorweek/server.toml`:
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:8080"
//!
//! [recompute]
//! interval_secs = 86400
//!
//! [prometheus]
//! enabled = false
//! ```
//!
//! All statistics live in memory and are lost when the process exits.

pub mod api;
pub mod config;
pub mod metrics;
pub mod scheduler;
pub mod state;

pub use config::{Config, ConfigError, PrometheusConfig, RecomputeConfig, ServerConfig};
pub use scheduler::RecomputeScheduler;
pub use state::{AppState, LastRun, SchedulerState};
