//! REST API endpoints for the sensorweek-service.
//!
//! The first four routes keep the wire format sensors and dashboards already
//! speak (`sensorName` in camelCase, bare `avg`/`max`/`min`). The `/api/*`
//! routes add service introspection.
//!
//! # Concurrency and Lock Acquisition
//!
//! - **`state.engine`** (RwLock): write lock to record a reading or recompute
//!   the window, read lock for every query. Held only for the in-memory call.
//! - **`state.scheduler.last_run`** (RwLock): read by `/api/status`, written
//!   after each recompute while the engine write lock is still held.
//!
//! ## Error Handling
//!
//! All endpoints return structured JSON errors via [`AppError`]. Invalid
//! submissions return 400; unknown sensors return 404 carrying the
//! `sensorName` that was asked for.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use sensorweek_store::{DailyStats, RecomputeReport};
use sensorweek_types::{Reading, ValidationError, WeeklySummary};
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::metrics;
use crate::state::{AppState, LastRun};

/// Description returned by the info endpoint.
pub const SERVICE_DESCRIPTION: &str = "this is a server for collecting data from sensors";

/// Error message for sensors that never sent a reading.
pub const NO_SENSOR_DATA: &str = "no data on this sensor";

/// Create the API router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(info))
        .route("/add-sensor-data", post(add_sensor_data))
        .route(
            "/get-sensor-statistics-by-week/{sensor_name}",
            get(get_sensor_weekly),
        )
        .route("/get-all-sensors-statistics-by-week", get(get_all_weekly))
        // Health and status
        .route("/api/health", get(health))
        .route("/api/status", get(get_status))
        // Introspection
        .route("/api/sensors", get(list_sensors))
        .route("/api/sensors/{sensor_name}/days", get(get_sensor_days))
        .route("/api/recompute", post(recompute_now))
        // Prometheus metrics
        .route("/metrics", get(prometheus_metrics))
}

/// Info endpoint response.
#[derive(Debug, Serialize)]
pub struct InfoResponse {
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub description: &'static str,
}

/// Liveness endpoint with the current server time.
async fn info() -> Json<InfoResponse> {
    Json(InfoResponse {
        timestamp: OffsetDateTime::now_utc(),
        description: SERVICE_DESCRIPTION,
    })
}

/// A reading submitted by a sensor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReadingRequest {
    pub sensor_name: String,
    pub data: f64,
}

/// Acknowledgement of an accepted reading.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReadingResponse {
    pub sensor_name: String,
    pub data: f64,
    pub message: String,
}

/// Record a reading at the current time.
///
/// # Errors
///
/// Returns [`AppError::BadRequest`] for malformed JSON, a missing or
/// non-numeric `data`, an empty `sensorName`, or a non-finite value.
async fn add_sensor_data(
    State(state): State<Arc<AppState>>,
    body: Result<Json<NewReadingRequest>, JsonRejection>,
) -> Result<Json<NewReadingResponse>, AppError> {
    let Json(request) = body?;
    let reading = Reading::new(request.sensor_name, request.data).inspect_err(|e| {
        warn!("Rejected reading: {}", e);
    })?;

    {
        let mut engine = state.engine.write().await;
        engine.record_reading(&reading, OffsetDateTime::now_utc());
    }
    debug!("Recorded {} from {}", reading.value, reading.sensor_name);

    Ok(Json(NewReadingResponse {
        message: format!(
            "The data: {} from sensor: {} was received",
            reading.value, reading.sensor_name
        ),
        sensor_name: reading.sensor_name,
        data: reading.value,
    }))
}

/// Weekly statistics of one sensor.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorWeeklyResponse {
    pub sensor_name: String,
    pub avg: Option<f64>,
    pub max: Option<f64>,
    pub min: Option<f64>,
}

/// Get the weekly statistics of one sensor.
///
/// # Errors
///
/// Returns [`AppError::SensorNotFound`] if the sensor never sent a reading.
async fn get_sensor_weekly(
    State(state): State<Arc<AppState>>,
    Path(sensor_name): Path<String>,
) -> Result<Json<SensorWeeklyResponse>, AppError> {
    let weekly = state.engine.read().await.sensor_weekly(&sensor_name)?;
    Ok(Json(SensorWeeklyResponse {
        sensor_name: weekly.sensor_name,
        avg: weekly.summary.avg,
        max: weekly.summary.max,
        min: weekly.summary.min,
    }))
}

/// Get the weekly statistics across all sensors.
async fn get_all_weekly(State(state): State<Arc<AppState>>) -> Json<WeeklySummary> {
    Json(state.engine.read().await.all_weekly())
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// Health check endpoint.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: OffsetDateTime::now_utc(),
    })
}

/// Service status response.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Service version.
    pub version: &'static str,
    /// Current timestamp.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Number of sensors seen.
    pub sensors: usize,
    /// Readings recorded since start.
    pub total_readings: u64,
    /// Recompute scheduler status.
    pub scheduler: SchedulerStatus,
}

/// Recompute scheduler status.
#[derive(Debug, Serialize)]
pub struct SchedulerStatus {
    /// Whether the periodic recompute is running.
    pub running: bool,
    /// When the scheduler was started (if running).
    #[serde(with = "time::serde::rfc3339::option")]
    pub started_at: Option<OffsetDateTime>,
    /// How long the scheduler has been running (in seconds).
    pub uptime_seconds: Option<u64>,
    /// Configured period between runs.
    pub interval_secs: u64,
    /// Completed runs, scheduled or manual.
    pub run_count: u64,
    /// The most recent run.
    pub last_run: Option<LastRun>,
}

/// Get service status including scheduler state.
async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let (sensors, total_readings) = {
        let engine = state.engine.read().await;
        (engine.sensor_count(), engine.total_readings())
    };

    let running = state.scheduler.is_running();
    let started_at = state.scheduler.started_at().filter(|_| running);
    let uptime_seconds = started_at.map(|s| {
        let now = OffsetDateTime::now_utc();
        (now - s).whole_seconds().max(0) as u64
    });

    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION"),
        timestamp: OffsetDateTime::now_utc(),
        sensors,
        total_readings,
        scheduler: SchedulerStatus {
            running,
            started_at,
            uptime_seconds,
            interval_secs: state.config.recompute.interval_secs,
            run_count: state.scheduler.run_count(),
            last_run: state.scheduler.last_run().await,
        },
    })
}

/// List all sensors seen, sorted by name.
async fn list_sensors(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.engine.read().await.sensor_names())
}

/// Daily statistics of one sensor.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorDaysResponse {
    pub sensor_name: String,
    pub days: Vec<DailyStats>,
}

/// Get the per-day statistics of one sensor, oldest first.
///
/// # Errors
///
/// Returns [`AppError::SensorNotFound`] if the sensor never sent a reading.
async fn get_sensor_days(
    State(state): State<Arc<AppState>>,
    Path(sensor_name): Path<String>,
) -> Result<Json<SensorDaysResponse>, AppError> {
    let days = state.engine.read().await.sensor_days(&sensor_name)?;
    Ok(Json(SensorDaysResponse { sensor_name, days }))
}

/// Recompute the weekly windows now instead of waiting for the next period.
async fn recompute_now(State(state): State<Arc<AppState>>) -> Json<RecomputeReport> {
    Json(state.recompute_window(OffsetDateTime::now_utc()).await)
}

/// Prometheus metrics endpoint.
///
/// # Errors
///
/// Returns [`AppError::NotFound`] when `prometheus.enabled` is false.
async fn prometheus_metrics(
    State(state): State<Arc<AppState>>,
) -> Result<
    (
        StatusCode,
        [(axum::http::header::HeaderName, &'static str); 1],
        String,
    ),
    AppError,
> {
    if !state.config.prometheus.enabled {
        return Err(AppError::NotFound(
            "Prometheus metrics endpoint is disabled".to_string(),
        ));
    }

    let output = {
        let engine = state.engine.read().await;
        metrics::render(&engine, state.scheduler.run_count())
    };

    Ok((
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            metrics::PROMETHEUS_CONTENT_TYPE,
        )],
        output,
    ))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    SensorNotFound(String),
    BadRequest(String),
}

impl From<sensorweek_store::Error> for AppError {
    fn from(e: sensorweek_store::Error) -> Self {
        match e {
            sensorweek_store::Error::SensorNotFound(name) => AppError::SensorNotFound(name),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        AppError::BadRequest(e.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, serde_json::json!({ "error": msg })),
            AppError::SensorNotFound(sensor_name) => (
                StatusCode::NOT_FOUND,
                serde_json::json!({
                    "sensorName": sensor_name,
                    "error": NO_SENSOR_DATA,
                }),
            ),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, serde_json::json!({ "error": msg }))
            }
        };

        (status, Json(body)).into_response()
    }
}
