//! Value types for daily and weekly sensor statistics.
//!
//! This crate provides the plain data types shared by the aggregation
//! engine (sensorweek-store) and the HTTP service (sensorweek-service).
//!
//! # Features
//!
//! - [`Statistics`]: count, sum, min and max with the update and merge rules
//! - [`DateKey`]: a UTC calendar day used to key daily buckets
//! - [`WeeklySummary`]: the reported avg/min/max view of a weekly rollup
//! - [`Reading`]: a validated `(sensor_name, value)` submission
//!
//! # Example
//!
//! ```
//! use sensorweek_types::{Statistics, WeeklySummary};
//!
//! let mut stats = Statistics::from_value(10.0);
//! stats.record(30.0);
//!
//! let summary = WeeklySummary::from(&stats);
//! assert_eq!(summary.avg, Some(20.0));
//! ```

pub mod error;
pub mod types;

pub use error::{ValidationError, ValidationResult};
pub use types::{DateKey, Reading, Statistics, WeeklySummary};
