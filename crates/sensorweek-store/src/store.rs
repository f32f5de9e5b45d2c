//! The statistics engine and its two stores.

use std::collections::HashMap;

use sensorweek_types::{DateKey, Reading};
use time::OffsetDateTime;
use tracing::debug;

use crate::models::{GlobalEntry, PerSensorEntry};

/// Per-sensor statistics keyed by sensor name.
///
/// Entries are created on a sensor's first reading and never removed.
#[derive(Debug, Clone, Default)]
pub struct PerSensorStore {
    entries: HashMap<String, PerSensorEntry>,
}

impl PerSensorStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a reading into the sensor's entry, creating it on first sight.
    pub fn record(&mut self, sensor_name: &str, value: f64, day: DateKey) {
        if let Some(entry) = self.entries.get_mut(sensor_name) {
            entry.record(value, day);
        } else {
            debug!("First reading from sensor {}", sensor_name);
            self.entries.insert(
                sensor_name.to_string(),
                PerSensorEntry::from_first_reading(value, day),
            );
        }
    }

    /// Look up a sensor's entry.
    pub fn get(&self, sensor_name: &str) -> Option<&PerSensorEntry> {
        self.entries.get(sensor_name)
    }

    /// Iterate over all entries in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &PerSensorEntry)> {
        self.entries.iter()
    }

    /// Iterate mutably over all entries in arbitrary order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut PerSensorEntry)> {
        self.entries.iter_mut()
    }

    /// Number of sensors seen.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no sensor has been seen.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Statistics across all sensors combined.
#[derive(Debug, Clone, Default)]
pub struct GlobalStore {
    entry: GlobalEntry,
}

impl GlobalStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a reading into the global entry.
    pub fn record(&mut self, value: f64, day: DateKey) {
        self.entry.record(value, day);
    }

    /// The global entry.
    pub fn entry(&self) -> &GlobalEntry {
        &self.entry
    }

    /// The global entry, mutably.
    pub fn entry_mut(&mut self) -> &mut GlobalEntry {
        &mut self.entry
    }
}

/// In-memory aggregation engine.
///
/// Holds one [`PerSensorStore`] and one [`GlobalStore`]. Every method takes
/// `&self` or `&mut self` and does no I/O; callers that share an engine
/// across tasks wrap it in a lock so each call is atomic.
///
/// # Example
///
/// ```
/// use sensorweek_store::StatsEngine;
/// use time::macros::datetime;
///
/// let mut engine = StatsEngine::new();
/// engine.record("tempA", 10.0, datetime!(2021-10-06 08:00 UTC));
/// engine.record("tempA", 30.0, datetime!(2021-10-06 09:00 UTC));
///
/// let weekly = engine.sensor_weekly("tempA")?;
/// assert_eq!(weekly.summary.avg, Some(20.0));
/// # Ok::<(), sensorweek_store::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct StatsEngine {
    pub(crate) sensors: PerSensorStore,
    pub(crate) global: GlobalStore,
}

impl StatsEngine {
    /// Create an empty engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a reading taken at `now`.
    ///
    /// Updates the sensor's day bucket and weekly rollup, then the global
    /// day bucket and weekly rollup. The caller is responsible for passing a
    /// non-empty name and a finite value (see [`Reading::new`]).
    pub fn record(&mut self, sensor_name: &str, value: f64, now: OffsetDateTime) {
        let day = DateKey::from_timestamp(now);
        self.sensors.record(sensor_name, value, day);
        self.global.record(value, day);
    }

    /// Record an already validated reading taken at `now`.
    pub fn record_reading(&mut self, reading: &Reading, now: OffsetDateTime) {
        self.record(&reading.sensor_name, reading.value, now);
    }

    /// The per-sensor store.
    pub fn sensors(&self) -> &PerSensorStore {
        &self.sensors
    }

    /// The global store.
    pub fn global(&self) -> &GlobalStore {
        &self.global
    }
}
