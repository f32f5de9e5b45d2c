//! Per-sensor and global entries held by the engine.

use std::collections::BTreeMap;

use sensorweek_types::{DateKey, Statistics};

/// One sensor's readings for one UTC day.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorDayRecord {
    /// Aggregate over `raw_values`.
    pub statistics: Statistics,
    /// Every reading of the day in arrival order. Append-only.
    pub raw_values: Vec<f64>,
}

impl SensorDayRecord {
    /// A day record seeded from its first reading.
    pub fn from_value(value: f64) -> Self {
        Self {
            statistics: Statistics::from_value(value),
            raw_values: vec![value],
        }
    }

    /// Fold another reading into the day.
    pub fn record(&mut self, value: f64) {
        self.statistics.record(value);
        self.raw_values.push(value);
    }
}

/// Everything known about a single sensor.
#[derive(Debug, Clone, PartialEq)]
pub struct PerSensorEntry {
    /// Day buckets keyed by UTC date.
    pub daily_history: BTreeMap<DateKey, SensorDayRecord>,
    /// Current weekly rollup. Nudged on every reading, rebuilt on recompute.
    pub weekly_rollup: Statistics,
}

impl PerSensorEntry {
    /// An entry created by the sensor's first reading.
    pub fn from_first_reading(value: f64, day: DateKey) -> Self {
        let mut daily_history = BTreeMap::new();
        daily_history.insert(day, SensorDayRecord::from_value(value));
        Self {
            daily_history,
            weekly_rollup: Statistics::from_value(value),
        }
    }

    /// Fold a reading into the weekly rollup and the day bucket for `day`.
    pub fn record(&mut self, value: f64, day: DateKey) {
        self.weekly_rollup.record(value);
        self.daily_history
            .entry(day)
            .and_modify(|record| record.record(value))
            .or_insert_with(|| SensorDayRecord::from_value(value));
    }
}

/// Statistics across all sensors combined.
///
/// Day buckets hold only aggregates since readings from different sensors
/// are commingled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalEntry {
    /// Day buckets keyed by UTC date.
    pub daily_history: BTreeMap<DateKey, Statistics>,
    /// Current weekly rollup. Nudged on every reading, rebuilt on recompute.
    pub weekly_rollup: Statistics,
}

impl GlobalEntry {
    /// Fold a reading into the weekly rollup and the day bucket for `day`.
    pub fn record(&mut self, value: f64, day: DateKey) {
        self.weekly_rollup.record(value);
        self.daily_history
            .entry(day)
            .and_modify(|stats| stats.record(value))
            .or_insert_with(|| Statistics::from_value(value));
    }
}
