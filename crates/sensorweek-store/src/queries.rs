//! Read-only queries over the engine.

use serde::Serialize;
use sensorweek_types::{DateKey, Statistics, WeeklySummary};

use crate::error::{Error, Result};
use crate::store::StatsEngine;

/// Weekly statistics of a single sensor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorWeekly {
    /// The sensor queried.
    pub sensor_name: String,
    /// Reported avg/min/max of the sensor's weekly rollup.
    pub summary: WeeklySummary,
}

/// Statistics of one sensor for one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyStats {
    /// The UTC day of the bucket.
    pub date: DateKey,
    /// Readings recorded that day.
    pub count: u64,
    /// Sum of the day's readings.
    pub sum: f64,
    /// Smallest reading of the day.
    pub min: Option<f64>,
    /// Largest reading of the day.
    pub max: Option<f64>,
    /// Mean of the day's readings.
    pub avg: Option<f64>,
}

impl DailyStats {
    fn new(date: DateKey, stats: &Statistics) -> Self {
        Self {
            date,
            count: stats.count,
            sum: stats.sum,
            min: stats.min,
            max: stats.max,
            avg: stats.average(),
        }
    }
}

impl StatsEngine {
    /// Current weekly statistics for one sensor.
    ///
    /// A sensor that was seen but has nothing in its window is reported with
    /// all-`None` fields, which is distinct from an unknown sensor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SensorNotFound`] if no reading was ever recorded for
    /// `sensor_name`.
    pub fn sensor_weekly(&self, sensor_name: &str) -> Result<SensorWeekly> {
        let entry = self
            .sensors
            .get(sensor_name)
            .ok_or_else(|| Error::SensorNotFound(sensor_name.to_string()))?;
        Ok(SensorWeekly {
            sensor_name: sensor_name.to_string(),
            summary: WeeklySummary::from(&entry.weekly_rollup),
        })
    }

    /// Current weekly statistics across all sensors.
    pub fn all_weekly(&self) -> WeeklySummary {
        WeeklySummary::from(&self.global.entry().weekly_rollup)
    }

    /// Names of all sensors seen, sorted.
    pub fn sensor_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sensors.iter().map(|(name, _)| name.clone()).collect();
        names.sort();
        names
    }

    /// Per-day statistics of one sensor, oldest day first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SensorNotFound`] for an unknown sensor.
    pub fn sensor_days(&self, sensor_name: &str) -> Result<Vec<DailyStats>> {
        let entry = self
            .sensors
            .get(sensor_name)
            .ok_or_else(|| Error::SensorNotFound(sensor_name.to_string()))?;
        Ok(entry
            .daily_history
            .iter()
            .map(|(date, record)| DailyStats::new(*date, &record.statistics))
            .collect())
    }

    /// Number of sensors seen.
    pub fn sensor_count(&self) -> usize {
        self.sensors.len()
    }

    /// Number of readings ever recorded, across all sensors and days.
    pub fn total_readings(&self) -> u64 {
        self.global
            .entry()
            .daily_history
            .values()
            .map(|stats| stats.count)
            .sum()
    }
}
