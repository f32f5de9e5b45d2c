//! Rolling weekly window recompute.
//!
//! The incrementally maintained weekly rollups drift: they count every
//! reading ever recorded. A recompute discards them and rebuilds each one
//! from the day buckets dated 1 to 7 days before the current UTC day. The
//! current day is never part of the window, so readings recorded today only
//! show up in the reported week once a later recompute ages them in.

use std::collections::BTreeMap;

use serde::Serialize;
use sensorweek_types::{DateKey, Statistics};
use time::OffsetDateTime;
use tracing::debug;

use crate::models::SensorDayRecord;
use crate::store::StatsEngine;

/// Number of past days that make up the weekly window.
pub const WINDOW_DAYS: u32 = 7;

/// A day bucket the window can be folded from.
pub trait DayBucket {
    /// Aggregate statistics of the bucket.
    fn statistics(&self) -> &Statistics;
}

impl DayBucket for Statistics {
    fn statistics(&self) -> &Statistics {
        self
    }
}

impl DayBucket for SensorDayRecord {
    fn statistics(&self) -> &Statistics {
        &self.statistics
    }
}

/// Fold the buckets of the [`WINDOW_DAYS`] days before `today` into one aggregate.
///
/// Days without a bucket are skipped.
pub fn window_statistics<B: DayBucket>(
    history: &BTreeMap<DateKey, B>,
    today: DateKey,
) -> Statistics {
    let mut stats = Statistics::empty();
    for offset in 1..=WINDOW_DAYS {
        let Some(day) = today.days_before(offset) else {
            break;
        };
        if let Some(bucket) = history.get(&day) {
            stats.merge(bucket.statistics());
        }
    }
    stats
}

/// Summary of a recompute run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RecomputeReport {
    /// The UTC day the window was computed relative to (excluded).
    pub today: DateKey,
    /// First day included in the window.
    pub window_start: Option<DateKey>,
    /// Last day included in the window.
    pub window_end: Option<DateKey>,
    /// Number of sensor rollups rebuilt.
    pub sensors: usize,
    /// Readings in the rebuilt global window.
    pub readings: u64,
}

impl StatsEngine {
    /// Rebuild every weekly rollup from the day buckets before `now`'s UTC day.
    ///
    /// Each rollup is reset and then folded from the buckets dated 1 to
    /// [`WINDOW_DAYS`] days earlier. Running this twice with the same `now`
    /// and no readings in between yields identical rollups.
    pub fn recompute_window(&mut self, now: OffsetDateTime) -> RecomputeReport {
        let today = DateKey::from_timestamp(now);

        for (name, entry) in self.sensors.iter_mut() {
            entry.weekly_rollup = window_statistics(&entry.daily_history, today);
            debug!(
                "Recomputed weekly window for {}: {} reading(s)",
                name, entry.weekly_rollup.count
            );
        }

        let global = self.global.entry_mut();
        global.weekly_rollup = window_statistics(&global.daily_history, today);

        RecomputeReport {
            today,
            window_start: today.days_before(WINDOW_DAYS),
            window_end: today.days_before(1),
            sensors: self.sensors.len(),
            readings: global.weekly_rollup.count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;
    use time::macros::datetime;

    const TODAY: OffsetDateTime = datetime!(2021-10-20 09:00 UTC);

    fn days_ago(days: i64) -> OffsetDateTime {
        TODAY - Duration::days(days)
    }

    #[test]
    fn test_window_boundary_includes_only_previous_seven_days() {
        let mut engine = StatsEngine::new();
        // One reading per day from today back to ten days ago, value = age in days.
        for age in 0..=10 {
            engine.record("tempA", age as f64, days_ago(age));
        }

        engine.recompute_window(TODAY);

        let rollup = engine.sensors().get("tempA").unwrap().weekly_rollup;
        assert_eq!(rollup.count, 7);
        assert_eq!(rollup.sum, (1..=7).sum::<i64>() as f64);
        assert_eq!(rollup.min, Some(1.0));
        assert_eq!(rollup.max, Some(7.0));

        let global = engine.global().entry().weekly_rollup;
        assert_eq!(global, rollup);
    }

    #[test]
    fn test_window_excludes_today() {
        let mut engine = StatsEngine::new();
        engine.record("tempA", 50.0, TODAY);

        engine.recompute_window(TODAY);

        let rollup = engine.sensors().get("tempA").unwrap().weekly_rollup;
        assert!(rollup.is_empty());
        assert_eq!(rollup.min, None);
        assert_eq!(rollup.max, None);
        assert!(engine.global().entry().weekly_rollup.is_empty());
    }

    #[test]
    fn test_window_skips_missing_days() {
        let mut engine = StatsEngine::new();
        for age in [1, 2, 4, 5, 6, 7] {
            engine.record("tempA", 10.0, days_ago(age));
        }
        assert!(
            !engine
                .sensors()
                .get("tempA")
                .unwrap()
                .daily_history
                .contains_key(&DateKey::from_timestamp(days_ago(3)))
        );

        engine.recompute_window(TODAY);

        let rollup = engine.sensors().get("tempA").unwrap().weekly_rollup;
        assert_eq!(rollup.count, 6);
        assert_eq!(rollup.sum, 60.0);
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let mut engine = StatsEngine::new();
        for age in 0..=9 {
            engine.record("tempA", age as f64 * 1.5, days_ago(age));
            engine.record("tempB", -(age as f64), days_ago(age));
        }

        let first = engine.recompute_window(TODAY);
        let sensor_a = engine.sensors().get("tempA").unwrap().weekly_rollup;
        let sensor_b = engine.sensors().get("tempB").unwrap().weekly_rollup;
        let global = engine.global().entry().weekly_rollup;

        let second = engine.recompute_window(TODAY);

        assert_eq!(first, second);
        assert_eq!(engine.sensors().get("tempA").unwrap().weekly_rollup, sensor_a);
        assert_eq!(engine.sensors().get("tempB").unwrap().weekly_rollup, sensor_b);
        assert_eq!(engine.global().entry().weekly_rollup, global);
    }

    #[test]
    fn test_recompute_replaces_incremental_rollup() {
        let mut engine = StatsEngine::new();
        engine.record("tempA", 100.0, days_ago(30));
        engine.record("tempA", 1.0, days_ago(2));
        assert_eq!(engine.sensors().get("tempA").unwrap().weekly_rollup.count, 2);

        engine.recompute_window(TODAY);
        let rollup = engine.sensors().get("tempA").unwrap().weekly_rollup;
        assert_eq!(rollup, Statistics::from_value(1.0));

        // The next reading nudges the rebuilt rollup incrementally again.
        engine.record("tempA", 3.0, TODAY);
        let rollup = engine.sensors().get("tempA").unwrap().weekly_rollup;
        assert_eq!(rollup.count, 2);
        assert_eq!(rollup.sum, 4.0);
        assert_eq!(rollup.max, Some(3.0));
    }

    #[test]
    fn test_recompute_ignores_time_of_day() {
        let mut engine = StatsEngine::new();
        engine.record("tempA", 1.0, datetime!(2021-10-13 00:00 UTC));
        engine.record("tempA", 2.0, datetime!(2021-10-12 23:59:59 UTC));

        engine.recompute_window(datetime!(2021-10-20 00:00:01 UTC));
        let early = engine.sensors().get("tempA").unwrap().weekly_rollup;

        engine.recompute_window(datetime!(2021-10-20 23:59:59 UTC));
        let late = engine.sensors().get("tempA").unwrap().weekly_rollup;

        // 10-13 is seven days back, 10-12 is eight.
        assert_eq!(early, Statistics::from_value(1.0));
        assert_eq!(early, late);
    }

    #[test]
    fn test_recompute_on_empty_engine() {
        let mut engine = StatsEngine::new();
        let report = engine.recompute_window(TODAY);

        assert_eq!(report.sensors, 0);
        assert_eq!(report.readings, 0);
        assert_eq!(report.today.to_string(), "2021-10-20");
        assert_eq!(report.window_start.unwrap().to_string(), "2021-10-13");
        assert_eq!(report.window_end.unwrap().to_string(), "2021-10-19");
    }

    #[test]
    fn test_report_counts() {
        let mut engine = StatsEngine::new();
        engine.record("tempA", 1.0, days_ago(1));
        engine.record("tempB", 2.0, days_ago(1));
        engine.record("tempB", 3.0, TODAY);

        let report = engine.recompute_window(TODAY);
        assert_eq!(report.sensors, 2);
        assert_eq!(report.readings, 2);
    }

    #[test]
    fn test_window_statistics_on_global_buckets() {
        let mut history = BTreeMap::new();
        let today = DateKey::from_timestamp(TODAY);
        for offset in 0..10 {
            let day = today.days_before(offset).unwrap();
            history.insert(day, Statistics::from_value(f64::from(offset)));
        }

        let stats = window_statistics(&history, today);
        assert_eq!(stats.count, 7);
        assert_eq!(stats.min, Some(1.0));
        assert_eq!(stats.max, Some(7.0));
    }

    #[test]
    fn test_report_serialization() {
        let mut engine = StatsEngine::new();
        let report = engine.recompute_window(TODAY);
        let json = serde_json::to_value(report).unwrap();
        assert_eq!(json["today"], "2021-10-20");
        assert_eq!(json["window_start"], "2021-10-13");
        assert_eq!(json["sensors"], 0);
    }
}
