//! Prometheus text exposition of the weekly statistics.
//!
//! # Metrics Exported
//!
//! - `sensorweek_sensors` - Number of sensors seen
//! - `sensorweek_readings_total` - Readings recorded since start
//! - `sensorweek_recompute_runs_total` - Completed window recomputes
//! - `sensorweek_weekly_readings{sensor}` - Readings in a sensor's weekly rollup
//! - `sensorweek_weekly_avg{sensor}` / `_min` / `_max` - Weekly rollup values
//!
//! Sensors with an empty window only export `sensorweek_weekly_readings`.
//! The all-sensors rollup is exported with the label `sensor="*"`.

use std::fmt::Write;

use sensorweek_store::StatsEngine;
use sensorweek_types::Statistics;

/// Content type for Prometheus metrics.
pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Label used for the rollup across all sensors.
pub const ALL_SENSORS_LABEL: &str = "*";

/// Render the engine's state in Prometheus text format.
pub fn render(engine: &StatsEngine, recompute_runs: u64) -> String {
    let mut output = String::with_capacity(1024);

    push_gauge(
        &mut output,
        "sensorweek_sensors",
        "Number of sensors seen",
        engine.sensor_count(),
    );
    push_counter(
        &mut output,
        "sensorweek_readings_total",
        "Readings recorded since start",
        engine.total_readings(),
    );
    push_counter(
        &mut output,
        "sensorweek_recompute_runs_total",
        "Completed weekly window recomputes",
        recompute_runs,
    );

    let mut rollups: Vec<(String, Statistics)> = engine
        .sensor_names()
        .into_iter()
        .filter_map(|name| {
            let rollup = engine.sensors().get(&name)?.weekly_rollup;
            Some((name, rollup))
        })
        .collect();
    rollups.push((
        ALL_SENSORS_LABEL.to_string(),
        engine.global().entry().weekly_rollup,
    ));

    let families: [(&str, &str, fn(&Statistics) -> Option<f64>); 4] = [
        (
            "sensorweek_weekly_readings",
            "Readings in the weekly rollup",
            |s| Some(s.count as f64),
        ),
        ("sensorweek_weekly_avg", "Weekly average", Statistics::average),
        ("sensorweek_weekly_min", "Weekly minimum", |s| s.min),
        ("sensorweek_weekly_max", "Weekly maximum", |s| s.max),
    ];

    for (name, help, value) in families {
        let _ = writeln!(output, "# HELP {} {}", name, help);
        let _ = writeln!(output, "# TYPE {} gauge", name);
        for (sensor, rollup) in &rollups {
            if let Some(v) = value(rollup) {
                let _ = writeln!(
                    output,
                    "{}{{sensor=\"{}\"}} {}",
                    name,
                    escape_label_value(sensor),
                    v
                );
            }
        }
        output.push('\n');
    }

    output
}

fn push_gauge(output: &mut String, name: &str, help: &str, value: usize) {
    let _ = writeln!(output, "# HELP {} {}", name, help);
    let _ = writeln!(output, "# TYPE {} gauge", name);
    let _ = writeln!(output, "{} {}\n", name, value);
}

fn push_counter(output: &mut String, name: &str, help: &str, value: u64) {
    let _ = writeln!(output, "# HELP {} {}", name, help);
    let _ = writeln!(output, "# TYPE {} counter", name);
    let _ = writeln!(output, "{} {}\n", name, value);
}

/// Escape special characters in Prometheus label values.
fn escape_label_value(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_render_empty_engine() {
        let output = render(&StatsEngine::new(), 0);

        assert!(output.contains("# TYPE sensorweek_sensors gauge"));
        assert!(output.contains("sensorweek_sensors 0"));
        assert!(output.contains("sensorweek_readings_total 0"));
        assert!(output.contains("sensorweek_recompute_runs_total 0"));
        assert!(output.contains("sensorweek_weekly_readings{sensor=\"*\"} 0"));
        assert!(!output.contains("sensorweek_weekly_avg{"));
    }

    #[test]
    fn test_render_with_readings() {
        let mut engine = StatsEngine::new();
        let now = datetime!(2021-10-06 08:00 UTC);
        engine.record("tempA", 10.0, now);
        engine.record("tempA", 30.0, now);
        engine.record("tempB", 5.0, now);

        let output = render(&engine, 2);

        assert!(output.contains("sensorweek_sensors 2"));
        assert!(output.contains("sensorweek_readings_total 3"));
        assert!(output.contains("sensorweek_recompute_runs_total 2"));
        assert!(output.contains("sensorweek_weekly_avg{sensor=\"tempA\"} 20"));
        assert!(output.contains("sensorweek_weekly_max{sensor=\"tempA\"} 30"));
        assert!(output.contains("sensorweek_weekly_min{sensor=\"*\"} 5"));
        assert!(output.contains("sensorweek_weekly_avg{sensor=\"*\"} 15"));
    }

    #[test]
    fn test_render_escapes_sensor_names() {
        let mut engine = StatsEngine::new();
        engine.record("weird \"name\"", 1.0, datetime!(2021-10-06 08:00 UTC));

        let output = render(&engine, 0);
        assert!(output.contains("sensor=\"weird \\\"name\\\"\""));
    }

    #[test]
    fn test_escape_label_value() {
        assert_eq!(escape_label_value("plain"), "plain");
        assert_eq!(escape_label_value("a\\b"), "a\\\\b");
        assert_eq!(escape_label_value("line\nbreak"), "line\\nbreak");
    }
}
