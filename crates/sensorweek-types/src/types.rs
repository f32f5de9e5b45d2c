//! Core types for sensor statistics.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::well_known::Iso8601;
use time::{Date, Duration, OffsetDateTime, UtcOffset};

use crate::error::{ValidationError, ValidationResult};

/// Running aggregate over a set of readings.
///
/// A freshly created value has `count == 0`, `sum == 0.0` and no `min`/`max`.
/// Once at least one value has been folded in, both bounds are present and
/// `min <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Statistics {
    /// Number of readings folded in.
    pub count: u64,
    /// Arithmetic sum of all readings (not an average).
    pub sum: f64,
    /// Smallest reading seen.
    pub min: Option<f64>,
    /// Largest reading seen.
    pub max: Option<f64>,
}

impl Statistics {
    /// An empty aggregate.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            count: 0,
            sum: 0.0,
            min: None,
            max: None,
        }
    }

    /// An aggregate seeded from a single reading.
    ///
    /// # Examples
    ///
    /// ```
    /// use sensorweek_types::Statistics;
    ///
    /// let stats = Statistics::from_value(4.5);
    /// assert_eq!(stats.count, 1);
    /// assert_eq!(stats.min, Some(4.5));
    /// assert_eq!(stats.max, Some(4.5));
    /// ```
    #[must_use]
    pub const fn from_value(value: f64) -> Self {
        Self {
            count: 1,
            sum: value,
            min: Some(value),
            max: Some(value),
        }
    }

    /// Fold a single reading into the aggregate.
    pub fn record(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        if self.min.is_none_or(|min| value < min) {
            self.min = Some(value);
        }
        if self.max.is_none_or(|max| value > max) {
            self.max = Some(value);
        }
    }

    /// Fold another aggregate (typically a day bucket) into this one.
    ///
    /// Bounds of `other` only replace ours when they are present and
    /// strictly more extreme, so merging an empty aggregate is a no-op.
    pub fn merge(&mut self, other: &Statistics) {
        self.count += other.count;
        self.sum += other.sum;
        if let Some(other_min) = other.min
            && self.min.is_none_or(|min| other_min < min)
        {
            self.min = Some(other_min);
        }
        if let Some(other_max) = other.max
            && self.max.is_none_or(|max| other_max > max)
        {
            self.max = Some(other_max);
        }
    }

    /// Return to the empty state.
    pub fn reset(&mut self) {
        *self = Self::empty();
    }

    /// Whether no reading has been folded in.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Mean of the folded readings, `None` when there are none.
    ///
    /// # Examples
    ///
    /// ```
    /// use sensorweek_types::Statistics;
    ///
    /// let mut stats = Statistics::empty();
    /// assert_eq!(stats.average(), None);
    ///
    /// stats.record(10.0);
    /// stats.record(30.0);
    /// assert_eq!(stats.average(), Some(20.0));
    /// ```
    #[must_use]
    pub fn average(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

/// A calendar day in UTC, used to key daily buckets.
///
/// Two timestamps on the same UTC day produce equal keys regardless of their
/// time of day. Displays and serializes as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey(Date);

impl DateKey {
    /// Wrap a calendar date.
    #[must_use]
    pub const fn new(date: Date) -> Self {
        Self(date)
    }

    /// Truncate a timestamp to its UTC calendar day.
    ///
    /// # Examples
    ///
    /// ```
    /// use sensorweek_types::DateKey;
    /// use time::macros::datetime;
    ///
    /// let key = DateKey::from_timestamp(datetime!(2021-10-06 08:47:28 UTC));
    /// assert_eq!(key.to_string(), "2021-10-06");
    /// ```
    #[must_use]
    pub fn from_timestamp(timestamp: OffsetDateTime) -> Self {
        Self(timestamp.to_offset(UtcOffset::UTC).date())
    }

    /// The underlying date.
    #[must_use]
    pub const fn date(&self) -> Date {
        self.0
    }

    /// The day `days` days earlier, or `None` past the supported calendar range.
    #[must_use]
    pub fn days_before(&self, days: u32) -> Option<Self> {
        self.0
            .checked_sub(Duration::days(i64::from(days)))
            .map(Self)
    }
}

impl From<Date> for DateKey {
    fn from(date: Date) -> Self {
        Self(date)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DateKey {
    type Err = time::error::Parse;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Date::parse(s, &Iso8601::DATE).map(Self)
    }
}

#[cfg(feature = "serde")]
impl Serialize for DateKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for DateKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The reported view of a weekly rollup.
///
/// All three fields are `None` when the rollup holds no readings, so an
/// empty week never produces a division by zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WeeklySummary {
    /// Mean of the readings in the window.
    pub avg: Option<f64>,
    /// Largest reading in the window.
    pub max: Option<f64>,
    /// Smallest reading in the window.
    pub min: Option<f64>,
}

impl From<&Statistics> for WeeklySummary {
    fn from(stats: &Statistics) -> Self {
        if stats.is_empty() {
            return Self::default();
        }
        Self {
            avg: stats.average(),
            max: stats.max,
            min: stats.min,
        }
    }
}

/// A validated reading ready to be recorded.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Reading {
    /// Identifier of the submitting sensor.
    pub sensor_name: String,
    /// The scalar value.
    pub value: f64,
}

impl Reading {
    /// Validate a submitted `(sensor_name, value)` pair.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptySensorName`] for an empty (or
    /// whitespace-only) name and [`ValidationError::NonFiniteValue`] for NaN
    /// or infinite values.
    pub fn new(sensor_name: impl Into<String>, value: f64) -> ValidationResult<Self> {
        let sensor_name = sensor_name.into();
        if sensor_name.trim().is_empty() {
            return Err(ValidationError::EmptySensorName);
        }
        if !value.is_finite() {
            return Err(ValidationError::NonFiniteValue(value));
        }
        Ok(Self { sensor_name, value })
    }
}
