//! Metric value model.
//!
//! A metric is either a gauge (f64, last write wins) or a counter (i64,
//! updates accumulate). The kind is derived from the value, so a `Metric`
//! cannot carry a kind that disagrees with its payload.

use std::fmt;
use std::str::FromStr;

use crate::error::{MetricaError, Result};

/// Metric kind. Closed to exactly gauge and counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    Gauge,
    Counter,
}

impl Kind {
    /// All kinds, in the order backends list them.
    pub const ALL: [Kind; 2] = [Kind::Gauge, Kind::Counter];

    /// Wire tag (`type` field of a record).
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Gauge => "gauge",
            Kind::Counter => "counter",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = MetricaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "gauge" => Ok(Kind::Gauge),
            "counter" => Ok(Kind::Counter),
            other => Err(MetricaError::UnknownKind(other.to_string())),
        }
    }
}

/// Metric payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Gauge(f64),
    Counter(i64),
}

impl Value {
    pub fn kind(self) -> Kind {
        match self {
            Value::Gauge(_) => Kind::Gauge,
            Value::Counter(_) => Kind::Counter,
        }
    }

    /// Value as a gauge. Counters widen.
    pub fn gauge(self) -> f64 {
        match self {
            Value::Gauge(v) => v,
            Value::Counter(v) => v as f64,
        }
    }

    /// Value as a counter. Gauges truncate toward zero (saturating, NaN -> 0).
    pub fn counter(self) -> i64 {
        match self {
            Value::Gauge(v) => v as i64,
            Value::Counter(v) => v,
        }
    }

    /// Re-express this value as `kind`.
    pub fn coerce(self, kind: Kind) -> Value {
        match kind {
            Kind::Gauge => Value::Gauge(self.gauge()),
            Kind::Counter => Value::Counter(self.counter()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Gauge(v) => write!(f, "{v}"),
            Value::Counter(v) => write!(f, "{v}"),
        }
    }
}

/// One named metric value. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    name: String,
    value: Value,
}

impl Metric {
    /// Build a metric of `kind`, coercing `value` to it.
    pub fn new(name: impl Into<String>, kind: Kind, value: Value) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(MetricaError::EmptyName);
        }
        Ok(Self {
            name,
            value: value.coerce(kind),
        })
    }

    pub fn gauge(name: impl Into<String>, value: f64) -> Result<Self> {
        Self::new(name, Kind::Gauge, Value::Gauge(value))
    }

    pub fn counter(name: impl Into<String>, delta: i64) -> Result<Self> {
        Self::new(name, Kind::Counter, Value::Counter(delta))
    }

    /// Parse the plain-text form `(name, "gauge"|"counter", "<number>")`.
    pub fn parse(name: &str, kind: &str, raw: &str) -> Result<Self> {
        let kind: Kind = kind.parse()?;
        let value = match kind {
            Kind::Gauge => raw
                .trim()
                .parse::<f64>()
                .map(Value::Gauge)
                .map_err(|e| MetricaError::BadValue(format!("{raw:?}: {e}")))?,
            Kind::Counter => raw
                .trim()
                .parse::<i64>()
                .map(Value::Counter)
                .map_err(|e| MetricaError::BadValue(format!("{raw:?}: {e}")))?,
        };
        Self::new(name, kind, value)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> Kind {
        self.value.kind()
    }

    pub fn value(&self) -> Value {
        self.value
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}={}", self.kind(), self.name, self.value)
    }
}

/// Ordered list of metrics applied together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricBatch {
    metrics: Vec<Metric>,
}

impl MetricBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, m: Metric) {
        self.metrics.push(m);
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Metric> {
        self.metrics.iter()
    }

    pub fn as_slice(&self) -> &[Metric] {
        &self.metrics
    }

    pub fn into_vec(self) -> Vec<Metric> {
        self.metrics
    }
}

impl From<Vec<Metric>> for MetricBatch {
    fn from(metrics: Vec<Metric>) -> Self {
        Self { metrics }
    }
}

impl FromIterator<Metric> for MetricBatch {
    fn from_iter<I: IntoIterator<Item = Metric>>(iter: I) -> Self {
        Self {
            metrics: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a MetricBatch {
    type Item = &'a Metric;
    type IntoIter = std::slice::Iter<'a, Metric>;

    fn into_iter(self) -> Self::IntoIter {
        self.metrics.iter()
    }
}
