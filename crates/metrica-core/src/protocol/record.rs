//! JSON wire record.
//!
//! `{"id": "...", "type": "gauge"|"counter", "delta": i64, "value": f64}`;
//! `delta` is present only for counters and `value` only for gauges. The
//! batch form is a JSON array of records; the same shape is used for the
//! file backend's snapshot.

use serde::{Deserialize, Serialize};

use crate::error::{MetricaError, Result};
use crate::metric::{Kind, Metric, Value};

/// Wire record (one metric).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricRecord {
    /// Metric name.
    pub id: String,
    /// Kind tag (field name is `type` in JSON).
    #[serde(rename = "type")]
    pub kind: String,
    /// Counter delta.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<i64>,
    /// Gauge value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl From<&Metric> for MetricRecord {
    fn from(m: &Metric) -> Self {
        let (delta, value) = match m.value() {
            Value::Gauge(v) => (None, Some(v)),
            Value::Counter(d) => (Some(d), None),
        };
        Self {
            id: m.name().to_string(),
            kind: m.kind().as_str().to_string(),
            delta,
            value,
        }
    }
}

impl TryFrom<MetricRecord> for Metric {
    type Error = MetricaError;

    fn try_from(r: MetricRecord) -> Result<Self> {
        let kind: Kind = r.kind.parse()?;
        let value = match kind {
            Kind::Gauge => r
                .value
                .map(Value::Gauge)
                .ok_or_else(|| MetricaError::BadValue(format!("gauge {} has no value", r.id)))?,
            Kind::Counter => r
                .delta
                .map(Value::Counter)
                .ok_or_else(|| MetricaError::BadValue(format!("counter {} has no delta", r.id)))?,
        };
        Metric::new(r.id, kind, value)
    }
}

/// Lookup request (`{"id", "type"}`) used by the value query path.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricQuery {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl MetricQuery {
    pub fn kind(&self) -> Result<Kind> {
        self.kind.parse()
    }
}

/// Serialize one metric.
pub fn encode_record(m: &Metric) -> Result<Vec<u8>> {
    serde_json::to_vec(&MetricRecord::from(m))
        .map_err(|e| MetricaError::Internal(format!("record encode failed: {e}")))
}

/// Serialize a batch as a JSON array.
pub fn encode_records<'a, I>(metrics: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = &'a Metric>,
{
    let records: Vec<MetricRecord> = metrics.into_iter().map(MetricRecord::from).collect();
    serde_json::to_vec(&records)
        .map_err(|e| MetricaError::Internal(format!("records encode failed: {e}")))
}

/// Parse one record.
pub fn decode_record(data: &[u8]) -> Result<Metric> {
    let record: MetricRecord = serde_json::from_slice(data)
        .map_err(|e| MetricaError::BadRequest(format!("invalid record json: {e}")))?;
    Metric::try_from(record)
}

/// Parse a JSON array of records. Fails on the first invalid record.
pub fn decode_records(data: &[u8]) -> Result<Vec<Metric>> {
    let records: Vec<MetricRecord> = serde_json::from_slice(data)
        .map_err(|e| MetricaError::BadRequest(format!("invalid records json: {e}")))?;
    records.into_iter().map(Metric::try_from).collect()
}
