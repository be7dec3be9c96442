//! Agent-side sample buffer.
//!
//! Poll and report run concurrently. One mutex guards both maps so a report
//! snapshot always pairs gauges and counters from the same instant, and the
//! counter drain cannot interleave with a poll increment.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use metrica_core::{Kind, Metric, MetricBatch, Value};

#[derive(Debug, Default)]
struct Inner {
    gauges: HashMap<String, f64>,
    counters: HashMap<String, i64>,
}

#[derive(Debug, Default)]
pub struct Samples {
    inner: Mutex<Inner>,
}

impl Samples {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_gauge(&self, name: &str, value: f64) {
        self.lock().gauges.insert(name.to_string(), value);
    }

    /// Write a whole poll's gauges under one lock.
    pub fn set_gauges(&self, values: impl IntoIterator<Item = (String, f64)>) {
        self.lock().gauges.extend(values);
    }

    pub fn add_counter(&self, name: &str, delta: i64) {
        let mut inner = self.lock();
        let slot = inner.counters.entry(name.to_string()).or_insert(0);
        *slot = slot.saturating_add(delta);
    }

    pub fn gauge(&self, name: &str) -> Option<f64> {
        self.lock().gauges.get(name).copied()
    }

    pub fn counter(&self, name: &str) -> Option<i64> {
        self.lock().counters.get(name).copied()
    }

    /// Current gauges plus the counter deltas accumulated since the last
    /// snapshot. Counters are drained.
    pub fn take_snapshot(&self) -> MetricBatch {
        let (gauges, counters) = {
            let mut inner = self.lock();
            (inner.gauges.clone(), std::mem::take(&mut inner.counters))
        };

        let gauges = gauges
            .into_iter()
            .filter_map(|(name, v)| Metric::new(name, Kind::Gauge, Value::Gauge(v)).ok());
        let counters = counters
            .into_iter()
            .filter_map(|(name, d)| Metric::new(name, Kind::Counter, Value::Counter(d)).ok());

        gauges.chain(counters).collect()
    }

    /// Put back the counter deltas of an undelivered snapshot.
    pub fn restore_counters(&self, batch: &MetricBatch) {
        let mut inner = self.lock();
        for m in batch {
            if let Value::Counter(d) = m.value() {
                let slot = inner.counters.entry(m.name().to_string()).or_insert(0);
                *slot = slot.saturating_add(d);
            }
        }
    }
}
