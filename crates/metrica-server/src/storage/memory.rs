//! In-memory backend.
//!
//! One `RwLock` per kind covers that kind's whole map. Writers take the
//! exclusive lock for a single entry mutation, so concurrent counter deltas
//! never get lost. `snapshot` copies the map under the shared lock and
//! releases it before the caller iterates.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use metrica_core::error::{MetricaError, Result};
use metrica_core::{Kind, Metric, Value};

use super::Storage;

/// Whole-map locked name -> value table.
#[derive(Debug, Default)]
pub struct SyncMap<T> {
    inner: RwLock<HashMap<String, T>>,
}

impl<T: Copy> SyncMap<T> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    // A poisoned lock still guards a consistent map of Copy values.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, T>> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, HashMap<String, T>> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Overwrite one entry.
    pub fn write(&self, key: &str, value: T) {
        self.write_guard().insert(key.to_string(), value);
    }

    /// Replace one entry with `f(current)`.
    pub fn modify(&self, key: &str, f: impl FnOnce(Option<T>) -> T) {
        let mut map = self.write_guard();
        let next = f(map.get(key).copied());
        map.insert(key.to_string(), next);
    }

    pub fn get(&self, key: &str) -> Option<T> {
        self.read().get(key).copied()
    }

    /// Copy of the whole map.
    pub fn snapshot(&self) -> HashMap<String, T> {
        self.read().clone()
    }

    /// Swap in a new map wholesale.
    pub fn replace_all(&self, map: HashMap<String, T>) {
        *self.write_guard() = map;
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Transient backend: two independent per-kind maps.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    gauges: SyncMap<f64>,
    counters: SyncMap<i64>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Synchronous form of `update`; in-memory writes never block on I/O.
    pub fn apply(&self, metric: &Metric) {
        match metric.value() {
            Value::Gauge(v) => self.gauges.write(metric.name(), v),
            Value::Counter(d) => self
                .counters
                .modify(metric.name(), |cur| cur.unwrap_or(0).saturating_add(d)),
        }
    }

    pub fn lookup(&self, kind: Kind, name: &str) -> Result<Metric> {
        let value = match kind {
            Kind::Gauge => self.gauges.get(name).map(Value::Gauge),
            Kind::Counter => self.counters.get(name).map(Value::Counter),
        };
        let value = value.ok_or_else(|| MetricaError::UnknownMetric {
            kind: kind.to_string(),
            name: name.to_string(),
        })?;
        Metric::new(name, kind, value)
    }

    /// Gauges then counters. Each kind is copied under its own lock; there is
    /// no ordering guarantee between the two copies.
    pub fn snapshot(&self) -> Vec<Metric> {
        let gauges = self.gauges.snapshot();
        let counters = self.counters.snapshot();

        let mut out = Vec::with_capacity(gauges.len() + counters.len());
        out.extend(
            gauges
                .into_iter()
                .filter_map(|(name, v)| Metric::new(name, Kind::Gauge, Value::Gauge(v)).ok()),
        );
        out.extend(
            counters
                .into_iter()
                .filter_map(|(name, v)| Metric::new(name, Kind::Counter, Value::Counter(v)).ok()),
        );
        out
    }

    /// Replace both maps (restore path). Not a merge.
    pub fn replace_all(&self, gauges: HashMap<String, f64>, counters: HashMap<String, i64>) {
        self.gauges.replace_all(gauges);
        self.counters.replace_all(counters);
    }

    pub fn len(&self) -> usize {
        self.gauges.len() + self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn update(&self, metric: &Metric) -> Result<()> {
        self.apply(metric);
        Ok(())
    }

    /// Best effort, item by item; no rollback.
    async fn batch_update(&self, metrics: &[Metric]) -> Result<()> {
        for m in metrics {
            self.apply(m);
        }
        Ok(())
    }

    async fn get(&self, kind: Kind, name: &str) -> Result<Metric> {
        self.lookup(kind, name)
    }

    async fn list(&self) -> Result<Vec<Metric>> {
        Ok(self.snapshot())
    }

    async fn stop(&self) -> Result<()> {
        Ok(())
    }
}
