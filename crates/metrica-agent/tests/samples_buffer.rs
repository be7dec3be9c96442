#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use metrica_agent::samples::Samples;
use metrica_core::{Kind, Value};

fn value_of(batch: &metrica_core::MetricBatch, kind: Kind, name: &str) -> Option<Value> {
    batch
        .iter()
        .find(|m| m.kind() == kind && m.name() == name)
        .map(|m| m.value())
}

#[test]
fn snapshot_keeps_gauges_and_drains_counters() {
    let s = Samples::new();
    s.set_gauge("Alloc", 10.0);
    s.add_counter("PollCount", 1);
    s.add_counter("PollCount", 1);

    let first = s.take_snapshot();
    assert_eq!(value_of(&first, Kind::Gauge, "Alloc"), Some(Value::Gauge(10.0)));
    assert_eq!(value_of(&first, Kind::Counter, "PollCount"), Some(Value::Counter(2)));

    let second = s.take_snapshot();
    assert_eq!(value_of(&second, Kind::Gauge, "Alloc"), Some(Value::Gauge(10.0)));
    assert_eq!(value_of(&second, Kind::Counter, "PollCount"), None);
}

#[test]
fn failed_report_restores_counter_deltas() {
    let s = Samples::new();
    s.add_counter("PollCount", 3);

    let undelivered = s.take_snapshot();
    s.add_counter("PollCount", 2);
    s.restore_counters(&undelivered);

    assert_eq!(s.counter("PollCount"), Some(5));
}

#[test]
fn gauges_overwrite() {
    let s = Samples::new();
    s.set_gauges(vec![("a".to_string(), 1.0), ("b".to_string(), 2.0)]);
    s.set_gauge("a", 3.0);

    assert_eq!(s.gauge("a"), Some(3.0));
    assert_eq!(s.gauge("b"), Some(2.0));
}
