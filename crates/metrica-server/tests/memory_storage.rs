#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use metrica_core::{Kind, Metric, MetricaError, Value};
use metrica_server::storage::{MemoryStorage, Storage};

#[tokio::test]
async fn gauge_last_write_wins() {
    let s = MemoryStorage::new();
    s.update(&Metric::gauge("Alloc", 1.5).unwrap()).await.unwrap();
    s.update(&Metric::gauge("Alloc", 2.5).unwrap()).await.unwrap();

    let m = s.get(Kind::Gauge, "Alloc").await.unwrap();
    assert_eq!(m.value(), Value::Gauge(2.5));
}

#[tokio::test]
async fn counter_accumulates() {
    let s = MemoryStorage::new();
    for d in [3, 4, -2] {
        s.update(&Metric::counter("PollCount", d).unwrap()).await.unwrap();
    }
    let m = s.get(Kind::Counter, "PollCount").await.unwrap();
    assert_eq!(m.value(), Value::Counter(5));
}

#[tokio::test]
async fn batch_applies_in_order() {
    let s = MemoryStorage::new();
    let batch = vec![
        Metric::gauge("g", 1.0).unwrap(),
        Metric::counter("c", 2).unwrap(),
        Metric::gauge("g", 7.0).unwrap(),
        Metric::counter("c", 3).unwrap(),
    ];
    s.batch_update(&batch).await.unwrap();

    assert_eq!(s.get(Kind::Gauge, "g").await.unwrap().value(), Value::Gauge(7.0));
    assert_eq!(s.get(Kind::Counter, "c").await.unwrap().value(), Value::Counter(5));
    assert_eq!(s.len(), 2);
}

#[tokio::test]
async fn kinds_are_separate_namespaces() {
    let s = MemoryStorage::new();
    s.update(&Metric::gauge("x", 1.0).unwrap()).await.unwrap();
    s.update(&Metric::counter("x", 9).unwrap()).await.unwrap();

    assert_eq!(s.get(Kind::Gauge, "x").await.unwrap().value(), Value::Gauge(1.0));
    assert_eq!(s.get(Kind::Counter, "x").await.unwrap().value(), Value::Counter(9));
}

#[tokio::test]
async fn missing_metric_is_unknown() {
    let s = MemoryStorage::new();
    s.update(&Metric::gauge("present", 1.0).unwrap()).await.unwrap();

    let err = s.get(Kind::Counter, "present").await.unwrap_err();
    assert!(matches!(err, MetricaError::UnknownMetric { .. }), "{err}");
}

#[tokio::test]
async fn list_returns_gauges_then_counters() {
    let s = MemoryStorage::new();
    s.update(&Metric::counter("c", 1).unwrap()).await.unwrap();
    s.update(&Metric::gauge("g", 1.0).unwrap()).await.unwrap();

    let kinds: Vec<Kind> = s.list().await.unwrap().iter().map(Metric::kind).collect();
    assert_eq!(kinds, vec![Kind::Gauge, Kind::Counter]);
}

#[tokio::test]
async fn redelivery_is_idempotent_only_for_gauges() {
    let s = MemoryStorage::new();
    let batch = vec![
        Metric::gauge("g", 4.0).unwrap(),
        Metric::counter("c", 10).unwrap(),
    ];
    s.batch_update(&batch).await.unwrap();
    s.batch_update(&batch).await.unwrap();

    assert_eq!(s.get(Kind::Gauge, "g").await.unwrap().value(), Value::Gauge(4.0));
    // a replayed counter delta is counted twice
    assert_eq!(s.get(Kind::Counter, "c").await.unwrap().value(), Value::Counter(20));
}

#[tokio::test]
async fn counter_saturates_instead_of_wrapping() {
    let s = MemoryStorage::new();
    s.update(&Metric::counter("big", i64::MAX).unwrap()).await.unwrap();
    s.update(&Metric::counter("big", 1).unwrap()).await.unwrap();

    assert_eq!(
        s.get(Kind::Counter, "big").await.unwrap().value(),
        Value::Counter(i64::MAX)
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_counter_updates_are_not_lost() {
    let s = Arc::new(MemoryStorage::new());

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let s = Arc::clone(&s);
        tasks.push(tokio::spawn(async move {
            for _ in 0..250 {
                s.update(&Metric::counter("hits", 1).unwrap()).await.unwrap();
            }
        }));
    }
    for t in tasks {
        t.await.unwrap();
    }

    assert_eq!(
        s.get(Kind::Counter, "hits").await.unwrap().value(),
        Value::Counter(2000)
    );
}

#[tokio::test]
async fn stop_is_a_no_op() {
    let s = MemoryStorage::new();
    s.stop().await.unwrap();
    s.stop().await.unwrap();
}
